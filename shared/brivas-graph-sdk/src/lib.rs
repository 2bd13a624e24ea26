//! BRIVAS Graph Communications SDK
//!
//! Call-control types and clients for the Microsoft Graph communications API:
//! call resources, invitation targets, meeting join links, callback
//! notifications and a client-credential authenticated REST client.

pub mod auth;
pub mod call;
pub mod client;
pub mod error;
pub mod graph;
pub mod identity;
pub mod join_url;
pub mod meeting;
pub mod notification;


pub use auth::{ClientCredentials, TokenProvider};
pub use call::{Call, CallState, MediaConfig, Modality};
pub use client::CallControlClient;
pub use error::{GraphError, Result};
pub use graph::{GraphClient, GraphConfig};
pub use identity::{Identity, IdentitySet, InvitationParticipantInfo};
pub use join_url::{parse_join_url, JoinUrlParser, TeamsJoinUrlParser};
pub use meeting::{ChatInfo, MeetingInfo, OnlineMeeting, OnlineMeetingRequest};
pub use notification::{CallStateUpdate, ChangeType, CommsNotification, CommsNotifications};
