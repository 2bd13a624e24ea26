//! Meeting types
//!
//! Join coordinates for scheduled meetings and the online-meeting resource.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::IdentitySet;

/// Chat thread coordinates of a meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInfo {
    pub thread_id: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_chain_message_id: Option<String>,
}

/// Meeting identification used when joining
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum MeetingInfo {
    #[serde(rename = "#microsoft.graph.organizerMeetingInfo")]
    Organizer { organizer: IdentitySet },
}

impl MeetingInfo {
    pub fn organizer(organizer: IdentitySet) -> Self {
        MeetingInfo::Organizer { organizer }
    }

    /// Tenant of the meeting organizer, if the join link carried one
    pub fn organizer_tenant_id(&self) -> Option<&str> {
        match self {
            MeetingInfo::Organizer { organizer } => {
                organizer.user.as_ref().and_then(|user| user.tenant_id())
            }
        }
    }
}

/// Request body for `onlineMeetings/createOrGet`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineMeetingRequest {
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl OnlineMeetingRequest {
    /// Meeting starting now and lasting `length`
    pub fn starting_now(subject: impl Into<String>, length: Duration) -> Self {
        let start = Utc::now();
        Self {
            start_date_time: start,
            end_date_time: start + length,
            subject: subject.into(),
            external_id: None,
        }
    }
}

/// Online meeting resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineMeeting {
    pub id: String,
    #[serde(default)]
    pub join_web_url: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date_time: Option<DateTime<Utc>>,
}
