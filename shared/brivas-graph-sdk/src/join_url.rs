//! Meeting join-URL parsing
//!
//! Extracts chat and organizer coordinates from a Teams meeting link of the form
//! `https://teams.microsoft.com/l/meetup-join/<thread>/<message>?context={"Tid":..,"Oid":..}`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{GraphError, Result};
use crate::identity::{Identity, IdentitySet};
use crate::meeting::{ChatInfo, MeetingInfo};

/// Turns a meeting join link into structured join information
pub trait JoinUrlParser: Send + Sync {
    fn parse(&self, join_url: &str) -> Result<(ChatInfo, MeetingInfo)>;
}

/// Parser for Teams `meetup-join` links
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamsJoinUrlParser;

impl JoinUrlParser for TeamsJoinUrlParser {
    fn parse(&self, join_url: &str) -> Result<(ChatInfo, MeetingInfo)> {
        parse_join_url(join_url)
    }
}

#[derive(Debug, Deserialize)]
struct JoinContext {
    #[serde(rename = "Tid", default)]
    tenant_id: Option<String>,
    #[serde(rename = "Oid", default)]
    organizer_id: Option<String>,
    #[serde(rename = "MessageId", default)]
    message_id: Option<String>,
}

fn join_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"https://teams\.microsoft\.com.*/",
            r"(?P<thread>[^/]+)/(?P<message>[^/]+)",
            r"\?context=(?P<context>\{.*\})",
        ))
        .expect("join URL pattern is valid")
    })
}

/// Parse a Teams join link
pub fn parse_join_url(join_url: &str) -> Result<(ChatInfo, MeetingInfo)> {
    let invalid = || GraphError::InvalidJoinUrl(join_url.to_string());

    let decoded = urlencoding::decode(join_url.trim()).map_err(|_| invalid())?;
    let captures = join_url_pattern().captures(&decoded).ok_or_else(invalid)?;

    let context: JoinContext =
        serde_json::from_str(&captures["context"]).map_err(|_| invalid())?;

    let organizer_id = context
        .organizer_id
        .filter(|id| !id.is_empty())
        .ok_or_else(invalid)?;

    let chat_info = ChatInfo {
        thread_id: captures["thread"].to_string(),
        message_id: captures["message"].to_string(),
        reply_chain_message_id: context.message_id.filter(|id| !id.is_empty()),
    };

    let mut organizer = Identity {
        id: organizer_id,
        ..Identity::default()
    };
    if let Some(tenant_id) = context.tenant_id.filter(|tenant| !tenant.is_empty()) {
        organizer = organizer.with_tenant_id(tenant_id);
    }

    Ok((chat_info, MeetingInfo::organizer(IdentitySet::user(organizer))))
}
