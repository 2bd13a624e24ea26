//! Call resource types

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::InvitationParticipantInfo;
use crate::meeting::{ChatInfo, MeetingInfo};

/// Requested media modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Audio,
}

/// Media hosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum MediaConfig {
    /// Media is hosted by the platform
    #[serde(rename = "#microsoft.graph.serviceHostedMediaConfig")]
    ServiceHosted {},
}

impl MediaConfig {
    pub fn service_hosted() -> Self {
        MediaConfig::ServiceHosted {}
    }
}

/// Control-plane state of a call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallState {
    Incoming,
    Establishing,
    Established,
    Hold,
    Transferring,
    TransferAccepted,
    Redirecting,
    Terminating,
    Terminated,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CallState {
    pub fn is_established(self) -> bool {
        matches!(self, CallState::Established)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Terminating | CallState::Terminated)
    }
}

/// Decode an explicit `null` the same way as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Call resource
///
/// `id` and `state` are assigned by the platform and are absent on outgoing
/// create requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub callback_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub targets: Vec<InvitationParticipantInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requested_modalities: Vec<Modality>,
    pub media_config: MediaConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_info: Option<ChatInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_info: Option<MeetingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CallState>,
}

impl Call {
    /// Outbound audio call to a single target
    pub fn outbound(
        callback_uri: impl Into<String>,
        tenant_id: impl Into<String>,
        target: InvitationParticipantInfo,
    ) -> Self {
        Self {
            id: None,
            callback_uri: callback_uri.into(),
            tenant_id: Some(tenant_id.into()),
            targets: vec![target],
            requested_modalities: vec![Modality::Audio],
            media_config: MediaConfig::service_hosted(),
            chat_info: None,
            meeting_info: None,
            state: None,
        }
    }

    /// Audio call joining a scheduled meeting
    pub fn join_meeting(
        callback_uri: impl Into<String>,
        tenant_id: impl Into<String>,
        chat_info: ChatInfo,
        meeting_info: MeetingInfo,
    ) -> Self {
        Self {
            id: None,
            callback_uri: callback_uri.into(),
            tenant_id: Some(tenant_id.into()),
            targets: Vec::new(),
            requested_modalities: vec![Modality::Audio],
            media_config: MediaConfig::service_hosted(),
            chat_info: Some(chat_info),
            meeting_info: Some(meeting_info),
            state: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}
