//! Identity types
//!
//! Participant identities as they appear in call targets, transfer targets
//! and meeting organizers.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

const TENANT_ID_KEY: &str = "tenantId";

/// A single user or application identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Open-typed properties (e.g. `tenantId`) serialized inline
    #[serde(flatten, default)]
    pub additional_data: JsonMap<String, JsonValue>,
}

impl Identity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
            additional_data: JsonMap::new(),
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.additional_data
            .get(TENANT_ID_KEY)
            .and_then(JsonValue::as_str)
            .filter(|tenant| !tenant.is_empty())
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.additional_data
            .insert(TENANT_ID_KEY.to_string(), JsonValue::String(tenant_id.into()));
        self
    }
}

/// Set of identities attached to a participant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Identity>,
}

impl IdentitySet {
    pub fn user(identity: Identity) -> Self {
        Self {
            user: Some(identity),
            application: None,
        }
    }
}

/// Invitation target for create, transfer and invite requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationParticipantInfo {
    pub identity: IdentitySet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces_call_id: Option<String>,
}

impl InvitationParticipantInfo {
    pub fn for_user(identity: Identity) -> Self {
        Self {
            identity: IdentitySet::user(identity),
            endpoint_type: None,
            replaces_call_id: None,
        }
    }

    /// Transfer targets are addressed at the user's default endpoint
    pub fn transfer_target(identity: Identity) -> Self {
        Self {
            endpoint_type: Some("default".to_string()),
            ..Self::for_user(identity)
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.user.as_ref().map(|user| user.id.as_str())
    }
}
