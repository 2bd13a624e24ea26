//! Callback notifications
//!
//! Payloads the platform posts to a call's `callbackUri`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::call::CallState;

/// Batch of notifications delivered to the callback endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommsNotifications {
    #[serde(default, deserialize_with = "crate::call::null_as_default")]
    pub value: Vec<CommsNotification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommsNotification {
    pub change_type: ChangeType,
    pub resource: String,
    #[serde(default)]
    pub resource_data: Option<JsonValue>,
}

/// State change of a single call extracted from a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStateUpdate {
    pub call_id: String,
    pub state: CallState,
}

impl CommsNotification {
    /// Call id addressed by `resource` (`/app/calls/{id}` or `/communications/calls/{id}`)
    ///
    /// Participant and operation sub-resources are not call-level updates.
    pub fn call_id(&self) -> Option<&str> {
        let mut segments = self.resource.trim_matches('/').split('/');
        while let Some(segment) = segments.next() {
            if segment == "calls" {
                let id = segments.next()?;
                return match segments.next() {
                    None if !id.is_empty() => Some(id),
                    _ => None,
                };
            }
        }
        None
    }

    pub fn call_state_update(&self) -> Option<CallStateUpdate> {
        let call_id = self.call_id()?.to_string();
        let state = match self.change_type {
            ChangeType::Deleted => CallState::Terminated,
            ChangeType::Created | ChangeType::Updated => {
                let data = self.resource_data.as_ref()?;
                serde_json::from_value(data.get("state")?.clone()).ok()?
            }
        };
        Some(CallStateUpdate { call_id, state })
    }
}

impl CommsNotifications {
    pub fn call_state_updates(&self) -> Vec<CallStateUpdate> {
        self.value
            .iter()
            .filter_map(CommsNotification::call_state_update)
            .collect()
    }
}
