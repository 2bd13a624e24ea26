//! User Directory
//!
//! Read-only set of known users, and the binding of call roles (primary
//! target, transfer target, invitee) to users in that set.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use brivas_graph_sdk::{Identity, InvitationParticipantInfo};
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// Known user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
}

impl User {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.id.clone(), self.display_name.clone())
    }
}

/// Semantic slot a user fills in the call flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    PrimaryTarget,
    TransferTarget,
    InviteTarget,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::PrimaryTarget, Role::TransferTarget, Role::InviteTarget];

    /// Position used when the role is not bound by name
    pub fn default_position(self) -> usize {
        match self {
            Role::PrimaryTarget => 0,
            Role::TransferTarget => 1,
            Role::InviteTarget => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::PrimaryTarget => "primaryTarget",
            Role::TransferTarget => "transferTarget",
            Role::InviteTarget => "inviteTarget",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a role selects its user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleBinding {
    Position(usize),
    UserId(String),
}

/// Immutable user directory
///
/// Role resolution happens on use: a directory too small for a role only
/// fails the operation that needs it.
#[derive(Debug, Clone)]
pub struct Directory {
    users: Arc<[User]>,
    bindings: HashMap<Role, RoleBinding>,
}

impl Directory {
    /// Directory with every role bound by position
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: users.into(),
            bindings: HashMap::new(),
        }
    }

    pub fn with_binding(mut self, role: Role, binding: RoleBinding) -> Self {
        self.bindings.insert(role, binding);
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn binding(&self, role: Role) -> RoleBinding {
        self.bindings
            .get(&role)
            .cloned()
            .unwrap_or(RoleBinding::Position(role.default_position()))
    }

    /// User filling `role`
    pub fn resolve(&self, role: Role) -> Result<&User, OrchestratorError> {
        let user = match self.binding(role) {
            RoleBinding::Position(index) => self.users.get(index),
            RoleBinding::UserId(id) => self.users.iter().find(|user| user.id == id),
        };
        user.ok_or(OrchestratorError::DirectoryExhausted { role })
    }

    /// Invitation target for `role`
    pub fn target(&self, role: Role) -> Result<InvitationParticipantInfo, OrchestratorError> {
        let user = self.resolve(role)?;
        Ok(match role {
            Role::TransferTarget => InvitationParticipantInfo::transfer_target(user.identity()),
            Role::PrimaryTarget | Role::InviteTarget => {
                InvitationParticipantInfo::for_user(user.identity())
            }
        })
    }
}
