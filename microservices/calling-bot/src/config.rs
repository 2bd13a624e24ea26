//! Configuration for the calling bot microservice

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use brivas_graph_sdk::auth::DEFAULT_AUTHORITY_URL;
use brivas_graph_sdk::graph::DEFAULT_GRAPH_BASE_URL;
use brivas_graph_sdk::{ClientCredentials, GraphConfig};

use crate::directory::{Directory, Role, RoleBinding, User};

/// When scheduled actions may touch a freshly created call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessPolicy {
    /// Sleep the action's fixed delay, then act
    FixedDelay,
    /// Wait for an `established` notification (bounded by `timeout`),
    /// then act; skip if the call ends first
    AwaitEstablished { timeout: Duration },
}

/// Calling bot configuration
#[derive(Debug, Clone)]
pub struct CallingBotConfig {
    /// HTTP bind address
    pub http_bind: String,
    /// Default tenant for outbound calls and meeting joins
    pub tenant_id: String,
    /// Public base URL of this bot; notifications arrive at `{bot_base_url}/callback`
    pub bot_base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Organizer of meetings created through `createOrGet`
    pub organizer_user_id: String,
    pub graph_base_url: String,
    pub authority_url: String,
    pub users: Vec<User>,
    /// Roles bound to a user id; unbound roles use their position
    pub role_bindings: Vec<(Role, String)>,
    pub transfer_delay: Duration,
    pub invite_delay: Duration,
    pub readiness: ReadinessPolicy,
    /// Upper bound for every remote call-control operation
    pub remote_timeout: Duration,
}

impl CallingBotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let users_json = std::env::var("CALLING_BOT_USERS").unwrap_or_else(|_| "[]".to_string());
        let users = parse_users(&users_json)?;

        let role_bindings = [
            (Role::PrimaryTarget, "PRIMARY_TARGET_USER"),
            (Role::TransferTarget, "TRANSFER_TARGET_USER"),
            (Role::InviteTarget, "INVITE_TARGET_USER"),
        ]
        .into_iter()
        .filter_map(|(role, key)| {
            std::env::var(key)
                .ok()
                .filter(|id| !id.trim().is_empty())
                .map(|id| (role, id.trim().to_string()))
        })
        .collect();

        let readiness = match std::env::var("READINESS_POLICY")
            .unwrap_or_else(|_| "fixed-delay".to_string())
            .as_str()
        {
            "fixed-delay" => ReadinessPolicy::FixedDelay,
            "await-established" => ReadinessPolicy::AwaitEstablished {
                timeout: Duration::from_secs(env_secs("ESTABLISH_TIMEOUT_SECS", 60)?),
            },
            other => anyhow::bail!("Invalid READINESS_POLICY: {other}"),
        };

        Ok(Self {
            http_bind: std::env::var("HTTP_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            tenant_id: std::env::var("TENANT_ID").unwrap_or_default(),
            bot_base_url: std::env::var("BOT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            client_id: std::env::var("CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("CLIENT_SECRET").unwrap_or_default(),
            organizer_user_id: std::env::var("USER_ID").unwrap_or_default(),
            graph_base_url: std::env::var("GRAPH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPH_BASE_URL.to_string()),
            authority_url: std::env::var("GRAPH_AUTHORITY_URL")
                .unwrap_or_else(|_| DEFAULT_AUTHORITY_URL.to_string()),
            users,
            role_bindings,
            transfer_delay: Duration::from_secs(env_secs("TRANSFER_DELAY_SECS", 15)?),
            invite_delay: Duration::from_secs(env_secs("INVITE_DELAY_SECS", 10)?),
            readiness,
            remote_timeout: Duration::from_secs(env_secs("REMOTE_TIMEOUT_SECS", 30)?),
        })
    }

    /// Get socket address for binding
    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        self.http_bind
            .parse()
            .with_context(|| format!("Invalid HTTP_BIND: {}", self.http_bind))
    }

    pub fn callback_uri(&self) -> String {
        format!("{}/callback", self.bot_base_url.trim_end_matches('/'))
    }

    pub fn directory(&self) -> Directory {
        self.role_bindings.iter().fold(
            Directory::new(self.users.clone()),
            |directory, (role, user_id)| {
                directory.with_binding(*role, RoleBinding::UserId(user_id.clone()))
            },
        )
    }

    pub fn graph_config(&self) -> GraphConfig {
        let mut config = GraphConfig::new(ClientCredentials {
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        });
        config.base_url = self.graph_base_url.clone();
        config.authority_url = self.authority_url.clone();
        config.request_timeout = self.remote_timeout;
        config
    }
}

fn env_secs(key: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key}: {value}")),
        Err(_) => Ok(default),
    }
}

/// Parse the `CALLING_BOT_USERS` JSON array of `{id, displayName}`
pub fn parse_users(json: &str) -> anyhow::Result<Vec<User>> {
    serde_json::from_str(json).context("Invalid CALLING_BOT_USERS")
}
