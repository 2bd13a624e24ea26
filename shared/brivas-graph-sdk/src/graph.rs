//! Graph REST client
//!
//! `CallControlClient` implementation over the Graph v1.0 communications API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::{ClientCredentials, TokenProvider, DEFAULT_AUTHORITY_URL};
use crate::call::Call;
use crate::client::CallControlClient;
use crate::error::{GraphError, Result};
use crate::identity::InvitationParticipantInfo;
use crate::meeting::{OnlineMeeting, OnlineMeetingRequest};

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Graph client configuration
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub credentials: ClientCredentials,
    pub base_url: String,
    pub authority_url: String,
    pub request_timeout: Duration,
}

impl GraphConfig {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            authority_url: DEFAULT_AUTHORITY_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferRequest<'a> {
    transfer_target: &'a InvitationParticipantInfo,
}

#[derive(Serialize)]
struct InviteRequest<'a> {
    participants: &'a [InvitationParticipantInfo],
}

/// Graph communications client
pub struct GraphClient {
    http: Client,
    base_url: String,
    tokens: TokenProvider,
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let tokens = TokenProvider::new(http.clone(), config.credentials, &config.authority_url);

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn call_url(&self, call_id: &str, suffix: &str) -> String {
        self.url(&format!(
            "/communications/calls/{}{}",
            urlencoding::encode(call_id),
            suffix
        ))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            Err(GraphError::from_status(status, error_text))
        }
    }
}

#[async_trait]
impl CallControlClient for GraphClient {
    async fn create_call(&self, call: &Call) -> Result<Call> {
        debug!(tenant_id = ?call.tenant_id, "Creating call");

        let response = self
            .send(self.http.post(self.url("/communications/calls")).json(call))
            .await?;
        let created: Call = response.json().await?;

        info!(call_id = ?created.id, "Call created");
        Ok(created)
    }

    async fn transfer_call(&self, call_id: &str, target: &InvitationParticipantInfo) -> Result<()> {
        let body = TransferRequest {
            transfer_target: target,
        };
        self.send(self.http.post(self.call_url(call_id, "/transfer")).json(&body))
            .await?;
        Ok(())
    }

    async fn invite_participants(
        &self,
        call_id: &str,
        participants: &[InvitationParticipantInfo],
    ) -> Result<()> {
        let body = InviteRequest { participants };
        self.send(
            self.http
                .post(self.call_url(call_id, "/participants/invite"))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_call(&self, call_id: &str) -> Result<()> {
        self.send(self.http.delete(self.call_url(call_id, "")))
            .await?;
        Ok(())
    }

    async fn create_online_meeting(
        &self,
        organizer_user_id: &str,
        request: &OnlineMeetingRequest,
    ) -> Result<OnlineMeeting> {
        let url = self.url(&format!(
            "/users/{}/onlineMeetings/createOrGet",
            urlencoding::encode(organizer_user_id)
        ));
        let response = self.send(self.http.post(url).json(request)).await?;
        Ok(response.json().await?)
    }
}
