//! Call Orchestrator
//!
//! Decides which calls to create, when follow-up actions (transfer, invite)
//! run against them, and how remote failures are reported. The orchestrator
//! only holds call ids; the call resources themselves live on the platform.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use brivas_graph_sdk::{
    Call, CallControlClient, CallState, GraphError, JoinUrlParser, OnlineMeeting,
    OnlineMeetingRequest,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::call_state::{CallStateTracker, Readiness};
use crate::config::{CallingBotConfig, ReadinessPolicy};
use crate::directory::{Directory, Role};
use crate::error::{OrchestratorError, Result};
use crate::scheduler::{
    ActionKind, BackgroundTask, DelayedActionScheduler, Execution, ScheduledAction,
    SchedulerStats,
};

const ONLINE_MEETING_SUBJECT: &str = "Calling bot meeting";
const ONLINE_MEETING_MINUTES: i64 = 30;

/// Outcome of a test call, as returned to the trigger endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub success: bool,
    pub call_id: Option<String>,
    pub error: Option<String>,
}

impl CallResult {
    pub fn succeeded(call_id: impl Into<String>) -> Self {
        Self {
            success: true,
            call_id: Some(call_id.into()),
            error: None,
        }
    }

    pub fn failed(error: &OrchestratorError) -> Self {
        Self {
            success: false,
            call_id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Values the orchestrator reads from configuration
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub callback_uri: String,
    pub tenant_id: String,
    pub organizer_user_id: String,
    pub transfer_delay: Duration,
    pub invite_delay: Duration,
    pub readiness: ReadinessPolicy,
    pub remote_timeout: Duration,
}

impl From<&CallingBotConfig> for OrchestratorSettings {
    fn from(config: &CallingBotConfig) -> Self {
        Self {
            callback_uri: config.callback_uri(),
            tenant_id: config.tenant_id.clone(),
            organizer_user_id: config.organizer_user_id.clone(),
            transfer_delay: config.transfer_delay,
            invite_delay: config.invite_delay,
            readiness: config.readiness,
            remote_timeout: config.remote_timeout,
        }
    }
}

/// Call orchestrator
#[derive(Clone)]
pub struct CallOrchestrator {
    client: Arc<dyn CallControlClient>,
    join_parser: Arc<dyn JoinUrlParser>,
    directory: Arc<Directory>,
    scheduler: DelayedActionScheduler,
    call_states: Arc<CallStateTracker>,
    settings: Arc<OrchestratorSettings>,
}

impl CallOrchestrator {
    pub fn new(
        client: Arc<dyn CallControlClient>,
        join_parser: Arc<dyn JoinUrlParser>,
        directory: Arc<Directory>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            client,
            join_parser,
            directory,
            scheduler: DelayedActionScheduler::new(),
            call_states: Arc::new(CallStateTracker::new()),
            settings: Arc::new(settings),
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn pending_actions(&self) -> Vec<ScheduledAction> {
        self.scheduler.pending()
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    pub fn tracked_calls(&self) -> usize {
        self.call_states.tracked()
    }

    /// Run a remote operation under the configured timeout
    async fn remote<T>(
        &self,
        operation: &'static str,
        request: impl Future<Output = brivas_graph_sdk::Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.settings.remote_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(OrchestratorError::Platform(err)),
            Err(_) => Err(OrchestratorError::Timeout(operation)),
        }
    }

    /// Place an audio call to the primary target
    pub async fn create_outbound_call(&self) -> Result<Call> {
        let target = self.directory.target(Role::PrimaryTarget)?;
        let call = Call::outbound(&self.settings.callback_uri, &self.settings.tenant_id, target);

        let created = self
            .remote("create call", self.client.create_call(&call))
            .await?;

        info!(call_id = ?created.id, "Outbound call created");
        Ok(created)
    }

    /// Place a test call and schedule its transfer
    ///
    /// Returns as soon as the call is created; the transfer runs on its own.
    pub async fn start_test_call(&self) -> (CallResult, Option<BackgroundTask>) {
        let call = match self.create_outbound_call().await {
            Ok(call) => call,
            Err(err) => {
                warn!(error = %err, "Test call failed");
                return (CallResult::failed(&err), None);
            }
        };

        let Some(call_id) = call.id().map(str::to_string) else {
            let err = OrchestratorError::Platform(GraphError::Parse(
                "created call has no id".to_string(),
            ));
            warn!(error = %err, "Test call failed");
            return (CallResult::failed(&err), None);
        };

        let transfer = self.transfer_call(&call_id);
        (CallResult::succeeded(call_id), Some(transfer))
    }

    pub async fn run_test_call(&self) -> CallResult {
        let (result, _transfer) = self.start_test_call().await;
        result
    }

    /// Join a scheduled meeting from its join link
    pub async fn join_scheduled_meeting(&self, join_url: &str) -> Result<Call> {
        let (chat_info, meeting_info) = self.join_parser.parse(join_url).map_err(|err| {
            debug!(error = %err, "Join URL rejected");
            OrchestratorError::InvalidJoinUrl(join_url.to_string())
        })?;

        // Organizer's tenant wins over the configured one
        let tenant_id = meeting_info
            .organizer_tenant_id()
            .unwrap_or(self.settings.tenant_id.as_str())
            .to_string();

        let call = Call::join_meeting(
            &self.settings.callback_uri,
            tenant_id,
            chat_info,
            meeting_info,
        );
        let joined = self
            .remote("join meeting", self.client.create_call(&call))
            .await?;

        info!(
            call_id = ?joined.id,
            tenant_id = ?call.tenant_id,
            thread_id = ?call.chat_info.as_ref().map(|chat| chat.thread_id.as_str()),
            "Joined scheduled meeting"
        );
        Ok(joined)
    }

    /// Schedule a transfer of `call_id` to the transfer target
    pub fn transfer_call(&self, call_id: &str) -> BackgroundTask {
        self.schedule_follow_up(call_id, ActionKind::Transfer)
    }

    /// Schedule an invitation of the invite target into `call_id`
    pub fn invite_participant(&self, call_id: &str) -> BackgroundTask {
        self.schedule_follow_up(call_id, ActionKind::Invite)
    }

    fn schedule_follow_up(&self, call_id: &str, kind: ActionKind) -> BackgroundTask {
        let delay = match self.settings.readiness {
            ReadinessPolicy::FixedDelay => match kind {
                ActionKind::Transfer => self.settings.transfer_delay,
                ActionKind::Invite => self.settings.invite_delay,
            },
            ReadinessPolicy::AwaitEstablished { .. } => Duration::ZERO,
        };

        let action = ScheduledAction::new(call_id, kind, delay);
        let orchestrator = self.clone();
        let call_id = call_id.to_string();

        self.scheduler.schedule(action, move || async move {
            orchestrator.run_follow_up(&call_id, kind).await
        })
    }

    async fn run_follow_up(&self, call_id: &str, kind: ActionKind) -> Result<Execution> {
        if let ReadinessPolicy::AwaitEstablished { timeout } = self.settings.readiness {
            match self.call_states.wait_until_established(call_id, timeout).await {
                Readiness::Established => {}
                Readiness::Terminated => {
                    info!(
                        call_id = %call_id,
                        kind = ?kind,
                        "Call ended before follow-up, skipping"
                    );
                    return Ok(Execution::Skipped);
                }
                Readiness::TimedOut => {
                    warn!(
                        call_id = %call_id,
                        kind = ?kind,
                        timeout_secs = timeout.as_secs(),
                        "No established notification, proceeding"
                    );
                }
            }
        }

        let target = self.directory.target(kind.role())?;
        let request = match kind {
            ActionKind::Transfer => {
                self.remote("transfer call", self.client.transfer_call(call_id, &target))
                    .await
            }
            ActionKind::Invite => {
                self.remote(
                    "invite participant",
                    self.client
                        .invite_participants(call_id, std::slice::from_ref(&target)),
                )
                .await
            }
        };
        request.map_err(|err| err.for_call(call_id))?;

        info!(
            call_id = %call_id,
            kind = ?kind,
            target = ?target.user_id(),
            "Follow-up action completed"
        );
        Ok(Execution::Performed)
    }

    /// Hang up `call`; a call without an id never existed remotely
    pub async fn hang_up(&self, call: &Call) -> Result<()> {
        match call.id() {
            Some(call_id) => self.hang_up_call(call_id).await,
            None => {
                debug!("Hang-up skipped for call without id");
                Ok(())
            }
        }
    }

    /// Delete a call by id; already-gone calls count as hung up
    ///
    /// Pending follow-ups are withdrawn only once the call is known to be gone.
    pub async fn hang_up_call(&self, call_id: &str) -> Result<()> {
        let result = self
            .remote("delete call", self.client.delete_call(call_id))
            .await
            .map_err(|err| err.for_call(call_id));

        match result {
            Ok(()) => {
                info!(call_id = %call_id, "Call hung up");
            }
            Err(OrchestratorError::NotFound(_)) => {
                info!(call_id = %call_id, "Call already gone");
            }
            Err(err) => return Err(err),
        }

        self.scheduler.cancel_for_call(call_id);
        self.call_states.forget(call_id);
        Ok(())
    }

    /// Create (or fetch) a 30 minute online meeting owned by the organizer
    pub async fn create_online_meeting(&self) -> Result<OnlineMeeting> {
        let request = OnlineMeetingRequest::starting_now(
            ONLINE_MEETING_SUBJECT,
            chrono::Duration::minutes(ONLINE_MEETING_MINUTES),
        );

        let meeting = self
            .remote(
                "create online meeting",
                self.client
                    .create_online_meeting(&self.settings.organizer_user_id, &request),
            )
            .await?;

        info!(meeting_id = %meeting.id, "Online meeting ready");
        Ok(meeting)
    }

    /// Apply a state notification from the platform
    pub fn observe_call_state(&self, call_id: &str, state: CallState) {
        self.call_states.observe(call_id, state);

        if state == CallState::Terminated {
            let cancelled = self.scheduler.cancel_for_call(call_id);
            self.call_states.forget(call_id);
            info!(call_id = %call_id, cancelled, "Call terminated");
        }
    }

    /// Abort pending follow-up actions
    pub fn shutdown(&self) -> usize {
        self.scheduler.shutdown()
    }
}
