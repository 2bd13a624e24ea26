//! Recording call-control client for tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brivas_graph_sdk::{
    Call, CallControlClient, GraphError, InvitationParticipantInfo, OnlineMeeting,
    OnlineMeetingRequest, TeamsJoinUrlParser,
};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::ReadinessPolicy;
use crate::directory::{Directory, User};
use crate::orchestrator::{CallOrchestrator, OrchestratorSettings};

/// How the mock answers an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    Status(u16),
    Hang,
    Panic,
}

#[derive(Debug, Clone)]
pub enum Recorded {
    CreateCall(Call),
    Transfer {
        call_id: String,
        target: InvitationParticipantInfo,
    },
    Invite {
        call_id: String,
        participants: Vec<InvitationParticipantInfo>,
    },
    Delete(String),
    CreateOnlineMeeting {
        organizer_user_id: String,
        request: OnlineMeetingRequest,
    },
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub at: Instant,
    pub op: Recorded,
}

struct Faults {
    create: Fault,
    transfer: Fault,
    invite: Fault,
    delete: Fault,
}

pub struct MockCallControl {
    next_call_id: Mutex<Option<String>>,
    invocations: Mutex<Vec<Invocation>>,
    faults: Mutex<Faults>,
}

impl MockCallControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_call_id: Mutex::new(Some("c1".to_string())),
            invocations: Mutex::new(Vec::new()),
            faults: Mutex::new(Faults {
                create: Fault::None,
                transfer: Fault::None,
                invite: Fault::None,
                delete: Fault::None,
            }),
        })
    }

    /// Id assigned to created calls; `None` returns calls without an id
    pub fn assign_call_id(&self, id: Option<&str>) {
        *self.next_call_id.lock() = id.map(str::to_string);
    }

    pub fn fail_create(&self, fault: Fault) {
        self.faults.lock().create = fault;
    }

    pub fn fail_transfer(&self, fault: Fault) {
        self.faults.lock().transfer = fault;
    }

    pub fn fail_invite(&self, fault: Fault) {
        self.faults.lock().invite = fault;
    }

    pub fn fail_delete(&self, fault: Fault) {
        self.faults.lock().delete = fault;
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    pub fn created_calls(&self) -> Vec<Call> {
        self.invocations()
            .into_iter()
            .filter_map(|invocation| match invocation.op {
                Recorded::CreateCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn transfers(&self) -> Vec<(Instant, String, InvitationParticipantInfo)> {
        self.invocations()
            .into_iter()
            .filter_map(|invocation| match invocation.op {
                Recorded::Transfer { call_id, target } => Some((invocation.at, call_id, target)),
                _ => None,
            })
            .collect()
    }

    pub fn invites(&self) -> Vec<(Instant, String, Vec<InvitationParticipantInfo>)> {
        self.invocations()
            .into_iter()
            .filter_map(|invocation| match invocation.op {
                Recorded::Invite {
                    call_id,
                    participants,
                } => Some((invocation.at, call_id, participants)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter_map(|invocation| match invocation.op {
                Recorded::Delete(call_id) => Some(call_id),
                _ => None,
            })
            .collect()
    }

    pub fn online_meeting_requests(&self) -> Vec<(String, OnlineMeetingRequest)> {
        self.invocations()
            .into_iter()
            .filter_map(|invocation| match invocation.op {
                Recorded::CreateOnlineMeeting {
                    organizer_user_id,
                    request,
                } => Some((organizer_user_id, request)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: Recorded) {
        self.invocations.lock().push(Invocation {
            at: Instant::now(),
            op,
        });
    }

    async fn apply(fault: Fault, resource: &str) -> brivas_graph_sdk::Result<()> {
        match fault {
            Fault::None => Ok(()),
            Fault::Status(status) => Err(GraphError::from_status(
                status,
                format!("{resource} failed with {status}"),
            )),
            Fault::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Ok(())
            }
            Fault::Panic => panic!("mock {resource} exploded"),
        }
    }
}

#[async_trait]
impl CallControlClient for MockCallControl {
    async fn create_call(&self, call: &Call) -> brivas_graph_sdk::Result<Call> {
        self.record(Recorded::CreateCall(call.clone()));
        let fault = self.faults.lock().create;
        Self::apply(fault, "create call").await?;

        let mut created = call.clone();
        created.id = self.next_call_id.lock().clone();
        Ok(created)
    }

    async fn transfer_call(
        &self,
        call_id: &str,
        target: &InvitationParticipantInfo,
    ) -> brivas_graph_sdk::Result<()> {
        self.record(Recorded::Transfer {
            call_id: call_id.to_string(),
            target: target.clone(),
        });
        let fault = self.faults.lock().transfer;
        Self::apply(fault, "transfer").await
    }

    async fn invite_participants(
        &self,
        call_id: &str,
        participants: &[InvitationParticipantInfo],
    ) -> brivas_graph_sdk::Result<()> {
        self.record(Recorded::Invite {
            call_id: call_id.to_string(),
            participants: participants.to_vec(),
        });
        let fault = self.faults.lock().invite;
        Self::apply(fault, "invite").await
    }

    async fn delete_call(&self, call_id: &str) -> brivas_graph_sdk::Result<()> {
        self.record(Recorded::Delete(call_id.to_string()));
        let fault = self.faults.lock().delete;
        Self::apply(fault, "delete").await
    }

    async fn create_online_meeting(
        &self,
        organizer_user_id: &str,
        request: &OnlineMeetingRequest,
    ) -> brivas_graph_sdk::Result<OnlineMeeting> {
        self.record(Recorded::CreateOnlineMeeting {
            organizer_user_id: organizer_user_id.to_string(),
            request: request.clone(),
        });
        Ok(OnlineMeeting {
            id: "m1".to_string(),
            join_web_url: Some("https://teams.microsoft.com/l/meetup-join/m1".to_string()),
            subject: Some(request.subject.clone()),
            start_date_time: Some(request.start_date_time),
            end_date_time: Some(request.end_date_time),
        })
    }
}

pub fn users() -> Vec<User> {
    vec![User::new("u1", "A"), User::new("u2", "B"), User::new("u3", "C")]
}

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        callback_uri: "https://bot.example.com/callback".to_string(),
        tenant_id: "T2".to_string(),
        organizer_user_id: "organizer".to_string(),
        transfer_delay: Duration::from_secs(15),
        invite_delay: Duration::from_secs(10),
        readiness: ReadinessPolicy::FixedDelay,
        remote_timeout: Duration::from_secs(30),
    }
}

pub fn orchestrator_with(
    client: Arc<MockCallControl>,
    directory: Directory,
    settings: OrchestratorSettings,
) -> CallOrchestrator {
    CallOrchestrator::new(
        client,
        Arc::new(TeamsJoinUrlParser),
        Arc::new(directory),
        settings,
    )
}

pub fn orchestrator(client: Arc<MockCallControl>) -> CallOrchestrator {
    orchestrator_with(client, Directory::new(users()), settings())
}
