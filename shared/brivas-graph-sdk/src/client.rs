//! Call-control capability surface

use async_trait::async_trait;

use crate::call::Call;
use crate::error::Result;
use crate::identity::InvitationParticipantInfo;
use crate::meeting::{OnlineMeeting, OnlineMeetingRequest};

/// Remote call-control operations
///
/// Implementations are thin: no retries, no caching, no assumption that a
/// freshly created call accepts follow-up operations immediately.
#[async_trait]
pub trait CallControlClient: Send + Sync {
    /// Create a call; the returned resource carries the platform-assigned id
    async fn create_call(&self, call: &Call) -> Result<Call>;

    async fn transfer_call(&self, call_id: &str, target: &InvitationParticipantInfo) -> Result<()>;

    async fn invite_participants(
        &self,
        call_id: &str,
        participants: &[InvitationParticipantInfo],
    ) -> Result<()>;

    /// Hang up; fails with `GraphError::NotFound` if the call is already gone
    async fn delete_call(&self, call_id: &str) -> Result<()>;

    async fn create_online_meeting(
        &self,
        organizer_user_id: &str,
        request: &OnlineMeetingRequest,
    ) -> Result<OnlineMeeting>;
}
