//! Cross-process event backplane interface.
//!
//! Single-process fan-out is the only built-in delivery path. Deployments
//! that run more than one process can plug a backplane in to forward events
//! to sessions connected elsewhere; forwarding is best-effort and failures
//! never reach publishers.

use crate::error::NotifyResult;
use async_trait::async_trait;
use darkroom_core::event::SessionEvent;
use uuid::Uuid;

/// Forwards published events to other processes.
#[async_trait]
pub trait EventBackplane: Send + Sync {
    /// Forward one event addressed to `user_id`.
    async fn forward(&self, user_id: Uuid, event: SessionEvent) -> NotifyResult<()>;

    /// Static identifier of the backplane, for logging.
    fn name(&self) -> &'static str;
}
