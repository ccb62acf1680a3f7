//! Send execution trait.

use async_trait::async_trait;

use crate::core::error::SendError;
use crate::core::job::Target;
use crate::core::message::Payload;

/// Performs one network transaction for one synthesized message.
///
/// Implementations must not retry internally; each job is attempted exactly
/// once and the outcome is reported as-is.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use owlmail_loadgen::core::{Payload, SendError, SendExecutor, Target};
///
/// #[derive(Clone)]
/// struct Discard;
///
/// #[async_trait]
/// impl SendExecutor for Discard {
///     async fn send(&self, _target: &Target, _payload: &Payload) -> Result<(), SendError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait SendExecutor: Send + Sync + Clone + 'static {
    /// Deliver `payload` to `target` within `target.timeout`.
    ///
    /// # Threading
    ///
    /// Called from a dedicated worker thread with its own single-threaded
    /// tokio runtime, so implementations may use tokio I/O and timers.
    ///
    /// # Errors
    ///
    /// Returns the [`SendError`] describing why the transaction failed.
    async fn send(&self, target: &Target, payload: &Payload) -> Result<(), SendError>;
}
