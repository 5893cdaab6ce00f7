//! Presentation / process-control port

use tokio::sync::oneshot;

use super::notice::{Notice, NoticeAction};

/// Narrow port into the presentation layer and process control
///
/// Implementations render notices and terminate the process. They are
/// called from async code and must not block.
pub trait EnforcementPort: Send + Sync {
    /// Show `notice` and answer through `response` once the user picks one
    /// of its actions. Dropping `response` means the notice closed
    /// unanswered.
    fn present(&self, notice: Notice, response: oneshot::Sender<NoticeAction>);

    /// End the process
    fn terminate(&self);
}
