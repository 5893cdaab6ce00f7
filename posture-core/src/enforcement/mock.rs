//! Recording enforcement port for tests
//!
//! RecordingPort remembers every notice it was asked to show, answers with
//! a scripted reply, and counts termination requests instead of exiting.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::notice::{Notice, NoticeAction};
use super::traits::EnforcementPort;

/// How RecordingPort answers notices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Answer immediately with the notice's first action
    Primary,
    /// Close the notice without answering
    Drop,
    /// Keep the notice open until `respond_pending` is called
    Hold,
}

pub struct RecordingPort {
    reply: Mutex<Reply>,
    notices: Mutex<Vec<Notice>>,
    pending: Mutex<Vec<oneshot::Sender<NoticeAction>>>,
    terminations: AtomicUsize,
}

impl RecordingPort {
    /// Port that answers every notice with its primary action
    pub fn new() -> Self {
        Self::with_reply(Reply::Primary)
    }

    pub fn with_reply(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            notices: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            terminations: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock() = reply;
    }

    /// Every notice presented so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Answer every held notice with `action`, returns how many were open
    pub fn respond_pending(&self, action: NoticeAction) -> usize {
        let pending: Vec<_> = self.pending.lock().drain(..).collect();
        let count = pending.len();
        for sender in pending {
            let _ = sender.send(action);
        }
        count
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

impl Default for RecordingPort {
    fn default() -> Self {
        Self::new()
    }
}

impl EnforcementPort for RecordingPort {
    fn present(&self, notice: Notice, response: oneshot::Sender<NoticeAction>) {
        let primary = notice.primary_action();
        self.notices.lock().push(notice);

        match *self.reply.lock() {
            Reply::Primary => {
                if let Some(action) = primary {
                    let _ = response.send(action);
                }
            }
            Reply::Drop => drop(response),
            Reply::Hold => self.pending.lock().push(response),
        }
    }

    fn terminate(&self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
    }
}
