//! Non-interactive enforcement port
//!
//! Notices are printed to stderr and answered with their default action.
//! Termination is recorded rather than carried out so the command can map it
//! to an exit code after flushing its output.

use std::sync::atomic::{AtomicBool, Ordering};

use posture_core::{EnforcementPort, Notice, NoticeAction, NoticeLevel};
use tokio::sync::{Notify, oneshot};
use tracing::{debug, warn};

pub struct TerminalPort {
    terminated: AtomicBool,
    termination: Notify,
}

impl TerminalPort {
    pub fn new() -> Self {
        Self {
            terminated: AtomicBool::new(false),
            termination: Notify::new(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Resolves once termination has been requested
    pub async fn terminated(&self) {
        if self.is_terminated() {
            return;
        }
        self.termination.notified().await;
    }
}

impl EnforcementPort for TerminalPort {
    fn present(&self, notice: Notice, response: oneshot::Sender<NoticeAction>) {
        eprintln!("{}", render_notice(&notice));

        match notice.primary_action() {
            Some(action) => {
                debug!(action = ?action, "Answering notice with default action");
                let _ = response.send(action);
            }
            None => debug!("Notice offers no actions"),
        }
    }

    fn terminate(&self) {
        warn!("Enforcement requested process termination");
        self.terminated.store(true, Ordering::SeqCst);
        self.termination.notify_one();
    }
}

/// Render a notice as a block of text
pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.level {
        NoticeLevel::Blocking => "!!",
        NoticeLevel::Warning => "**",
    };

    let mut out = format!("{marker} {} {marker}\n", notice.title);
    for line in &notice.lines {
        out.push_str("   ");
        out.push_str(line);
        out.push('\n');
    }

    let actions: Vec<String> = notice
        .actions
        .iter()
        .map(|a| format!("[{}]", a.label()))
        .collect();
    out.push_str("   ");
    out.push_str(&actions.join(" "));
    if !notice.dismissible {
        out.push_str("  (cannot be dismissed)");
    }
    out
}
