pub mod check;
pub mod config;
pub mod events;
pub mod watch;

use std::process::ExitCode;
use std::sync::Arc;

use posture_core::{SecurityState, SecurityStateManager};

use crate::config::PostureConfig;
use crate::terminal::TerminalPort;

/// Exit status for a `Ready` engine
pub const EXIT_READY: u8 = 0;
/// Exit status for a `Degraded` engine
pub const EXIT_DEGRADED: u8 = 1;
/// Exit status for a `Fatal` engine or requested termination
pub const EXIT_BLOCKED: u8 = 2;

/// An engine wired to the configured device profile and the terminal port
pub struct Engine {
    pub manager: Arc<SecurityStateManager>,
    pub port: Arc<TerminalPort>,
}

impl Engine {
    pub fn build(config: &PostureConfig) -> Self {
        let port = Arc::new(TerminalPort::new());
        let manager = SecurityStateManager::with_memory_sink(
            Arc::new(config.device.provider()),
            port.clone(),
            config.engine.clone(),
        );
        Self {
            manager: Arc::new(manager),
            port,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(status_for(&self.manager.state(), self.port.is_terminated()))
    }
}

/// Map an engine outcome to a process exit status
pub fn status_for(state: &SecurityState, terminated: bool) -> u8 {
    if terminated {
        return EXIT_BLOCKED;
    }
    match state {
        SecurityState::Ready { .. } => EXIT_READY,
        SecurityState::Degraded { .. } => EXIT_DEGRADED,
        _ => EXIT_BLOCKED,
    }
}
