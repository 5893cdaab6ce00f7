//! Enforcement of policy decisions through the presentation port

pub mod controller;
pub mod mock;
pub mod notice;
pub mod traits;

pub use controller::EnforcementController;
pub use mock::{RecordingPort, Reply};
pub use notice::{Notice, NoticeAction, NoticeLevel};
pub use traits::EnforcementPort;
