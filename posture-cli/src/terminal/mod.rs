//! Terminal presentation for enforcement notices

mod port;

pub use port::{TerminalPort, render_notice};
