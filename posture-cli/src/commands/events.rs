//! Dump the security audit trail

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use posture_core::{EventSeq, SecurityEvent};
use tracing::debug;

use super::Engine;
use crate::config::PostureConfig;

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Print the events as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: EventsArgs, config: &PostureConfig) -> Result<ExitCode> {
    let engine = Engine::build(config);

    if let Err(e) = engine.manager.initialize().await {
        debug!(error = %e, "Initialization failed");
    }
    engine.manager.settle().await;

    let events = engine.manager.sink().events_from(0).await;
    if args.json {
        let events: Vec<&SecurityEvent> = events.iter().map(|(_, event)| event).collect();
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else if events.is_empty() {
        println!("No security events recorded.");
    } else {
        for (seq, event) in &events {
            println!("{}", format_event(*seq, event));
        }
    }

    Ok(engine.exit_code())
}

/// One-line rendering: sequence, time, kind and payload fields
pub fn format_event(seq: EventSeq, event: &SecurityEvent) -> String {
    let mut line = format!(
        "{seq:>4}  {}  {:<22}",
        event.emitted_at.format("%H:%M:%S%.3f"),
        event.kind.as_str()
    );
    for (key, value) in &event.payload {
        let value = match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        };
        line.push_str(&format!(" {key}={value}"));
    }
    line.trim_end().to_string()
}
