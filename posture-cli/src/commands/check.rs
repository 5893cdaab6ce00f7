//! One-shot security check

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use posture_core::{FeatureSupport, Notice, SecurityState, SecuritySummary, SelfCheck};
use serde::Serialize;
use tracing::debug;

use super::Engine;
use crate::config::PostureConfig;
use crate::terminal::render_notice;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Everything `check` reports
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub state: SecurityState,
    pub summary: SecuritySummary,
    pub notice: Option<Notice>,
    pub self_check: SelfCheck,
    pub features: FeatureSupport,
    pub terminated: bool,
}

pub async fn run(args: CheckArgs, config: &PostureConfig) -> Result<ExitCode> {
    let engine = Engine::build(config);

    if let Err(e) = engine.manager.initialize().await {
        debug!(error = %e, "Initialization failed");
    }
    engine.manager.settle().await;

    let report = CheckReport {
        state: engine.manager.state(),
        summary: engine.manager.get_summary(),
        notice: engine.manager.notice(),
        self_check: engine.manager.self_check(),
        features: engine.manager.feature_support(),
        terminated: engine.port.is_terminated(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", summary_table(&report));
        if let Some(notice) = &report.notice {
            println!();
            println!("{}", render_notice(notice));
        }
    }

    Ok(engine.exit_code())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn state_color(state: &SecurityState) -> Color {
    match state {
        SecurityState::Ready { .. } => Color::Green,
        SecurityState::Degraded { .. } => Color::Yellow,
        _ => Color::Red,
    }
}

/// Render the report as a two-column table
pub fn summary_table(report: &CheckReport) -> Table {
    let summary = &report.summary;
    let unknown: Vec<&str> = summary
        .unknown_signals()
        .iter()
        .map(|kind| kind.as_str())
        .collect();
    let reasons: Vec<String> = report
        .state
        .degraded_reasons()
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Check").fg(Color::Cyan),
        Cell::new("Result").fg(Color::Cyan),
    ]);

    table.add_row(vec![
        Cell::new("State"),
        Cell::new(report.state.name()).fg(state_color(&report.state)),
    ]);
    table.add_row(vec![
        Cell::new("Security level"),
        Cell::new(summary.security_level.as_str()),
    ]);
    table.add_row(vec![
        Cell::new("Provider available"),
        Cell::new(yes_no(summary.native_provider_available)),
    ]);
    table.add_row(vec![
        Cell::new("Capture protection"),
        Cell::new(yes_no(summary.screenshot_protection_enabled)),
    ]);
    table.add_row(vec![
        Cell::new("Violations"),
        Cell::new(summary.violation_count),
    ]);
    if !unknown.is_empty() {
        table.add_row(vec![Cell::new("Unknown signals"), Cell::new(unknown.join(", "))]);
    }
    if !reasons.is_empty() {
        table.add_row(vec![Cell::new("Degraded by"), Cell::new(reasons.join("\n"))]);
    }
    if let SecurityState::Fatal { reason } = &report.state {
        table.add_row(vec![Cell::new("Fatal"), Cell::new(reason).fg(Color::Red)]);
    }
    if report.terminated {
        table.add_row(vec![
            Cell::new("Enforcement"),
            Cell::new("termination requested").fg(Color::Red),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::{DegradedReason, SecurityLevel};

    fn report(state: SecurityState, terminated: bool) -> CheckReport {
        CheckReport {
            summary: state.summary().cloned().unwrap_or_default(),
            notice: Notice::for_state(&state),
            self_check: SelfCheck {
                initialized: state.is_operational(),
                provider_available: true,
                protection_enabled: false,
                state: state.name().to_string(),
                degraded_reasons: state.degraded_reasons().to_vec(),
                unknown_signals: vec![],
                violation_count: 0,
            },
            features: FeatureSupport {
                screenshot_blocking: false,
                emulator_detection: false,
                root_detection: false,
                developer_options_detection: false,
            },
            state,
            terminated,
        }
    }

    #[test]
    fn test_table_shows_state_and_level() {
        let summary = SecuritySummary {
            security_level: SecurityLevel::High,
            ..Default::default()
        };
        let table = summary_table(&report(SecurityState::Ready { summary }, false)).to_string();

        assert!(table.contains("ready"));
        assert!(table.contains("high"));
        assert!(!table.contains("Degraded by"));
    }

    #[test]
    fn test_table_lists_degraded_reasons_and_termination() {
        let state = SecurityState::Degraded {
            summary: SecuritySummary::default(),
            reasons: vec![DegradedReason::ProtectionUnavailable {
                error: "no window".to_string(),
            }],
        };
        let table = summary_table(&report(state, true)).to_string();

        assert!(table.contains("Degraded by"));
        assert!(table.contains("no window"));
        assert!(table.contains("termination requested"));
    }

    #[test]
    fn test_report_serializes_state_tag() {
        let json = serde_json::to_value(report(
            SecurityState::Fatal {
                reason: "provider unavailable".to_string(),
            },
            false,
        ))
        .unwrap();

        assert_eq!(json["state"]["status"], "fatal");
        assert_eq!(json["notice"]["level"], "blocking");
    }
}
