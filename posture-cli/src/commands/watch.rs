//! Periodic rechecks with a live event stream

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use posture_core::{EventSeq, EventSink, RecheckMonitor, SecurityEvent, event_stream};
use tokio::sync::oneshot;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use super::Engine;
use super::events::format_event;
use crate::config::PostureConfig;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Number of rechecks to run after initialization
    #[arg(long, default_value_t = 3)]
    pub cycles: usize,

    /// Seconds between rechecks (defaults to the configured interval)
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WatchArgs, config: &PostureConfig) -> Result<ExitCode> {
    let engine = Engine::build(config);
    let sink = engine.manager.sink();

    // Subscribe before initializing so no event is missed
    let stream = event_stream(sink.as_ref());
    let (done_tx, done_rx) = oneshot::channel();
    let printer = tokio::spawn(print_events(sink, stream, args.json, done_rx));

    let initialized = engine.manager.initialize().await;
    engine.manager.settle().await;

    if let Err(e) = initialized {
        warn!(error = %e, "Initialization failed, not watching");
    } else if engine.port.is_terminated() {
        warn!("Terminated during initialization, not watching");
    } else {
        let interval = args
            .interval_secs
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or_else(|| config.engine.recheck_interval());
        let monitor =
            RecheckMonitor::spawn_bounded(engine.manager.clone(), interval, args.cycles);

        tokio::select! {
            rechecks = monitor.join() => info!(rechecks, "Watch complete"),
            _ = engine.port.terminated() => warn!("Terminated during watch"),
        }
        engine.manager.settle().await;
    }

    let _ = done_tx.send(());
    if let Err(e) = printer.await {
        warn!(error = %e, "Event printer failed");
    }

    Ok(engine.exit_code())
}

/// Print live events until told to stop, then flush anything still unseen
///
/// Events skipped by a lagging subscription are replayed from the sink so
/// the output has no gaps.
async fn print_events(
    sink: Arc<dyn EventSink>,
    stream: impl Stream<Item = (EventSeq, SecurityEvent)>,
    json: bool,
    mut done: oneshot::Receiver<()>,
) {
    let mut stream = std::pin::pin!(stream);
    let mut next: EventSeq = 0;

    loop {
        tokio::select! {
            biased;
            Some((seq, event)) = stream.next() => {
                if seq > next {
                    for (missed, event) in sink.events_from(next).await {
                        if missed >= seq {
                            break;
                        }
                        print_event(missed, &event, json);
                    }
                }
                print_event(seq, &event, json);
                next = seq + 1;
            }
            _ = &mut done => break,
        }
    }

    for (seq, event) in sink.events_from(next).await {
        print_event(seq, &event, json);
    }
}

fn print_event(seq: EventSeq, event: &SecurityEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "Could not serialize event"),
        }
    } else {
        println!("{}", format_event(seq, event));
    }
}
