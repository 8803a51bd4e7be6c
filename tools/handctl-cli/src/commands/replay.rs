//! Run a recorded landmark stream through the pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use handctl_actuator_core::{Actuator, DisplayInfo, LogActuator, QueuedActuator};
use handctl_hand_model::event::{EventKind, PipelineEvent};
use handctl_hand_model::mapping::MappingSnapshot;
use handctl_pipeline::{JsonlReplaySource, Pipeline};
use tokio::sync::broadcast;

use super::{document_paths, load_config};

pub struct ReplayArgs {
    pub frames: PathBuf,
    pub config: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub json_events: bool,
    pub realtime: bool,
    pub queued: bool,
}

#[derive(Default)]
struct Summary {
    confirmed: BTreeMap<String, u64>,
    drags: u64,
    hands_lost: u64,
    lagged: u64,
}

pub async fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    let (mapping_path, templates_path) = document_paths(&config, args.mapping, args.templates);
    let mapping = MappingSnapshot::load(&mapping_path, &templates_path)
        .context("Failed to load gesture mapping")?;

    let source = JsonlReplaySource::open(&args.frames)
        .with_context(|| format!("Failed to open recording {}", args.frames.display()))?;
    if let Some(header) = source.header() {
        tracing::info!(
            width = header.frame_width,
            height = header.frame_height,
            source = %header.source,
            recorded = %header.epoch_wall,
            "Recording header"
        );
        config.cursor.frame_width = header.frame_width;
        config.cursor.frame_height = header.frame_height;
        config.validate().context("Recording header has unusable frame size")?;
    }
    let total = source.remaining();
    let mut source = source.realtime(args.realtime);

    let display = DisplayInfo::new(config.cursor.display_width, config.cursor.display_height);
    let actuator: Box<dyn Actuator> = if args.queued {
        Box::new(QueuedActuator::spawn(LogActuator::new(display))?)
    } else {
        Box::new(LogActuator::new(display))
    };

    println!("Replaying {} frame(s) from {}", total, args.frames.display());
    println!(
        "  Overrides: {}  Templates: {}",
        mapping.mapping.overrides().len(),
        mapping.templates.len()
    );

    let mut pipeline = Pipeline::new(config, mapping, actuator);
    let control = pipeline.control();
    let events = control.subscribe();
    let printer = tokio::spawn(print_events(events, args.json_events));

    let stop_control = control.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping");
            stop_control.stop();
        }
    });

    let processed = pipeline.run(&mut source).await?;
    let failures = pipeline.dispatcher().failures();

    // The printer finishes once every event sender is gone.
    interrupt.abort();
    let _ = interrupt.await;
    drop(control);
    drop(pipeline);
    let summary = printer.await?;

    println!();
    println!("Summary");
    println!("{}", "=".repeat(40));
    println!("  Frames processed: {processed}/{total}");
    println!("  Drags: {}", summary.drags);
    println!("  Hands lost: {}", summary.hands_lost);
    println!("  Actuator failures: {failures}");
    if summary.lagged > 0 {
        println!("  Events dropped by slow output: {}", summary.lagged);
    }
    if summary.confirmed.is_empty() {
        println!("  No actions dispatched");
    } else {
        println!("  Actions dispatched:");
        for (action, count) in &summary.confirmed {
            println!("    {action:<20} {count}");
        }
    }

    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<PipelineEvent>, json: bool) -> Summary {
    let mut summary = Summary::default();
    loop {
        match events.recv().await {
            Ok(event) => {
                tally(&mut summary, &event.kind);
                if json {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => tracing::warn!(error = %e, "Failed to encode event"),
                    }
                } else {
                    print_event(&event);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event output lagging");
                summary.lagged += skipped;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    summary
}

fn tally(summary: &mut Summary, kind: &EventKind) {
    match kind {
        EventKind::GestureConfirmed { action, .. } => {
            *summary.confirmed.entry(action.clone()).or_default() += 1;
        }
        EventKind::DragStarted { .. } => summary.drags += 1,
        EventKind::HandLost { .. } => summary.hands_lost += 1,
        _ => {}
    }
}

fn print_event(event: &PipelineEvent) {
    let t = event.timestamp_secs();
    match &event.kind {
        EventKind::GestureChanged { hand, symbol } => {
            println!("[{t:>8.3}s] {hand} -> {symbol}");
        }
        EventKind::GestureConfirmed {
            hand,
            symbol,
            action,
        } => {
            println!("[{t:>8.3}s] {hand} {symbol} => {action}");
        }
        EventKind::ActionFailed { action, message } => {
            println!("[{t:>8.3}s] FAILED {action}: {message}");
        }
        EventKind::DragStarted { hand } => println!("[{t:>8.3}s] drag started by {hand}"),
        EventKind::DragEnded { forced } => {
            let how = if *forced { " (forced)" } else { "" };
            println!("[{t:>8.3}s] drag ended{how}");
        }
        EventKind::HandLost { hand } => println!("[{t:>8.3}s] {hand} lost"),
        other => println!("[{t:>8.3}s] {other:?}"),
    }
}
