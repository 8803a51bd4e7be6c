//! Write a synthetic landmark recording of a single gesture.

use std::path::PathBuf;

use anyhow::bail;
use handctl_hand_model::gesture::GestureSymbol;
use handctl_hand_model::landmark::{FrameStreamHeader, Handedness};
use handctl_hand_model::synthetic::{hold_sequence, posed, swipe_sequence};
use handctl_pipeline::FrameWriter;

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;

/// Swipe speed in frame pixels per second, comfortably above the default
/// threshold.
const SWIPE_SPEED: f64 = 900.0;

pub fn run(
    gesture: String,
    output: PathBuf,
    frames: usize,
    fps: u32,
    hand: String,
) -> anyhow::Result<()> {
    if fps == 0 {
        bail!("--fps must be positive");
    }
    let handedness = match hand.to_ascii_lowercase().as_str() {
        "left" => Handedness::Left,
        "right" => Handedness::Right,
        other => bail!("Unknown hand '{other}', expected left or right"),
    };

    let symbol = GestureSymbol::from_name(&gesture.to_ascii_uppercase());
    let interval_ns = 1_000_000_000 / fps as u64;
    let center = (FRAME_WIDTH as f64 / 2.0, FRAME_HEIGHT as f64 / 2.0);

    let Some(pose) = posed(&symbol, center) else {
        bail!("No synthetic pose for '{gesture}' (custom templates cannot be synthesized)");
    };
    let pose = pose.handedness(handedness);

    let sequence = match symbol {
        GestureSymbol::Swipe(direction) => {
            // Start opposite the travel direction so the hand stays in frame.
            let (ux, uy) = direction.unit();
            let travel = SWIPE_SPEED * interval_ns as f64 * frames as f64 / 1e9;
            let start = (center.0 - ux * travel / 2.0, center.1 - uy * travel / 2.0);
            swipe_sequence(&pose.center(start), direction, SWIPE_SPEED, 0, interval_ns, frames)
        }
        _ => hold_sequence(&pose, 0, interval_ns, frames),
    };

    let mut header = FrameStreamHeader::new(chrono::Utc::now().to_rfc3339(), FRAME_WIDTH, FRAME_HEIGHT);
    header.frame_rate_hz = Some(fps);
    header.source = "synthetic".to_string();

    let mut writer = FrameWriter::create(&output, &header)?;
    for frame in &sequence {
        writer.write_frame(frame)?;
    }
    writer.flush()?;

    println!(
        "Wrote {} frame(s) of {} ({} hand, {} fps) to {}",
        writer.frames_written(),
        symbol,
        handedness,
        fps,
        output.display()
    );

    Ok(())
}
