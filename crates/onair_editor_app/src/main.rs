// SPDX-License-Identifier: MIT OR Apache-2.0
//! `onair_preview` - evaluate a scene at a point in time
//!
//! Usage: `onair_preview <scene.json> [time]`
//!
//! Prints the visual state of every visible object, back to front, as JSON.

use onair_editor_app::session::{evaluate_scene, read_scene};
use onair_editor_sequencer::{format_timecode, Evaluator};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn run(path: PathBuf, time: f64) -> Result<(), Box<dyn std::error::Error>> {
    let scene = read_scene(&path)?;
    tracing::info!(
        "Evaluating '{}' ({} objects) at {}",
        scene.name,
        scene.objects.len(),
        format_timecode(time)
    );
    let frames = evaluate_scene(&Evaluator::default(), &scene, time);
    println!("{}", serde_json::to_string_pretty(&frames)?);
    Ok(())
}

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "onair_editor_app=debug".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("Usage: onair_preview <scene.json> [time]");
        std::process::exit(2);
    };
    let time = match args.next().map(|arg| arg.parse::<f64>()) {
        None => 0.0,
        Some(Ok(time)) => time,
        Some(Err(e)) => {
            eprintln!("Invalid time: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(path, time) {
        tracing::error!("Preview failed: {e}");
        std::process::exit(1);
    }
}
