//! demo - bounded synthetic run of the classification pipeline

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;

use liveclass::{
    CameraConfig, DisplaySink, Pipeline, ResultAggregator, StubClassifier, SyntheticCamera,
    FrameSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds of synthetic capture.
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 10)]
    fps: u32,
    /// Capture width in pixels.
    #[arg(long, default_value_t = 224)]
    width: u32,
    /// Capture height in pixels.
    #[arg(long, default_value_t = 224)]
    height: u32,
    /// Rotation the synthetic camera reports, in degrees.
    #[arg(long, default_value_t = 90.0)]
    rotation: f32,
    /// How many top labels to display.
    #[arg(long, default_value_t = 1)]
    top_k: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }
    let total_frames = args.seconds.saturating_mul(args.fps as u64);

    stage("open synthetic camera");
    let mut source = SyntheticCamera::new(CameraConfig {
        device: "stub://demo".to_string(),
        target_fps: args.fps,
        width: args.width,
        height: args.height,
        rotation_degrees: args.rotation,
        ..CameraConfig::default()
    });
    source.connect()?;

    stage("spawn pipeline");
    let results: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectingSink(Arc::clone(&results));
    let aggregator = ResultAggregator::new(args.top_k, [("smile", "Smiling"), ("no face", "No face")]);
    let pipeline = Pipeline::spawn(
        Box::<StubClassifier>::default(),
        aggregator,
        Box::new(sink),
    )?;
    let queue = pipeline.queue();

    stage("submit synthetic frames");
    let interval = Duration::from_millis(1000 / args.fps as u64);
    for _ in 0..total_frames {
        queue.submit(source.next_frame()?);
        std::thread::sleep(interval);
    }

    // Give the worker a moment to drain the last frame, then tear down.
    std::thread::sleep(interval);
    queue.close();
    let stats = pipeline.shutdown();

    let results = results.lock().unwrap_or_else(|e| e.into_inner());
    println!("demo summary:");
    println!("  frames produced: {}", total_frames);
    println!("  frames analyzed: {}", stats.frames_analyzed);
    println!("  frames dropped (backpressure): {}", stats.frames_dropped);
    println!(
        "  cycles skipped: {}",
        stats.conversion_skips + stats.dimension_mismatches + stats.inference_failures
    );
    if let Some(last) = results.last() {
        println!("  last display string: {:?}", last);
    }

    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}

struct CollectingSink(Arc<Mutex<Vec<String>>>);

impl DisplaySink for CollectingSink {
    fn display(&self, text: String) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text);
    }
}
