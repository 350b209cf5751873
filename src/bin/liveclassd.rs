//! liveclassd - live classification daemon
//!
//! This daemon:
//! 1. Loads pipeline configuration (file + env)
//! 2. Opens the configured camera source
//! 3. Spawns the analysis worker and the producer thread
//! 4. Logs display results and periodic pipeline health
//! 5. Shuts the pipeline down cleanly on ctrl-c

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use liveclass::{
    open_source, spawn_producer, LogSink, Pipeline, PipelineConfig, ResultAggregator,
    StubClassifier,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = PipelineConfig::load()?;
    log::info!(
        "camera: {} ({:?}, {}x{} @ {} fps, rotation {}°)",
        cfg.camera.device,
        cfg.camera.facing,
        cfg.camera.width,
        cfg.camera.height,
        cfg.camera.target_fps,
        cfg.camera.rotation_degrees
    );
    log::info!("top-k: {}, labels: {}", cfg.top_k, cfg.labels.len());

    let mut source = open_source(cfg.camera.clone())?;
    source.connect()?;

    // The in-tree backend is the deterministic stub; a real model slots in
    // through the same trait.
    let backend = StubClassifier::new(cfg.labels.keys().cloned());
    let aggregator = ResultAggregator::new(cfg.top_k, cfg.labels.clone());
    let pipeline = Pipeline::spawn(Box::new(backend), aggregator, Box::new(LogSink))?;

    let queue = pipeline.queue();
    let interval = Duration::from_millis(1000 / cfg.camera.target_fps.max(1) as u64);
    let producer = spawn_producer(source, pipeline.queue(), interval)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .context("install ctrl-c handler")?;
    }

    log::info!("liveclassd running");
    let mut last_health_log = Instant::now();
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            let stats = pipeline.stats();
            log::info!(
                "pipeline health: analyzed={} dropped={} conversion_skips={} \
                 dimension_mismatches={} inference_failures={}",
                stats.frames_analyzed,
                stats.frames_dropped,
                stats.conversion_skips,
                stats.dimension_mismatches,
                stats.inference_failures
            );
            last_health_log = Instant::now();
        }
    }

    log::info!("shutting down");
    queue.close();
    producer.join();
    let stats = pipeline.shutdown();
    log::info!(
        "final: analyzed={} dropped={} skips={}",
        stats.frames_analyzed,
        stats.frames_dropped,
        stats.conversion_skips + stats.dimension_mismatches + stats.inference_failures
    );

    Ok(())
}
