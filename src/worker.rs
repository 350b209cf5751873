//! Analysis worker and pipeline lifecycle.
//!
//! One dedicated thread drains the frame queue and drives each analyze
//! cycle: convert to RGB, rotate upright, classify, aggregate, deliver. The
//! single thread serializes every mutation of the working buffer and every
//! classifier call, so none of them need locks; the queue slot is the only
//! cross-thread state.
//!
//! Per-cycle failures (unusable pixel data, misconfigured dimensions, a
//! failing classifier) are contained here: logged, counted, cycle skipped,
//! frame released. Nothing propagates to the producer thread. Only startup
//! resource failures are fatal, surfaced from `Pipeline::spawn`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::aggregate::ResultAggregator;
use crate::classify::ClassifierBackend;
use crate::convert::ColorConverter;
use crate::frame::{FrameBuffer, RawFrame};
use crate::queue::FrameQueue;
use crate::rotate::{RotationCorrector, RotationTransform};
use crate::sink::DisplaySink;

/// How long the worker parks between wake-up checks while Idle.
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Outcome of one analyze cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A display string was delivered to the sink.
    Analyzed,
    Skipped(SkipReason),
}

/// Why a cycle produced no result. Never an error for the producer; each
/// variant is counted and the frame is released as usual.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The frame carried no usable pixel data, or conversion rejected it.
    NoPixelData,
    /// Frame dimensions disagree with the once-fixed working buffer.
    DimensionMismatch,
    /// The classifier backend returned an error.
    InferenceFailure,
}

/// Counters shared between the worker and observers.
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_analyzed: AtomicU64,
    conversion_skips: AtomicU64,
    dimension_mismatches: AtomicU64,
    inference_failures: AtomicU64,
}

/// Point-in-time view of the pipeline counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_analyzed: u64,
    /// Frames discarded by the queue's keep-only-latest policy.
    pub frames_dropped: u64,
    pub conversion_skips: u64,
    pub dimension_mismatches: u64,
    pub inference_failures: u64,
}

impl PipelineStats {
    fn record(&self, outcome: CycleOutcome) {
        let counter = match outcome {
            CycleOutcome::Analyzed => &self.frames_analyzed,
            CycleOutcome::Skipped(SkipReason::NoPixelData) => &self.conversion_skips,
            CycleOutcome::Skipped(SkipReason::DimensionMismatch) => &self.dimension_mismatches,
            CycleOutcome::Skipped(SkipReason::InferenceFailure) => &self.inference_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, frames_dropped: u64) -> StatsSnapshot {
        StatsSnapshot {
            frames_analyzed: self.frames_analyzed.load(Ordering::Relaxed),
            frames_dropped,
            conversion_skips: self.conversion_skips.load(Ordering::Relaxed),
            dimension_mismatches: self.dimension_mismatches.load(Ordering::Relaxed),
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
        }
    }
}

// ----------------------------------------------------------------------------
// AnalysisWorker: one analyze cycle at a time
// ----------------------------------------------------------------------------

/// The single consumer of the frame queue.
///
/// Two states: Idle (no frame pending) and Busy (inside `analyze`). While
/// Busy, newly delivered frames wait in the queue's single slot under its
/// replace-on-overflow policy; there is no re-entrancy.
pub struct AnalysisWorker {
    converter: ColorConverter,
    corrector: RotationCorrector,
    /// Working buffer and rotation transform, both fixed at the first frame.
    buffer: Option<FrameBuffer>,
    transform: Option<RotationTransform>,
    backend: Box<dyn ClassifierBackend>,
    aggregator: ResultAggregator,
    sink: Box<dyn DisplaySink>,
    stats: Arc<PipelineStats>,
}

impl AnalysisWorker {
    pub fn new(
        backend: Box<dyn ClassifierBackend>,
        aggregator: ResultAggregator,
        sink: Box<dyn DisplaySink>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            converter: ColorConverter::new(),
            corrector: RotationCorrector::new(),
            buffer: None,
            transform: None,
            backend,
            aggregator,
            sink,
            stats,
        }
    }

    /// Run one analyze cycle. Consumes the frame; its release handle fires
    /// on every return path.
    pub fn analyze(&mut self, frame: RawFrame) -> CycleOutcome {
        let outcome = self.run_cycle(frame);
        self.stats.record(outcome);
        outcome
    }

    fn run_cycle(&mut self, frame: RawFrame) -> CycleOutcome {
        if frame.planes().is_none() {
            log::debug!("skipping frame with no pixel data");
            return CycleOutcome::Skipped(SkipReason::NoPixelData);
        }

        // First frame fixes the buffer dimensions and the rotation transform
        // for the rest of the session.
        if self.buffer.is_none() {
            match FrameBuffer::new(frame.width, frame.height) {
                Ok(buffer) => self.buffer = Some(buffer),
                Err(err) => {
                    log::error!("cannot size working buffer: {}", err);
                    return CycleOutcome::Skipped(SkipReason::DimensionMismatch);
                }
            }
            self.transform = Some(RotationTransform::from_degrees(frame.rotation_degrees));
        }
        let buffer = self.buffer.as_mut().expect("buffer sized above");
        let transform = self.transform.expect("transform derived above");

        if !buffer.matches(frame.width, frame.height) {
            log::error!(
                "producer misconfiguration: frame is {}x{}, working buffer is {}x{}",
                frame.width,
                frame.height,
                buffer.width(),
                buffer.height()
            );
            return CycleOutcome::Skipped(SkipReason::DimensionMismatch);
        }

        if let Err(err) = self.converter.convert(&frame, buffer) {
            log::warn!("conversion skipped: {}", err);
            return CycleOutcome::Skipped(SkipReason::NoPixelData);
        }

        // Pixel data has been extracted; release the producer's handle
        // before the (potentially slow) inference call.
        drop(frame);

        let image = self.corrector.apply(buffer, &transform);

        let scores = match self.backend.classify(&image) {
            Ok(scores) => scores,
            Err(err) => {
                log::warn!("inference failed ({}): {}", self.backend.name(), err);
                return CycleOutcome::Skipped(SkipReason::InferenceFailure);
            }
        };

        self.sink.display(self.aggregator.aggregate(scores));
        CycleOutcome::Analyzed
    }
}

// ----------------------------------------------------------------------------
// Pipeline: lifecycle handle
// ----------------------------------------------------------------------------

/// Running pipeline: the queue the producer submits into, plus the dedicated
/// worker thread consuming it.
pub struct Pipeline {
    queue: Arc<FrameQueue>,
    stats: Arc<PipelineStats>,
    worker: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Start the worker thread.
    ///
    /// Fatal only for startup resource failures: a backend that cannot warm
    /// up, or a thread that cannot be spawned. Everything after this point
    /// is contained per cycle.
    pub fn spawn(
        mut backend: Box<dyn ClassifierBackend>,
        aggregator: ResultAggregator,
        sink: Box<dyn DisplaySink>,
    ) -> Result<Self> {
        backend
            .warm_up()
            .with_context(|| format!("warm up classifier backend '{}'", backend.name()))?;

        let queue = Arc::new(FrameQueue::new());
        let stats = Arc::new(PipelineStats::default());
        let mut worker = AnalysisWorker::new(backend, aggregator, sink, Arc::clone(&stats));

        let worker_queue = Arc::clone(&queue);
        let thread = std::thread::Builder::new()
            .name("liveclass-worker".to_string())
            .spawn(move || loop {
                match worker_queue.take_latest() {
                    Some(frame) => {
                        worker.analyze(frame);
                    }
                    None => {
                        if !worker_queue.wait_for_frame(IDLE_WAIT) {
                            break;
                        }
                    }
                }
            })
            .context("spawn analysis worker thread")?;

        Ok(Self {
            queue,
            stats,
            worker: Some(thread),
        })
    }

    /// The hand-off queue the producer submits frames into.
    pub fn queue(&self) -> Arc<FrameQueue> {
        Arc::clone(&self.queue)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.queue.dropped())
    }

    /// Tear down: stop intake, release any pending frame, let an in-flight
    /// cycle finish, join the worker thread.
    pub fn shutdown(mut self) -> StatsSnapshot {
        self.stop();
        self.stats.snapshot(self.queue.dropped())
    }

    fn stop(&mut self) {
        self.queue.close();
        if let Some(thread) = self.worker.take() {
            if thread.join().is_err() {
                log::error!("analysis worker thread panicked");
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
