//! liveclass - live camera classification pipeline
//!
//! This crate implements the frame analysis path of a live classification
//! app: the camera delivers frames on its own thread, a single dedicated
//! worker turns each one into an on-screen label.
//!
//! # Architecture
//!
//! ```text
//! camera thread -> FrameQueue (keep only latest) -> AnalysisWorker
//!     -> ColorConverter -> RotationCorrector -> ClassifierBackend
//!     -> ResultAggregator -> DisplaySink
//! ```
//!
//! Design points the rest of the crate hangs off:
//!
//! - **Backpressure by dropping.** The queue holds one frame; a submission
//!   while the worker is busy replaces and releases the pending frame. The
//!   camera is never stalled by slow inference, and memory stays bounded.
//! - **One worker, no locks.** The working buffer and rotation transform are
//!   touched only by the worker thread; the queue slot is the sole piece of
//!   cross-thread state.
//! - **Buffers allocated once.** The RGB working buffer is sized by the
//!   first frame and reused every cycle; the rotation transform is derived
//!   from the first frame's metadata and cached.
//! - **External boundaries as traits.** Inference (`ClassifierBackend`), the
//!   UI (`DisplaySink`), and the camera (`FrameSource`) are collaborators
//!   behind traits, so the pipeline is model-agnostic and testable with
//!   stubs.
//!
//! # Module Structure
//!
//! - `frame`: pixel containers (RawFrame, FrameBuffer, ConvertedImage)
//! - `queue`: single-slot hand-off with the drop-oldest policy
//! - `convert` / `rotate`: YUV to RGB and upright correction
//! - `classify`: backend trait, results, stub backend
//! - `aggregate`: top-K selection and display formatting
//! - `camera`: frame sources and the producer thread
//! - `worker`: analyze cycle, stats, pipeline lifecycle
//! - `config`: static configuration (file + env)

pub mod aggregate;
pub mod camera;
pub mod classify;
pub mod config;
pub mod convert;
pub mod frame;
pub mod queue;
pub mod rotate;
pub mod sink;
pub mod worker;

pub use aggregate::ResultAggregator;
pub use camera::{
    open_source, spawn_producer, CameraConfig, CameraFacing, FrameSource, ProducerHandle,
    SourceStats, SyntheticCamera,
};
pub use classify::{ClassificationResult, ClassifierBackend, LabelScore, StubClassifier};
pub use config::PipelineConfig;
pub use convert::ColorConverter;
pub use frame::{
    ConvertedImage, FrameBuffer, FramePlanes, Plane, RawFrame, ReleaseHandle, BYTES_PER_PIXEL,
};
pub use queue::{FrameQueue, SubmitOutcome};
pub use rotate::{RotationCorrector, RotationTransform};
pub use sink::{DisplaySink, LogSink};
pub use worker::{
    AnalysisWorker, CycleOutcome, Pipeline, PipelineStats, SkipReason, StatsSnapshot,
};
