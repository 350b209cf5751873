//! Camera frame sources.
//!
//! The real camera stack is platform-provided and external to this crate; it
//! participates through the `FrameSource` trait. What ships here is:
//!
//! - `CameraConfig`: the static selection the pipeline passes through
//!   (facing, resolution, rate, reported rotation).
//! - `SyntheticCamera`: an in-process source for `stub://` devices, used by
//!   the binaries and tests.
//! - `spawn_producer`: the delivery thread that feeds a `FrameQueue` at the
//!   source's own cadence.
//!
//! Sources hand each frame off exactly once and never retain it; per-frame
//! capture resources travel with the frame's release handle.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::frame::{FramePlanes, Plane, RawFrame, ReleaseHandle};
use crate::queue::FrameQueue;

/// Which physical camera to select. Passed through to the platform stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device selector (e.g., "stub://front_camera").
    pub device: String,
    pub facing: CameraFacing,
    /// Target frame rate (frames per second).
    pub target_fps: u32,
    /// Capture width in pixels.
    pub width: u32,
    /// Capture height in pixels.
    pub height: u32,
    /// Rotation the device reports for upright display, in degrees.
    pub rotation_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://camera".to_string(),
            facing: CameraFacing::Back,
            target_fps: 10,
            width: 224,
            height: 224,
            rotation_degrees: 0.0,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub device: String,
}

/// A producer of raw frames. Implemented by the platform camera stack, and
/// in-tree by `SyntheticCamera`.
pub trait FrameSource: Send {
    /// Connect to the device.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame. The source gives up ownership; the pipeline
    /// releases the frame at the end of its analyze cycle.
    fn next_frame(&mut self) -> Result<RawFrame>;

    /// Check if the source is healthy.
    fn is_healthy(&self) -> bool {
        true
    }

    /// Get frame statistics.
    fn stats(&self) -> SourceStats;
}

/// Open a source for the configured device.
///
/// Only `stub://` synthetic devices are backed in-tree; anything else comes
/// from the platform and is wired up by the embedding application.
pub fn open_source(config: CameraConfig) -> Result<Box<dyn FrameSource>> {
    if config.device.starts_with("stub://") {
        Ok(Box::new(SyntheticCamera::new(config)))
    } else {
        Err(anyhow!(
            "unsupported camera device '{}': only stub:// sources are built in",
            config.device
        ))
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for binaries and tests
// ----------------------------------------------------------------------------

/// Synthetic planar-YUV source.
///
/// Generates a deterministic luma pattern that drifts frame to frame, with
/// neutral chroma, so downstream stages see changing but reproducible input.
pub struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn connect(&mut self) -> Result<()> {
        log::info!(
            "SyntheticCamera: connected to {} ({:?}, {}x{})",
            self.config.device,
            self.config.facing,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RawFrame> {
        self.frame_count += 1;

        // Shift the "scene" occasionally so classifications vary.
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let w = self.config.width as usize;
        let h = self.config.height as usize;
        let chroma_w = w.div_ceil(2);
        let chroma_h = h.div_ceil(2);

        let mut y = vec![0u8; w * h];
        for (i, sample) in y.iter_mut().enumerate() {
            *sample = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }

        let planes = FramePlanes {
            y: Plane::packed(y, w),
            u: Plane::packed(vec![128u8; chroma_w * chroma_h], chroma_w),
            v: Plane::packed(vec![128u8; chroma_w * chroma_h], chroma_w),
        };

        Ok(RawFrame::new(
            Some(planes),
            self.config.width,
            self.config.height,
            self.config.rotation_degrees,
            ReleaseHandle::noop(),
        ))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Producer thread
// ----------------------------------------------------------------------------

/// Handle to the producer thread. Joins on the camera's delivery loop; the
/// loop exits once the queue is closed.
pub struct ProducerHandle {
    thread: JoinHandle<()>,
}

impl ProducerHandle {
    pub fn join(self) {
        if self.thread.join().is_err() {
            log::error!("producer thread panicked");
        }
    }
}

/// Spawn the camera delivery thread.
///
/// Captures at the source's own cadence and submits into the queue; overflow
/// handling lives entirely in the queue, so this loop never waits on the
/// analysis worker. Capture errors are logged and retried.
pub fn spawn_producer(
    mut source: Box<dyn FrameSource>,
    queue: Arc<FrameQueue>,
    interval: Duration,
) -> Result<ProducerHandle> {
    let thread = std::thread::Builder::new()
        .name("liveclass-producer".to_string())
        .spawn(move || {
            while !queue.is_closed() {
                match source.next_frame() {
                    Ok(frame) => {
                        queue.submit(frame);
                    }
                    Err(err) => {
                        log::warn!("frame capture failed: {}", err);
                    }
                }
                std::thread::sleep(interval);
            }
            let stats = source.stats();
            log::info!(
                "producer stopped: {} frames captured from {}",
                stats.frames_captured,
                stats.device
            );
        })
        .context("spawn producer thread")?;
    Ok(ProducerHandle { thread })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
