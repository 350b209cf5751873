//! Frame data model.
//!
//! This module owns the pipeline's three pixel containers:
//!
//! - `RawFrame`: producer-owned planar YUV frame. Carries a release handle
//!   that fires exactly once when the pipeline is done with the frame.
//! - `FrameBuffer`: reusable packed-RGB working buffer, allocated once by the
//!   worker and mutated in place every cycle.
//! - `ConvertedImage`: fully-owned upright snapshot handed to the classifier.
//!
//! The producer keeps ownership of its capture resources until the pipeline
//! releases the frame. Release is tied to `Drop`, so every exit path of an
//! analyze cycle (success, skip, teardown) releases exactly once.

use anyhow::{anyhow, Result};

/// Bytes per pixel of the packed output format (RGB24).
pub const BYTES_PER_PIXEL: usize = 3;

// ----------------------------------------------------------------------------
// RawFrame: producer-owned planar frame
// ----------------------------------------------------------------------------

/// One plane of a planar-YUV frame.
#[derive(Clone, Debug)]
pub struct Plane {
    /// Raw sample bytes, laid out row by row with `row_stride`.
    pub data: Vec<u8>,
    /// Distance in bytes between the starts of consecutive rows.
    pub row_stride: usize,
    /// Distance in bytes between consecutive samples within a row.
    pub pixel_stride: usize,
}

impl Plane {
    pub fn packed(data: Vec<u8>, row_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride: 1,
        }
    }

    /// Sample at (row, col), or None when the plane is under-sized.
    pub(crate) fn sample(&self, row: usize, col: usize) -> Option<u8> {
        self.data
            .get(row * self.row_stride + col * self.pixel_stride)
            .copied()
    }
}

/// The three planes of a YUV 4:2:0 frame. Chroma planes are subsampled 2x2.
#[derive(Clone, Debug)]
pub struct FramePlanes {
    pub y: Plane,
    pub u: Plane,
    pub v: Plane,
}

/// Callback invoked when the pipeline is done with a frame.
///
/// The producer attaches one per frame; this is how capture resources (buffer
/// pool slots, hardware queues) are returned. Fires at most once.
pub struct ReleaseHandle(Option<Box<dyn FnOnce() + Send>>);

impl ReleaseHandle {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(release)))
    }

    /// Handle that does nothing on release. For sources that own no
    /// per-frame resources (synthetic cameras, tests).
    pub fn noop() -> Self {
        Self(None)
    }

    fn fire(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

impl std::fmt::Debug for ReleaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReleaseHandle")
            .field(&self.0.is_some())
            .finish()
    }
}

/// Producer-owned frame handed to the pipeline.
///
/// Pixel data is valid until release; the pipeline extracts what it needs
/// within one analyze cycle and never retains the handle. A frame whose
/// capture handle was already closed carries no planes and is skipped.
pub struct RawFrame {
    planes: Option<FramePlanes>,
    pub width: u32,
    pub height: u32,
    /// Device-reported rotation needed to make the image upright, in degrees.
    pub rotation_degrees: f32,
    release: ReleaseHandle,
}

impl RawFrame {
    pub fn new(
        planes: Option<FramePlanes>,
        width: u32,
        height: u32,
        rotation_degrees: f32,
        release: ReleaseHandle,
    ) -> Self {
        Self {
            planes,
            width,
            height,
            rotation_degrees,
            release,
        }
    }

    /// Planar pixel data, or None when the capture handle was closed before
    /// the pipeline saw the frame.
    pub fn planes(&self) -> Option<&FramePlanes> {
        self.planes.as_ref()
    }
}

impl Drop for RawFrame {
    fn drop(&mut self) {
        self.release.fire();
    }
}

// ----------------------------------------------------------------------------
// FrameBuffer: reusable packed-RGB working buffer
// ----------------------------------------------------------------------------

/// Reusable packed-RGB buffer owned by the analysis worker.
///
/// Allocated once from the first frame's dimensions and mutated in place each
/// cycle; there is no per-frame allocation on the steady-state path and no
/// dynamic resize. Frames of a different size are a producer misconfiguration
/// and skip the cycle.
pub struct FrameBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| anyhow!("frame buffer dimensions overflow: {}x{}", width, height))?;
        if len == 0 {
            return Err(anyhow!("frame buffer dimensions must be non-zero"));
        }
        Ok(Self {
            data: vec![0u8; len],
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when a frame of the given size can be converted into this buffer.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

// ----------------------------------------------------------------------------
// ConvertedImage: owned snapshot for the classifier
// ----------------------------------------------------------------------------

/// Immutable upright RGB snapshot handed to the classifier.
///
/// Owns its storage; it must not alias `FrameBuffer`, which is mutated again
/// before the classifier is guaranteed to have finished with the previous
/// image.
#[derive(Clone, Debug)]
pub struct ConvertedImage {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ConvertedImage {
    pub(crate) fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * BYTES_PER_PIXEL
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counted_frame(releases: &Arc<AtomicUsize>) -> RawFrame {
        let releases = Arc::clone(releases);
        RawFrame::new(
            None,
            4,
            4,
            0.0,
            ReleaseHandle::new(move || {
                releases.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn frame_release_fires_exactly_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let frame = counted_frame(&releases);
        assert_eq!(releases.load(Ordering::SeqCst), 0);

        drop(frame);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closed_frame_has_no_planes() {
        let frame = RawFrame::new(None, 640, 480, 90.0, ReleaseHandle::noop());
        assert!(frame.planes().is_none());
        assert_eq!(frame.width, 640);
        assert_eq!(frame.rotation_degrees, 90.0);
    }

    #[test]
    fn frame_buffer_allocation_is_idempotent() -> Result<()> {
        let a = FrameBuffer::new(8, 6)?;
        let b = FrameBuffer::new(8, 6)?;

        assert_eq!(a.pixels().len(), b.pixels().len());
        assert_eq!(a.pixels().len(), 8 * 6 * BYTES_PER_PIXEL);
        assert!(a.matches(8, 6));
        assert!(!a.matches(6, 8));

        Ok(())
    }

    #[test]
    fn frame_buffer_rejects_zero_dimensions() {
        assert!(FrameBuffer::new(0, 480).is_err());
        assert!(FrameBuffer::new(640, 0).is_err());
    }

    #[test]
    fn plane_sample_honours_strides() {
        let plane = Plane {
            data: vec![0, 1, 2, 3, 10, 11, 12, 13],
            row_stride: 4,
            pixel_stride: 2,
        };
        assert_eq!(plane.sample(0, 0), Some(0));
        assert_eq!(plane.sample(0, 1), Some(2));
        assert_eq!(plane.sample(1, 1), Some(12));
        assert_eq!(plane.sample(2, 0), None);
    }
}
