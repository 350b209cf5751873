//! Planar YUV to packed RGB conversion.
//!
//! The camera delivers YUV 4:2:0 with per-plane row and pixel strides; the
//! classifier wants packed RGB24. `ColorConverter` bridges the two, writing
//! into the worker's reusable `FrameBuffer` so the steady-state path performs
//! no allocation.
//!
//! Coefficients are BT.601 full-range, the same math used for sensor-native
//! NV12 elsewhere in this codebase's lineage.

use anyhow::{anyhow, Result};

use crate::frame::{FrameBuffer, FramePlanes, RawFrame, BYTES_PER_PIXEL};

/// Converts planar YUV 4:2:0 frames into a caller-supplied RGB buffer.
#[derive(Debug, Default)]
pub struct ColorConverter;

impl ColorConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert `frame` into `into`, mutating it in place.
    ///
    /// The caller has already verified that the frame carries pixel data and
    /// that its dimensions match the buffer; a plane that turns out to be
    /// under-sized for the advertised strides is reported as an error and the
    /// buffer contents are unspecified.
    pub fn convert(&self, frame: &RawFrame, into: &mut FrameBuffer) -> Result<()> {
        let planes = frame
            .planes()
            .ok_or_else(|| anyhow!("frame carries no pixel data"))?;
        debug_assert!(into.matches(frame.width, frame.height));

        let w = into.width() as usize;
        let h = into.height() as usize;
        let rgb = into.pixels_mut();

        for j in 0..h {
            for i in 0..w {
                let (y, u, v) = sample_yuv(planes, j, i)
                    .ok_or_else(|| anyhow!("plane under-sized at row {} col {}", j, i))?;

                let y = y as f32;
                let u = u as f32 - 128.0;
                let v = v as f32 - 128.0;

                let r = y + 1.402_f32 * v;
                let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
                let b = y + 1.772_f32 * u;

                let offset = (j * w + i) * BYTES_PER_PIXEL;
                rgb[offset] = clamp_to_u8(r);
                rgb[offset + 1] = clamp_to_u8(g);
                rgb[offset + 2] = clamp_to_u8(b);
            }
        }

        Ok(())
    }
}

fn sample_yuv(planes: &FramePlanes, row: usize, col: usize) -> Option<(u8, u8, u8)> {
    let y = planes.y.sample(row, col)?;
    // Chroma planes are subsampled 2x2.
    let u = planes.u.sample(row / 2, col / 2)?;
    let v = planes.v.sample(row / 2, col / 2)?;
    Some((y, u, v))
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
