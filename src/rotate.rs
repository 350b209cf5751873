//! Rotation correction.
//!
//! The camera reports how many degrees the sensor image must be rotated to be
//! upright. The transform is derived once, from the first frame's metadata,
//! and reused for the rest of the session; a device orientation change
//! mid-stream is not picked up (known gap, kept as-is).
//!
//! Multiples of 90 degrees take an exact index-remap path. Arbitrary angles
//! are supported through an inverse nearest-neighbour mapping into a
//! bounding-box-sized output, with uncovered pixels left black.

use crate::frame::{ConvertedImage, FrameBuffer, BYTES_PER_PIXEL};

/// Cached rotation derived from a frame's rotation-degrees metadata.
#[derive(Clone, Copy, Debug)]
pub struct RotationTransform {
    /// Clockwise rotation in degrees, normalized to [0, 360).
    degrees: f32,
    /// Set when the angle is an exact multiple of 90 (0..=3 quarter turns).
    quarter_turns: Option<u8>,
}

impl RotationTransform {
    pub fn from_degrees(degrees: f32) -> Self {
        let degrees = degrees.rem_euclid(360.0);
        let quarter_turns = if degrees % 90.0 == 0.0 {
            Some((degrees / 90.0) as u8 % 4)
        } else {
            None
        };
        Self {
            degrees,
            quarter_turns,
        }
    }

    pub fn degrees(&self) -> f32 {
        self.degrees
    }

    /// Output dimensions for a source of the given size.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self.quarter_turns {
            Some(0) | Some(2) => (width, height),
            Some(_) => (height, width),
            None => {
                let rad = self.degrees.to_radians();
                let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
                let w = width as f32;
                let h = height as f32;
                (
                    (w * cos + h * sin).round().max(1.0) as u32,
                    (w * sin + h * cos).round().max(1.0) as u32,
                )
            }
        }
    }
}

/// Applies a cached `RotationTransform` to the working buffer, producing an
/// independent upright copy for the classifier.
#[derive(Debug, Default)]
pub struct RotationCorrector;

impl RotationCorrector {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, buffer: &FrameBuffer, transform: &RotationTransform) -> ConvertedImage {
        let (src_w, src_h) = (buffer.width() as usize, buffer.height() as usize);
        let (out_w, out_h) = transform.output_size(buffer.width(), buffer.height());
        let (out_w_us, out_h_us) = (out_w as usize, out_h as usize);
        let src = buffer.pixels();

        match transform.quarter_turns {
            Some(0) => ConvertedImage::new(src.to_vec(), out_w, out_h),
            Some(turns) => {
                let mut dst = vec![0u8; out_w_us * out_h_us * BYTES_PER_PIXEL];
                for y in 0..out_h_us {
                    for x in 0..out_w_us {
                        // Inverse map: which source pixel lands at (x, y).
                        let (i, j) = match turns {
                            1 => (y, src_h - 1 - x),
                            2 => (src_w - 1 - x, src_h - 1 - y),
                            _ => (src_w - 1 - y, x),
                        };
                        copy_pixel(src, src_w, i, j, &mut dst, out_w_us, x, y);
                    }
                }
                ConvertedImage::new(dst, out_w, out_h)
            }
            None => {
                let mut dst = vec![0u8; out_w_us * out_h_us * BYTES_PER_PIXEL];
                let rad = transform.degrees.to_radians();
                let (sin, cos) = (rad.sin(), rad.cos());
                let (src_cx, src_cy) = ((src_w as f32 - 1.0) / 2.0, (src_h as f32 - 1.0) / 2.0);
                let (dst_cx, dst_cy) =
                    ((out_w_us as f32 - 1.0) / 2.0, (out_h_us as f32 - 1.0) / 2.0);

                for y in 0..out_h_us {
                    for x in 0..out_w_us {
                        // Rotate the destination offset back by -degrees.
                        let dx = x as f32 - dst_cx;
                        let dy = y as f32 - dst_cy;
                        let sx = src_cx + dx * cos + dy * sin;
                        let sy = src_cy - dx * sin + dy * cos;

                        let i = sx.round();
                        let j = sy.round();
                        if i < 0.0 || j < 0.0 || i >= src_w as f32 || j >= src_h as f32 {
                            continue; // outside the source: stays black
                        }
                        copy_pixel(src, src_w, i as usize, j as usize, &mut dst, out_w_us, x, y);
                    }
                }
                ConvertedImage::new(dst, out_w, out_h)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn copy_pixel(
    src: &[u8],
    src_w: usize,
    i: usize,
    j: usize,
    dst: &mut [u8],
    dst_w: usize,
    x: usize,
    y: usize,
) {
    let s = (j * src_w + i) * BYTES_PER_PIXEL;
    let d = (y * dst_w + x) * BYTES_PER_PIXEL;
    dst[d..d + BYTES_PER_PIXEL].copy_from_slice(&src[s..s + BYTES_PER_PIXEL]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    /// 2x3 buffer whose pixels encode their (col, row) position.
    fn tagged_buffer() -> Result<FrameBuffer> {
        let mut buffer = FrameBuffer::new(2, 3)?;
        for j in 0..3usize {
            for i in 0..2usize {
                let offset = (j * 2 + i) * BYTES_PER_PIXEL;
                buffer.pixels_mut()[offset] = i as u8;
                buffer.pixels_mut()[offset + 1] = j as u8;
                buffer.pixels_mut()[offset + 2] = 0;
            }
        }
        Ok(buffer)
    }

    fn pixel(image: &ConvertedImage, x: usize, y: usize) -> (u8, u8) {
        let offset = (y * image.width as usize + x) * BYTES_PER_PIXEL;
        (image.pixels()[offset], image.pixels()[offset + 1])
    }

    #[test]
    fn degrees_normalize_into_a_full_turn() {
        assert_eq!(RotationTransform::from_degrees(-90.0).degrees(), 270.0);
        assert_eq!(RotationTransform::from_degrees(450.0).degrees(), 90.0);
        assert_eq!(RotationTransform::from_degrees(0.0).degrees(), 0.0);
    }

    #[test]
    fn zero_rotation_copies_without_aliasing() -> Result<()> {
        let buffer = tagged_buffer()?;
        let transform = RotationTransform::from_degrees(0.0);

        let image = RotationCorrector::new().apply(&buffer, &transform);
        assert_eq!((image.width, image.height), (2, 3));
        assert_eq!(image.pixels(), buffer.pixels());
        assert_ne!(image.pixels().as_ptr(), buffer.pixels().as_ptr());

        Ok(())
    }

    #[test]
    fn quarter_turn_swaps_dimensions_and_remaps() -> Result<()> {
        let buffer = tagged_buffer()?;
        let transform = RotationTransform::from_degrees(90.0);

        let image = RotationCorrector::new().apply(&buffer, &transform);
        assert_eq!((image.width, image.height), (3, 2));

        // Clockwise 90: source top-left ends up top-right.
        assert_eq!(pixel(&image, 2, 0), (0, 0));
        // Source bottom-left ends up top-left.
        assert_eq!(pixel(&image, 0, 0), (0, 2));
        // Source (1, 1) ends up at (1, 1).
        assert_eq!(pixel(&image, 1, 1), (1, 1));

        Ok(())
    }

    #[test]
    fn half_turn_reverses_both_axes() -> Result<()> {
        let buffer = tagged_buffer()?;
        let transform = RotationTransform::from_degrees(180.0);

        let image = RotationCorrector::new().apply(&buffer, &transform);
        assert_eq!((image.width, image.height), (2, 3));
        assert_eq!(pixel(&image, 0, 0), (1, 2));
        assert_eq!(pixel(&image, 1, 2), (0, 0));

        Ok(())
    }

    #[test]
    fn three_quarter_turn_is_inverse_of_quarter_turn() -> Result<()> {
        let buffer = tagged_buffer()?;
        let transform = RotationTransform::from_degrees(270.0);

        let image = RotationCorrector::new().apply(&buffer, &transform);
        assert_eq!((image.width, image.height), (3, 2));
        // Clockwise 270: source top-left ends up bottom-left.
        assert_eq!(pixel(&image, 0, 1), (0, 0));
        assert_eq!(pixel(&image, 2, 0), (1, 2));

        Ok(())
    }

    #[test]
    fn arbitrary_angle_expands_to_bounding_box_and_keeps_center() -> Result<()> {
        let mut buffer = FrameBuffer::new(5, 5)?;
        let center = (2 * 5 + 2) * BYTES_PER_PIXEL;
        buffer.pixels_mut()[center] = 200;
        let transform = RotationTransform::from_degrees(45.0);

        let image = RotationCorrector::new().apply(&buffer, &transform);
        // 5*cos45 + 5*sin45 = 7.07 -> 7
        assert_eq!((image.width, image.height), (7, 7));

        // The center pixel is rotation-invariant.
        let dst_center = (3 * 7 + 3) * BYTES_PER_PIXEL;
        assert_eq!(image.pixels()[dst_center], 200);
        // Corners fall outside the source and stay black.
        assert_eq!(image.pixels()[0], 0);

        Ok(())
    }
}
