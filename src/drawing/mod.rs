//! Conversion of buffers to viewable images.

use {
  crate::buffer::Buffer,
  image::{GrayImage, Luma, Rgb, RgbImage},
  rand::{Rng, SeedableRng},
  rand_pcg::Pcg64
};

#[cfg(test)] mod tests;

/// Plane 0 of `buffer`, linearly stretched so its minimum maps to black and its maximum to
/// white. Constant and non-finite samples render black.
pub fn to_luma(buffer: &Buffer<f32>) -> GrayImage {
  let (xsize, ysize) = (buffer.xsize(), buffer.ysize());
  let (min, max) = buffer.as_slice()[..xsize * ysize].iter()
    .filter(|v| v.is_finite())
    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
  let scale = if max > min { 255.0 / (max - min) } else { 0.0 };
  GrayImage::from_fn(xsize as u32, ysize as u32, |x, y| {
    let v = buffer[(x as usize, y as usize)];
    Luma([if v.is_finite() { ((v - min) * scale).round() as u8 } else { 0 }])
  })
}

/// Stable pseudo-random color of a region label.
pub fn label_color(label: i32) -> Rgb<u8> {
  let mut rng = Pcg64::seed_from_u64(label as u64);
  Rgb([rng.gen_range(64..=255), rng.gen_range(64..=255), rng.gen_range(64..=255)])
}

/// Plane 0 of a label map, one color per label, negative labels in black.
pub fn label_map(labels: &Buffer<i32>) -> RgbImage {
  RgbImage::from_fn(labels.xsize() as u32, labels.ysize() as u32, |x, y| {
    match labels[(x as usize, y as usize)] {
      l if l < 0 => Rgb([0, 0, 0]),
      l => label_color(l)
    }
  })
}
