//! Closed-form images.
//!
//! Every generator allocates a fresh buffer and evaluates its formula at each pixel center.
//! "Image center" means the integer pixel `(xsize / 2, ysize / 2)`.

use {
  crate::{
    buffer::{Buffer, Dims},
    error::{Error, Result},
    geometry::{P2, V2}
  },
  anyhow::ensure,
  rayon::prelude::*,
  std::f64::consts::PI
};

pub mod optics;
pub mod sky;

pub use {
  optics::{create_psf_from_profile, fiber_coupling_overlap, psf_from_profile, FiberCoupling, RadialProfile},
  sky::{
    cluster, cluster_with, elliptical_galaxy, exozodi_disk, galaxy,
    ClusterConfig, EllipticalGalaxy, Galaxy, GalaxyComponent
  }
};

fn generate(xsize: usize, ysize: usize, f: impl Fn(f64, f64) -> f64 + Sync) -> Result<Buffer<f32>> {
  let mut buffer = Buffer::new_2d(xsize, ysize)?;
  buffer.as_mut_slice()
    .par_chunks_mut(xsize)
    .enumerate()
    .for_each(|(y, row)| {
      for (x, v) in row.iter_mut().enumerate() {
        *v = f(x as f64, y as f64) as f32;
      }
    });
  Ok(buffer)
}

fn image_center(xsize: usize, ysize: usize) -> P2 {
  P2::new((xsize / 2) as f64, (ysize / 2) as f64)
}

fn indicator(inside: bool) -> f64 {
  if inside { 1.0 } else { 0.0 }
}

/// `amplitude * exp(-d² / width²)`, `d` measured from the image center.
pub fn gauss(xsize: usize, ysize: usize, width: f64, amplitude: f64) -> Result<Buffer<f32>> {
  let c = image_center(xsize, ysize);
  generate(xsize, ysize, |x, y| {
    let d2 = (P2::new(x, y) - c).square_length();
    amplitude * (-d2 / width / width).exp()
  })
}

/// Elliptical gaussian: the axis at `position_angle` keeps `width`, the perpendicular one is
/// stretched by `sqrt(1 + elongation)`.
pub fn gauss_2axis(
  xsize: usize,
  ysize: usize,
  width: f64,
  amplitude: f64,
  elongation: f64,
  position_angle: f64
) -> Result<Buffer<f32>> {
  let c = image_center(xsize, ysize);
  let (sin, cos) = position_angle.sin_cos();
  generate(xsize, ysize, |x, y| {
    let (dx, dy) = (x - c.x, y - c.y);
    let u = dx * cos + dy * sin;
    let v = dy * cos - dx * sin;
    let d2 = u * u + v * v / (1.0 + elongation);
    amplitude * (-d2 / width / width).exp()
  })
}

/// Plane of slopes `(sx, sy)` through zero at the image center.
pub fn slope_xy(xsize: usize, ysize: usize, slope: V2) -> Result<Buffer<f32>> {
  let c = image_center(xsize, ysize);
  generate(xsize, ysize, |x, y| slope.x * (x - c.x) + slope.y * (y - c.y))
}

/// Distance to `center`.
pub fn distance(xsize: usize, ysize: usize, center: P2) -> Result<Buffer<f32>> {
  generate(xsize, ysize, |x, y| (P2::new(x, y) - center).length())
}

/// Polar angle around `center`, in `(-π, π]`.
pub fn position_angle(xsize: usize, ysize: usize, center: P2) -> Result<Buffer<f32>> {
  generate(xsize, ysize, |x, y| (y - center.y).atan2(x - center.x))
}

pub fn square(xsize: usize, ysize: usize, center: P2, half_side: f64) -> Result<Buffer<f32>> {
  rectangle(xsize, ysize, center, V2::splat(half_side))
}

/// 1 where `|x - cx| < half.x` and `|y - cy| < half.y`.
pub fn rectangle(xsize: usize, ysize: usize, center: P2, half: V2) -> Result<Buffer<f32>> {
  generate(xsize, ysize, |x, y| {
    let (dx, dy) = (x - center.x, y - center.y);
    indicator(dx * dx < half.x * half.x && dy * dy < half.y * half.y)
  })
}

/// Segment from `from` to `to` with the given thickness, end caps excluded.
pub fn line(xsize: usize, ysize: usize, from: P2, to: P2, thickness: f64) -> Result<Buffer<f32>> {
  let axis = to - from;
  let length = axis.length();
  ensure!(length > 0.0, Error::DegenerateGeometry(format!("line from {from:?} to itself")));
  let (sin, cos) = axis.y.atan2(axis.x).sin_cos();
  let half = 0.5 * thickness / length;
  generate(xsize, ysize, |x, y| {
    let (dx, dy) = (x - from.x, y - from.y);
    let along = (dx * cos + dy * sin) / length;
    let across = (dy * cos - dx * sin) / length;
    indicator(along > 0.0 && along < 1.0 && across < half && across > -half)
  })
}

/// Signed distance along direction `angle` from the line through `center` perpendicular to it.
pub fn lin_coordinate(xsize: usize, ysize: usize, center: P2, angle: f64) -> Result<Buffer<f32>> {
  let (sin, cos) = angle.sin_cos();
  generate(xsize, ysize, |x, y| (x - center.x) * cos + (y - center.y) * sin)
}

/// `count` angular sectors around `center`, sector `k` valued `k * step`. Angles are measured from
/// the +y axis towards +x.
pub fn sectors(xsize: usize, ysize: usize, center: P2, step: f64, count: usize) -> Result<Buffer<f32>> {
  generate(xsize, ysize, |x, y| {
    let mut theta = (x - center.x).atan2(y - center.y);
    if theta < 0.0 {
      theta += 2.0 * PI;
    }
    step * (theta / 2.0 / PI * count as f64).trunc()
  })
}

/// 1 where `|y - cy| / height < exp(-(x - cx)² / width²)`.
pub fn jacquinot_pupil(xsize: usize, ysize: usize, center: P2, width: f64, height: f64) -> Result<Buffer<f32>> {
  generate(xsize, ysize, |x, y| {
    let dx = x - center.x;
    indicator((y - center.y).abs() / height < (-dx * dx / width / width).exp())
  })
}

/// 0 inside `radius`, `1 - exp(-((d - radius) / scale)^order)` beyond.
pub fn offset_hypergaussian(size: usize, radius: f64, scale: f64, order: i32) -> Result<Buffer<f32>> {
  let c = image_center(size, size);
  generate(size, size, |x, y| {
    let d = (P2::new(x, y) - c).length();
    if d < radius { 0.0 } else { 1.0 - (-((d - radius) / scale).powi(order)).exp() }
  })
}

/// 1 inside `inner`, 0 beyond `outer`, raised cosine between.
pub fn cosine_apodized_pupil(size: usize, inner: f64, outer: f64) -> Result<Buffer<f32>> {
  let c = image_center(size, size);
  generate(size, size, |x, y| {
    let d = (P2::new(x, y) - c).length();
    if d < inner {
      1.0
    } else if d > outer {
      0.0
    } else {
      0.5 * ((PI * (d - inner) / (outer - inner)).cos() + 1.0)
    }
  })
}

/// Regular grid of points starting at `offset`, each spread bilinearly over four pixels.
pub fn grid_pix_2d(xsize: usize, ysize: usize, pitch: V2, offset: V2) -> Result<Buffer<f32>> {
  ensure!(pitch.x > 0.0 && pitch.y > 0.0, Error::InvalidConfig(format!("grid pitch {pitch:?} must be positive")));
  let mut buffer = Buffer::new_2d(xsize, ysize)?;
  let (xmax, ymax) = (xsize as f64 - 1.0, ysize as f64 - 1.0);
  let mut x = offset.x;
  while x < xmax {
    let mut y = offset.y;
    while y < ymax {
      if x >= 0.0 && y >= 0.0 {
        let (i, j) = (x as usize, y as usize);
        let (u, t) = ((x - i as f64) as f32, (y - j as f64) as f32);
        buffer[(i, j)] = (1.0 - u) * (1.0 - t);
        buffer[(i, j + 1)] = (1.0 - u) * t;
        buffer[(i + 1, j)] = u * (1.0 - t);
        buffer[(i + 1, j + 1)] = u * t;
      }
      y += pitch.y;
    }
    x += pitch.x;
  }
  Ok(buffer)
}

/// `size × size` periodic repetition of plane 0 of `input`.
pub fn tile(input: &Buffer<f32>, size: usize) -> Result<Buffer<f32>> {
  let (xs, ys) = (input.xsize(), input.ysize());
  let plane = input.plane(0).unwrap_or_default();
  generate(size, size, |x, y| plane[(y as usize % ys) * xs + x as usize % xs] as f64)
}

/// Buffer of `dims` holding each sample's coordinate along `axis`.
pub fn coordinate_map(dims: Dims, axis: usize) -> Result<Buffer<f32>> {
  ensure!(axis < dims.naxis(), Error::InvalidConfig(format!(
    "axis {axis} out of a {}-axis image", dims.naxis()
  )));
  let mut buffer = Buffer::new(dims.as_slice())?;
  let coordinates = (0..dims.len())
    .map(|i| {
      let (x, y, z) = (i % dims.x(), (i / dims.x()) % dims.y(), i / dims.plane_len());
      [x, y, z][axis] as f32
    });
  for (v, c) in buffer.as_mut_slice().iter_mut().zip(coordinates) {
    *v = c;
  }
  Ok(buffer)
}

/// Two point sources: `primary` at the image center, `secondary` at `separation` pixels towards
/// `position_angle` (measured from +y towards +x). A companion falling outside the image is dropped.
pub fn double_star(
  xsize: usize,
  ysize: usize,
  primary: f32,
  secondary: f32,
  separation: f64,
  position_angle: f64
) -> Result<Buffer<f32>> {
  let mut buffer = Buffer::new_2d(xsize, ysize)?;
  let c = image_center(xsize, ysize);
  buffer[(xsize / 2, ysize / 2)] = primary;
  let (sin, cos) = position_angle.sin_cos();
  let (x, y) = ((c.x + separation * sin) as i64, (c.y + separation * cos) as i64);
  let slot = usize::try_from(x).ok()
    .zip(usize::try_from(y).ok())
    .and_then(|(x, y)| buffer.get_mut(x, y));
  match slot {
    Some(v) => *v = secondary,
    None => log::warn!("companion at ({x}, {y}) is outside the {xsize}x{ysize} image")
  }
  Ok(buffer)
}
