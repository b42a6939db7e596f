//! Piston, tip and tilt modes of pupil segments.

use {
  super::Segment,
  crate::{
    buffer::{Buffer, BufferStore, ImageId},
    error::{Error, Result},
    geometry::{P2, V2}
  },
  anyhow::ensure,
  rayon::prelude::*
};

/// Normalized influence functions of a hexagonal pupil.
///
/// Plane `3s` is 1 on segment `s`, planes `3s + 1` and `3s + 2` hold the x and y offsets from the
/// segment centroid divided by their RMS, so that `Σ tilt² = pixel_count`.
pub fn influence_functions(pupil: &Buffer<f32>, segments: &[Segment]) -> Result<Buffer<f32>> {
  for s in segments {
    ensure!(s.pixel_count > 0 && s.rms.x > 0.0 && s.rms.y > 0.0, Error::DegenerateGeometry(format!(
      "segment {} has no tilt extent (rms {:?}, {} pixels)", s.id, s.rms, s.pixel_count
    )));
  }
  let (xsize, ysize) = (pupil.xsize(), pupil.ysize());
  let mut cube = Buffer::new_3d(xsize, ysize, 3 * segments.len())?;
  log::debug!("influence functions: {cube:?}");

  let plane = xsize * ysize;
  cube.as_mut_slice()
    .par_chunks_mut(3 * plane)
    .zip(segments.par_iter())
    .for_each(|(planes, segment)| {
      let (piston, tilts) = planes.split_at_mut(plane);
      let (tip, tilt) = tilts.split_at_mut(plane);
      for (x, y) in segment.pixels(pupil) {
        let i = y * xsize + x;
        let v = (P2::new(x as f64, y as f64) - segment.centroid).component_div(segment.rms);
        piston[i] = 1.0;
        tip[i] = v.x as f32;
        tilt[i] = v.y as f32;
      }
    });
  Ok(cube)
}

#[derive(Debug, Clone)]
pub struct SegmentModes {
  /// `Σ (s + 1) * mask_s`
  pub mask: Buffer<f32>,
  /// Piston, tip and tilt per segment, unnormalized.
  pub modes: Buffer<f32>,
  /// Mask-weighted centroid of every segment.
  pub centroids: Vec<P2>
}

/// Piston, tip and tilt modes of an ordered list of weighted segment masks.
/// Only plane 0 of each mask is read.
pub fn segments_to_modes(masks: &[&Buffer<f32>]) -> Result<SegmentModes> {
  let first = masks.first()
    .ok_or_else(|| Error::DegenerateGeometry("no segment mask".into()))?;
  let (xsize, ysize) = (first.xsize(), first.ysize());
  for m in masks {
    ensure!(m.xsize() == xsize && m.ysize() == ysize, Error::InvalidConfig(format!(
      "segment masks differ in size: {:?} and {:?}", first.dims().as_slice(), m.dims().as_slice()
    )));
  }

  let plane = xsize * ysize;
  let centroids = masks.par_iter()
    .enumerate()
    .map(|(s, m)| {
      let (weight, moment) = m.as_slice()[..plane].iter()
        .enumerate()
        .fold((0.0, V2::zero()), |(w, c), (i, &v)| {
          let v = v as f64;
          (w + v, c + V2::new((i % xsize) as f64, (i / xsize) as f64) * v)
        });
      ensure!(weight != 0.0, Error::DegenerateGeometry(format!("segment mask {s} sums to zero")));
      Ok((moment / weight).to_point())
    })
    .collect::<Result<Vec<_>>>()?;

  let mut mask = Buffer::new_2d(xsize, ysize)?;
  for (s, m) in masks.iter().enumerate() {
    for (acc, &v) in mask.as_mut_slice().iter_mut().zip(&m.as_slice()[..plane]) {
      *acc += (1.0 + s as f32) * v;
    }
  }

  let mut modes = Buffer::new_3d(xsize, ysize, 3 * masks.len())?;
  modes.as_mut_slice()
    .par_chunks_mut(3 * plane)
    .zip(masks.par_iter().zip(centroids.par_iter()))
    .for_each(|(planes, (m, c))| {
      let (piston, tilts) = planes.split_at_mut(plane);
      let (tip, tilt) = tilts.split_at_mut(plane);
      for (i, &v) in m.as_slice()[..plane].iter().enumerate() {
        let (x, y) = ((i % xsize) as f64, (i / xsize) as f64);
        piston[i] = v;
        tip[i] = v * (x - c.x) as f32;
        tilt[i] = v * (y - c.y) as f32;
      }
    });
  log::info!("{} segment masks to modes", masks.len());

  Ok(SegmentModes { mask, modes, centroids })
}

/// Collects `{prefix}{s}`, `s` zero-padded to `digits` digits and counted from 0 until the first
/// missing name, then publishes the modes as `name` and the summed mask as `{name}_mask`.
pub fn create_segment_modes(store: &mut BufferStore, prefix: &str, digits: usize, name: &str) -> Result<ImageId> {
  ensure!((1..=6).contains(&digits), Error::InvalidConfig(format!(
    "segment masks are numbered with 1 to 6 digits, not {digits}"
  )));
  let mut masks = Vec::new();
  while let Some(id) = store.get_buffer(&format!("{prefix}{:0digits$}", masks.len())) {
    masks.push(store.get::<f32>(id)?);
  }
  let SegmentModes { mask, modes, .. } = segments_to_modes(&masks)?;
  store.insert(&format!("{name}_mask"), mask);
  Ok(store.insert(name, modes))
}
