//! Hexagonal segmented pupil.
//!
//! Segments are flat-topped hexagons laid on a triangular lattice around the buffer center.
//! A candidate is accepted when it lies inside the aperture radius and overlaps the region
//! outside the (anti-aliased) aperture disk by less than [`OVERLAP_TOLERANCE`]. Accepted
//! segments are numbered from 1 in lattice traversal order, which is not a spatial ordering.

use {
  crate::{
    buffer::{Buffer, BufferStore, ImageId},
    error::{Error, Result},
    geometry::{Hexagon, PixelSpace, P2, V2},
    random::RandomSource,
    raster::{render_disk, Footprint}
  },
  anyhow::ensure,
  euclid::{Box2D, Size2D},
  itertools::iproduct
};

pub mod export;
pub mod influence;
#[cfg(test)] mod tests;

pub use {
  export::{MaskLevels, SegmentOutline, VectorExport},
  influence::{create_segment_modes, influence_functions, segments_to_modes, SegmentModes}
};

/// Candidates overlapping the outside of the aperture by this many pixels or more are rejected.
pub const OVERLAP_TOLERANCE: f64 = 0.1;

/// Per-segment piston offset accumulated into the phase buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PistonError {
  /// Uniform in `[-amplitude, amplitude]`, drawn once per lattice candidate inside the aperture.
  Random { amplitude: f64 },
  /// Segment `id` (1-based) gets `amplitude`, every other segment 0.
  Segment { amplitude: f64, id: usize }
}

impl PistonError {
  fn draw<R: RandomSource + ?Sized>(&self, rng: &mut R, next_id: usize) -> f64 {
    match *self {
      PistonError::Random { amplitude } => amplitude * (1.0 - 2.0 * rng.uniform()),
      PistonError::Segment { amplitude, id } => if id == next_id { amplitude } else { 0.0 }
    }
  }
}

#[derive(Debug, Clone)]
pub struct HexPupilConfig {
  /// Side of the square output, in pixels.
  pub size: usize,
  /// Aperture radius.
  pub radius: f64,
  /// Edge-to-edge shrink of each segment, in lattice units.
  pub gap: f64,
  /// Lattice step; segment circumradius is `step - gap`.
  pub step: f64,
  pub influence_functions: bool,
  pub piston: Option<PistonError>,
  pub export: Option<VectorExport>
}

impl HexPupilConfig {
  pub fn new(size: usize, radius: f64, gap: f64, step: f64) -> Self {
    Self {
      size,
      radius,
      gap,
      step,
      influence_functions: true,
      piston: None,
      export: None
    }
  }

  pub fn with_influence_functions(mut self, enabled: bool) -> Self {
    self.influence_functions = enabled;
    self
  }

  pub fn with_piston_error(mut self, piston: PistonError) -> Self {
    self.piston = Some(piston);
    self
  }

  pub fn with_vector_export(mut self, export: VectorExport) -> Self {
    self.export = Some(export);
    self
  }

  pub fn validate(&self) -> Result<()> {
    let invalid = |what: String| Error::InvalidConfig(what);
    ensure!(self.size > 0, invalid("pupil size must be positive".into()));
    ensure!(self.radius.is_finite() && self.radius > 0.0,
      invalid(format!("aperture radius {} must be positive", self.radius)));
    ensure!(self.step.is_finite() && self.step > 0.0,
      invalid(format!("lattice step {} must be positive", self.step)));
    ensure!(self.gap >= 0.0 && self.gap < self.step,
      invalid(format!("gap {} must lie in [0, step = {})", self.gap, self.step)));
    if let Some(PistonError::Segment { id, .. }) = self.piston {
      ensure!(id > 0, invalid("piston segment ids start at 1".into()));
    }
    Ok(())
  }

  /// Inradius of every segment.
  pub fn segment_inradius(&self) -> f64 {
    (self.step - self.gap) * 3f64.sqrt() / 2.0
  }

  fn center(&self) -> P2 {
    let c = 0.5 * self.size as f64;
    P2::new(c, c)
  }

  /// Lattice offsets from the pupil center, inside the aperture, in traversal order.
  pub fn candidates(&self) -> impl Iterator<Item = V2> + '_ {
    let n = (2.0 * self.size as f64 / self.step) as i64;
    let (step, radius) = (self.step, self.radius);
    let row = V2::new(3.0 * step, 3f64.sqrt() * step);
    let shift = V2::new(1.5 * step, 3f64.sqrt() / 2.0 * step);
    iproduct!(-n..n, -n..n)
      .flat_map(move |(x1, y1)| {
        let base = V2::new(row.x * x1 as f64, row.y * y1 as f64);
        [base, base + shift]
      })
      .filter(move |offset| offset.length() < radius)
  }
}

/// One accepted segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
  pub id: usize,
  /// Lattice center in pixels.
  pub center: P2,
  /// Mean coordinate of the pixels carrying `id`.
  pub centroid: P2,
  pub pixel_count: usize,
  /// RMS of `x - centroid.x` and `y - centroid.y` over the segment.
  pub rms: V2,
  /// Clamped bounding box of the hexagon, every pixel of the segment is inside.
  pub bounds: Box2D<usize, PixelSpace>
}

impl Segment {
  /// Pixels of `pupil` carrying this segment's id.
  pub fn pixels<'a>(&self, pupil: &'a Buffer<f32>) -> impl Iterator<Item = (usize, usize)> + 'a {
    let id = self.id as f32;
    iproduct!(self.bounds.y_range(), self.bounds.x_range())
      .filter(move |&(y, x)| pupil.get(x, y).map_or(false, |&v| (v - id).abs() < 0.01))
      .map(|(y, x)| (x, y))
  }

  fn measure(id: usize, center: P2, bounds: Box2D<usize, PixelSpace>, pupil: &Buffer<f32>) -> Result<Self> {
    let mut segment = Self { id, center, centroid: center, pixel_count: 0, rms: V2::zero(), bounds };
    let (count, sum) = segment.pixels(pupil)
      .fold((0usize, V2::zero()), |(n, s), (x, y)| (n + 1, s + V2::new(x as f64, y as f64)));
    ensure!(count > 0, Error::DegenerateGeometry(format!(
      "segment {id} at {center:?} covers no pixel"
    )));
    segment.pixel_count = count;
    segment.centroid = (sum / count as f64).to_point();
    let spread = segment.pixels(pupil)
      .map(|(x, y)| P2::new(x as f64, y as f64) - segment.centroid)
      .fold(V2::zero(), |acc, v| acc + v.component_mul(v));
    segment.rms = V2::new((spread.x / count as f64).sqrt(), (spread.y / count as f64).sqrt());
    Ok(segment)
  }
}

#[derive(Debug, Clone)]
pub struct HexPupil {
  /// Segment ids, 0 outside every segment.
  pub pupil: Buffer<f32>,
  pub segments: Vec<Segment>,
  /// Piston, x-tilt and y-tilt planes per segment, `3 * segments.len()` deep.
  pub influence: Option<Buffer<f32>>,
  /// Piston error of the segment owning each pixel.
  pub phase: Option<Buffer<f32>>,
  pub outlines: Vec<SegmentOutline>
}

impl HexPupil {
  pub fn segment_count(&self) -> usize {
    self.segments.len()
  }
}

/// [`build_hex_pupil_with`] drawing piston errors from the thread-local generator.
pub fn build_hex_pupil(config: &HexPupilConfig) -> Result<HexPupil> {
  build_hex_pupil_with(config, &mut rand::thread_rng())
}

pub fn build_hex_pupil_with<R: RandomSource + ?Sized>(config: &HexPupilConfig, rng: &mut R) -> Result<HexPupil> {
  config.validate()?;
  let size = config.size;
  let center = config.center();

  // 1 outside the aperture
  let mut outside = Buffer::new_2d(size, size)?;
  let half = (size / 2) as f64;
  render_disk(&mut outside, P2::new(half, half), config.radius);
  outside.as_mut_slice().iter_mut().for_each(|v| *v = 1.0 - *v);

  let mut pupil = Buffer::<f32>::new_2d(size, size)?;
  let mut phase = match config.piston {
    Some(_) => Some(Buffer::<f32>::new_2d(size, size)?),
    None => None
  };
  let exporter = config.export.as_ref().and_then(|e| e.prepare());
  let inradius = config.segment_inradius();

  let mut accepted = Vec::new();
  let mut outlines = Vec::new();
  for offset in config.candidates() {
    let next_id = accepted.len() + 1;
    let piston = match config.piston {
      Some(p) => Some(p.draw(&mut *rng, next_id)),
      None => None
    };
    let hex = Hexagon::new(center + offset, inradius);
    let footprint = Footprint::hexagon(&hex, Size2D::new(size, size));
    let overlap = footprint.overlap(&outside);
    log::debug!("candidate {offset:?}: overlap {overlap:.3}");
    if overlap >= OVERLAP_TOLERANCE {
      continue;
    }

    for (x, y, v) in footprint.pixels() {
      if v == 0.0 || pupil[(x, y)] != 0.0 {
        continue;
      }
      pupil[(x, y)] = next_id as f32;
      if let (Some(phase), Some(p)) = (phase.as_mut(), piston) {
        phase[(x, y)] += p as f32;
      }
    }
    if let Some(outline) = exporter.as_ref().and_then(|e| e.outline(next_id, offset, config)) {
      outlines.push(outline);
    }
    accepted.push((hex.center, footprint.bounds));
  }
  log::info!("hex pupil: {} segments, size {size}, radius {}", accepted.len(), config.radius);

  let segments = accepted.into_iter()
    .enumerate()
    .map(|(i, (c, bounds))| Segment::measure(i + 1, c, bounds, &pupil))
    .collect::<Result<Vec<_>>>()?;

  let influence = if !config.influence_functions {
    None
  } else if segments.is_empty() {
    log::warn!("hex pupil has no segment, influence functions skipped");
    None
  } else {
    Some(influence_functions(&pupil, &segments)?)
  };

  Ok(HexPupil { pupil, segments, influence, phase, outlines })
}

/// Store handles of a published pupil.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HexPupilIds {
  pub pupil: ImageId,
  /// `{name}_if`
  pub influence: Option<ImageId>,
  /// `{name}_pha`
  pub phase: Option<ImageId>,
  pub segment_count: usize
}

pub fn create_hex_pupil(store: &mut BufferStore, name: &str, config: &HexPupilConfig) -> Result<HexPupilIds> {
  let HexPupil { pupil, segments, influence, phase, .. } = build_hex_pupil(config)?;
  Ok(HexPupilIds {
    pupil: store.insert(name, pupil),
    influence: influence.map(|b| store.insert(&format!("{name}_if"), b)),
    phase: phase.map(|b| store.insert(&format!("{name}_pha"), b)),
    segment_count: segments.len()
  })
}
