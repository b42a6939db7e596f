//! Fiber coupling maps and PSFs from tabulated radial profiles.

use {
  super::{generate, image_center},
  crate::{
    buffer::{Buffer, BufferStore, ImageId},
    error::{Error, Result},
    geometry::{P2, V2}
  },
  anyhow::ensure,
  std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path
  }
};

/// Coupling of an off-axis annular pupil into a single-mode fiber, as a function of tip/tilt.
///
/// Pupil coordinates are pixel offsets from the image center divided by `pupil_radius`. The
/// fiber mode is the normalized gaussian `exp(-r²)`; the pupil is the annulus
/// `inner < |p - offset| < 1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FiberCoupling {
  pub size: usize,
  /// Phase slope per output pixel of tip/tilt.
  pub tilt_step: f64,
  /// Pupil radius as a fraction of `size`.
  pub pupil_radius: f64,
  pub pupil_offset: V2,
  /// Central obstruction, relative to the pupil radius.
  pub inner: f64
}

impl Default for FiberCoupling {
  fn default() -> Self {
    Self { size: 128, tilt_step: 0.2, pupil_radius: 0.1, pupil_offset: V2::new(1.32, 0.0), inner: 0.3 }
  }
}

impl FiberCoupling {
  pub fn with_size(mut self, size: usize) -> Self {
    self.size = size;
    self
  }

  pub fn validate(&self) -> Result<()> {
    ensure!(self.size > 0, Error::InvalidDimensions(vec![self.size, self.size]));
    ensure!(self.pupil_radius.is_finite() && self.pupil_radius > 0.0,
      Error::InvalidConfig(format!("pupil radius {} must be positive", self.pupil_radius)));
    ensure!(self.inner >= 0.0 && self.inner < 1.0,
      Error::InvalidConfig(format!("obstruction {} must lie in [0, 1)", self.inner)));
    Ok(())
  }
}

/// Each output pixel `(i, j)` applies the tilt `((i, j) - center) · tilt_step` across the pupil and
/// holds `|Σ mode · exp(i · phase)|² / sqrt(pupil pixels)`.
pub fn fiber_coupling_overlap(config: &FiberCoupling) -> Result<Buffer<f32>> {
  config.validate()?;
  let size = config.size;
  let half = 0.5 * size as f64;
  let scale = config.pupil_radius * size as f64;
  let coords = |i: usize| (i as f64 - half) / scale;

  let norm = itertools::iproduct!(0..size, 0..size)
    .map(|(j, i)| (-(coords(i).powi(2) + coords(j).powi(2))).exp().powi(2))
    .sum::<f64>()
    .sqrt();
  // (position, mode) over the annulus
  let pupil = itertools::iproduct!(0..size, 0..size)
    .map(|(j, i)| P2::new(coords(i), coords(j)))
    .filter(|p| {
      let r = (p.to_vector() - config.pupil_offset).length();
      r > config.inner && r < 1.0
    })
    .map(|p| (p, (-p.to_vector().square_length()).exp() / norm))
    .collect::<Vec<_>>();
  ensure!(!pupil.is_empty(), Error::DegenerateGeometry(format!(
    "annular pupil at {:?} covers no pixel of a {size} px grid", config.pupil_offset
  )));
  let count = (pupil.len() as f64).sqrt();

  generate(size, size, |x, y| {
    let tilt = V2::new((x - half) * config.tilt_step, (y - half) * config.tilt_step);
    let (re, im) = pupil.iter()
      .fold((0.0, 0.0), |(re, im), (p, mode)| {
        let (sin, cos) = (p.x * tilt.x + p.y * tilt.y).sin_cos();
        (re + mode * cos, im + mode * sin)
      });
    (re * re + im * im) / count
  })
}

/// Tabulated PSF radial profile, `<distance> <value>` per line with strictly increasing distances.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialProfile {
  samples: Vec<(f64, f64)>
}

impl RadialProfile {
  pub fn new(samples: Vec<(f64, f64)>) -> Result<Self> {
    ensure!(!samples.is_empty(), Error::InvalidConfig("empty radial profile".into()));
    ensure!(samples.windows(2).all(|w| w[0].0 < w[1].0),
      Error::InvalidConfig("profile distances must be strictly increasing".into()));
    Ok(Self { samples })
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let file = File::open(path)
      .map_err(|source| Error::Io { path: path.into(), source })?;
    Self::parse(file, path)
  }

  /// `path` only labels errors.
  pub fn parse(reader: impl Read, path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let mut samples: Vec<(f64, f64)> = vec![];
    for (n, line) in BufReader::new(reader).lines().enumerate() {
      let line = line.map_err(|source| Error::Io { path: path.into(), source })?;
      if line.trim().is_empty() {
        continue;
      }
      let mut fields = line.split_whitespace().map(str::parse::<f64>);
      let sample = match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(d)), Some(Ok(v)), None) if d.is_finite() && v.is_finite() => (d, v),
        _ => return Err(Error::malformed(path, n + 1, format!(
          "expected `<distance> <value>`, found `{}`", line.trim()
        )).into())
      };
      if let Some(&(last, _)) = samples.last() {
        ensure!(sample.0 > last, Error::malformed(path, n + 1, format!(
          "distance {} does not increase past {last}", sample.0
        )));
      }
      samples.push(sample);
    }
    ensure!(!samples.is_empty(), Error::malformed(path, 1, "empty radial profile"));
    Ok(Self { samples })
  }

  /// Linear interpolation between the bracketing samples. Below the first sample the first value
  /// is held, beyond the last the last segment is extrapolated.
  pub fn value_at(&self, distance: f64) -> f64 {
    let s = &self.samples;
    let i = s.iter()
      .position(|&(d, _)| d >= distance)
      .unwrap_or(s.len() - 1);
    if i == 0 {
      return s[0].1;
    }
    let ((d0, v0), (d1, v1)) = (s[i - 1], s[i]);
    v0 + (v1 - v0) * (distance - d0) / (d1 - d0)
  }

  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }
}

/// Circularly symmetric PSF around the image center.
pub fn psf_from_profile(profile: &RadialProfile, xsize: usize, ysize: usize) -> Result<Buffer<f32>> {
  let c = image_center(xsize, ysize);
  generate(xsize, ysize, |x, y| profile.value_at((P2::new(x, y) - c).length()))
}

/// PSF from the profile file at `path`, published under `name`.
pub fn create_psf_from_profile(
  store: &mut BufferStore,
  name: &str,
  path: impl AsRef<Path>,
  xsize: usize,
  ysize: usize
) -> Result<ImageId> {
  let profile = RadialProfile::load(path)?;
  log::info!("psf `{name}`: {} profile samples", profile.len());
  Ok(store.insert(name, psf_from_profile(&profile, xsize, ysize)?))
}
