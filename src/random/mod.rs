//! Random sample sources and random-valued buffers.

use {
  crate::{
    buffer::{Buffer, BufferStore, ImageId},
    error::{Error, Result}
  },
  anyhow::ensure,
  rand::Rng,
  rand_distr::StandardNormal
};

#[cfg(test)] mod tests;

/// Standard-normal draws beyond this many sigmas are rejected by [`RandomSource::truncated_gaussian`].
pub const TRUNCATION: f64 = 3.0;

/// Scalar random draws used by the generators.
pub trait RandomSource {
  /// Uniform in `[0, 1)`.
  fn uniform(&mut self) -> f64;
  /// Standard normal.
  fn gaussian(&mut self) -> f64;
  /// Standard normal restricted to `[-TRUNCATION, TRUNCATION]`.
  fn truncated_gaussian(&mut self) -> f64;
}

impl <R: Rng + ?Sized> RandomSource for R {
  fn uniform(&mut self) -> f64 {
    self.gen()
  }

  fn gaussian(&mut self) -> f64 {
    self.sample(StandardNormal)
  }

  fn truncated_gaussian(&mut self) -> f64 {
    loop {
      let v: f64 = self.sample(StandardNormal);
      if v.abs() <= TRUNCATION {
        return v;
      }
    }
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Distribution {
  #[default]
  Uniform,
  Gaussian,
  TruncatedGaussian
}

impl Distribution {
  pub fn draw<R: RandomSource + ?Sized>(self, rng: &mut R) -> f64 {
    match self {
      Distribution::Uniform => rng.uniform(),
      Distribution::Gaussian => rng.gaussian(),
      Distribution::TruncatedGaussian => rng.truncated_gaussian()
    }
  }
}

/// Overwrite every sample of `buffer` with an independent draw.
pub fn fill<R: RandomSource + ?Sized>(buffer: &mut Buffer<f32>, distribution: Distribution, rng: &mut R) {
  for v in buffer.as_mut_slice() {
    *v = distribution.draw(rng) as f32;
  }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RandomFill {
  pub xsize: usize,
  pub ysize: usize,
  pub distribution: Distribution
}

impl RandomFill {
  pub fn new(xsize: usize, ysize: usize) -> Self {
    Self { xsize, ysize, distribution: Distribution::default() }
  }

  pub fn with_distribution(mut self, distribution: Distribution) -> Self {
    self.distribution = distribution;
    self
  }

  pub fn validate(&self) -> Result<()> {
    ensure!(self.xsize > 0 && self.ysize > 0, Error::InvalidDimensions(vec![self.xsize, self.ysize]));
    Ok(())
  }
}

/// [`create_random_with`] on the thread-local generator.
pub fn create_random(store: &mut BufferStore, name: &str, config: &RandomFill) -> Result<ImageId> {
  create_random_with(store, name, config, &mut rand::thread_rng())
}

pub fn create_random_with<R: RandomSource + ?Sized>(
  store: &mut BufferStore,
  name: &str,
  config: &RandomFill,
  rng: &mut R
) -> Result<ImageId> {
  config.validate()?;
  let mut buffer = Buffer::new_2d(config.xsize, config.ysize)?;
  fill(&mut buffer, config.distribution, rng);
  log::debug!("random {:?} image `{name}`: {buffer:?}", config.distribution);
  Ok(store.insert(name, buffer))
}
