//! Voronoi maps with carved gaps.
//!
//! Every pixel is labelled with the index of its nearest seed when that seed is closer than the
//! configured radius, -1 otherwise. Distances are measured in normalized coordinates,
//! `(x / xsize, y / ysize)`. Gaps are then carved by comparing the labels found at
//! `gap_pixels` on either side of each pixel along both axes and diagonals.

use {
  crate::{
    buffer::{Buffer, BufferStore, ImageId},
    error::{Error, Result},
    geometry::{to_world_space, PixelSpace, WorldSpace}
  },
  anyhow::ensure,
  euclid::{Point2D, Size2D},
  rayon::prelude::*,
  std::path::Path
};

pub mod seeds;

pub use seeds::{Seed, SeedList};

/// Label of pixels outside every region.
pub const UNASSIGNED: i32 = -1;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VoronoiConfig {
  pub xsize: usize,
  pub ysize: usize,
  /// Maximum distance from a pixel to its seed, normalized.
  pub radius: f32,
  /// Half-width of the carved gap, as a fraction of `xsize`.
  pub gap: f32
}

impl VoronoiConfig {
  pub fn new(xsize: usize, ysize: usize) -> Self {
    Self { xsize, ysize, radius: f32::INFINITY, gap: 0.0 }
  }

  pub fn with_radius(mut self, radius: f32) -> Self {
    self.radius = radius;
    self
  }

  pub fn with_gap(mut self, gap: f32) -> Self {
    self.gap = gap;
    self
  }

  pub fn validate(&self) -> Result<()> {
    ensure!(self.xsize > 0 && self.ysize > 0, Error::InvalidDimensions(vec![self.xsize, self.ysize]));
    ensure!(!self.radius.is_nan(), Error::InvalidConfig("region radius is NaN".into()));
    ensure!(self.gap.is_finite() && self.gap >= 0.0,
      Error::InvalidConfig(format!("gap {} must be finite and non-negative", self.gap)));
    Ok(())
  }

  /// Gap half-width in pixels, truncated.
  pub fn gap_pixels(&self) -> usize {
    (self.gap * self.xsize as f32) as usize
  }
}

/// Nearest and second nearest seeds of a pixel, as positions in the seed list.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Neighbours {
  pub nearest: Option<(usize, f32)>,
  pub runner_up: Option<(usize, f32)>
}

impl Neighbours {
  const NONE: Self = Self { nearest: None, runner_up: None };

  /// Single pass keeping the two running minima. Ties keep the earlier seed.
  fn scan(point: Point2D<f32, WorldSpace>, seeds: &[Seed]) -> Self {
    let mut n = Self::NONE;
    for (i, seed) in seeds.iter().enumerate() {
      let d = (point - seed.position).length();
      match (n.nearest, n.runner_up) {
        (Some((_, d0)), _) if d >= d0 => {
          if n.runner_up.map_or(true, |(_, d1)| d < d1) {
            n.runner_up = Some((i, d));
          }
        }
        _ => {
          n.runner_up = n.nearest;
          n.nearest = Some((i, d));
        }
      }
    }
    n
  }
}

/// Nearest and second nearest seed of every pixel, in storage order.
pub fn nearest_seeds(seeds: &SeedList, xsize: usize, ysize: usize) -> Vec<Neighbours> {
  let resolution = Size2D::<f64, PixelSpace>::new(xsize as f64, ysize as f64);
  let mut out = vec![Neighbours::NONE; xsize * ysize];
  out.par_chunks_mut(xsize.max(1))
    .enumerate()
    .for_each(|(y, row)| {
      for (x, n) in row.iter_mut().enumerate() {
        let point = to_world_space(Point2D::new(x as f64, y as f64), resolution);
        *n = Neighbours::scan(point, seeds.as_slice());
      }
    });
  out
}

/// Reset to [`UNASSIGNED`] every pixel whose opposite neighbours at `gap_pixels` (horizontal,
/// vertical and both diagonals) carry different labels, and every pixel closer than
/// `gap_pixels` to the border.
pub fn carve_gaps(labels: &mut Buffer<i32>, gap_pixels: usize) {
  let (xsize, ysize) = (labels.xsize(), labels.ysize());
  let g = gap_pixels;
  let frozen = &*labels;
  let keep = |x: usize, y: usize| {
    if x < g || y < g || x + g >= xsize || y + g >= ysize {
      return false;
    }
    let at = |x: usize, y: usize| frozen[(x, y)];
    at(x + g, y) == at(x - g, y)
      && at(x, y + g) == at(x, y - g)
      && at(x + g, y + g) == at(x - g, y - g)
      && at(x - g, y + g) == at(x + g, y - g)
  };
  let retain = (0..xsize * ysize)
    .into_par_iter()
    .map(|i| keep(i % xsize, i / xsize))
    .collect::<Vec<bool>>();

  labels.as_mut_slice()
    .par_iter_mut()
    .zip(retain.par_iter())
    .for_each(|(label, &keep)| if !keep {
      *label = UNASSIGNED;
    });
}

pub fn voronoi_partition(seeds: &SeedList, config: &VoronoiConfig) -> Result<Buffer<i32>> {
  config.validate()?;
  let (xsize, ysize) = (config.xsize, config.ysize);
  let labels = nearest_seeds(seeds, xsize, ysize).into_iter()
    .map(|n| match n.nearest {
      Some((i, d)) if d < config.radius => seeds.as_slice()[i].index,
      _ => UNASSIGNED
    })
    .collect::<Vec<_>>();
  let mut labels = Buffer::from_vec(&[xsize, ysize], labels)?;
  log::debug!("voronoi: {} seeds, gap {} px", seeds.len(), config.gap_pixels());
  carve_gaps(&mut labels, config.gap_pixels());
  Ok(labels)
}

/// Partition from the seed file at `path`, published as an `i32` buffer.
pub fn create_voronoi_map(
  store: &mut BufferStore,
  name: &str,
  path: impl AsRef<Path>,
  config: &VoronoiConfig
) -> Result<ImageId> {
  let seeds = SeedList::load(path)?;
  let labels = voronoi_partition(&seeds, config)?;
  Ok(store.insert(name, labels))
}
