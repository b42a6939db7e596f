//! Anti-aliased rasterisation of disks, perturbed disks and hexagons.
//!
//! The disk renderers split the shape's bounding box into three zones (see [`Zones`]):
//! the inscribed interior square is filled without any test, pixels near the boundary get
//! their coverage estimated on a [`SubGrid`], and the rest get an exact inside test.

use {
  crate::{
    buffer::{Buffer, BufferStore, ImageId},
    error::Result,
    geometry::{
      Boundary, BoundingBox, Disk, Hexagon, PerturbedDisk, PixelSpace, Zones, P2,
      clamp_box, clamp_span
    },
  },
  euclid::{Box2D, Size2D, Vector2D},
  rayon::prelude::*
};


/// Pixels closer than this to the boundary get their coverage sampled.
pub const BOUNDARY_BAND: f64 = 1.5;

/// `N × N` sub-pixel sample offsets, evenly spaced over the pixel extent and centered.
#[derive(Debug, Clone)]
pub struct SubGrid {
  offsets: Vec<f64>
}

impl Default for SubGrid {
  fn default() -> Self {
    Self::new(Self::DEFAULT_DENSITY)
  }
}

impl SubGrid {
  pub const DEFAULT_DENSITY: usize = 55;

  pub fn new(density: usize) -> Self {
    let n = density.max(1) as f64;
    Self {
      offsets: (0..density.max(1))
        .map(|i| 0.5 - 0.5 / n - i as f64 / n)
        .collect()
    }
  }

  pub fn density(&self) -> usize {
    self.offsets.len()
  }

  /// Fraction of sub-samples around `offset` for which `inside` holds.
  pub fn coverage(&self, offset: Vector2D<f64, PixelSpace>, inside: impl Fn(Vector2D<f64, PixelSpace>) -> bool) -> f32 {
    let hits = itertools::iproduct!(self.offsets.iter(), self.offsets.iter())
      .filter(|(dy, dx)| inside(offset + Vector2D::new(**dx, **dy)))
      .count();
    (hits as f64 / (self.offsets.len() * self.offsets.len()) as f64) as f32
  }
}

#[derive(Copy, Clone)]
enum Sampling<'a> {
  Threshold,
  Subpixel(&'a SubGrid)
}

fn buffer_size(buffer: &Buffer<f32>) -> Size2D<usize, PixelSpace> {
  Size2D::new(buffer.xsize(), buffer.ysize())
}

/// Three-zone rasterisation of any radially bounded shape onto plane 0 of `buffer`.
/// Pixels outside the shape are left untouched.
fn rasterize<B: Boundary>(buffer: &mut Buffer<f32>, shape: &B, sampling: Sampling) {
  let (inner, outer) = shape.radial_bounds();
  if !(outer >= 0.0) {
    return;
  }
  let center = shape.center();
  let zones = Zones::new(center, inner, outer, buffer_size(buffer));
  let xsize = buffer.xsize();
  log::debug!("rasterize: center {:?}, radii [{inner}, {outer}], zones {:?}", center, zones);

  buffer.row_span_mut(zones.outer.y_range())
    .par_chunks_mut(xsize)
    .zip(zones.outer.y_range().into_par_iter())
    .for_each(|(row, y)| {
      for x in zones.outer.x_range() {
        if zones.is_interior(x, y) {
          row[x] = 1.0;
          continue;
        }
        let offset = P2::new(x as f64, y as f64) - center;
        if shape.contains(offset) {
          row[x] = 1.0;
        }
        if let Sampling::Subpixel(grid) = sampling {
          if (offset.length() - shape.radius_towards(offset).abs()).abs() < BOUNDARY_BAND {
            row[x] = grid.coverage(offset, |v| shape.contains(v));
          }
        }
      }
    });
}

/// Anti-aliased disk: boundary pixels receive their covered fraction.
pub fn render_disk(buffer: &mut Buffer<f32>, center: P2, radius: f64) {
  rasterize(buffer, &Disk::new(center, radius), Sampling::Subpixel(&SubGrid::default()))
}

/// Hard-edged disk, 1 where the pixel center is strictly inside.
pub fn make_disk(buffer: &mut Buffer<f32>, center: P2, radius: f64) {
  rasterize(buffer, &Disk::new(center, radius), Sampling::Threshold)
}

/// Anti-aliased disk with an angle-dependent radius. With no harmonics this is [`render_disk`].
pub fn render_disk_perturbed(buffer: &mut Buffer<f32>, shape: &PerturbedDisk) {
  rasterize(buffer, shape, Sampling::Subpixel(&SubGrid::default()))
}

/// Binary rasterisation of a shape restricted to its clamped bounding box.
#[derive(Debug, Clone)]
pub struct Footprint {
  pub bounds: Box2D<usize, PixelSpace>,
  pub mask: Vec<f32>
}

impl Footprint {
  pub fn hexagon(hex: &Hexagon, size: Size2D<usize, PixelSpace>) -> Self {
    let bb = hex.bounding_box();
    let bounds = clamp_box(
      clamp_span(bb.min.x - 1.0, bb.max.x + 1.0, size.width),
      clamp_span(bb.min.y - 1.0, bb.max.y + 1.0, size.height)
    );
    let width = bounds.width();
    let mut mask = vec![0.0; width * bounds.height()];
    if width > 0 {
      mask.par_chunks_mut(width)
        .zip(bounds.y_range().into_par_iter())
        .for_each(|(row, y)| {
          for (value, x) in row.iter_mut().zip(bounds.x_range()) {
            let offset = P2::new(x as f64, y as f64) - hex.center;
            *value = if hex.contains(offset) { 1.0 } else { 0.0 };
          }
        });
    }
    Self { bounds, mask }
  }

  /// `(x, y, value)` for every pixel of the bounding box.
  pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
    itertools::iproduct!(self.bounds.y_range(), self.bounds.x_range())
      .zip(self.mask.iter())
      .map(|((y, x), &v)| (x, y, v))
  }

  /// `Σ mask * other` over the footprint.
  pub fn overlap(&self, other: &Buffer<f32>) -> f64 {
    self.pixels()
      .filter(|&(_, _, v)| v != 0.0)
      .filter_map(|(x, y, v)| other.get(x, y).map(|o| (v * o) as f64))
      .sum()
  }

  pub fn area(&self) -> f64 {
    self.mask.iter().map(|&v| v as f64).sum()
  }
}

/// Hexagon written over its whole bounding box: 1 inside, 0 elsewhere in the box.
pub fn render_hexagon(buffer: &mut Buffer<f32>, hex: &Hexagon) {
  log::debug!("hexagon at {:?}, inradius {}", hex.center, hex.inradius);
  let footprint = Footprint::hexagon(hex, buffer_size(buffer));
  for (x, y, v) in footprint.pixels() {
    buffer[(x, y)] = v;
  }
}

fn create_with(
  store: &mut BufferStore,
  name: &str,
  xsize: usize,
  ysize: usize,
  fill: impl FnOnce(&mut Buffer<f32>)
) -> Result<ImageId> {
  let mut buffer = Buffer::new_2d(xsize, ysize)?;
  fill(&mut buffer);
  Ok(store.insert(name, buffer))
}

pub fn create_disk(store: &mut BufferStore, name: &str, xsize: usize, ysize: usize, disk: Disk) -> Result<ImageId> {
  create_with(store, name, xsize, ysize, |b| make_disk(b, disk.center, disk.radius))
}

pub fn create_subpixel_disk(store: &mut BufferStore, name: &str, xsize: usize, ysize: usize, disk: Disk) -> Result<ImageId> {
  create_with(store, name, xsize, ysize, |b| render_disk(b, disk.center, disk.radius))
}

pub fn create_perturbed_disk(
  store: &mut BufferStore,
  name: &str,
  xsize: usize,
  ysize: usize,
  shape: &PerturbedDisk
) -> Result<ImageId> {
  create_with(store, name, xsize, ysize, |b| render_disk_perturbed(b, shape))
}

pub fn create_hexagon(store: &mut BufferStore, name: &str, xsize: usize, ysize: usize, hex: Hexagon) -> Result<ImageId> {
  create_with(store, name, xsize, ysize, |b| render_hexagon(b, &hex))
}
