//! Coordinate spaces and pixel regions.
//!
//! The origin of the pixel coordinate system is in the top-left corner, and pixel `(x, y)`
//! is sampled at its center `(x as f64, y as f64)`. Normalized coordinates span `[0, 1)` on
//! both axes.

use {
  euclid::{Point2D, Box2D, Size2D, Vector2D},
  num_traits::NumCast,
  std::ops::Range
};

pub mod shapes;
pub use shapes::*;

/// Pixel coordinate basis
#[derive(Debug, Copy, Clone)]
pub struct PixelSpace;
/// Normalized coordinate basis
#[derive(Debug, Copy, Clone)]
pub struct WorldSpace;

pub type P2<T = f64> = Point2D<T, PixelSpace>;
pub type V2<T = f64> = Vector2D<T, PixelSpace>;

pub trait BoundingBox {
  fn bounding_box(&self) -> Box2D<f64, PixelSpace>;
}

pub fn to_world_space<T: NumCast + Copy>(
  point: Point2D<T, PixelSpace>,
  resolution: Size2D<T, PixelSpace>
) -> Point2D<f32, WorldSpace> {
  point.to_f32().to_vector()
    .component_div(resolution.to_f32().to_vector())
    .cast_unit()
    .to_point()
}

/// Truncate `[lo, hi)` toward zero and clamp it into `[0, size]`.
pub fn clamp_span(lo: f64, hi: f64, size: usize) -> Range<usize> {
  let clamp = |v: f64| (v as i64).clamp(0, size as i64) as usize;
  let (lo, hi) = (clamp(lo), clamp(hi));
  lo..hi.max(lo)
}

pub fn clamp_box(x: Range<usize>, y: Range<usize>) -> Box2D<usize, PixelSpace> {
  Box2D::new(
    Point2D::new(x.start, y.start),
    Point2D::new(x.end, y.end)
  )
}

/// Pixel regions of a radially bounded shape.
///
/// `inner` is the square inscribed in the inner safe radius, inset by 2 px, so every pixel in
/// it is fully covered. `outer` encloses the outer safe radius plus 2 px. Both are clamped to
/// the buffer.
#[derive(Debug, Copy, Clone)]
pub struct Zones {
  pub outer: Box2D<usize, PixelSpace>,
  pub inner: Box2D<usize, PixelSpace>
}

impl Zones {
  pub const MARGIN: f64 = 2.0;

  pub fn new(center: P2, inner_radius: f64, outer_radius: f64, size: Size2D<usize, PixelSpace>) -> Self {
    let r_o = outer_radius + Self::MARGIN;
    let r_i = inner_radius * std::f64::consts::FRAC_1_SQRT_2;
    let outer = clamp_box(
      clamp_span(center.x - r_o, center.x + r_o, size.width),
      clamp_span(center.y - r_o, center.y + r_o, size.height)
    );
    let inner = clamp_box(
      clamp_span(center.x - r_i + Self::MARGIN, center.x + r_i - Self::MARGIN, size.width),
      clamp_span(center.y - r_i + Self::MARGIN, center.y + r_i - Self::MARGIN, size.height)
    );
    Self { outer, inner }
  }

  /// Pixel lies in the guaranteed-interior square.
  pub fn is_interior(&self, x: usize, y: usize) -> bool {
    self.inner.contains(Point2D::new(x, y))
  }
}
