use {
  super::{BoundingBox, PixelSpace, P2, V2},
  euclid::{Box2D, Vector2D},
  std::f64::consts::FRAC_PI_6
};

/// A closed region described around a center by a boundary radius per direction.
pub trait Boundary: Sync {
  fn center(&self) -> P2;
  /// Radii `(inner, outer)` such that the boundary lies entirely between them.
  fn radial_bounds(&self) -> (f64, f64);
  /// Distance from the center to the boundary along `offset`.
  fn radius_towards(&self, offset: V2) -> f64;
  /// Strict interior test, `offset` is measured from the center.
  fn contains(&self, offset: V2) -> bool {
    let r = self.radius_towards(offset);
    offset.square_length() < r * r
  }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Disk {
  pub center: P2,
  pub radius: f64
}

impl Disk {
  pub fn new(center: P2, radius: f64) -> Self {
    Self { center, radius }
  }
}

impl Boundary for Disk {
  fn center(&self) -> P2 { self.center }
  fn radial_bounds(&self) -> (f64, f64) { (self.radius, self.radius) }
  fn radius_towards(&self, _: V2) -> f64 { self.radius }
  fn contains(&self, offset: V2) -> bool {
    offset.square_length() < self.radius * self.radius
  }
}

/// One term of the boundary perturbation `amplitude * cos(wavenumber * θ + phase)`.
/// The amplitude is relative to the base radius.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Harmonic {
  pub amplitude: f64,
  pub wavenumber: f64,
  pub phase: f64
}

impl Harmonic {
  pub fn new(amplitude: f64, wavenumber: f64, phase: f64) -> Self {
    Self { amplitude, wavenumber, phase }
  }
}

/// Disk whose radius follows `r(θ) = radius * (1 + Σ amplitude_k * cos(wavenumber_k * θ + phase_k))`,
/// θ being the polar angle of the center as seen from the pixel, `atan2(cy - y, cx - x)`.
/// A single `wavenumber = 1` harmonic of positive amplitude bulges towards -x.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbedDisk {
  pub center: P2,
  pub radius: f64,
  pub harmonics: Vec<Harmonic>
}

impl PerturbedDisk {
  pub fn new(center: P2, radius: f64, harmonics: impl IntoIterator<Item = Harmonic>) -> Self {
    Self { center, radius, harmonics: harmonics.into_iter().collect() }
  }

  fn total_amplitude(&self) -> f64 {
    self.harmonics.iter().map(|h| h.amplitude.abs()).sum()
  }
}

impl Boundary for PerturbedDisk {
  fn center(&self) -> P2 { self.center }

  fn radial_bounds(&self) -> (f64, f64) {
    let a = self.total_amplitude();
    ((self.radius * (1.0 - a)).max(0.0), self.radius * (1.0 + a))
  }

  fn radius_towards(&self, offset: V2) -> f64 {
    let theta = (-offset.y).atan2(-offset.x);
    self.radius * (1.0 + self.harmonics.iter()
      .map(|h| h.amplitude * (h.wavenumber * theta + h.phase).cos())
      .sum::<f64>())
  }
}

/// Flat-topped hexagon (two edges parallel to the x axis).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hexagon {
  pub center: P2,
  pub inradius: f64
}

impl Hexagon {
  pub fn new(center: P2, inradius: f64) -> Self {
    Self { center, inradius }
  }

  pub fn circumradius(&self) -> f64 {
    self.inradius * 2.0 / 3f64.sqrt()
  }

  /// Points within the inradius are accepted without the half-plane tests.
  pub fn contains(&self, offset: V2) -> bool {
    let r = self.inradius;
    if offset.square_length() <= r * r {
      return true;
    }
    let (c, s) = (FRAC_PI_6.cos(), FRAC_PI_6.sin());
    offset.y.abs() <= r
      && (c * offset.x + s * offset.y).abs() <= r
      && (c * offset.x - s * offset.y).abs() <= r
  }
}

impl BoundingBox for Hexagon {
  fn bounding_box(&self) -> Box2D<f64, PixelSpace> {
    let r = Vector2D::splat(self.circumradius());
    Box2D::new(self.center - r, self.center + r)
  }
}

impl BoundingBox for Disk {
  fn bounding_box(&self) -> Box2D<f64, PixelSpace> {
    let r = Vector2D::splat(self.radius);
    Box2D::new(self.center - r, self.center + r)
  }
}

impl BoundingBox for PerturbedDisk {
  fn bounding_box(&self) -> Box2D<f64, PixelSpace> {
    let r = Vector2D::splat(self.radial_bounds().1);
    Box2D::new(self.center - r, self.center + r)
  }
}
