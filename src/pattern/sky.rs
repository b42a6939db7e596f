//! Astronomical scenes: galaxies, exozodiacal dust disks, star clusters.

use {
  super::{generate, image_center},
  crate::{
    buffer::Buffer,
    error::{Error, Result},
    random::RandomSource
  },
  anyhow::ensure,
  std::f64::consts::{FRAC_PI_2, PI}
};

/// `b` of the de Vaucouleurs law, in base 10.
pub const DE_VAUCOULEURS_B: f64 = 3.3307;
/// Approximate `∫ I dA / (L0 · R²)` of a de Vaucouleurs bulge.
pub const DE_VAUCOULEURS_FLUX: f64 = 23.02;
/// Radius at which the exozodi background level is taken.
pub const EXOZODI_BACKGROUND_RADIUS: f64 = 6.0;

/// One elliptical component of a [`Galaxy`].
///
/// The elliptical radius is `sqrt(x² / (1 - e) + (1 - e) · y²)`, with `(x, y)` the offset from
/// the image center rotated by `position_angle`, so the component area is preserved.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GalaxyComponent {
  /// Scale length in pixels.
  pub radius: f64,
  /// Surface brightness at `radius` (bulge) or at the center (disk).
  pub brightness: f64,
  /// `1 - b/a`, in `[0, 1)`.
  pub ellipticity: f64,
  pub position_angle: f64
}

impl GalaxyComponent {
  pub fn new(radius: f64, brightness: f64) -> Self {
    Self { radius, brightness, ellipticity: 0.0, position_angle: 0.0 }
  }

  pub fn with_ellipticity(mut self, ellipticity: f64) -> Self {
    self.ellipticity = ellipticity;
    self
  }

  pub fn with_position_angle(mut self, position_angle: f64) -> Self {
    self.position_angle = position_angle;
    self
  }

  fn validate(&self, what: &str) -> Result<()> {
    ensure!(self.radius.is_finite() && self.radius > 0.0,
      Error::InvalidConfig(format!("{what} radius {} must be positive", self.radius)));
    ensure!(self.ellipticity >= 0.0 && self.ellipticity < 1.0,
      Error::InvalidConfig(format!("{what} ellipticity {} must lie in [0, 1)", self.ellipticity)));
    Ok(())
  }

  fn elliptical_radius(&self, dx: f64, dy: f64) -> f64 {
    let (sin, cos) = self.position_angle.sin_cos();
    let x = cos * dx + sin * dy;
    let y = cos * dy - sin * dx;
    let boa = 1.0 - self.ellipticity;
    (x * x / boa + boa * y * y).sqrt()
  }
}

/// Exponential disk plus de Vaucouleurs bulge.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Galaxy {
  pub disk: GalaxyComponent,
  pub bulge: GalaxyComponent
}

impl Galaxy {
  pub fn new(disk: GalaxyComponent, bulge: GalaxyComponent) -> Self {
    Self { disk, bulge }
  }

  /// `disk.brightness · exp(-r / disk.radius)`
  pub fn disk_brightness(&self, dx: f64, dy: f64) -> f64 {
    let d = &self.disk;
    d.brightness * (-d.elliptical_radius(dx, dy) / d.radius).exp()
  }

  /// `bulge.brightness · 10^(-3.3307 · ((r / bulge.radius)^¼ - 1))`
  pub fn bulge_brightness(&self, dx: f64, dy: f64) -> f64 {
    let b = &self.bulge;
    let r = b.elliptical_radius(dx, dy) / b.radius;
    b.brightness * 10f64.powf(-DE_VAUCOULEURS_B * (r.powf(0.25) - 1.0))
  }

  /// Analytic total flux over an unbounded image.
  pub fn expected_flux(&self) -> f64 {
    let (d, b) = (&self.disk, &self.bulge);
    2.0 * PI * d.brightness * d.radius * d.radius
      + DE_VAUCOULEURS_FLUX * b.brightness * b.radius * b.radius
  }
}

pub fn galaxy(xsize: usize, ysize: usize, model: &Galaxy) -> Result<Buffer<f32>> {
  model.disk.validate("disk")?;
  model.bulge.validate("bulge")?;
  let c = image_center(xsize, ysize);
  let image = generate(xsize, ysize, |x, y| {
    let (dx, dy) = (x - c.x, y - c.y);
    model.disk_brightness(dx, dy) + model.bulge_brightness(dx, dy)
  })?;
  log::debug!("galaxy: total {:.3} ({:.3} expected)", image.sum(), model.expected_flux());
  Ok(image)
}

/// Gaussian elliptical galaxy, `peak · exp(-concentration · d²)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EllipticalGalaxy {
  /// Scale relative to the image diagonal.
  pub size: f64,
  pub concentration: f64,
  pub position_angle: f64,
  /// `sqrt(a² - b²) / a`, in `[0, 1)`.
  pub ellipticity: f64,
  pub peak: f64,
  /// Only fill the central half of the image, zero elsewhere.
  pub central_half: bool
}

impl Default for EllipticalGalaxy {
  fn default() -> Self {
    Self { size: 0.1, concentration: 1.0, position_angle: 0.0, ellipticity: 0.3, peak: 1.0, central_half: false }
  }
}

impl EllipticalGalaxy {
  pub fn with_size(mut self, size: f64) -> Self {
    self.size = size;
    self
  }

  pub fn with_concentration(mut self, concentration: f64) -> Self {
    self.concentration = concentration;
    self
  }

  pub fn with_orientation(mut self, position_angle: f64, ellipticity: f64) -> Self {
    self.position_angle = position_angle;
    self.ellipticity = ellipticity;
    self
  }

  pub fn with_central_half(mut self, central_half: bool) -> Self {
    self.central_half = central_half;
    self
  }

  pub fn validate(&self) -> Result<()> {
    ensure!(self.size.is_finite() && self.size > 0.0,
      Error::InvalidConfig(format!("galaxy size {} must be positive", self.size)));
    ensure!(self.ellipticity >= 0.0 && self.ellipticity < 1.0,
      Error::InvalidConfig(format!("ellipticity {} must lie in [0, 1)", self.ellipticity)));
    Ok(())
  }
}

/// Pixel window `[lo, hi)` filled by generators honoring `central_half`.
fn window(size: usize, central_half: bool) -> (usize, usize) {
  if central_half { (size / 4, 3 * size / 4) } else { (0, size) }
}

/// `d² = (x² + y² / (1 - e²)) / (xsize² + ysize²) / size²`, `(x, y)` rotated by the position angle.
pub fn elliptical_galaxy(xsize: usize, ysize: usize, model: &EllipticalGalaxy) -> Result<Buffer<f32>> {
  model.validate()?;
  let c = image_center(xsize, ysize);
  let (sin, cos) = model.position_angle.sin_cos();
  let stretch = (1.0 - model.ellipticity * model.ellipticity).sqrt();
  let norm = (xsize * xsize + ysize * ysize) as f64 * model.size * model.size;
  let (xw, yw) = (window(xsize, model.central_half), window(ysize, model.central_half));
  generate(xsize, ysize, |x, y| {
    let (i, j) = (x as usize, y as usize);
    if i < xw.0 || i >= xw.1 || j < yw.0 || j >= yw.1 {
      return 0.0;
    }
    let (dx, dy) = (x - c.x, y - c.y);
    let u = cos * dx + sin * dy;
    let v = (cos * dy - sin * dx) / stretch;
    model.peak * (-model.concentration * (u * u + v * v) / norm).exp()
  })
}

/// Inclined exozodiacal dust disk seen at `inclination`: `r^-index` beyond `inner_edge`, divided by
/// `cos(inclination)`, over a constant background `6^-index`. Pixels are sampled at their centers
/// offset by half a pixel.
pub fn exozodi_disk(size: usize, inner_edge: f64, index: f64, inclination: f64) -> Result<Buffer<f32>> {
  ensure!(inclination.abs() < FRAC_PI_2,
    Error::InvalidConfig(format!("inclination {inclination} must be below π/2")));
  let cos = inclination.cos();
  let half = (size / 2) as f64;
  let background = EXOZODI_BACKGROUND_RADIUS.powf(-index);
  generate(size, size, |x, y| {
    let (dx, dy) = (x + 0.5 - half, (y + 0.5 - half) / cos);
    let r = (dx * dx + dy * dy).sqrt();
    let disk = if r < inner_edge { 0.0 } else { r.powf(-index) };
    disk / cos + background
  })
}

/// Star cluster with a radially concentrated population.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterConfig {
  pub xsize: usize,
  pub ysize: usize,
  pub stars: usize,
  /// Core radius as a fraction of the image side.
  pub size: f64,
  /// Exponent applied to the gaussian radial draw, larger values pack stars tighter.
  pub concentration: f64,
  /// Only place stars inside the central half of the image.
  pub central_half: bool
}

impl ClusterConfig {
  pub fn new(xsize: usize, ysize: usize) -> Self {
    Self { xsize, ysize, stars: 3000, size: 0.1, concentration: 1.0, central_half: false }
  }

  pub fn with_stars(mut self, stars: usize) -> Self {
    self.stars = stars;
    self
  }

  pub fn with_size(mut self, size: f64) -> Self {
    self.size = size;
    self
  }

  pub fn with_concentration(mut self, concentration: f64) -> Self {
    self.concentration = concentration;
    self
  }

  pub fn with_central_half(mut self, central_half: bool) -> Self {
    self.central_half = central_half;
    self
  }

  pub fn validate(&self) -> Result<()> {
    ensure!(self.xsize > 0 && self.ysize > 0, Error::InvalidDimensions(vec![self.xsize, self.ysize]));
    ensure!(self.size.is_finite() && self.size >= 0.0,
      Error::InvalidConfig(format!("cluster size {} must be finite and non-negative", self.size)));
    ensure!(self.concentration.is_finite(),
      Error::InvalidConfig(format!("concentration {} must be finite", self.concentration)));
    // stars are accepted strictly inside the window, the center must be
    let (xw, yw) = (window(self.xsize, self.central_half), window(self.ysize, self.central_half));
    let (cx, cy) = (self.xsize / 2, self.ysize / 2);
    ensure!(cx > xw.0 && cx < xw.1 && cy > yw.0 && cy < yw.1, Error::InvalidConfig(format!(
      "a {}x{} image leaves no room for cluster stars", self.xsize, self.ysize
    )));
    Ok(())
  }
}

/// [`cluster_with`] on the thread-local generator.
pub fn cluster(config: &ClusterConfig) -> Result<Buffer<f32>> {
  cluster_with(config, &mut rand::thread_rng())
}

/// Star `k` lands at `center + size · side / 2 · |g|^concentration · (cos θ, sin θ)` with `g`
/// standard normal and `θ` uniform, and adds `g'²` to its pixel. Draws landing outside the window
/// (or on its first row or column) are repeated.
pub fn cluster_with<R: RandomSource + ?Sized>(config: &ClusterConfig, rng: &mut R) -> Result<Buffer<f32>> {
  config.validate()?;
  let (xsize, ysize) = (config.xsize, config.ysize);
  let mut buffer = Buffer::new_2d(xsize, ysize)?;
  let (xw, yw) = (window(xsize, config.central_half), window(ysize, config.central_half));
  let (cx, cy) = ((xsize / 2) as f64, (ysize / 2) as f64);
  let inside = |v: f64, (lo, hi): (usize, usize)| v > lo as f64 && v < hi as f64;

  let mut placed = 0;
  let mut draws = 0usize;
  while placed < config.stars {
    draws += 1;
    let dist = rng.gaussian().abs().powf(config.concentration);
    let angle = 2.0 * PI * rng.uniform();
    let x = (cx + config.size * xsize as f64 / 2.0 * dist * angle.cos()).trunc();
    let y = (cy + config.size * ysize as f64 / 2.0 * dist * angle.sin()).trunc();
    if inside(x, xw) && inside(y, yw) {
      let flux = rng.gaussian();
      buffer[(x as usize, y as usize)] += (flux * flux) as f32;
      placed += 1;
    }
  }
  log::debug!("cluster: {placed} stars in {draws} draws");
  Ok(buffer)
}
