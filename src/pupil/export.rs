//! Segment outlines for a lithography mask.
//!
//! Each segment has a mask level read from a table of `<segment index> <level>` lines. A segment
//! is exported when the lowest bit of its stored level (level + 15) is set; which table entry a
//! lattice segment maps to is read from an externally built index map.

use {
  super::HexPupilConfig,
  crate::{
    buffer::Buffer,
    error::{Error, Result},
    geometry::V2
  },
  std::{
    collections::BTreeMap,
    f64::consts::PI,
    fs::File,
    io::{BufRead, BufReader, ErrorKind, Read},
    path::Path
  }
};

/// Stored levels are offset by this amount from the table values.
pub const LEVEL_OFFSET: i64 = 15;
/// Index map lookups are stretched by this factor.
pub const MAP_SCALE: f64 = 1.037;
/// Binary digit of `level / 16` selecting the segment (0 = integer part).
const BIT_INDEX: usize = 4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskLevels {
  levels: BTreeMap<usize, i64>
}

impl MaskLevels {
  /// `None` if the table file does not exist.
  pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
    let path = path.as_ref();
    match File::open(path) {
      Ok(file) => Self::parse(file, path).map(Some),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(source) => Err(Error::Io { path: path.into(), source }.into())
    }
  }

  pub fn parse(reader: impl Read, path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let mut levels = Self::default();
    for (n, line) in BufReader::new(reader).lines().enumerate() {
      let line = line.map_err(|source| Error::Io { path: path.into(), source })?;
      let fields = line.split_whitespace().collect::<Vec<_>>();
      if fields.is_empty() {
        continue;
      }
      let (index, level) = match fields[..] {
        [a, b] => (a.parse::<usize>(), b.parse::<i64>()),
        _ => return Err(Error::malformed(path, n + 1, "expected `<segment index> <level>`").into())
      };
      match (index, level) {
        (Ok(index), Ok(level)) if index > 0 => levels.set(index, level),
        _ => return Err(Error::malformed(path, n + 1, format!("invalid entry `{}`", line.trim())).into())
      }
    }
    Ok(levels)
  }

  /// Record `level` for 1-based segment `index`.
  pub fn set(&mut self, index: usize, level: i64) {
    self.levels.insert(index, level + LEVEL_OFFSET);
  }

  /// Stored level of 1-based segment `index`.
  pub fn level(&self, index: usize) -> Option<i64> {
    self.levels.get(&index).copied()
  }

  pub fn is_exported(&self, index: usize) -> bool {
    self.level(index).map_or(false, |l| level_bit(l) == 1)
  }
}

fn level_bit(level: i64) -> i32 {
  let mut fraction = level as f32 / 16.0;
  let mut digit = 0;
  for _ in 0..=BIT_INDEX {
    digit = fraction as i32;
    fraction = (fraction - digit as f32) * 2.0;
  }
  digit
}

#[derive(Debug, Clone, Default)]
pub struct VectorExport {
  pub levels: Option<MaskLevels>,
  /// Square map of 1-based table indices.
  pub index_map: Option<Buffer<u16>>,
  /// Output units per lattice unit.
  pub pixel_scale: f64
}

impl VectorExport {
  pub fn new(levels: Option<MaskLevels>, index_map: Option<Buffer<u16>>) -> Self {
    Self { levels, index_map, pixel_scale: 1.0 }
  }

  pub fn with_pixel_scale(mut self, pixel_scale: f64) -> Self {
    self.pixel_scale = pixel_scale;
    self
  }

  pub(super) fn prepare(&self) -> Option<Exporter<'_>> {
    match (&self.levels, &self.index_map) {
      (Some(levels), Some(index_map)) => Some(Exporter { levels, index_map, pixel_scale: self.pixel_scale }),
      (None, _) => {
        log::warn!("no mask level table, vector export skipped");
        None
      }
      (_, None) => {
        log::warn!("no index map, vector export skipped");
        None
      }
    }
  }
}

/// Hexagon of one exported segment, vertices in hundredths of output units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOutline {
  pub segment: usize,
  pub level: i64,
  pub vertices: [(i64, i64); 6]
}

pub(super) struct Exporter<'a> {
  levels: &'a MaskLevels,
  index_map: &'a Buffer<u16>,
  pixel_scale: f64
}

impl <'a> Exporter<'a> {
  pub fn outline(&self, segment: usize, offset: V2, config: &HexPupilConfig) -> Option<SegmentOutline> {
    let size = self.index_map.xsize() as f64;
    let scale = 0.5 * size / config.radius * MAP_SCALE;
    let lookup = |v: f64| {
      let i = (0.5 * size + v * scale) as i64;
      usize::try_from(i).ok()
    };
    let index = *self.index_map.get(lookup(offset.x)?, lookup(offset.y)?)? as usize;
    if !self.levels.is_exported(index) {
      return None;
    }
    let circumradius = config.step - config.gap;
    let vertex = |k: usize| {
      let angle = 2.0 * PI * k as f64 / 6.0;
      let x = self.pixel_scale * (offset.x + angle.cos() * circumradius);
      let y = self.pixel_scale * (offset.y + angle.sin() * circumradius);
      ((100.0 * x) as i64, (100.0 * y) as i64)
    };
    Some(SegmentOutline {
      segment,
      level: self.levels.level(index)?,
      vertices: [vertex(0), vertex(1), vertex(2), vertex(3), vertex(4), vertex(5)]
    })
  }
}
