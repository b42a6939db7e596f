//! ASCII seed lists.
//!
//! ```text
//! 3
//! 0 0.25 0.25
//! 1 0.75 0.25
//! 2 0.5  0.8
//! ```
//! The first line is the point count, each following line `<index> <x> <y>` with normalized
//! coordinates.

use {
  crate::{
    error::{Error, Result},
    geometry::WorldSpace
  },
  euclid::Point2D,
  std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path
  }
};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Seed {
  /// Label given to the pixels of this seed's region.
  pub index: i32,
  pub position: Point2D<f32, WorldSpace>
}

impl Seed {
  pub fn new(index: i32, x: f32, y: f32) -> Self {
    Self { index, position: Point2D::new(x, y) }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedList {
  seeds: Vec<Seed>
}

impl SeedList {
  pub fn new(seeds: impl IntoIterator<Item = Seed>) -> Self {
    Self { seeds: seeds.into_iter().collect() }
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
    let mut lines = BufReader::new(reader).lines().enumerate()
      .map(|(n, line)| line.map(|l| (n + 1, l)).map_err(|source| Error::Io { path: path.into(), source }))
      .filter(|line| !matches!(line, Ok((_, l)) if l.trim().is_empty()));

    let (n, header) = lines.next()
      .ok_or_else(|| Error::malformed(path, 1, "missing point count"))??;
    let count = header.trim().parse::<usize>()
      .map_err(|_| Error::malformed(path, n, format!("invalid point count `{}`", header.trim())))?;

    let mut seeds = Vec::with_capacity(count);
    let mut last = n;
    for line in lines.by_ref().take(count) {
      let (n, text) = line?;
      seeds.push(parse_seed(&text).ok_or_else(|| Error::malformed(
        path, n, format!("expected `<index> <x> <y>`, found `{}`", text.trim())
      ))?);
      last = n;
    }
    if seeds.len() < count {
      return Err(Error::malformed(path, last + 1, format!("{count} points announced, {} found", seeds.len())).into());
    }
    if lines.next().is_some() {
      log::warn!("{}: lines past the {count} announced points are ignored", path.display());
    }
    log::info!("{}: {count} seeds", path.display());
    Ok(Self { seeds })
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Seed> {
    self.seeds.iter()
  }

  pub fn as_slice(&self) -> &[Seed] {
    &self.seeds
  }

  pub fn len(&self) -> usize {
    self.seeds.len()
  }

  pub fn is_empty(&self) -> bool {
    self.seeds.is_empty()
  }
}

fn parse_seed(line: &str) -> Option<Seed> {
  let mut fields = line.split_whitespace();
  let index = fields.next()?.parse::<u32>().ok()
    .and_then(|i| i32::try_from(i).ok())?;
  let x = fields.next()?.parse::<f32>().ok().filter(|v| v.is_finite())?;
  let y = fields.next()?.parse::<f32>().ok().filter(|v| v.is_finite())?;
  fields.next().is_none().then(|| Seed::new(index, x, y))
}
