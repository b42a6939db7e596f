//! Dense row-major sample storage.
//!
//! Linear index of a sample is `z * (xsize * ysize) + y * xsize + x`. Every accessor is
//! bounds-checked: [`Buffer::get`] and friends return `None`, indexing with `buf[(x, y)]` panics.

use {
  crate::error::{Error, Result},
  anyhow::bail,
  num_traits::ToPrimitive,
  std::{
    fmt::{Debug, Formatter},
    ops::{Index, IndexMut},
    slice::ChunksMut
  }
};

pub mod store;
pub use store::{BufferStore, DataType, Image, ImageId, Sample};

/// Extent of a buffer along each of its (up to three) axes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Dims {
  sizes: [usize; 3],
  naxis: usize
}

impl Dims {
  pub fn new(sizes: &[usize]) -> Result<Self> {
    if sizes.is_empty() || sizes.len() > 3 || sizes.iter().any(|&s| s == 0) {
      bail!(Error::InvalidDimensions(sizes.to_vec()));
    }
    let mut dims = Self { sizes: [1; 3], naxis: sizes.len() };
    dims.sizes[..sizes.len()].copy_from_slice(sizes);
    Ok(dims)
  }

  pub fn x(&self) -> usize { self.sizes[0] }
  pub fn y(&self) -> usize { self.sizes[1] }
  pub fn z(&self) -> usize { self.sizes[2] }
  pub fn naxis(&self) -> usize { self.naxis }
  pub fn as_slice(&self) -> &[usize] { &self.sizes[..self.naxis] }

  /// Samples in one xy plane.
  pub fn plane_len(&self) -> usize { self.sizes[0] * self.sizes[1] }
  pub fn len(&self) -> usize { self.plane_len() * self.sizes[2] }

  pub fn offset(&self, x: usize, y: usize, z: usize) -> Option<usize> {
    (x < self.sizes[0] && y < self.sizes[1] && z < self.sizes[2])
      .then(|| z * self.plane_len() + y * self.sizes[0] + x)
  }
}

#[derive(Clone, PartialEq)]
pub struct Buffer<T> {
  data: Vec<T>,
  dims: Dims
}

impl <T: Copy + Default> Buffer<T> {
  /// Zero-filled buffer with 1 to 3 strictly positive axes.
  pub fn new(sizes: &[usize]) -> Result<Self> {
    Self::filled(sizes, T::default())
  }

  pub fn new_2d(xsize: usize, ysize: usize) -> Result<Self> {
    Self::new(&[xsize, ysize])
  }

  pub fn new_3d(xsize: usize, ysize: usize, zsize: usize) -> Result<Self> {
    Self::new(&[xsize, ysize, zsize])
  }

  pub fn filled(sizes: &[usize], value: T) -> Result<Self> {
    let dims = Dims::new(sizes)?;
    Ok(Self { data: vec![value; dims.len()], dims })
  }
}

impl <T> Buffer<T> {
  pub fn from_vec(sizes: &[usize], data: Vec<T>) -> Result<Self> {
    let dims = Dims::new(sizes)?;
    if data.len() != dims.len() {
      bail!(Error::InvalidConfig(format!(
        "{} samples do not fill a {:?} buffer", data.len(), dims.as_slice()
      )));
    }
    Ok(Self { data, dims })
  }

  pub fn dims(&self) -> Dims { self.dims }
  pub fn xsize(&self) -> usize { self.dims.x() }
  pub fn ysize(&self) -> usize { self.dims.y() }
  pub fn zsize(&self) -> usize { self.dims.z() }

  pub fn get(&self, x: usize, y: usize) -> Option<&T> {
    self.get3(x, y, 0)
  }

  pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
    self.get3_mut(x, y, 0)
  }

  pub fn get3(&self, x: usize, y: usize, z: usize) -> Option<&T> {
    self.dims.offset(x, y, z).map(|i| &self.data[i])
  }

  pub fn get3_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut T> {
    self.dims.offset(x, y, z).map(move |i| &mut self.data[i])
  }

  pub fn as_slice(&self) -> &[T] { &self.data }
  pub fn as_mut_slice(&mut self) -> &mut [T] { &mut self.data }
  pub fn into_vec(self) -> Vec<T> { self.data }

  pub fn plane(&self, z: usize) -> Option<&[T]> {
    let len = self.dims.plane_len();
    (z < self.zsize()).then(|| &self.data[z * len..(z + 1) * len])
  }

  pub fn plane_mut(&mut self, z: usize) -> Option<&mut [T]> {
    let len = self.dims.plane_len();
    (z < self.zsize()).then(move || &mut self.data[z * len..(z + 1) * len])
  }

  /// Mutable rows of every plane, in storage order.
  pub fn rows_mut(&mut self) -> ChunksMut<'_, T> {
    let xsize = self.xsize();
    self.data.chunks_mut(xsize)
  }

  /// Rows `y_range` of plane 0, for row-parallel rasterisation.
  pub fn row_span_mut(&mut self, y_range: std::ops::Range<usize>) -> &mut [T] {
    let xsize = self.xsize();
    let end = y_range.end.min(self.ysize());
    let start = y_range.start.min(end);
    &mut self.data[start * xsize..end * xsize]
  }

  pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Buffer<U> {
    Buffer {
      data: self.data.iter().map(f).collect(),
      dims: self.dims
    }
  }

  /// Iterate `((x, y, z), value)` in storage order.
  pub fn indexed(&self) -> impl Iterator<Item = ((usize, usize, usize), &T)> + '_ {
    let (xs, plane) = (self.xsize(), self.dims.plane_len());
    self.data.iter().enumerate()
      .map(move |(i, v)| ((i % xs, (i % plane) / xs, i / plane), v))
  }
}

impl <T: Copy + ToPrimitive> Buffer<T> {
  pub fn sum(&self) -> f64 {
    self.data.iter()
      .filter_map(|v| v.to_f64())
      .sum()
  }
}

impl <T> Index<(usize, usize)> for Buffer<T> {
  type Output = T;
  fn index(&self, (x, y): (usize, usize)) -> &T {
    self.get(x, y).unwrap_or_else(|| panic!(
      "pixel ({x}, {y}) outside of {:?} buffer", self.dims.as_slice()
    ))
  }}

impl <T> IndexMut<(usize, usize)> for Buffer<T> {
  fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
    let dims = self.dims;
    self.get_mut(x, y).unwrap_or_else(|| panic!(
      "pixel ({x}, {y}) outside of {:?} buffer", dims.as_slice()
    ))
  }}

impl <T> Index<(usize, usize, usize)> for Buffer<T> {
  type Output = T;
  fn index(&self, (x, y, z): (usize, usize, usize)) -> &T {
    self.get3(x, y, z).unwrap_or_else(|| panic!(
      "voxel ({x}, {y}, {z}) outside of {:?} buffer", self.dims.as_slice()
    ))
  }}

impl <T> IndexMut<(usize, usize, usize)> for Buffer<T> {
  fn index_mut(&mut self, (x, y, z): (usize, usize, usize)) -> &mut T {
    let dims = self.dims;
    self.get3_mut(x, y, z).unwrap_or_else(|| panic!(
      "voxel ({x}, {y}, {z}) outside of {:?} buffer", dims.as_slice()
    ))
  }}

impl <T> Debug for Buffer<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    use humansize::{FileSize, file_size_opts as options};

    let bytes = self.data.capacity() * std::mem::size_of::<T>();
    f.debug_struct("Buffer")
      .field("dims", &self.dims.as_slice())
      .field("sample", &std::any::type_name::<T>())
      .field("size", &bytes.file_size(options::BINARY).unwrap_or_else(|e| e))
      .finish()
  }
}
