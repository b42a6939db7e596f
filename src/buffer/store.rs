//! Named registry of buffers.
//!
//! Generators never reach for ambient state: they receive a `&mut BufferStore`, publish their
//! output under a name and hand back an [`ImageId`].

use {
  super::Buffer,
  crate::error::{Error, Result},
  anyhow::bail,
  std::collections::HashMap
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
  F32,
  I32,
  U16
}

/// A buffer of any supported sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
  F32(Buffer<f32>),
  I32(Buffer<i32>),
  U16(Buffer<u16>)
}

impl Image {
  pub fn data_type(&self) -> DataType {
    match self {
      Image::F32(_) => DataType::F32,
      Image::I32(_) => DataType::I32,
      Image::U16(_) => DataType::U16,
    }
  }

  pub fn dims(&self) -> super::Dims {
    match self {
      Image::F32(b) => b.dims(),
      Image::I32(b) => b.dims(),
      Image::U16(b) => b.dims(),
    }
  }
}

/// Sample types a [`BufferStore`] can hold.
pub trait Sample: Copy + Default + Send + Sync + 'static {
  const DATA_TYPE: DataType;
  fn wrap(buffer: Buffer<Self>) -> Image;
  fn unwrap_ref(image: &Image) -> Option<&Buffer<Self>>;
  fn unwrap_mut(image: &mut Image) -> Option<&mut Buffer<Self>>;
}

macro_rules! impl_sample {
  ($t: ty, $variant: ident) => {
    impl Sample for $t {
      const DATA_TYPE: DataType = DataType::$variant;
      fn wrap(buffer: Buffer<Self>) -> Image { Image::$variant(buffer) }
      fn unwrap_ref(image: &Image) -> Option<&Buffer<Self>> {
        match image { Image::$variant(b) => Some(b), _ => None }
      }
      fn unwrap_mut(image: &mut Image) -> Option<&mut Buffer<Self>> {
        match image { Image::$variant(b) => Some(b), _ => None }
      }
    }
    impl From<Buffer<$t>> for Image {
      fn from(buffer: Buffer<$t>) -> Self { Image::$variant(buffer) }
    }
  }
}
impl_sample!(f32, F32);
impl_sample!(i32, I32);
impl_sample!(u16, U16);

/// Handle to a store entry. Stale after the entry is deleted or replaced: a freed slot is reused
/// under a new generation, so stale handles never reach the new entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ImageId {
  slot: usize,
  generation: u32
}

struct Entry {
  name: String,
  image: Image
}

#[derive(Default)]
struct Slot {
  generation: u32,
  entry: Option<Entry>
}

#[derive(Default)]
pub struct BufferStore {
  slots: Vec<Slot>,
  free: Vec<usize>,
  names: HashMap<String, ImageId>
}

impl BufferStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Allocate a zero-filled buffer. An existing entry with the same name is replaced.
  pub fn create_buffer(&mut self, name: &str, dims: &[usize], data_type: DataType) -> Result<ImageId> {
    let image = match data_type {
      DataType::F32 => Image::F32(Buffer::new(dims)?),
      DataType::I32 => Image::I32(Buffer::new(dims)?),
      DataType::U16 => Image::U16(Buffer::new(dims)?),
    };
    Ok(self.insert(name, image))
  }

  /// Publish a fully computed buffer under `name`.
  pub fn insert(&mut self, name: &str, image: impl Into<Image>) -> ImageId {
    self.delete_buffer(name);
    let slot = match self.free.pop() {
      Some(slot) => slot,
      None => {
        self.slots.push(Slot::default());
        self.slots.len() - 1
      }
    };
    let image = image.into();
    log::debug!("store: `{name}` <- {:?} {:?}", image.data_type(), image.dims().as_slice());
    let entry = &mut self.slots[slot];
    entry.entry = Some(Entry { name: name.to_string(), image });
    let id = ImageId { slot, generation: entry.generation };
    self.names.insert(name.to_string(), id);
    id
  }

  pub fn get_buffer(&self, name: &str) -> Option<ImageId> {
    self.names.get(name).copied()
  }

  pub fn delete_buffer(&mut self, name: &str) -> bool {
    match self.names.remove(name) {
      Some(ImageId { slot, .. }) => {
        let entry = &mut self.slots[slot];
        entry.entry = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
        true
      },
      None => false
    }
  }

  pub fn name(&self, id: ImageId) -> Option<&str> {
    self.entry(id).map(|e| e.name.as_str())
  }

  pub fn image(&self, id: ImageId) -> Option<&Image> {
    self.entry(id).map(|e| &e.image)
  }

  pub fn get<T: Sample>(&self, id: ImageId) -> Result<&Buffer<T>> {
    let image = match self.image(id) {
      Some(image) => image,
      None => bail!(Error::UnknownBuffer(format!("{id:?}")))
    };
    match T::unwrap_ref(image) {
      Some(buffer) => Ok(buffer),
      None => bail!(Error::TypeMismatch { expected: T::DATA_TYPE, found: image.data_type() })
    }
  }

  pub fn get_mut<T: Sample>(&mut self, id: ImageId) -> Result<&mut Buffer<T>> {
    let image = match self.slots.get_mut(id.slot).filter(|s| s.generation == id.generation) {
      Some(Slot { entry: Some(entry), .. }) => &mut entry.image,
      _ => bail!(Error::UnknownBuffer(format!("{id:?}")))
    };
    let found = image.data_type();
    match T::unwrap_mut(image) {
      Some(buffer) => Ok(buffer),
      None => bail!(Error::TypeMismatch { expected: T::DATA_TYPE, found })
    }
  }

  /// Typed lookup by name.
  pub fn by_name<T: Sample>(&self, name: &str) -> Result<&Buffer<T>> {
    match self.get_buffer(name) {
      Some(id) => self.get(id),
      None => bail!(Error::UnknownBuffer(name.to_string()))
    }
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// Allocated slots, live or free.
  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  fn entry(&self, id: ImageId) -> Option<&Entry> {
    self.slots.get(id.slot)
      .filter(|s| s.generation == id.generation)
      .and_then(|s| s.entry.as_ref())
  }
}
