//! Synthetic image generators for optical simulations.
//!
//! Every generator fills a [`Buffer`](buffer::Buffer), a dense 1 to 3 axis array stored
//! x-fastest. Generators come in two flavours: plain functions returning or filling a buffer,
//! and `create_*` wrappers publishing the result under a name in a
//! [`BufferStore`](buffer::BufferStore).
//!
//! - [`raster`]: disks with sub-pixel anti-aliasing, Fourier-perturbed disks, hexagons;
//! - [`pupil`]: hexagonal segmented pupils, with segment influence functions and piston errors;
//! - [`voronoi`]: region maps from a seed file, with carved gaps;
//! - [`random`]: noise images;
//! - [`pattern`]: closed-form images (gaussians, slopes, sectors, apodized pupils, ...);
//! - [`drawing`]: conversion to `image` buffers (requires `drawing` feature).
//!
//! # Basic usage
//! ```
//! # use image_gen::{
//! #   buffer::BufferStore,
//! #   error::Result,
//! #   geometry::{Disk, P2},
//! #   pupil::{create_hex_pupil, HexPupilConfig},
//! #   raster::create_subpixel_disk
//! # };
//! # fn main() -> Result<()> {
//! let mut store = BufferStore::new();
//!
//! // 256x256 disk of radius 80 px, edge pixels hold their covered fraction
//! let disk = create_subpixel_disk(&mut store, "disk", 256, 256, Disk::new(P2::new(128.0, 128.0), 80.0))?;
//! assert!(store.get::<f32>(disk)?.sum() > 0.0);
//!
//! /* Segmented pupil: 256 px wide, aperture radius 100 px, 1 px gaps, lattice step 20 px.
//!    Publishes "pupil" (segment numbers), "pupil_if" (influence functions). */
//! let ids = create_hex_pupil(&mut store, "pupil", &HexPupilConfig::new(256, 100.0, 1.0, 20.0))?;
//! assert!(ids.segment_count > 0);
//! assert!(store.get_buffer("pupil_if").is_some());
//! #   Ok(())
//! # }
//! ```
//!
//! # Logging
//! Progress and recoverable oddities (ignored trailing lines in a seed file, a double star
//! companion outside the image, a pupil without segments) go through the [`log`] facade.
//! Install any logger to see them.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod buffer;
pub mod geometry;
pub mod raster;
pub mod pupil;
pub mod voronoi;
pub mod random;
pub mod pattern;
#[cfg(feature = "drawing")]
#[cfg_attr(docsrs, doc(cfg(feature = "drawing")))]
pub mod drawing;
