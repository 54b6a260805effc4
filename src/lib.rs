//! A FAT32 volume driver and CLI for inspecting and mutating a filesystem image
//! stored in a regular host file, without mounting it through the operating
//! system.
//!
//! Layers, leaf first: [`device`] (sector I/O) → [`bpb`] (volume geometry) →
//! [`fat`] (FAT chains) and [`cluster`] (cluster I/O) → [`entry`] (8.3 directory
//! entry codec) → [`dir`] (root directory) → [`volume`] (the five user-facing
//! operations). [`error`] is shared by every layer.

pub mod bpb;
pub mod cluster;
pub mod device;
pub mod dir;
pub mod entry;
pub mod error;
pub mod fat;
pub mod volume;

pub use device::ImageFile;
pub use error::{FatError, Result};
pub use volume::Volume;
