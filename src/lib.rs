//! DfuSe firmware container reader
//!
//! This library decodes the DfuSe file format, ST Microelectronics' extension
//! of the USB DFU file format, validates its structural and checksum
//! integrity, and exposes the decoded image/element tree for listing,
//! extraction to disk, and JSON metadata export.
//!
//! # Features
//! - DFU suffix validation with CRC-32 verification (optionally downgraded
//!   to a warning)
//! - DfuSe prefix, target prefix, and image element decoding
//! - Headers-only decoding for lightweight listing without payload retention
//! - Per-element extraction and per-image merge extraction
//! - JSON metadata export
//!
//! The format is read-only here; encoding DfuSe files and the DFU USB
//! transport are out of scope. All multi-byte fields are little-endian,
//! including the nested structures the format documentation claims are
//! big-endian.
//!
//! # Examples
//!
//! ## Listing a file's contents
//! ```no_run
//! use dfuse::{read_file, ReadConfig};
//!
//! fn main() -> dfuse::Result<()> {
//!     let file = read_file("firmware.dfu", &ReadConfig::new().headers_only())?;
//!     for image in &file.images {
//!         for element in &image.elements {
//!             println!("{} bytes at {:#x}", element.size(), element.address);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Extracting every element
//! ```no_run
//! use dfuse::{extract_elements, read_file, ReadConfig};
//!
//! fn main() -> dfuse::Result<()> {
//!     let file = read_file("firmware.dfu", &ReadConfig::new())?;
//!     for output in extract_elements(&file, ".".as_ref()) {
//!         output.result?;
//!     }
//!     Ok(())
//! }
//! ```

mod dfuse;
mod error;
mod extract;
mod metadata;
#[cfg(test)]
pub(crate) mod testutil;

pub use dfuse::{
    DfuPrefix, DfuSuffix, DfuseFile, ElementData, Image, ImageElement, PayloadMode, ReadConfig,
    Warning,
};
pub use error::{Error, Result};
pub use extract::{extract_elements, extract_merged, ElementOutput, ImageOutput};
pub use metadata::{write_metadata, ElementMetadata, ImageMetadata};

use std::path::Path;

/// Opens and decodes a DfuSe file from disk.
pub fn read_file(path: impl AsRef<Path>, config: &ReadConfig) -> Result<DfuseFile> {
    let mut file = std::fs::File::open(path)?;
    DfuseFile::from_reader(&mut file, config)
}
