use std::io::{ErrorKind, Read, Seek, SeekFrom};

use bytes::Buf;
use log::{debug, warn};

use crate::error::{Error, Result};

mod config;
mod types;

pub use config::*;
pub use types::*;

const SUFFIX_LEN: usize = 16;
const SUFFIX_CRC_LEN: usize = 4;
const SUFFIX_SIGNATURE: [u8; 3] = *b"UFD";
const PREFIX_LEN: usize = 11;
const PREFIX_SIGNATURE: [u8; 5] = *b"DfuSe";
const PREFIX_VERSION: u8 = 0x01;
const TARGET_PREFIX_LEN: usize = 274;
const TARGET_NAME_LEN: usize = 255;
const ELEMENT_HEADER_LEN: usize = 8;

impl DfuseFile {
    /// Decodes a complete DfuSe file from a seekable byte source.
    ///
    /// The suffix is validated first (unless skipped), then the prefix and the
    /// image tree are decoded in one sequential pass from offset 0. Any decode
    /// error aborts the whole read; every later structure's position depends
    /// on having consumed all prior bytes exactly.
    pub fn from_reader<R: Read + Seek>(source: &mut R, config: &ReadConfig) -> Result<Self> {
        let mut warnings = Vec::new();

        let suffix = if config.check_suffix {
            Some(read_suffix(source, config, &mut warnings)?)
        } else {
            source.seek(SeekFrom::Start(0))?;
            None
        };

        let prefix = read_prefix(source)?;
        debug!(
            "prefix: version {}, declared size {}, {} image(s)",
            prefix.version, prefix.file_size, prefix.image_count
        );

        let mut images = Vec::with_capacity(prefix.image_count as usize);
        for index in 0..prefix.image_count {
            let image = read_image(source, config)?;
            debug!(
                "image {index}: alternate setting {:#04x}, {} element(s)",
                image.alternate_setting,
                image.elements.len()
            );
            images.push(image);
        }

        Ok(Self {
            suffix,
            prefix,
            images,
            warnings,
        })
    }
}

/// Reads and validates the 16-byte DFU suffix from the end of the source,
/// then recomputes the whole-file CRC. Restores the read position to offset 0
/// before returning; downstream decoding assumes a fresh sequential read.
fn read_suffix<R: Read + Seek>(
    source: &mut R,
    config: &ReadConfig,
    warnings: &mut Vec<Warning>,
) -> Result<DfuSuffix> {
    let total_len = source.seek(SeekFrom::End(0))?;
    if total_len < SUFFIX_LEN as u64 {
        return Err(Error::UnexpectedEof {
            field: "DFU suffix",
            offset: total_len,
            needed: SUFFIX_LEN,
        });
    }
    let suffix_offset = total_len - SUFFIX_LEN as u64;
    source.seek(SeekFrom::Start(suffix_offset))?;

    let raw = read_block(source, SUFFIX_LEN, "DFU suffix")?;
    let mut buf = raw.as_slice();
    let device = buf.get_u16_le();
    let product_id = buf.get_u16_le();
    let vendor_id = buf.get_u16_le();
    let dfu_spec = buf.get_u16_le();
    let mut signature = [0u8; 3];
    buf.copy_to_slice(&mut signature);
    let length = buf.get_u8();
    let crc = buf.get_u32_le();

    if signature != SUFFIX_SIGNATURE {
        return Err(Error::SuffixSignatureMismatch {
            found: signature,
            // signature sits 8 bytes into the suffix
            offset: suffix_offset + 8,
        });
    }

    // The stored CRC covers every byte of the file except itself.
    source.seek(SeekFrom::Start(0))?;
    let mut covered = Vec::with_capacity(total_len as usize);
    source.read_to_end(&mut covered)?;
    covered.truncate(covered.len() - SUFFIX_CRC_LEN);
    let computed = crc32fast::hash(&covered);

    source.seek(SeekFrom::Start(0))?;

    if crc != computed {
        if config.ignore_crc_errors {
            warn!("suffix CRC mismatch ignored: stored {crc:#010x}, computed {computed:#010x}");
            warnings.push(Warning::CrcIgnored {
                stored: crc,
                computed,
            });
        } else {
            return Err(Error::SuffixCrcMismatch {
                stored: crc,
                computed,
            });
        }
    }

    Ok(DfuSuffix {
        device,
        product_id,
        vendor_id,
        dfu_spec,
        signature,
        length,
        crc,
    })
}

/// Reads the 11-byte DfuSe prefix from the current position (offset 0).
fn read_prefix<R: Read + Seek>(source: &mut R) -> Result<DfuPrefix> {
    let raw = read_block(source, PREFIX_LEN, "DfuSe prefix")?;
    let mut buf = raw.as_slice();
    let mut signature = [0u8; 5];
    buf.copy_to_slice(&mut signature);
    let version = buf.get_u8();
    let file_size = buf.get_u32_le();
    let image_count = buf.get_u8();

    if signature != PREFIX_SIGNATURE {
        return Err(Error::PrefixSignatureMismatch { found: signature });
    }
    if version != PREFIX_VERSION {
        return Err(Error::VersionMismatch { found: version });
    }

    Ok(DfuPrefix {
        signature,
        version,
        file_size,
        image_count,
    })
}

/// Reads one 274-byte target prefix and the elements it declares.
fn read_image<R: Read + Seek>(source: &mut R, config: &ReadConfig) -> Result<Image> {
    let raw = read_block(source, TARGET_PREFIX_LEN, "target prefix")?;
    let mut buf = raw.as_slice();
    // 6-byte "Target" signature, not validated
    buf.advance(6);
    let alternate_setting = buf.get_u8();
    let is_target_named = buf.get_u32_le();
    let mut name_field = [0u8; TARGET_NAME_LEN];
    buf.copy_to_slice(&mut name_field);
    // image_size is read but not enforced; element sizes are authoritative
    let _image_size = buf.get_u32_le();
    let element_count = buf.get_u32_le();

    // Boolean stored in 4 bytes: any nonzero value means the name is present.
    // When zero, the 255-byte name field is ignored outright.
    let target_name = if is_target_named != 0 {
        Some(c_string(&name_field))
    } else {
        None
    };

    let mut elements = Vec::with_capacity(element_count.min(1024) as usize);
    for _ in 0..element_count {
        elements.push(read_element(source, config)?);
    }

    Ok(Image {
        alternate_setting,
        target_name,
        elements,
    })
}

/// Reads one element: an 8-byte address/size header followed by exactly
/// `size` payload bytes, read or skipped per the configured payload mode.
fn read_element<R: Read + Seek>(source: &mut R, config: &ReadConfig) -> Result<ImageElement> {
    let raw = read_block(source, ELEMENT_HEADER_LEN, "element header")?;
    let mut buf = raw.as_slice();
    let address = buf.get_u32_le();
    let size = buf.get_u32_le();

    let data = match config.payload_mode {
        PayloadMode::Load => {
            ElementData::Loaded(read_block(source, size as usize, "element payload")?)
        }
        PayloadMode::Skip => {
            skip_payload(source, size)?;
            ElementData::Skipped { size }
        }
    };

    Ok(ImageElement { address, data })
}

/// Takes the bytes up to the first NUL and decodes them as text.
fn c_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Reads exactly `len` bytes, mapping a short read to a typed EOF error that
/// records the field being decoded and the offset it started at.
fn read_block<R: Read + Seek>(source: &mut R, len: usize, field: &'static str) -> Result<Vec<u8>> {
    let offset = source.stream_position()?;
    let mut block = vec![0u8; len];
    source.read_exact(&mut block).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::UnexpectedEof {
                field,
                offset,
                needed: len,
            }
        } else {
            Error::Io(e)
        }
    })?;
    Ok(block)
}

/// Skips `size` payload bytes with a relative seek, failing on truncation
/// rather than seeking past the end of the source.
fn skip_payload<R: Read + Seek>(source: &mut R, size: u32) -> Result<()> {
    let offset = source.stream_position()?;
    let end = source.seek(SeekFrom::End(0))?;
    if u64::from(size) > end - offset {
        return Err(Error::UnexpectedEof {
            field: "element payload",
            offset,
            needed: size as usize,
        });
    }
    source.seek(SeekFrom::Start(offset + u64::from(size)))?;
    Ok(())
}
