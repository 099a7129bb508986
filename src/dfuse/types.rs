/// DFU suffix, the fixed 16-byte trailer at the end of every DFU file.
///
/// Carries the USB identification fields and the whole-file CRC. Kept around
/// after validation so callers can inspect the device/product/vendor IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfuSuffix {
    pub device: u16,
    pub product_id: u16,
    pub vendor_id: u16,
    pub dfu_spec: u16,
    pub signature: [u8; 3],
    pub length: u8,
    pub crc: u32,
}

/// DfuSe prefix, the fixed 11-byte header at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfuPrefix {
    pub signature: [u8; 5],
    pub version: u8,
    pub file_size: u32,
    pub image_count: u8,
}

/// One firmware image (a "target" in ST's terms), selected on the device via
/// its alternate setting. Elements are kept in file order; that order decides
/// extraction filenames and the merge base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub alternate_setting: u8,
    pub target_name: Option<String>,
    pub elements: Vec<ImageElement>,
}

/// One contiguous memory-addressed payload within an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageElement {
    pub address: u32,
    pub data: ElementData,
}

/// Element payload, either retained in memory or skipped over during a
/// headers-only decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementData {
    Loaded(Vec<u8>),
    Skipped { size: u32 },
}

impl ElementData {
    /// Payload length in bytes. For loaded payloads this is the actual byte
    /// count, which always matches the declared size once decoding succeeded.
    pub fn len(&self) -> usize {
        match self {
            ElementData::Loaded(data) => data.len(),
            ElementData::Skipped { size } => *size as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The payload bytes, or `None` when the decode skipped them.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            ElementData::Loaded(data) => Some(data),
            ElementData::Skipped { .. } => None,
        }
    }
}

impl ImageElement {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A fully decoded DfuSe file.
///
/// The suffix is `None` when suffix validation was skipped via
/// [`ReadConfig::skip_suffix`](crate::ReadConfig::skip_suffix). Non-fatal
/// conditions encountered during the decode are collected in `warnings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfuseFile {
    pub suffix: Option<DfuSuffix>,
    pub prefix: DfuPrefix,
    pub images: Vec<Image>,
    pub warnings: Vec<Warning>,
}

/// Non-fatal conditions surfaced alongside a successful decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// The suffix CRC did not match but the caller asked to proceed anyway.
    CrcIgnored { stored: u32, computed: u32 },
}
