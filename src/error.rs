use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("suffix signature mismatch at offset {offset}: expected \"UFD\", found {found:?}")]
    SuffixSignatureMismatch { found: [u8; 3], offset: u64 },

    #[error("suffix CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    SuffixCrcMismatch { stored: u32, computed: u32 },

    #[error("prefix signature mismatch: expected \"DfuSe\", found {found:?}")]
    PrefixSignatureMismatch { found: [u8; 5] },

    #[error("unsupported DfuSe version: expected 1, found {found}")]
    VersionMismatch { found: u8 },

    #[error("unexpected end of file at offset {offset}: {needed} bytes required for {field}")]
    UnexpectedEof {
        field: &'static str,
        offset: u64,
        needed: usize,
    },

    #[error("image {image_index} has no elements, merge base address is undefined")]
    EmptyImage { image_index: usize },

    #[error("metadata serialization error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
