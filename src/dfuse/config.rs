/// Whether element payloads are read into memory or skipped with a relative
/// seek. Skipping supports lightweight listing without data retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadMode {
    #[default]
    Load,
    Skip,
}

/// Decode-time configuration.
#[derive(Debug, Clone)]
pub struct ReadConfig {
    pub ignore_crc_errors: bool,
    pub check_suffix: bool,
    pub payload_mode: PayloadMode,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            ignore_crc_errors: false,
            check_suffix: true,
            payload_mode: PayloadMode::Load,
        }
    }
}

impl ReadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downgrade a suffix CRC mismatch from a fatal error to a
    /// [`Warning::CrcIgnored`](super::Warning::CrcIgnored).
    pub fn ignore_crc_errors(mut self) -> Self {
        self.ignore_crc_errors = true;
        self
    }

    /// Skip suffix validation entirely; the decoded tree carries no suffix.
    pub fn skip_suffix(mut self) -> Self {
        self.check_suffix = false;
        self
    }

    /// Decode structure only, skipping over element payloads.
    pub fn headers_only(mut self) -> Self {
        self.payload_mode = PayloadMode::Skip;
        self
    }
}
