//! Synthetic DfuSe file construction for tests.

const SUFFIX_LEN: usize = 16;

/// Declarative description of one image in a synthetic file.
pub(crate) struct TestImage {
    pub alternate_setting: u8,
    pub target_name: Option<String>,
    /// Extra bytes written into the 255-byte name field after the name's NUL
    /// terminator (or at its start when unnamed), to prove they are ignored.
    pub name_field_tail: Option<Vec<u8>>,
    pub elements: Vec<(u32, Vec<u8>)>,
}

impl TestImage {
    pub fn new(alternate_setting: u8) -> Self {
        Self {
            alternate_setting,
            target_name: None,
            name_field_tail: None,
            elements: Vec::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.target_name = Some(name.to_owned());
        self
    }

    pub fn element(mut self, address: u32, data: &[u8]) -> Self {
        self.elements.push((address, data.to_vec()));
        self
    }
}

/// Builds prefix + images without the trailing suffix.
pub(crate) fn unsigned_body(images: &[TestImage]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"DfuSe");
    out.push(0x01);
    out.extend_from_slice(&[0; 4]); // file_size, patched below
    out.push(images.len() as u8);

    for image in images {
        out.extend_from_slice(b"Target");
        out.push(image.alternate_setting);
        out.extend_from_slice(&u32::from(image.target_name.is_some()).to_le_bytes());

        let mut name_field = [0u8; 255];
        let mut cursor = 0;
        if let Some(name) = &image.target_name {
            name_field[..name.len()].copy_from_slice(name.as_bytes());
            cursor = name.len() + 1;
        }
        if let Some(tail) = &image.name_field_tail {
            name_field[cursor..cursor + tail.len()].copy_from_slice(tail);
        }
        out.extend_from_slice(&name_field);

        let image_size: u32 = image
            .elements
            .iter()
            .map(|(_, data)| 8 + data.len() as u32)
            .sum();
        out.extend_from_slice(&image_size.to_le_bytes());
        out.extend_from_slice(&(image.elements.len() as u32).to_le_bytes());

        for (address, data) in &image.elements {
            out.extend_from_slice(&address.to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(data);
        }
    }

    let total = (out.len() + SUFFIX_LEN) as u32;
    out[6..10].copy_from_slice(&total.to_le_bytes());
    out
}

/// Appends a valid DFU suffix (including a freshly computed CRC) to a body.
pub(crate) fn sign(mut body: Vec<u8>) -> Vec<u8> {
    body.extend_from_slice(&0xFFFFu16.to_le_bytes()); // device
    body.extend_from_slice(&0xDF11u16.to_le_bytes()); // product id
    body.extend_from_slice(&0x0483u16.to_le_bytes()); // vendor id
    body.extend_from_slice(&0x011Au16.to_le_bytes()); // dfu spec
    body.extend_from_slice(b"UFD");
    body.push(SUFFIX_LEN as u8);
    let crc = crc32fast::hash(&body);
    body.extend_from_slice(&crc.to_le_bytes());
    body
}

/// Builds a complete, correctly signed DfuSe file.
pub(crate) fn build_file(images: &[TestImage]) -> Vec<u8> {
    sign(unsigned_body(images))
}
