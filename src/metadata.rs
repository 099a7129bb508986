use std::io::Write;

use serde::Serialize;

use crate::dfuse::{DfuseFile, Image, ImageElement};
use crate::error::Result;

// Field declaration order is alphabetical so the serialized keys come out
// sorted. `target_name` is omitted entirely when absent, not emitted as null.

#[derive(Debug, Serialize)]
pub struct ImageMetadata<'a> {
    pub alternate_setting: u8,
    pub elements: Vec<ElementMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ElementMetadata {
    pub address: u32,
    pub size: usize,
}

/// Writes the decoded image tree as one JSON array to `sink`, followed by a
/// trailing newline. Element sizes reflect the decoded payload lengths, so
/// the metadata always matches what extraction would write.
pub fn write_metadata<W: Write>(file: &DfuseFile, sink: &mut W) -> Result<()> {
    let records: Vec<ImageMetadata> = file.images.iter().map(image_metadata).collect();
    serde_json::to_writer(&mut *sink, &records)?;
    sink.write_all(b"\n")?;
    Ok(())
}

fn image_metadata(image: &Image) -> ImageMetadata<'_> {
    ImageMetadata {
        alternate_setting: image.alternate_setting,
        elements: image.elements.iter().map(element_metadata).collect(),
        target_name: image.target_name.as_deref(),
    }
}

fn element_metadata(element: &ImageElement) -> ElementMetadata {
    ElementMetadata {
        address: element.address,
        size: element.size(),
    }
}
