use std::fs::File;
use std::io::{self, ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::dfuse::{DfuseFile, Image, ImageElement};
use crate::error::{Error, Result};

/// Outcome of writing one element to its own file.
#[derive(Debug)]
pub struct ElementOutput {
    pub image_index: usize,
    pub element_index: usize,
    pub path: PathBuf,
    pub result: io::Result<()>,
}

/// Outcome of merging one image's elements into a single file.
#[derive(Debug)]
pub struct ImageOutput {
    pub image_index: usize,
    pub base_address: u32,
    pub path: PathBuf,
    pub result: io::Result<()>,
}

/// Writes every element to its own file,
/// named `image{i}_element{j}_0x{ADDR}.bin`.
///
/// Each write is independent: a failure is recorded in that element's outcome
/// and extraction continues with the next element.
pub fn extract_elements(file: &DfuseFile, out_dir: &Path) -> Vec<ElementOutput> {
    let mut outputs = Vec::new();
    for (image_index, image) in file.images.iter().enumerate() {
        for (element_index, element) in image.elements.iter().enumerate() {
            let path = out_dir.join(format!(
                "image{image_index}_element{element_index}_0x{:X}.bin",
                element.address
            ));
            let result = write_element(&path, element);
            match &result {
                Ok(()) => info!(
                    "extracted image {image_index}, element {element_index} to {}",
                    path.display()
                ),
                Err(e) => error!(
                    "failed to extract image {image_index}, element {element_index} to {}: {e}",
                    path.display()
                ),
            }
            outputs.push(ElementOutput {
                image_index,
                element_index,
                path,
                result,
            });
        }
    }
    outputs
}

/// Merges each image's elements into one flat binary,
/// named `image{i}_0x{BASE}.bin`.
///
/// The base is the lowest element address in the image; every element is
/// written at absolute offset `address - base`. Gaps between elements are
/// zero-filled (the sparse-write behavior of seeking past the end of a
/// regular file). Overlapping elements are last-write-wins in decode order.
///
/// An image with no elements has no base address; the whole run fails with
/// [`Error::EmptyImage`] before any output file is opened. Write failures,
/// by contrast, only abort the affected image's output.
pub fn extract_merged(file: &DfuseFile, out_dir: &Path) -> Result<Vec<ImageOutput>> {
    let mut bases = Vec::with_capacity(file.images.len());
    for (image_index, image) in file.images.iter().enumerate() {
        match image.elements.iter().map(|e| e.address).min() {
            Some(base) => bases.push(base),
            None => return Err(Error::EmptyImage { image_index }),
        }
    }

    let mut outputs = Vec::new();
    for (image_index, (image, base)) in file.images.iter().zip(bases).enumerate() {
        let path = out_dir.join(format!("image{image_index}_0x{base:X}.bin"));
        let result = write_merged(&path, image, base);
        match &result {
            Ok(()) => info!("extracted image {image_index} to {}", path.display()),
            Err(e) => error!(
                "failed to extract image {image_index} to {}: {e}",
                path.display()
            ),
        }
        outputs.push(ImageOutput {
            image_index,
            base_address: base,
            path,
            result,
        });
    }
    Ok(outputs)
}

fn write_element(path: &Path, element: &ImageElement) -> io::Result<()> {
    std::fs::write(path, payload(element)?)
}

fn write_merged(path: &Path, image: &Image, base: u32) -> io::Result<()> {
    let mut sink = File::create(path)?;
    for element in &image.elements {
        sink.seek(SeekFrom::Start(u64::from(element.address - base)))?;
        sink.write_all(payload(element)?)?;
    }
    Ok(())
}

fn payload(element: &ImageElement) -> io::Result<&[u8]> {
    element.data.bytes().ok_or_else(|| {
        io::Error::new(
            ErrorKind::InvalidInput,
            "element payload was skipped during decoding",
        )
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;

    use super::*;
    use crate::dfuse::ReadConfig;
    use crate::testutil::{build_file, TestImage};

    fn decode(images: &[TestImage]) -> DfuseFile {
        let raw = build_file(images);
        DfuseFile::from_reader(&mut Cursor::new(raw), &ReadConfig::new()).unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dfuse-rs-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn per_element_filenames_and_contents() {
        let file = decode(&[
            TestImage::new(0).element(0x0800_0000, b"aaaa").element(0xBEEF, b"bb"),
            TestImage::new(1).element(0x42, b"c"),
        ]);
        let dir = temp_dir("per-element");

        let outputs = extract_elements(&file, &dir);

        assert_eq!(outputs.len(), 3);
        assert!(outputs.iter().all(|o| o.result.is_ok()));
        assert_eq!(
            fs::read(dir.join("image0_element0_0x8000000.bin")).unwrap(),
            b"aaaa"
        );
        assert_eq!(
            fs::read(dir.join("image0_element1_0xBEEF.bin")).unwrap(),
            b"bb"
        );
        assert_eq!(fs::read(dir.join("image1_element0_0x42.bin")).unwrap(), b"c");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn zero_size_element_extracts_as_empty_file() {
        let file = decode(&[TestImage::new(0).element(0x1000, b"")]);
        let dir = temp_dir("zero-size");

        let outputs = extract_elements(&file, &dir);

        assert!(outputs[0].result.is_ok());
        assert_eq!(fs::read(dir.join("image0_element0_0x1000.bin")).unwrap(), b"");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn merge_positions_elements_by_address_offset() {
        let file = decode(&[
            TestImage::new(0)
                .element(0x1000, b"\xAA\xAA\xAA\xAA")
                .element(0x1008, b"\xBB\xBB\xBB\xBB"),
        ]);
        let dir = temp_dir("merge");

        let outputs = extract_merged(&file, &dir).unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].base_address, 0x1000);
        assert!(outputs[0].result.is_ok());

        let merged = fs::read(dir.join("image0_0x1000.bin")).unwrap();
        assert!(merged.len() >= 12);
        assert_eq!(&merged[0..4], b"\xAA\xAA\xAA\xAA");
        // the 4-byte gap is zero-filled
        assert_eq!(&merged[4..8], &[0, 0, 0, 0]);
        assert_eq!(&merged[8..12], b"\xBB\xBB\xBB\xBB");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn merge_base_is_lowest_address_not_first_element() {
        let file = decode(&[
            TestImage::new(0).element(0x2000, b"high").element(0x1000, b"low!"),
        ]);
        let dir = temp_dir("merge-base");

        let outputs = extract_merged(&file, &dir).unwrap();

        assert_eq!(outputs[0].base_address, 0x1000);
        let merged = fs::read(dir.join("image0_0x1000.bin")).unwrap();
        assert_eq!(&merged[0..4], b"low!");
        assert_eq!(&merged[0x1000..0x1004], b"high");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn merge_overlap_is_last_write_wins() {
        let file = decode(&[
            TestImage::new(0).element(0x1000, b"XXXX").element(0x1002, b"YY"),
        ]);
        let dir = temp_dir("merge-overlap");

        extract_merged(&file, &dir).unwrap();

        let merged = fs::read(dir.join("image0_0x1000.bin")).unwrap();
        assert_eq!(&merged[..], b"XXYY");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn merge_fails_fast_on_empty_image() {
        let file = decode(&[
            TestImage::new(0).element(0x1000, b"data"),
            TestImage::new(1),
        ]);
        let dir = temp_dir("merge-empty");

        let err = extract_merged(&file, &dir).unwrap_err();

        assert!(matches!(err, Error::EmptyImage { image_index: 1 }));
        // fails before any sink is opened
        assert!(!dir.join("image0_0x1000.bin").exists());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn element_write_failures_are_independent() {
        let file = decode(&[
            TestImage::new(0).element(0x1, b"a").element(0x2, b"b"),
        ]);
        // nonexistent directory, every write fails but all are attempted
        let dir = temp_dir("independent").join("missing");

        let outputs = extract_elements(&file, &dir);

        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().all(|o| o.result.is_err()));
    }
}
