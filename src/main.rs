use std::{fs, path::PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use env_logger::Env;

use dfuse::{extract_elements, extract_merged, read_file, write_metadata, ReadConfig};

#[derive(Parser)]
#[command(about = "Inspect and extract DfuSe firmware container files")]
struct Args {
    /// The DfuSe file to extract
    dfuse_file: PathBuf,

    /// List the images and image elements in the file (default)
    #[clap(long, conflicts_with_all = ["extract", "extract_single"])]
    list: bool,

    /// Extract each image's elements, one file per element, named
    /// 'image<image index>_element<element index>_0x<address>.bin'
    #[clap(long)]
    extract: bool,

    /// Merge each image's elements into one file positioned by address,
    /// named 'image<image index>_0x<base address>.bin'
    #[clap(long, conflicts_with = "extract")]
    extract_single: bool,

    /// Ignore CRC errors
    #[clap(long)]
    ignore_crc: bool,

    /// Save metadata to a JSON file (during list or extract)
    #[clap(long, value_name = "filename")]
    save_metadata: Option<PathBuf>,

    /// Directory to place extracted files in
    #[clap(short, long, default_value = ".")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let extracting = args.extract || args.extract_single;
    let mut config = ReadConfig::new();
    if args.ignore_crc {
        config = config.ignore_crc_errors();
    }
    if args.list || !extracting {
        // listing and metadata only need the structure, not the payloads
        config = config.headers_only();
    }

    let file = read_file(&args.dfuse_file, &config)?;

    if args.extract {
        let outputs = extract_elements(&file, &args.output);
        let mut failed = 0;
        for output in &outputs {
            match &output.result {
                Ok(()) => println!(
                    "Extracted image {}, element {} to {}",
                    output.image_index,
                    output.element_index,
                    output.path.display()
                ),
                Err(e) => {
                    eprintln!(
                        "Failed to extract image {}, element {}: {e}",
                        output.image_index, output.element_index
                    );
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} element(s) failed to extract", outputs.len());
        }
    } else if args.extract_single {
        let outputs = extract_merged(&file, &args.output)?;
        let mut failed = 0;
        for output in &outputs {
            match &output.result {
                Ok(()) => println!(
                    "Extracted image {} to {}",
                    output.image_index,
                    output.path.display()
                ),
                Err(e) => {
                    eprintln!("Failed to extract image {}: {e}", output.image_index);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} image(s) failed to extract", outputs.len());
        }
    } else {
        list(&file);
    }

    if let Some(path) = &args.save_metadata {
        let mut sink = fs::File::create(path)?;
        write_metadata(&file, &mut sink)?;
    }

    Ok(())
}

fn list(file: &dfuse::DfuseFile) {
    for (image_index, image) in file.images.iter().enumerate() {
        let name = match &image.target_name {
            Some(name) => format!(", target name '{name}'"),
            None => String::new(),
        };
        println!(
            "Image {image_index} (alternate setting = {:#X}{name}):",
            image.alternate_setting
        );
        for element in &image.elements {
            println!(
                "\tElement of {0:#X} ({0}) bytes at {1:#X}",
                element.size(),
                element.address
            );
        }
    }

    println!();
    println!("Hint: extract with '--extract'");
}
