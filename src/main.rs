//! imglabel command line converter.
//!
//! Loads one label file and saves it in the format implied by the output
//! suffix:
//!
//! ```text
//! imglabel <input> <output> [--size WxH] [--image PATH] [--classes FILE] [--verify]
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use imglabel::{AppConfig, ClassRegistry, ImageSize, LabelFile, LabelFileError, LoadOptions};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read class file {path:?}: {source}")]
    Classes {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Label(#[from] LabelFileError),
}

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Label file to read
    #[clap(value_parser)]
    input: PathBuf,

    /// Label file to write, format picked by suffix
    #[clap(value_parser)]
    output: PathBuf,

    /// Image size as WIDTHxHEIGHT, needed to read YOLO files
    #[clap(long, value_parser = parse_size)]
    size: Option<ImageSize>,

    /// Image the annotations belong to
    #[clap(long, value_parser)]
    image: Option<PathBuf>,

    /// Class list used to resolve and assign class indices
    #[clap(long, value_parser)]
    classes: Option<PathBuf>,

    /// Mark the written document as verified
    #[clap(long)]
    verify: bool,
}

fn parse_size(value: &str) -> Result<ImageSize, String> {
    let invalid = || format!("Invalid image size '{value}', must be given as WIDTHxHEIGHT");
    let (width, height) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = width.trim().parse().map_err(|_| invalid())?;
    let height = height.trim().parse().map_err(|_| invalid())?;
    let size = ImageSize::new(width, height);
    if size.is_valid() { Ok(size) } else { Err(invalid()) }
}

fn load_classes(path: &Path) -> Result<ClassRegistry, CliError> {
    ClassRegistry::load(path).map_err(|source| CliError::Classes {
        path: path.to_path_buf(),
        source,
    })
}

fn run(args: Args, config: &AppConfig) -> Result<PathBuf, CliError> {
    let classes_path = args
        .classes
        .clone()
        .or_else(|| config.preferences.predefined_classes.clone());
    let classes = match classes_path {
        Some(path) => load_classes(&path)?,
        None => ClassRegistry::new(),
    };

    let mut options = LoadOptions::new();
    if let Some(image) = &args.image {
        options = options.image_path(image.clone());
    }
    if let Some(size) = args.size {
        options = options.image_size(size);
    }

    let mut document = LabelFile::new()
        .with_classes(classes)
        .with_format(config.preferences.save_format)
        .with_style(config.preferences.default_style);
    document.decode_from(&args.input, &options)?;

    if args.verify && !document.verified {
        document.toggle_verify();
    }

    let records = document.shapes.clone();
    let written = document.save(&args.output, &records, None, None, None)?;
    Ok(written)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = AppConfig::load_from_default_path().unwrap_or_default();

    // RUST_LOG overrides the configured level
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_env("RUST_LOG")
        .init();

    match run(args, &config) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("imglabel: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_with_options() {
        let parsed = Args::try_parse_from([
            "imglabel", "a.xml", "--size", "640x480", "b.txt", "--classes", "classes.txt", "--verify",
        ])
        .unwrap();
        assert_eq!(parsed.input, PathBuf::from("a.xml"));
        assert_eq!(parsed.output, PathBuf::from("b.txt"));
        assert_eq!(parsed.size, Some(ImageSize::new(640, 480)));
        assert_eq!(parsed.classes, Some(PathBuf::from("classes.txt")));
        assert_eq!(parsed.image, None);
        assert!(parsed.verify);
    }

    #[test]
    fn test_parse_args_errors() {
        let cases: &[&[&str]] = &[
            &["imglabel", "a.xml"],
            &["imglabel", "a.xml", "b.txt", "c.json"],
            &["imglabel", "a.xml", "b.txt", "--size", "0x10"],
            &["imglabel", "a.xml", "b.txt", "--image"],
            &["imglabel", "a.xml", "b.txt", "--bogus"],
        ];
        for args in cases {
            assert!(Args::try_parse_from(*args).is_err(), "accepted {args:?}");
        }
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("10X20"), Ok(ImageSize::new(10, 20)));
        assert!(parse_size("10").is_err());
        assert!(parse_size("ax20").is_err());
        assert!(parse_size("0x20").unwrap_err().contains("WIDTHxHEIGHT"));
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_run_converts_voc_to_yolo() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("img.xml");
        std::fs::write(
            &input,
            "<annotation><size><width>100</width><height>50</height><depth>3</depth></size>\
             <object><name>cat</name><difficult>0</difficult>\
             <bndbox><xmin>10</xmin><ymin>10</ymin><xmax>30</xmax><ymax>20</ymax></bndbox>\
             </object></annotation>",
        )
        .unwrap();

        let parsed = Args {
            input,
            output: dir.path().join("img.txt"),
            size: None,
            image: None,
            classes: None,
            verify: false,
        };
        let written = run(parsed, &AppConfig::new()).unwrap();

        assert_eq!(written, dir.path().join("img.txt"));
        let text = std::fs::read_to_string(&written).unwrap();
        assert_eq!(text, "0 0.200000 0.300000 0.200000 0.200000\n");
        let classes = std::fs::read_to_string(dir.path().join("classes.txt")).unwrap();
        assert_eq!(classes.trim_end(), "cat");
    }
}
