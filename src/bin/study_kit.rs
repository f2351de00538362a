//! Generate a Study Kit
//!
//! Reads notes from a text file and/or page images and prints the kit as
//! pretty JSON.
//!
//! Usage:
//!   cargo run --release --bin study_kit -- notes.txt
//!   cargo run --release --bin study_kit -- --image page1.png --image page2.png --tesseract
//!   cargo run --release --bin study_kit -- notes.txt --title "Cell Biology" --difficulty harder --embed
//!
//! Set `RUST_LOG=study_oxide=debug` to see stage timings.

use study_oxide::document::ImagePages;
use study_oxide::{Difficulty, KitGenerator, KitRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

struct CliConfig {
    input: Option<PathBuf>,
    images: Vec<PathBuf>,
    title: Option<String>,
    difficulty: Difficulty,
    embed: bool,
    tesseract: bool,
}

impl CliConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self {
            input: None,
            images: Vec::new(),
            title: None,
            difficulty: Difficulty::default(),
            embed: false,
            tesseract: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--title" => {
                    i += 1;
                    config.title = Some(value(&args, i, "--title")?.to_string());
                },
                "--difficulty" => {
                    i += 1;
                    config.difficulty = value(&args, i, "--difficulty")?
                        .parse()
                        .map_err(|e| format!("{}", e))?;
                },
                "--image" => {
                    i += 1;
                    config.images.push(PathBuf::from(value(&args, i, "--image")?));
                },
                "--embed" => config.embed = true,
                "--tesseract" => config.tesseract = true,
                "--help" | "-h" => return Err(usage()),
                other if other.starts_with("--") => {
                    return Err(format!("unknown option {}\n\n{}", other, usage()));
                },
                path => config.input = Some(PathBuf::from(path)),
            }
            i += 1;
        }

        if config.input.is_none() && config.images.is_empty() {
            return Err(usage());
        }
        Ok(config)
    }
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} expects a value", flag))
}

fn usage() -> String {
    "usage: study_kit [NOTES.txt] [--image PAGE]... [--title TITLE] \
     [--difficulty balanced|harder] [--embed] [--tesseract]"
        .to_string()
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let config = match CliConfig::from_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        },
    };

    let mut request = KitRequest::default().with_difficulty(config.difficulty);
    if let Some(title) = config.title {
        request = request.with_title(title);
    }
    if let Some(path) = &config.input {
        match std::fs::read_to_string(path) {
            Ok(text) => request = request.with_text(text),
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        }
    }
    if !config.images.is_empty() {
        match ImagePages::open(&config.images) {
            Ok(pages) => request = request.with_pages(Arc::new(pages)),
            Err(e) => {
                eprintln!("Error loading images: {}", e);
                return ExitCode::FAILURE;
            },
        }
    }

    let mut generator = KitGenerator::new();
    if config.embed {
        generator = generator.with_hashing_embedder();
    }
    if config.tesseract {
        generator = generator.with_tesseract();
    }
    generator.warm();

    let kit = match generator.generate(request).await {
        Ok(kit) => kit,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    match kit.to_json() {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
