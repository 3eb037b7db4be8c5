//! Command line argument parsing for the medc compiler.

use clap::Parser;
use std::{fs, path::Path, process};

/// Command line arguments for the medc compiler
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path of the Mediator program (or declarations JSON with --declarations),
    /// or "all" to process every example file
    #[arg(value_name = "PROGRAM")]
    pub program: String,

    /// Treat the input as a declarations JSON object (the output shape of the
    /// external semantic-extraction step) instead of Mediator source text
    #[arg(long)]
    pub declarations: bool,

    /// Write the generated program to <FILE>. If <FILE> is `-` (the default)
    /// stdout is used.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<String>,

    /// Write the canonical parse tree dump to <FILE> for diagnostics or for
    /// the external extraction step
    #[arg(long, value_name = "FILE")]
    pub dump_tree: Option<String>,

    /// Emit a full project (Cargo.toml + src/main.rs) under <DIR> instead of a
    /// single source file
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<String>,
}

impl Args {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn should_process_all(&self) -> bool {
        self.program == "all" || self.program == "--all"
    }

    /// Stem of the input path, used as the generated package name.
    pub fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown_program".into())
    }

    pub fn declarations(&self) -> bool {
        self.declarations
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn output_to_stdout(&self) -> bool {
        matches!(self.output.as_deref(), None | Some("-"))
    }

    pub fn dump_tree(&self) -> Option<&str> {
        self.dump_tree.as_deref()
    }

    pub fn project_dir(&self) -> Option<&str> {
        self.project_dir.as_deref()
    }
}

/// Get all .med files from the example directory, sorted alphabetically
pub fn get_example_files() -> Vec<std::path::PathBuf> {
    let example_dir = "example";

    if !Path::new(example_dir).exists() {
        eprintln!("Error: Directory '{}' not found", example_dir);
        process::exit(1);
    }

    let entries = match fs::read_dir(example_dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading example dir: {}", e);
            process::exit(1);
        }
    };

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("med") {
            files.push(path);
        }
    }

    files.sort();

    if files.is_empty() {
        eprintln!("No .med files found in {}", example_dir);
        process::exit(1);
    }

    files
}
