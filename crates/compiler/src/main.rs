//! medc command line entry point.

use clap::Parser;
use common::{get_example_files, Args, BatchReport};
use medc::{compile_declarations_json, compile_source, Compilation};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    if args.should_process_all() {
        process_all();
    } else if let Err(e) = process_one(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn process_one(args: &Args) -> Result<(), Box<dyn Error>> {
    let input = fs::read_to_string(args.program())?;
    let compilation: Compilation = if args.declarations() {
        compile_declarations_json(&input)?
    } else {
        compile_source(&input)?
    };
    info!(
        "compiled {}: {}",
        args.program(),
        compilation.declarations().summary()
    );

    if let Some(path) = args.dump_tree() {
        match compilation.tree() {
            Some(tree) => {
                fs::write(path, tree.pretty())?;
                info!("wrote parse tree dump to {}", path);
            }
            None => info!("declarations input carries no parse tree; dump skipped"),
        }
    }

    if let Some(dir) = args.project_dir() {
        let name = args.program_name();
        generator::scaffold::write_project(Path::new(dir), &name, compilation.program())?;
        info!("wrote project '{}' under {}", name, dir);
        return Ok(());
    }

    if args.output_to_stdout() {
        print!("{}", compilation.program());
    } else if let Some(path) = args.output() {
        fs::write(path, compilation.program())?;
        info!("wrote generated program to {}", path);
    }
    Ok(())
}

fn process_all() {
    let files = get_example_files();
    let mut report = BatchReport::new(files.len());
    for file in &files {
        let name = file.display().to_string();
        match fs::read_to_string(file) {
            Err(e) => report.failed(&name, &e.to_string()),
            Ok(source) => match compile_source(&source) {
                Ok(compilation) => {
                    report.compiled(&name, &compilation.declarations().summary())
                }
                Err(e) => report.failed(&name, &e.to_string()),
            },
        }
    }
    if !report.finish() {
        process::exit(1);
    }
}
