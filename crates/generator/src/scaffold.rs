//! Project scaffolding around a generated program.
//!
//! The runtime module is spliced from this crate's own `runtime.rs` source,
//! so the code generated into a program is exactly the code tested here.
//! A generated project is a self-contained cargo package with no
//! dependencies.

use crate::error::{GeneratorError, Result};
use proc_macro2::TokenStream;
use quote::quote;
use std::fs;
use std::path::Path;
use tracing::debug;

const RUNTIME_SRC: &str = include_str!("runtime.rs");

/// The runtime as a `pub mod runtime` item for the generated file.
pub fn runtime_module() -> Result<TokenStream> {
    let items: TokenStream = RUNTIME_SRC
        .parse()
        .map_err(|e: proc_macro2::LexError| GeneratorError::Render(e.to_string()))?;
    Ok(quote! {
        pub mod runtime {
            #items
        }
    })
}

/// Manifest of a generated project.
pub fn render_cargo_toml(name: &str) -> String {
    let mut doc = toml_edit::DocumentMut::new();
    doc["package"] = toml_edit::table();
    doc["package"]["name"] = toml_edit::value(name);
    doc["package"]["version"] = toml_edit::value("0.1.0");
    doc["package"]["edition"] = toml_edit::value("2021");
    doc["dependencies"] = toml_edit::table();
    doc.to_string()
}

/// Write a runnable cargo project for `program` under `dir`.
pub fn write_project(dir: &Path, name: &str, program: &str) -> Result<()> {
    let src = dir.join("src");
    fs::create_dir_all(&src)?;
    fs::write(dir.join("Cargo.toml"), render_cargo_toml(name))?;
    fs::write(src.join("main.rs"), program)?;
    debug!(project = name, dir = %dir.display(), "wrote generated project");
    Ok(())
}
