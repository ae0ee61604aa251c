//! Build script for the cookbook binary.
//!
//! Copies the `.env.example` configuration template into the local data
//! directory (`<data dir>/cookbook/.env.example`), next to the `.env` file the
//! binary loads at startup. Every failure is reported as a cargo warning; the
//! template is a convenience and never breaks the build.

use std::{env, fs, path::PathBuf};

fn copy_template() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    if !env_example_path.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
        return Ok(());
    }

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("cookbook");
    fs::create_dir_all(&out_dir)?;
    fs::copy(&env_example_path, out_dir.join(".env.example"))?;
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=.env.example");

    if let Err(e) = copy_template() {
        println!("cargo:warning=could not install .env.example: {}", e);
    }
}
