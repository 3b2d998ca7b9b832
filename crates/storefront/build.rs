//! Build script for the storefront crate.
//!
//! Fingerprints the stylesheet so it can be served from an immutable URL
//! (`/static/css/derived/main.<hash>.css`).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Hex characters of the SHA-256 kept in the file name.
const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir = env::var_os("CARGO_MANIFEST_DIR").map_or_else(PathBuf::new, PathBuf::from);
    let css_dir = manifest_dir.join("static/css");

    let hash = fingerprint_css(&css_dir).unwrap_or_else(|e| {
        // Templates still compile; the stylesheet link 404s until this is fixed.
        println!("cargo:warning=Stylesheet not fingerprinted: {e}");
        String::new()
    });
    println!("cargo:rustc-env=CSS_HASH={hash}");
}

/// Copy `main.css` to `derived/main.<hash>.css` and return the hash.
fn fingerprint_css(css_dir: &Path) -> std::io::Result<String> {
    let source = css_dir.join("main.css");
    println!("cargo:rerun-if-changed={}", source.display());

    let content = fs::read(&source)?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let hash = digest.get(..HASH_LEN).unwrap_or(&digest).to_string();

    let derived_dir = css_dir.join("derived");
    fs::create_dir_all(&derived_dir)?;

    // Drop fingerprints of earlier versions
    for entry in fs::read_dir(&derived_dir)?.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("main.") && name.ends_with(".css") && name != format!("main.{hash}.css") {
            let _ = fs::remove_file(entry.path());
        }
    }

    fs::copy(&source, derived_dir.join(format!("main.{hash}.css")))?;
    Ok(hash)
}
