//! Embeds `SHEETKEEPER_REVISION` (git revision, `-dirty` if the tree has
//! local edits) and `SHEETKEEPER_BUILT_AT` (UTC date of the build).

use std::path::Path;
use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn main() {
    let revision = git(&["describe", "--always", "--dirty", "--abbrev=10"])
        .unwrap_or_else(|| "untracked".to_string());
    let built_at = chrono::Utc::now().format("%Y-%m-%d").to_string();

    println!("cargo:rustc-env=SHEETKEEPER_REVISION={}", revision);
    println!("cargo:rustc-env=SHEETKEEPER_BUILT_AT={}", built_at);

    // Rebuild when HEAD moves; not on every build
    let head = Path::new("../.git/HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }
    println!("cargo:rerun-if-changed=build.rs");
}
