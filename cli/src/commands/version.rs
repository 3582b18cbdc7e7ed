//! Version command

use anyhow::{Context, Result};

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    if json {
        let out = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": version,
        });
        println!(
            "{}",
            serde_json::to_string(&out).context("JSON serialization failed")?
        );
    } else {
        println!("certrenewer {version}");
    }
    Ok(())
}
