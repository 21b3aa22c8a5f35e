use std::path::Path;

use anyhow::Result;
use case_digest::config::{self, DigestConfig};

/// `config show` — the effective configuration as TOML.
pub fn run_show(config: &DigestConfig) -> Result<()> {
    let mut shown = config.clone();
    // Never echo the key itself
    if shown.summarizer.api_key.is_some() {
        shown.summarizer.api_key = Some("********".into());
    }
    print!("{}", shown.to_toml()?);
    Ok(())
}

/// `config path` — where the configuration is read from.
pub fn run_path(explicit: Option<&Path>) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);
    let state = if path.exists() { "" } else { " (not found, defaults in use)" };
    println!("{}{}", path.display(), state);
    Ok(())
}
