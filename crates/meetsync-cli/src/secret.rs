//! Secret references in configuration values.
//!
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - `pass::path/in/store` runs `pass show path/in/store` and keeps the first line
//! - anything else is used verbatim

use std::process::Command;

/// Expands a possibly-prefixed configuration value.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(var) = value.strip_prefix("env::") {
        std::env::var(var).map_err(|_| format!("environment variable `{var}` is not set"))
    } else if let Some(entry) = value.strip_prefix("pass::") {
        from_pass(entry)
    } else {
        Ok(value.to_string())
    }
}

fn from_pass(entry: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", entry])
        .output()
        .map_err(|e| format!("failed to run `pass show {entry}`: {e}"))?;

    if !output.status.success() {
        return Err(format!(
            "`pass show {entry}` exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {entry}` printed nothing"))
}
