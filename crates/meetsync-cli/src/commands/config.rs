//! `meetsync config`

use crate::config::CliConfig;
use crate::error::CliResult;

pub fn validate(config: &CliConfig) -> CliResult<()> {
    let providers = config.providers()?;
    if let Some(google) = &providers.google {
        google.validate().map_err(crate::error::CliError::Config)?;
        println!("google: ok (calendar {})", google.calendar_id);
    }
    if let Some(microsoft) = &providers.microsoft {
        microsoft.validate().map_err(crate::error::CliError::Config)?;
        println!("microsoft: ok");
    }
    if providers.google.is_none() && providers.microsoft.is_none() {
        println!("No provider configured.");
    } else {
        println!("Configuration is valid.");
    }
    Ok(())
}

pub fn path(config: &CliConfig) -> CliResult<()> {
    println!("config:      {}", CliConfig::default_path().display());
    println!("credentials: {}", config.credentials_path().display());
    Ok(())
}
