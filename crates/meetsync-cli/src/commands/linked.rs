//! `meetsync linked`

use meetsync_core::UserId;

use crate::config::CliConfig;
use crate::error::CliResult;

pub async fn run(config: &CliConfig, user: UserId, json: bool) -> CliResult<()> {
    let registry = super::registry(config)?;
    let linked = registry.linked_kinds(user).await?;

    if json {
        return super::print_json(&linked);
    }
    for kind in registry.configured_kinds() {
        let state = if linked.contains(&kind) { "linked" } else { "not linked" };
        println!("{:<10} {state}", kind.as_str());
    }
    Ok(())
}
