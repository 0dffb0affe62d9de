// SPDX-License-Identifier: MIT

//! `hive config` -- configuration inspection (§6).

use std::path::PathBuf;

use hive_core::HiveConfig;

use crate::cli::ConfigCommand;
use crate::output::OutputFormat;

use super::resolve_project_root;

pub fn run(project_root: Option<PathBuf>, format: OutputFormat, command: ConfigCommand) -> anyhow::Result<()> {
    let project_root = resolve_project_root(project_root)?;

    match command {
        ConfigCommand::Show => {
            let config = HiveConfig::load(&project_root)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                OutputFormat::Text => println!("{}", serde_yaml::to_string(&config)?),
            }
            Ok(())
        }
        ConfigCommand::Validate => {
            let path = project_root.join(".trellis").join("hive-config.yaml");
            match HiveConfig::load(&project_root) {
                Ok(_) => {
                    println!("configuration is valid");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("configuration at {} is invalid:\n{e}", path.display());
                    Err(anyhow::anyhow!(e))
                }
            }
        }
    }
}
