use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::ConfigLoader;
use crate::results;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the merged configuration as TOML
    Show {
        /// Extra config file layered over the user and project files
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the config layers in merge order and where results would go
    Path {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show { config } => {
            let merged = ConfigLoader::load(config.as_deref())?;
            print!("{}", toml::to_string_pretty(&merged)?);
        }
        ConfigCommands::Path { config } => {
            for line in layer_report(config.as_deref())? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn layer_report(explicit: Option<&Path>) -> Result<Vec<String>> {
    let merged = ConfigLoader::load(explicit)?;
    let layers = [
        ("user", ConfigLoader::user_config_path()),
        ("project", Some(ConfigLoader::project_config_path())),
        ("explicit", explicit.map(Path::to_path_buf)),
    ];

    let mut lines: Vec<String> = layers
        .into_iter()
        .map(|(label, path)| match path {
            Some(path) => {
                let state = if path.exists() { "loaded" } else { "absent" };
                format!("{label:<9}{} ({state})", path.display())
            }
            None => format!("{label:<9}-"),
        })
        .collect();
    lines.push(format!(
        "{:<9}{}",
        "results",
        results::output_dir(&merged).display()
    ));
    Ok(lines)
}
