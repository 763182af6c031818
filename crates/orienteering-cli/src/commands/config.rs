use clap::Subcommand;
use orienteering_core::{Config, ConfigError};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, e.g. `race.penalty_per_minute` or `sync.offline`
    Get { key: String },
    /// Change one value and save
    Set { key: String, value: String },
    /// Print the whole configuration as JSON
    List,
    /// Print where the configuration file lives
    Path,
    /// Restore the default session, race rules and display settings
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            let saved = config.get(&key).unwrap_or(value);
            println!("{key} = {saved}");
        }
        ConfigAction::List => print_json(&Config::load()?)?,
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
