//! `config` command handlers.

use std::path::PathBuf;

use treesync_core::config::EngineConfig;

use crate::cli::args::ConfigCommands;

/// Handle config subcommands.
/// Returns true on success, false on error
pub fn handle_config_command(command: ConfigCommands, mut config: EngineConfig) -> bool {
    match command {
        ConfigCommands::Show => match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                println!("{}", json);
                true
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        },

        ConfigCommands::Path => match EngineConfig::config_path() {
            Some(path) => {
                println!("{}", path.display());
                true
            }
            None => {
                eprintln!("✗ Could not determine config directory");
                false
            }
        },

        ConfigCommands::Set { key, value } => {
            if let Err(e) = apply(&mut config, &key, &value) {
                eprintln!("✗ {}", e);
                return false;
            }
            match config.save() {
                Ok(()) => {
                    println!("✓ Set {} = {}", key, value);
                    true
                }
                Err(e) => {
                    eprintln!("✗ Failed to save config: {}", e);
                    false
                }
            }
        }
    }
}

fn apply(config: &mut EngineConfig, key: &str, value: &str) -> Result<(), String> {
    fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
        value
            .parse()
            .map_err(|_| format!("Invalid value '{}' for {}", value, key))
    }

    match key {
        "default_root" => config.default_root = Some(PathBuf::from(value)),
        "poll_interval_ms" => config.poll_interval_ms = parse(key, value)?,
        "pause_when_unfocused" => config.pause_when_unfocused = parse(key, value)?,
        "show_hidden" => config.show_hidden = parse(key, value)?,
        "detect_repositories" => config.detect_repositories = parse(key, value)?,
        "position_gap" => {
            let gap: f64 = parse(key, value)?;
            if !(gap.is_finite() && gap > 0.0) {
                return Err(format!("position_gap must be positive, got {}", value));
            }
            config.position_gap = gap;
        }
        other => return Err(format!("Unknown config key '{}'", other)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = EngineConfig::default();
        apply(&mut config, "poll_interval_ms", "500").unwrap();
        apply(&mut config, "show_hidden", "true").unwrap();
        apply(&mut config, "default_root", "/notes").unwrap();
        assert_eq!(config.poll_interval_ms, 500);
        assert!(config.show_hidden);
        assert_eq!(config.default_root, Some(PathBuf::from("/notes")));
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = EngineConfig::default();
        assert!(apply(&mut config, "poll_interval_ms", "soon").is_err());
        assert!(apply(&mut config, "position_gap", "-1").is_err());
        assert!(apply(&mut config, "colour", "blue").is_err());
        assert_eq!(config, EngineConfig::default());
    }
}
