use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use crate::bucket::parse_timezone;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub report: ReportConfig,
    pub formatting: FormattingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub concurrency: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReportConfig {
    /// IANA timezone name. Empty means the host's timezone.
    pub timezone: String,
    pub pad_minutes: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FormattingConfig {
    pub number_comma: bool,
    pub number_human: bool,
    pub locale: String,
    pub decimal_places: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                url: "https://core.bloxberg.org".to_string(),
                timeout_seconds: 30,
                concurrency: 8,
            },
            report: ReportConfig {
                timezone: "".to_string(),
                pad_minutes: false,
            },
            formatting: FormattingConfig {
                number_comma: false,
                number_human: false,
                locale: "en".to_string(),
                decimal_places: 2,
            },
        }
    }
}

thread_local! {
    static TEST_CONFIG_PATH: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

#[cfg(test)]
pub fn set_test_config_path(path: PathBuf) {
    TEST_CONFIG_PATH.with(|p| *p.borrow_mut() = Some(path));
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(test)]
        {
            if let Some(path) = TEST_CONFIG_PATH.with(|p| p.borrow().clone()) {
                return Ok(path);
            }
        }

        Ok(dirs::home_dir()
            .context("Could not find home directory")?
            .join(".txclock.toml"))
    }

    pub fn load() -> Result<Option<Config>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(Some(config))
    }

    pub fn save(&self, silent: bool) -> Result<()> {
        let config_path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;

        if !silent {
            println!("✅ Configuration saved to: {}", config_path.display());
        }

        Ok(())
    }

    /// Configured timezone, `None` when the host zone should be used.
    pub fn timezone(&self) -> Option<&str> {
        let tz = self.report.timezone.trim();
        (!tz.is_empty()).then_some(tz)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .context("Invalid boolean value. Use 'true' or 'false'")
}

// CLI helper functions
pub fn create_default_config(overwrite: bool) -> Result<()> {
    let config = Config::default();
    if !std::fs::exists(Config::config_path()?)? || overwrite {
        config.save(true)?;

        println!("📝 Created default configuration file.");
        println!("📍 Point it at your node with:");
        println!("   txclock config set node-url https://...");
        println!("or edit");
        println!("   {}", Config::config_path()?.display());
    } else {
        println!("Configuration already exists.  Pass `--overwrite` to overwrite.");
    }

    Ok(())
}

pub fn show_config() -> Result<()> {
    match Config::load()? {
        Some(config) => {
            println!("🔧 Current configuration:");
            println!("   Node URL: {}", config.node.url);
            println!("   Timeout (s): {}", config.node.timeout_seconds);
            println!("   Concurrency: {}", config.node.concurrency);
            println!(
                "   Timezone: {}",
                config.timezone().unwrap_or("host default")
            );
            println!("   Pad Minutes: {}", config.report.pad_minutes);
            println!("   Number Comma: {}", config.formatting.number_comma);
            println!("   Number Human: {}", config.formatting.number_human);
            println!("   Locale: {}", config.formatting.locale);
            println!("   Decimal Places: {}", config.formatting.decimal_places);
        }
        None => {
            println!("❌ No configuration file found.");
            println!("   Run 'txclock config init' to create one.");
        }
    }
    Ok(())
}

pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?.unwrap_or_default();

    match key {
        "node-url" => config.node.url = value.to_string(),
        "timeout-seconds" => {
            config.node.timeout_seconds = value.parse::<u64>().context("Invalid number value")?;
        }
        "concurrency" => {
            let concurrency = value.parse::<usize>().context("Invalid number value")?;
            if concurrency == 0 {
                anyhow::bail!("Concurrency must be at least 1");
            }
            config.node.concurrency = concurrency;
        }
        "timezone" => {
            if !value.is_empty() {
                parse_timezone(value)?;
            }
            config.report.timezone = value.to_string();
        }
        "pad-minutes" => config.report.pad_minutes = parse_bool(value)?,
        "number-comma" => config.formatting.number_comma = parse_bool(value)?,
        "number-human" => config.formatting.number_human = parse_bool(value)?,
        "locale" => {
            config.formatting.locale = value.to_string();
        }
        "decimal-places" => {
            let places = value.parse::<usize>().context("Invalid number value")?;
            config.formatting.decimal_places = places;
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    }

    config.save(false)?;
    Ok(())
}
