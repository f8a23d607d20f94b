use std::{env, fs, io};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ShellError;

const LOG_ENV: &str = "SHELLFYRE_LOG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
	pub name: String,
	pub max_line: usize,
	pub history_file: PathBuf,
	pub history_size: usize,
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Config {
		let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
		Config {
			name: "shellfyre".to_string(),
			max_line: 4096,
			history_file: home.join(".dir_history"),
			history_size: 10,
			log_level: "warn".to_string(),
		}
	}
}

impl Config {
	pub fn path() -> Option<PathBuf> {
		dirs::config_dir().map(|d| d.join("shellfyre").join("config.toml"))
	}

	/// Reads the user's config file; a missing file yields the defaults.
	pub fn load() -> Result<Config, ShellError> {
		let mut config = match Config::path() {
			Some(path) => Config::from_file(&path)?,
			None => Config::default(),
		};
		if let Ok(level) = env::var(LOG_ENV) {
			config.log_level = level;
		}
		Ok(config)
	}

	pub fn from_file(path: &Path) -> Result<Config, ShellError> {
		match fs::read_to_string(path) {
			Ok(text) => Config::from_toml(&text),
			Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
			Err(e) => Err(e.into()),
		}
	}

	pub fn from_toml(text: &str) -> Result<Config, ShellError> {
		let config: Config = toml::from_str(text)?;
		if config.max_line == 0 {
			return Err(ShellError::ConfigError("max_line must be positive".to_string()));
		}
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_file_keeps_defaults() {
		let c = Config::from_toml("name = \"fyre\"\nhistory_size = 3\n").unwrap();
		assert_eq!(c.name, "fyre");
		assert_eq!(c.history_size, 3);
		assert_eq!(c.max_line, 4096);
		assert_eq!(c.log_level, "warn");
	}

	#[test]
	fn rejects_zero_line_bound() {
		assert!(Config::from_toml("max_line = 0").is_err());
	}

	#[test]
	fn missing_file_is_default() {
		let dir = tempfile::tempdir().unwrap();
		let c = Config::from_file(&dir.path().join("nope.toml")).unwrap();
		assert_eq!(c.name, "shellfyre");
	}
}
