use log::LevelFilter;
use simplelog::{ColorChoice, SimpleLogger, TermLogger, TerminalMode};

pub fn level_from_str(level: &str) -> LevelFilter {
	level.parse().unwrap_or(LevelFilter::Warn)
}

/// Installs the global logger on stderr. Failure here is not worth stopping
/// the shell for.
pub fn init(level: &str) {
	let level = level_from_str(level);
	let config = simplelog::ConfigBuilder::new()
		.set_time_level(LevelFilter::Off)
		.build();
	if TermLogger::init(level, config.clone(), TerminalMode::Stderr, ColorChoice::Auto).is_err() {
		let _ = SimpleLogger::init(level, config);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_level_falls_back_to_warn() {
		assert_eq!(level_from_str("debug"), LevelFilter::Debug);
		assert_eq!(level_from_str("OFF"), LevelFilter::Off);
		assert_eq!(level_from_str("loud"), LevelFilter::Warn);
	}
}
