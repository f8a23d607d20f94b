use std::io::{self, Write};

use log::debug;

use shellfyre::config::Config;
use shellfyre::error::ShellError;
use shellfyre::input::{self, Outcome};
use shellfyre::types::Status;
use shellfyre::{eval, global, logging, parser};

fn main() {
	let config = Config::load().unwrap_or_else(|e| {
		eprintln!("shellfyre: {}; using defaults", e);
		Config::default()
	});
	logging::init(&config.log_level);
	eval::ignore_job_signals();

	let mut state = global::State::new(config);
	loop {
		state.job_set.reap();
		let prompt = state.prompt();
		let line = match input::read_line(&mut state.editor, &prompt) {
			Ok((_, Outcome::Exit)) => break,
			Ok((line, outcome)) => {
				debug!("read {:?} ({:?})", line, outcome);
				line
			},
			Err(e @ ShellError::LineTooLong(_)) => {
				eprintln!("{}: {}", state.config.name, e);
				continue;
			},
			// the terminal itself is gone
			Err(e) => {
				eprintln!("{}: {}", state.config.name, e);
				break;
			},
		};

		let command = parser::parse(&line);
		if eval::eval(&mut state, &command) == Status::Exit {
			break;
		}
	}
	println!();
	let _ = io::stdout().flush();
}
