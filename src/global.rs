use std::env;

use nix::unistd;

use crate::config::Config;
use crate::history::DirHistory;
use crate::input::LineEditor;
use crate::job::JobSet;

/// Everything that lives for one shell session.
pub struct State {
	pub config: Config,
	pub dir_history: DirHistory,
	pub editor: LineEditor,
	pub job_set: JobSet,
}

impl State {
	pub fn new(config: Config) -> State {
		let dir_history = DirHistory::new(config.history_file.clone(), config.history_size);
		let editor = LineEditor::new(config.max_line);
		State { config: config, dir_history: dir_history, editor: editor, job_set: JobSet::new() }
	}

	pub fn prompt(&self) -> String {
		let user = env::var("USER").unwrap_or_default();
		let host = unistd::gethostname()
			.map(|h| h.to_string_lossy().into_owned())
			.unwrap_or_default();
		let cwd = env::current_dir()
			.map(|p| p.display().to_string())
			.unwrap_or_default();
		format!("{}@{}:{} {}$ ", user, host, cwd, self.config.name)
	}
}
