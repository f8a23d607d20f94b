use std::{env, fs, io, process};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::os_message;
use crate::global;
use crate::history;
use crate::input;
use crate::types::{Command, Status};

pub type Builtin = fn(&mut global::State, &Command) -> Status;

pub const NAMES: &[&str] = &["cd", "cdh", "exit", "filesearch", "take"];

const OPENER: &str = "xdg-open";

fn change_dir(state: &mut global::State, target: &Path) -> Status {
	if let Err(e) = env::set_current_dir(target) {
		eprintln!("-{}: cd: {}: {}", state.config.name, target.display(), os_message(&e));
		return Status::Success;
	}
	match env::current_dir() {
		Ok(cwd) => {
			debug!("cwd is now {}", cwd.display());
			if let Err(e) = state.dir_history.push(&cwd.to_string_lossy()) {
				warn!("could not record {} in directory history: {}", cwd.display(), e);
			}
		},
		Err(e) => warn!("cwd unreadable after cd: {}", e),
	}
	Status::Success
}

pub fn builtin_exit(_: &mut global::State, _: &Command) -> Status {
	Status::Exit
}

pub fn builtin_cd(state: &mut global::State, command: &Command) -> Status {
	let target = match command.arguments.first() {
		Some(dir) => PathBuf::from(dir),
		None => match dirs::home_dir() {
			Some(home) => home,
			None => {
				eprintln!("-{}: cd: HOME not set", state.config.name);
				return Status::Success;
			},
		},
	};
	change_dir(state, &target)
}

pub fn builtin_cdh(state: &mut global::State, _: &Command) -> Status {
	let entries = match state.dir_history.load() {
		Ok(entries) => entries,
		Err(e) => {
			eprintln!("{}: cdh: {}", state.config.name, os_message(&e));
			return Status::Success;
		},
	};
	if entries.is_empty() {
		println!("No history found");
		return Status::Success;
	}
	let entries = history::recent(&entries);
	for (i, dir) in entries.iter().enumerate() {
		println!("{} {}", history::menu_label(i), dir);
	}
	print!("\nEnter a number or letter: ");
	let _ = io::stdout().flush();

	let reply = match input::read_reply() {
		Ok(reply) => reply,
		Err(e) => {
			eprintln!("{}: cdh: {}", state.config.name, os_message(&e));
			return Status::Success;
		},
	};
	match history::select(entries, &reply) {
		Some(dir) => {
			let dir = PathBuf::from(dir);
			change_dir(state, &dir)
		},
		None => {
			println!("Invalid input");
			Status::Success
		},
	}
}

pub fn builtin_take(state: &mut global::State, command: &Command) -> Status {
	let dir = match command.arguments.first() {
		Some(dir) => Path::new(dir),
		None => {
			eprintln!("{}: take: missing directory name", state.config.name);
			return Status::Success;
		},
	};
	if let Err(e) = fs::create_dir_all(dir) {
		eprintln!("{}: take: {}: {}", state.config.name, dir.display(), os_message(&e));
		return Status::Success;
	}
	change_dir(state, dir)
}

fn walk(dir: &Path, shown: &Path, keyword: &str, recursive: bool, out: &mut Vec<PathBuf>) -> io::Result<()> {
	let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.filter_map(Result::ok).collect();
	entries.sort_by_key(|e| e.file_name());
	for e in entries {
		let name = e.file_name();
		let shown_path = shown.join(&name);
		if name.to_string_lossy().contains(keyword) {
			out.push(shown_path.clone());
		}
		let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
		if recursive && is_dir {
			if let Err(err) = walk(&e.path(), &shown_path, keyword, recursive, out) {
				debug!("skipping {}: {}", e.path().display(), err);
			}
		}
	}
	Ok(())
}

/// Entries under `root` whose name contains `keyword`. Recursive results are
/// shown relative to `.`, flat ones by bare name.
pub fn find_files(root: &Path, keyword: &str, recursive: bool) -> io::Result<Vec<PathBuf>> {
	let mut out = vec![];
	let shown = if recursive { PathBuf::from(".") } else { PathBuf::new() };
	walk(root, &shown, keyword, recursive, &mut out)?;
	Ok(out)
}

/// Runs `opener` on `path` and waits for it to exit.
pub fn open_file(opener: &str, path: &Path) -> io::Result<process::ExitStatus> {
	process::Command::new(opener)
		.arg(path)
		.stdin(process::Stdio::null())
		.stdout(process::Stdio::null())
		.stderr(process::Stdio::null())
		.status()
}

pub fn builtin_filesearch(state: &mut global::State, command: &Command) -> Status {
	let mut keyword = None;
	let mut recursive = false;
	let mut open = false;
	for arg in &command.arguments {
		match arg.as_str() {
			"-r" => recursive = true,
			"-o" => open = true,
			word if keyword.is_none() => keyword = Some(word),
			word => debug!("filesearch: ignoring extra argument {}", word),
		}
	}
	let keyword = match keyword {
		Some(keyword) => keyword,
		None => {
			eprintln!("usage: filesearch <keyword> [-r] [-o]");
			return Status::Success;
		},
	};

	let found = match find_files(Path::new("."), keyword, recursive) {
		Ok(found) => found,
		Err(e) => {
			eprintln!("{}: filesearch: {}", state.config.name, os_message(&e));
			return Status::Success;
		},
	};
	for path in found {
		if open {
			match open_file(OPENER, &path) {
				Ok(status) if !status.success() => debug!("{} {}: {}", OPENER, path.display(), status),
				Ok(_) => {},
				Err(e) => warn!("{} {}: {}", OPENER, path.display(), e),
			}
		}
		println!("{}", path.display());
	}
	Status::Success
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"cd" => Some(builtin_cd),
		"cdh" => Some(builtin_cdh),
		"exit" => Some(builtin_exit),
		"filesearch" => Some(builtin_filesearch),
		"take" => Some(builtin_take),
		_ => None,
	}
}
