use std::collections::BTreeSet;
use std::{env, fs};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const PATH_KEY: &str = "PATH";

fn search_path() -> Vec<PathBuf> {
	match env::var_os(PATH_KEY) {
		Some(path) => env::split_paths(&path).filter(|p| !p.as_os_str().is_empty()).collect(),
		None => vec![],
	}
}

/// Every path `execv` should try for `name`, in order. Names with a slash
/// (including `./prog`) are taken as they are; everything else is looked up
/// in each PATH entry.
pub fn candidates(name: &str) -> Vec<PathBuf> {
	if name.is_empty() {
		return vec![];
	}
	if name.contains('/') {
		return vec![PathBuf::from(name)];
	}
	search_path().into_iter().map(|dir| dir.join(name)).collect()
}

pub fn is_executable(path: &Path) -> bool {
	match fs::metadata(path) {
		Ok(m) => m.is_file() && m.permissions().mode() & 0o111 != 0,
		Err(_) => false,
	}
}

pub fn lookup(name: &str) -> Option<PathBuf> {
	candidates(name).into_iter().find(|p| is_executable(p))
}

/// Executable names reachable through PATH that start with `prefix`.
pub fn executables(prefix: &str) -> BTreeSet<String> {
	let mut names = BTreeSet::new();
	for dir in search_path() {
		let entries = match fs::read_dir(&dir) {
			Ok(entries) => entries,
			Err(_) => continue,
		};
		for entry in entries.filter_map(Result::ok) {
			let file_name = entry.file_name();
			let name = match file_name.to_str() {
				Some(name) => name,
				None => continue,
			};
			if name.starts_with(prefix) && is_executable(&entry.path()) {
				names.insert(name.to_owned());
			}
		}
	}
	names
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slash_names_skip_path() {
		assert_eq!(candidates("./run.sh"), [PathBuf::from("./run.sh")]);
		assert_eq!(candidates("/bin/sh"), [PathBuf::from("/bin/sh")]);
		assert!(candidates("").is_empty());
	}

	#[test]
	fn finds_sh_on_path() {
		let found = lookup("sh").expect("sh on PATH");
		assert!(found.ends_with("sh"));
		assert!(lookup("definitely-not-a-command-xyz").is_none());
		assert!(executables("s").contains("sh"));
	}
}
