use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::builtin;
use crate::search;
use crate::types::Command;

// "src/ma" -> ("src/", "ma"), "ma" -> ("", "ma")
fn split_partial(partial: &str) -> (&str, &str) {
	match partial.rfind('/') {
		Some(i) => (&partial[.. i + 1], &partial[i + 1 ..]),
		None => ("", partial),
	}
}

pub fn command_candidates(prefix: &str) -> Vec<String> {
	let mut names: BTreeSet<String> = builtin::NAMES.iter()
		.filter(|n| n.starts_with(prefix))
		.map(|n| n.to_string())
		.collect();
	names.extend(search::executables(prefix));
	names.into_iter().collect()
}

/// Directory entries matching a partially typed path. Directories keep a
/// trailing slash so the next completion can descend into them.
pub fn path_candidates(partial: &str) -> Vec<String> {
	let (dir, file) = split_partial(partial);
	let search_dir = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };
	let entries = match fs::read_dir(search_dir) {
		Ok(entries) => entries,
		Err(_) => return vec![],
	};
	let mut out: Vec<String> = entries.filter_map(Result::ok)
		.filter_map(|e| {
			let name = e.file_name().into_string().ok()?;
			if !name.starts_with(file) || (file.is_empty() && name.starts_with('.')) {
				return None;
			}
			let slash = if e.path().is_dir() { "/" } else { "" };
			Some(format!("{}{}{}", dir, name, slash))
		})
		.collect();
	out.sort();
	out
}

/// What to offer for a line that ended in Tab: command names while the
/// first word is still being typed, paths after that.
pub fn candidates(command: &Command) -> Vec<String> {
	match command.arguments.last() {
		None => command_candidates(&command.name),
		Some(partial) => path_candidates(partial),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parser::parse;

	#[test]
	fn builtins_are_offered() {
		let c = command_candidates("ex");
		assert!(c.contains(&"exit".to_string()));
		assert!(c.windows(2).all(|w| w[0] < w[1]));
	}

	#[test]
	fn paths_under_a_directory() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("main.rs"), "").unwrap();
		fs::write(dir.path().join("mod.rs"), "").unwrap();
		fs::create_dir(dir.path().join("macros")).unwrap();
		fs::write(dir.path().join("lib.rs"), "").unwrap();

		let base = format!("{}/", dir.path().display());
		let got = path_candidates(&format!("{}ma", base));
		assert_eq!(got, [format!("{}macros/", base), format!("{}main.rs", base)]);
	}

	#[test]
	fn argument_switches_to_paths() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("notes.txt"), "").unwrap();
		let line = format!("cat {}/no?", dir.path().display());
		let got = candidates(&parse(&line));
		assert_eq!(got, [format!("{}/notes.txt", dir.path().display())]);
	}
}
