use std::{fs, io};
use std::io::Write;
use std::path::PathBuf;

/// Recently visited directories, one absolute path per line, oldest first.
pub struct DirHistory {
	path: PathBuf,
	capacity: usize,
}

impl DirHistory {
	pub fn new(path: PathBuf, capacity: usize) -> DirHistory {
		DirHistory { path: path, capacity: capacity }
	}

	pub fn load(&self) -> io::Result<Vec<String>> {
		match fs::read_to_string(&self.path) {
			Ok(text) => Ok(text.lines().filter(|l| !l.is_empty()).map(|l| l.to_owned()).collect()),
			Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(vec![]),
			Err(e) => Err(e),
		}
	}

	pub fn push(&self, dir: &str) -> io::Result<()> {
		let mut entries = self.load()?;
		entries.retain(|e| e != dir);
		entries.push(dir.to_owned());
		if entries.len() > self.capacity {
			let excess = entries.len() - self.capacity;
			entries.drain(.. excess);
		}
		let mut file = fs::File::create(&self.path)?;
		for e in &entries {
			writeln!(file, "{}", e)?;
		}
		Ok(())
	}
}

/// Maps a menu choice (`a`, `B`, `3`, ...) to an entry.
pub fn select<'a>(entries: &'a [String], choice: &str) -> Option<&'a str> {
	let mut chars = choice.trim().chars();
	let c = chars.next()?;
	if chars.next().is_some() {
		return None;
	}
	let idx = match c {
		'a' ..= 'z' => c as usize - 'a' as usize,
		'A' ..= 'Z' => c as usize - 'A' as usize,
		'1' ..= '9' => c as usize - '1' as usize,
		_ => return None,
	};
	entries.get(idx).map(|s| s.as_str())
}

/// The `cdh` menu shows at most this many of the newest entries.
pub const MENU_MAX: usize = 10;

pub fn recent(entries: &[String]) -> &[String] {
	&entries[entries.len().saturating_sub(MENU_MAX) ..]
}

pub fn menu_label(i: usize) -> String {
	format!("{} {})", (b'a' + i as u8) as char, i + 1)
}
