use std::io::{self, Read, Write};
use std::os::unix::io::RawFd;

use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use nix::unistd;

use crate::error::ShellError;

const EOT: u8 = 4;
const ETX: u8 = 3;
const BS: u8 = 8;
const TAB: u8 = 9;
const ESC: u8 = 27;
const DEL: u8 = 127;

const ERASE: &[u8] = b"\x08 \x08";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome { Normal, AutoComplete, Background, Exit }

/// Puts a terminal into non-canonical, non-echoing mode until dropped.
pub struct RawMode {
	fd: RawFd,
	saved: Termios,
}

impl RawMode {
	pub fn enable(fd: RawFd) -> Result<RawMode, ShellError> {
		let saved = termios::tcgetattr(fd)?;
		let mut raw = saved.clone();
		raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO | LocalFlags::ISIG);
		raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
		raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
		termios::tcsetattr(fd, SetArg::TCSANOW, &raw)?;
		Ok(RawMode { fd: fd, saved: saved })
	}
}

impl Drop for RawMode {
	fn drop(&mut self) {
		let _ = termios::tcsetattr(self.fd, SetArg::TCSANOW, &self.saved);
	}
}

/// Unbuffered reads straight from a descriptor, so bytes past the current
/// line stay in the kernel for whichever process reads next.
pub struct FdReader(pub RawFd);

impl Read for FdReader {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		unistd::read(self.0, buf).map_err(io::Error::from)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape { Idle, Esc, Csi }

pub struct LineEditor {
	recall: String,
	max_line: usize,
}

fn next_byte<R: Read>(input: &mut R) -> io::Result<Option<u8>> {
	let mut b = [0u8; 1];
	loop {
		match input.read(&mut b) {
			Ok(0) => return Ok(None),
			Ok(_) => return Ok(Some(b[0])),
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(e),
		}
	}
}

// Drops the last UTF-8 character.
fn erase(buf: &mut Vec<u8>) -> bool {
	if buf.is_empty() {
		return false;
	}
	while let Some(b) = buf.pop() {
		if b & 0xC0 != 0x80 { break; }
	}
	true
}

impl LineEditor {
	pub fn new(max_line: usize) -> LineEditor {
		LineEditor { recall: String::new(), max_line: max_line }
	}

	pub fn recall(&self) -> &str {
		&self.recall
	}

	fn replay<W: Write>(&self, buf: &mut Vec<u8>, out: &mut W) -> io::Result<()> {
		while erase(buf) {
			out.write_all(ERASE)?;
		}
		buf.extend_from_slice(self.recall.as_bytes());
		out.write_all(self.recall.as_bytes())
	}

	/// Reads one line of keystrokes, echoing as it goes. Empty lines are
	/// swallowed and the prompt is shown again.
	pub fn read_line<R: Read, W: Write>(&mut self, prompt: &str, input: &mut R, out: &mut W)
	                                    -> Result<(String, Outcome), ShellError> {
		let mut buf: Vec<u8> = vec![];
		let mut escape = Escape::Idle;
		let mut overflow = false;
		let mut outcome = Outcome::Normal;

		out.write_all(prompt.as_bytes())?;
		out.flush()?;
		loop {
			let c = match next_byte(input)? {
				Some(c) => c,
				None => return Ok((String::new(), Outcome::Exit)),
			};

			if overflow {
				match c {
					b'\n' | b'\r' => {
						out.write_all(b"\n")?;
						return Err(ShellError::LineTooLong(self.max_line));
					},
					EOT => return Ok((String::new(), Outcome::Exit)),
					ETX => {
						buf.clear();
						overflow = false;
						out.write_all(b"^C\n")?;
						out.write_all(prompt.as_bytes())?;
						out.flush()?;
						continue;
					},
					_ => continue,
				}
			}

			match (escape, c) {
				(_, ESC) => { escape = Escape::Esc; continue; },
				(Escape::Esc, b'[') => { escape = Escape::Csi; continue; },
				(Escape::Csi, b'A') => {
					escape = Escape::Idle;
					self.replay(&mut buf, out)?;
					out.flush()?;
					continue;
				},
				// parameter bytes of a sequence we don't handle
				(Escape::Csi, 0x30 ..= 0x3f) => continue,
				(Escape::Csi, 0x40 ..= 0x7e) => { escape = Escape::Idle; continue; },
				_ => escape = Escape::Idle,
			}

			match c {
				TAB => {
					buf.push(b'?');
					outcome = Outcome::AutoComplete;
					out.write_all(b"\n")?;
					break;
				},
				DEL | BS => {
					if erase(&mut buf) {
						out.write_all(ERASE)?;
					}
				},
				EOT => return Ok((String::new(), Outcome::Exit)),
				ETX => {
					buf.clear();
					out.write_all(b"^C\n")?;
					out.write_all(prompt.as_bytes())?;
				},
				b'\n' | b'\r' => {
					out.write_all(b"\n")?;
					if !buf.is_empty() {
						break;
					}
					out.write_all(prompt.as_bytes())?;
				},
				c if c < 0x20 => {},
				c => {
					if buf.len() >= self.max_line {
						overflow = true;
						continue;
					}
					buf.push(c);
					out.write_all(&[c])?;
				},
			}
			out.flush()?;
		}
		out.flush()?;

		let text = String::from_utf8_lossy(&buf).into_owned();
		self.recall = text.clone();
		if outcome == Outcome::Normal && text.trim_end().ends_with('&') {
			outcome = Outcome::Background;
		}
		Ok((text, outcome))
	}
}

/// Reads a line from the controlling terminal, in raw mode when stdin is a tty.
pub fn read_line(editor: &mut LineEditor, prompt: &str) -> Result<(String, Outcome), ShellError> {
	let _raw = if unistd::isatty(libc::STDIN_FILENO).unwrap_or(false) {
		Some(RawMode::enable(libc::STDIN_FILENO)?)
	} else {
		None
	};
	let stdout = io::stdout();
	let mut out = stdout.lock();
	editor.read_line(prompt, &mut FdReader(libc::STDIN_FILENO), &mut out)
}

/// Reads a cooked reply line from stdin, without the newline.
pub fn read_reply() -> io::Result<String> {
	let mut input = FdReader(libc::STDIN_FILENO);
	let mut buf = vec![];
	while let Some(c) = next_byte(&mut input)? {
		if c == b'\n' { break; }
		buf.push(c);
	}
	Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn feed(editor: &mut LineEditor, keys: &[u8]) -> (Result<(String, Outcome), ShellError>, String) {
		let mut out = vec![];
		let mut input = keys;
		let r = editor.read_line("$ ", &mut input, &mut out);
		(r, String::from_utf8(out).unwrap())
	}

	#[test]
	fn plain_line_is_echoed() {
		let mut ed = LineEditor::new(64);
		let (r, out) = feed(&mut ed, b"ls -l\n");
		assert_eq!(r.unwrap(), ("ls -l".to_string(), Outcome::Normal));
		assert_eq!(out, "$ ls -l\n");
		assert_eq!(ed.recall(), "ls -l");
	}

	#[test]
	fn backspace_edits_buffer() {
		let mut ed = LineEditor::new(64);
		let (r, out) = feed(&mut ed, b"lx\x7fs\n");
		assert_eq!(r.unwrap().0, "ls");
		assert_eq!(out, "$ lx\x08 \x08s\n");

		let (r, _) = feed(&mut ed, "\x7fé\x7fe\n".as_bytes());
		assert_eq!(r.unwrap().0, "e");
	}

	#[test]
	fn empty_enter_reprompts() {
		let mut ed = LineEditor::new(64);
		let (r, out) = feed(&mut ed, b"\n\npwd\n");
		assert_eq!(r.unwrap().0, "pwd");
		assert_eq!(out, "$ \n$ \n$ pwd\n");
	}

	#[test]
	fn up_arrow_recalls_last_line() {
		let mut ed = LineEditor::new(64);
		feed(&mut ed, b"echo hi\n").0.unwrap();
		let (r, out) = feed(&mut ed, b"xy\x1b[A\n");
		assert_eq!(r.unwrap().0, "echo hi");
		assert_eq!(out, "$ xy\x08 \x08\x08 \x08echo hi\n");
	}

	#[test]
	fn other_escapes_are_swallowed() {
		let mut ed = LineEditor::new(64);
		let (r, _) = feed(&mut ed, b"a\x1b[Bb\x1b[1;5Cc\n");
		assert_eq!(r.unwrap().0, "abc");
	}

	#[test]
	fn tab_requests_completion() {
		let mut ed = LineEditor::new(64);
		let (r, _) = feed(&mut ed, b"gr\t");
		assert_eq!(r.unwrap(), ("gr?".to_string(), Outcome::AutoComplete));
		assert!(crate::parser::parse(ed.recall()).auto_complete);
	}

	#[test]
	fn trailing_ampersand_is_background() {
		let mut ed = LineEditor::new(64);
		let (r, _) = feed(&mut ed, b"sleep 5 &\n");
		assert_eq!(r.unwrap().1, Outcome::Background);
	}

	#[test]
	fn ctrl_d_and_eof_exit() {
		let mut ed = LineEditor::new(64);
		assert_eq!(feed(&mut ed, b"ls\x04").0.unwrap().1, Outcome::Exit);
		assert_eq!(feed(&mut ed, b"").0.unwrap().1, Outcome::Exit);
		assert_eq!(ed.recall(), "");
	}

	#[test]
	fn ctrl_c_drops_line() {
		let mut ed = LineEditor::new(64);
		let (r, out) = feed(&mut ed, b"rm x\x03ls\n");
		assert_eq!(r.unwrap().0, "ls");
		assert_eq!(out, "$ rm x^C\n$ ls\n");
	}

	#[test]
	fn long_line_is_rejected() {
		let mut ed = LineEditor::new(4);
		let (r, _) = feed(&mut ed, b"abcdefgh\n");
		match r {
			Err(ShellError::LineTooLong(4)) => {},
			other => panic!("unexpected {:?}", other),
		}
		let (r, _) = feed(&mut ed, b"abcd\n");
		assert_eq!(r.unwrap().0, "abcd");
	}

	#[test]
	fn ctrl_c_clears_overlong_line() {
		let mut ed = LineEditor::new(4);
		let (r, out) = feed(&mut ed, b"abcdefgh\x03ls\n");
		assert_eq!(r.unwrap().0, "ls");
		assert_eq!(out, "$ abcd^C\n$ ls\n");
	}
}
