use crate::types::*;

struct Parser<'a> {
	line: &'a str,
	i: usize,
}

impl<'a> Parser<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(&c) = self.line.as_bytes().get(self.i) {
			if !f(c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		matches!(c, b' ' | b'\t')
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn read_word(&mut self) -> Option<&'a str> {
		self.skip_whitespaces();
		let orig = self.i;
		self.proceed_while(|c| !Parser::is_whitespace(c));
		if orig == self.i {
			None
		} else {
			Some(&self.line[orig .. self.i])
		}
	}

	// `> out` and `>out` name the same target. A bare `|` still starts the
	// next stage and leaves the target empty.
	fn redirect_target(&mut self, attached: &str) -> String {
		if !attached.is_empty() {
			return attached.to_owned();
		}
		let orig = self.i;
		match self.read_word() {
			Some("|") => {
				self.i = orig;
				String::new()
			},
			Some(word) => word.to_owned(),
			None => String::new(),
		}
	}

	fn parse_command(&mut self) -> Command {
		let mut command = Command::default();
		match self.read_word() {
			Some(name) => command.name = name.to_owned(),
			None => return command,
		}

		while let Some(word) = self.read_word() {
			if word == "|" {
				// the remainder of the line is a stage of its own
				command.next = Some(Box::new(self.parse_command()));
				break;
			}
			if word == "&" {
				continue;
			}
			if let Some(target) = word.strip_prefix('<') {
				command.redirects.input = Some(self.redirect_target(target));
			} else if let Some(target) = word.strip_prefix(">>") {
				let target = self.redirect_target(target);
				command.redirects.output = Some(OutputRedirect { target, mode: OutputMode::Append });
			} else if let Some(target) = word.strip_prefix('>') {
				let target = self.redirect_target(target);
				command.redirects.output = Some(OutputRedirect { target, mode: OutputMode::Truncate });
			} else {
				command.arguments.push(unquote(word).to_owned());
			}
		}
		command
	}
}

fn unquote(word: &str) -> &str {
	let b = word.as_bytes();
	let n = b.len();
	if n >= 2 && (b[0] == b'"' || b[0] == b'\'') && b[n - 1] == b[0] {
		&word[1 .. n - 1]
	} else {
		word
	}
}

fn trim(s: &str) -> &str {
	s.trim_matches(|c| c == ' ' || c == '\t')
}

/// Builds the pipeline for one input line. Never fails: blank or garbage
/// input comes back as a command with an empty name.
pub fn parse(line: &str) -> Command {
	let mut line = trim(line);
	let mut auto_complete = false;
	let mut background = false;
	if let Some(rest) = line.strip_suffix('?') {
		auto_complete = true;
		line = trim(rest);
	} else if let Some(rest) = line.strip_suffix('&') {
		background = true;
		line = trim(rest);
	}

	let mut parser = Parser { line: line, i: 0 };
	let mut command = parser.parse_command();
	command.auto_complete = auto_complete;
	command.last_mut().background = background;
	command
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(c: &Command) -> Vec<&str> {
		c.arguments.iter().map(|s| s.as_str()).collect()
	}

	#[test]
	fn plain_words() {
		let c = parse("  ls\t-l   -a /tmp  ");
		assert_eq!(c.name, "ls");
		assert_eq!(args(&c), ["-l", "-a", "/tmp"]);
		assert_eq!(c.arg_count(), 3);
		assert!(c.next.is_none());
		assert!(c.redirects.is_empty());
	}

	#[test]
	fn quotes_only_on_exact_wrap() {
		let c = parse(r#"echo "hi" 'there' "mixed' "open x"y ''"#);
		assert_eq!(args(&c), ["hi", "there", "\"mixed'", "\"open", "x\"y", ""]);
	}

	#[test]
	fn truncate_redirect() {
		let c = parse("echo hi > out.txt");
		assert_eq!(c.name, "echo");
		assert_eq!(args(&c), ["hi"]);
		assert_eq!(c.redirects.slot(0), None);
		assert_eq!(c.redirects.slot(1), Some("out.txt"));
		assert_eq!(c.redirects.slot(2), None);
	}

	#[test]
	fn attached_redirects() {
		let c = parse("sort <in.txt >>log.txt -r");
		assert_eq!(args(&c), ["-r"]);
		assert_eq!(c.redirects.slot(0), Some("in.txt"));
		assert_eq!(c.redirects.slot(1), None);
		assert_eq!(c.redirects.slot(2), Some("log.txt"));
	}

	#[test]
	fn last_output_redirect_wins() {
		let c = parse("echo x >>a >b");
		assert_eq!(c.redirects.slot(1), Some("b"));
		assert_eq!(c.redirects.slot(2), None);
	}

	#[test]
	fn operators_inside_tokens_are_literal() {
		let c = parse("echo a>b c|d");
		assert_eq!(args(&c), ["a>b", "c|d"]);
		assert!(c.next.is_none());
	}

	#[test]
	fn bare_redirect_does_not_swallow_pipe() {
		let c = parse("echo hi > | wc");
		assert_eq!(c.len(), 2);
		assert_eq!(args(&c), ["hi"]);
		assert_eq!(c.redirects.slot(1), Some(""));
		assert_eq!(c.last().name, "wc");
		assert!(c.last().arguments.is_empty());
	}

	#[test]
	fn three_stage_pipeline() {
		let c = parse("cat a.txt | grep foo | wc -l");
		let names: Vec<&str> = c.stages().map(|s| s.name.as_str()).collect();
		assert_eq!(names, ["cat", "grep", "wc"]);
		assert_eq!(args(&c), ["a.txt"]);
		assert_eq!(args(c.next.as_ref().unwrap()), ["foo"]);
		assert_eq!(args(c.last()), ["-l"]);
	}

	#[test]
	fn redirects_stay_with_their_stage() {
		let c = parse("cat < in | sort > out");
		assert_eq!(c.redirects.slot(0), Some("in"));
		assert_eq!(c.redirects.slot(1), None);
		let sort = c.next.as_ref().unwrap();
		assert_eq!(sort.redirects.slot(0), None);
		assert_eq!(sort.redirects.slot(1), Some("out"));
	}

	#[test]
	fn single_pipe_round_trip() {
		let line = "ls | wc";
		let c = parse(line);
		assert_eq!(c.len(), 2);
		assert_eq!(format!("{} | {}", c.name, c.last().name), line);
	}

	#[test]
	fn background_marks_last_stage_only() {
		let c = parse("sleep 5 &");
		assert_eq!(c.name, "sleep");
		assert_eq!(args(&c), ["5"]);
		assert!(c.background);

		let c = parse("yes | head -n 1&");
		assert!(!c.background);
		assert!(c.last().background);
		assert_eq!(args(c.last()), ["-n", "1"]);
	}

	#[test]
	fn auto_complete_marker() {
		let c = parse("gr?");
		assert_eq!(c.name, "gr");
		assert!(c.auto_complete);
		assert!(!c.background);
	}

	#[test]
	fn blank_input_is_a_no_op() {
		for line in ["", "   ", "\t \t", "&", " & "] {
			let c = parse(line);
			assert!(c.is_empty(), "{:?}", line);
			assert_eq!(c.arg_count(), 0);
			assert!(c.next.is_none());
		}
	}

	#[test]
	fn parse_is_idempotent() {
		let line = "cat 'a' < x | tr a b >> y &";
		assert_eq!(parse(line), parse(line));
	}
}
