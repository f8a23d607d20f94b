#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode { Truncate, Append }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
	pub target: String,
	pub mode: OutputMode,
}

/// Per-stage stream rebinding. `>` and `>>` share one slot, so a stage
/// never carries both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirects {
	pub input: Option<String>,
	pub output: Option<OutputRedirect>,
}

impl Redirects {
	/// Slot view: 0 is `<`, 1 is `>`, 2 is `>>`.
	pub fn slot(&self, i: usize) -> Option<&str> {
		match (i, &self.output) {
			(0, _) => self.input.as_deref(),
			(1, Some(OutputRedirect { target, mode: OutputMode::Truncate })) => Some(target.as_str()),
			(2, Some(OutputRedirect { target, mode: OutputMode::Append })) => Some(target.as_str()),
			_ => None,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.input.is_none() && self.output.is_none()
	}
}

/// One pipeline stage. A stage owns the rest of the chain through `next`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
	pub name: String,
	pub arguments: Vec<String>,
	pub redirects: Redirects,
	pub background: bool,
	pub auto_complete: bool,
	pub next: Option<Box<Command>>,
}

impl Command {
	pub fn arg_count(&self) -> usize {
		self.arguments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.name.is_empty()
	}

	pub fn stages(&self) -> Stages {
		Stages { cur: Some(self) }
	}

	pub fn len(&self) -> usize {
		self.stages().count()
	}

	pub fn last(&self) -> &Command {
		let mut cur = self;
		while let Some(next) = cur.next.as_deref() {
			cur = next;
		}
		cur
	}

	pub fn last_mut(&mut self) -> &mut Command {
		match self.next {
			Some(ref mut next) => next.last_mut(),
			None => self,
		}
	}

	/// True when the final stage asked not to be waited on.
	pub fn is_background(&self) -> bool {
		self.last().background
	}
}

pub struct Stages<'a> {
	cur: Option<&'a Command>,
}

impl<'a> Iterator for Stages<'a> {
	type Item = &'a Command;

	fn next(&mut self) -> Option<&'a Command> {
		let cur = self.cur?;
		self.cur = cur.next.as_deref();
		Some(cur)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status { Success, Exit, CommandNotFound }

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn chain_walk() {
		let tail = Command { name: "wc".into(), background: true, ..Default::default() };
		let head = Command { name: "cat".into(), next: Some(Box::new(tail)), ..Default::default() };
		let names: Vec<&str> = head.stages().map(|c| c.name.as_str()).collect();
		assert_eq!(names, ["cat", "wc"]);
		assert_eq!(head.len(), 2);
		assert!(head.is_background());
		assert_eq!(head.last().name, "wc");
	}

	#[test]
	fn slots_follow_mode() {
		let r = Redirects {
			input: Some("in".into()),
			output: Some(OutputRedirect { target: "out".into(), mode: OutputMode::Append }),
		};
		assert_eq!(r.slot(0), Some("in"));
		assert_eq!(r.slot(1), None);
		assert_eq!(r.slot(2), Some("out"));
	}
}
