use std::ffi::{CStr, CString};
use std::io::{self, Write};
use std::os::unix::ffi::OsStringExt;
use std::os::unix::io::RawFd;

use log::{debug, info};
use nix::fcntl::{self, OFlag};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::unistd::{self, ForkResult};

use crate::builtin;
use crate::complete;
use crate::error::ShellError;
use crate::global;
use crate::job;
use crate::search;
use crate::types::{Command, OutputMode, Status};

// Ignored dispositions survive exec; children get the defaults back.
const CHILD_SIGNALS: [Signal; 4] = [Signal::SIGTTOU, Signal::SIGTTIN, Signal::SIGTSTP, Signal::SIGPIPE];

/// The shell must be able to take the terminal back from a finished
/// foreground job without being stopped for it.
pub fn ignore_job_signals() {
	unsafe {
		let _ = signal::signal(Signal::SIGTTOU, SigHandler::SigIgn);
	}
}

fn restore_child_signals() {
	for &sig in CHILD_SIGNALS.iter() {
		unsafe {
			let _ = signal::signal(sig, SigHandler::SigDfl);
		}
	}
}

fn owns_terminal() -> bool {
	unistd::isatty(libc::STDIN_FILENO).unwrap_or(false)
		&& unistd::tcgetpgrp(libc::STDIN_FILENO).map(|g| g == unistd::getpgrp()).unwrap_or(false)
}

/// A pipeline stage with every string the child needs already converted, so
/// nothing is allocated between fork and exec.
struct Stage {
	name: CString,
	argv: Vec<CString>,
	candidates: Vec<CString>,
	input: Option<CString>,
	output: Option<(CString, OutputMode)>,
}

impl Stage {
	fn prepare(command: &Command) -> Result<Stage, ShellError> {
		let name = CString::new(command.name.as_bytes())?;
		let mut argv = Vec::with_capacity(command.arg_count() + 1);
		argv.push(name.clone());
		for arg in &command.arguments {
			argv.push(CString::new(arg.as_bytes())?);
		}
		let mut candidates = vec![];
		for path in search::candidates(&command.name) {
			candidates.push(CString::new(path.into_os_string().into_vec())?);
		}
		let input = match command.redirects.input {
			Some(ref target) => Some(CString::new(target.as_bytes())?),
			None => None,
		};
		let output = match command.redirects.output {
			Some(ref r) => Some((CString::new(r.target.as_bytes())?, r.mode)),
			None => None,
		};
		Ok(Stage { name: name, argv: argv, candidates: candidates, input: input, output: output })
	}
}

fn write_err(parts: &[&[u8]]) {
	for part in parts {
		let _ = unistd::write(libc::STDERR_FILENO, part);
	}
}

fn redirect(path: &CStr, flags: OFlag, to: RawFd) -> nix::Result<()> {
	let fd = fcntl::open(path, flags, Mode::from_bits_truncate(0o644))?;
	if fd != to {
		unistd::dup2(fd, to)?;
		unistd::close(fd)?;
	}
	Ok(())
}

fn apply_redirects(stage: &Stage, shell: &[u8]) -> bool {
	let mut wanted: [Option<(&CStr, OFlag, RawFd)>; 2] = [None, None];
	if let Some(ref path) = stage.input {
		wanted[0] = Some((path.as_c_str(), OFlag::O_RDONLY, libc::STDIN_FILENO));
	}
	if let Some((ref path, mode)) = stage.output {
		let flags = match mode {
			OutputMode::Truncate => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
			OutputMode::Append => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
		};
		wanted[1] = Some((path.as_c_str(), flags, libc::STDOUT_FILENO));
	}
	for &(path, flags, to) in wanted.iter().flatten() {
		if let Err(e) = redirect(path, flags, to) {
			write_err(&[shell, b": ", path.to_bytes(), b": ", e.desc().as_bytes(), b"\n"]);
			return false;
		}
	}
	true
}

// Runs in the forked child and never returns into shell code.
fn exec_stage(stage: &Stage, i: usize, pipes: &[(RawFd, RawFd)], shell: &[u8]) -> ! {
	let mut wired = true;
	if i > 0 {
		wired &= unistd::dup2(pipes[i - 1].0, libc::STDIN_FILENO).is_ok();
	}
	if i < pipes.len() {
		wired &= unistd::dup2(pipes[i].1, libc::STDOUT_FILENO).is_ok();
	}
	close_pipes(pipes);
	if !wired {
		write_err(&[shell, b": could not set up pipe\n"]);
		unsafe { libc::_exit(126) }
	}
	// explicit redirections win over the pipe ends
	if !apply_redirects(stage, shell) {
		unsafe { libc::_exit(1) }
	}
	restore_child_signals();

	for path in &stage.candidates {
		let _ = unistd::execv(path.as_c_str(), &stage.argv);
	}
	write_err(&[shell, b": ", stage.name.to_bytes(), b": command not found\n"]);
	unsafe { libc::_exit(127) }
}

fn close_pipes(pipes: &[(RawFd, RawFd)]) {
	for &(r, w) in pipes {
		let _ = unistd::close(r);
		let _ = unistd::close(w);
	}
}

fn spawn_commands(stages: &[Stage], shell: &str, foreground: bool,
                  job_builder: &mut job::JobBuilder) -> Result<(), ShellError> {
	let mut pipes: Vec<(RawFd, RawFd)> = Vec::with_capacity(stages.len().saturating_sub(1));
	for _ in 1 .. stages.len() {
		match unistd::pipe2(OFlag::O_CLOEXEC) {
			Ok(p) => pipes.push(p),
			Err(e) => {
				close_pipes(&pipes);
				return Err(e.into());
			},
		}
	}

	// anything still buffered would otherwise be written twice
	let _ = io::stdout().flush();
	for (i, stage) in stages.iter().enumerate() {
		match job_builder.push_fork() {
			Ok(ForkResult::Parent { child }) => {
				debug!("stage {} ({:?}) forked as pid {}", i, stage.name, child);
			},
			Ok(ForkResult::Child) => {
				if foreground {
					let _ = unistd::tcsetpgrp(libc::STDIN_FILENO, unistd::getpgrp());
				}
				exec_stage(stage, i, &pipes, shell.as_bytes());
			},
			Err(e) => {
				close_pipes(&pipes);
				return Err(e.into());
			},
		}
	}
	close_pipes(&pipes);
	Ok(())
}

fn eval_pipeline(state: &mut global::State, command: &Command) -> Status {
	let stages: Result<Vec<Stage>, ShellError> = command.stages().map(Stage::prepare).collect();
	let stages = match stages {
		Ok(stages) => stages,
		Err(e) => {
			eprintln!("{}: {}", state.config.name, e);
			return Status::Success;
		},
	};
	for stage in &stages {
		debug!("exec {:?} via {:?}", stage.argv, stage.candidates);
	}

	let background = command.is_background();
	let handover = !background && owns_terminal();
	let mut job_builder = job::JobBuilder::new(stages.len());
	if let Err(e) = spawn_commands(&stages, &state.config.name, handover, &mut job_builder) {
		eprintln!("{}: {}", state.config.name, e);
	}
	let mut job = match job_builder.build() {
		Some(job) => job,
		None => return Status::Success,
	};

	if background {
		state.job_set.push(job);
		return Status::Success;
	}
	if handover {
		let _ = unistd::tcsetpgrp(libc::STDIN_FILENO, job.gid);
	}
	if let Err(e) = job.wait() {
		eprintln!("{}: {}", state.config.name, e.desc());
	}
	if handover {
		let _ = unistd::tcsetpgrp(libc::STDIN_FILENO, unistd::getpgrp());
	}
	debug!("[{}] finished: {:?}", job.gid, job.last_status());
	Status::Success
}

fn show_candidates(command: &Command) {
	let found = complete::candidates(command);
	if found.is_empty() {
		print!("\x07");
	} else {
		println!("{}", found.join("  "));
	}
	let _ = io::stdout().flush();
}

/// Runs one parsed line: completion, a builtin, or a pipeline of children.
pub fn eval(state: &mut global::State, command: &Command) -> Status {
	if command.is_empty() {
		return Status::Success;
	}
	debug!("parsed {:?}", command);

	if command.auto_complete {
		show_candidates(command);
		return Status::Success;
	}
	if let Some(func) = builtin::match_builtin(&command.name) {
		return func(state, command);
	}
	if command.stages().any(|c| c.is_empty()) {
		eprintln!("{}: syntax error near unexpected token `|'", state.config.name);
		return Status::Success;
	}
	if command.len() == 1 && command.redirects.is_empty() && search::lookup(&command.name).is_none() {
		eprintln!("{}: {}: command not found", state.config.name, command.name);
		return Status::CommandNotFound;
	}
	if command.is_background() {
		info!("backgrounding {}", command.name);
	}
	eval_pipeline(state, command)
}
