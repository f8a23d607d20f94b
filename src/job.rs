use log::{debug, info};
use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

fn is_terminated(status: Option<WaitStatus>) -> bool {
	matches!(status, Some(WaitStatus::Exited(..)) | Some(WaitStatus::Signaled(..)))
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	pub status: Option<WaitStatus>,
}

/// The processes of one pipeline, all in process group `gid`.
#[derive(Debug)]
pub struct Job {
	pub gid: Pid,
	pub processes: Vec<Process>,
}

impl Job {
	pub fn is_done(&self) -> bool {
		self.processes.iter().all(|pr| is_terminated(pr.status))
	}

	fn update(pr: &mut Process, flags: Option<WaitPidFlag>) -> nix::Result<()> {
		loop {
			match wait::waitpid(pr.pid, flags) {
				Ok(WaitStatus::StillAlive) => return Ok(()),
				Ok(status) => {
					debug!("pid {} -> {:?}", pr.pid, status);
					pr.status = Some(status);
					if is_terminated(pr.status) || flags.is_some() {
						return Ok(());
					}
				},
				Err(Errno::EINTR) => continue,
				// already reaped elsewhere
				Err(Errno::ECHILD) => {
					pr.status = Some(WaitStatus::Exited(pr.pid, 0));
					return Ok(());
				},
				Err(e) => return Err(e),
			}
		}
	}

	/// Blocks until every process of the job has terminated.
	pub fn wait(&mut self) -> nix::Result<()> {
		for pr in self.processes.iter_mut().filter(|pr| !is_terminated(pr.status)) {
			Job::update(pr, None)?;
		}
		Ok(())
	}

	/// Collects whatever has finished without blocking.
	pub fn reap(&mut self) -> nix::Result<bool> {
		for pr in self.processes.iter_mut().filter(|pr| !is_terminated(pr.status)) {
			Job::update(pr, Some(WaitPidFlag::WNOHANG))?;
		}
		Ok(self.is_done())
	}

	pub fn last_status(&self) -> Option<WaitStatus> {
		self.processes.last().and_then(|pr| pr.status)
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	gid: Option<Pid>,
	processes: Vec<Process>,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder { gid: None, processes: Vec::with_capacity(size_hint) }
	}

	/// Forks one pipeline member. The first child leads the process group;
	/// both sides call setpgid so neither order of scheduling races.
	pub fn push_fork(&mut self) -> nix::Result<ForkResult> {
		let r = unsafe { unistd::fork() }?;
		match r {
			ForkResult::Parent { child } => {
				let gid = *self.gid.get_or_insert(child);
				// EACCES once the child has exec'd; its own call already did the job
				let _ = unistd::setpgid(child, gid);
				self.processes.push(Process { pid: child, status: None });
			},
			ForkResult::Child => {
				let gid = self.gid.unwrap_or(Pid::from_raw(0));
				let _ = unistd::setpgid(Pid::from_raw(0), gid);
			},
		}
		Ok(r)
	}

	pub fn is_empty(&self) -> bool {
		self.processes.is_empty()
	}

	pub fn build(self) -> Option<Job> {
		let gid = self.gid?;
		Some(Job { gid: gid, processes: self.processes })
	}
}

/// Background jobs still owed a wait.
#[derive(Debug, Default)]
pub struct JobSet {
	jobs: Vec<Job>,
}

impl JobSet {
	pub fn new() -> JobSet {
		JobSet { jobs: vec![] }
	}

	pub fn push(&mut self, job: Job) {
		info!("[{}] started in background ({} processes)", job.gid, job.processes.len());
		self.jobs.push(job);
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.jobs.is_empty()
	}

	pub fn reap(&mut self) {
		self.jobs.retain_mut(|job| match job.reap() {
			Ok(false) => true,
			Ok(true) => {
				info!("[{}] done: {:?}", job.gid, job.last_status());
				false
			},
			Err(e) => {
				debug!("[{}] wait failed: {}", job.gid, e);
				false
			},
		});
	}
}
