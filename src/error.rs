use std::{error, fmt, ffi, io};

#[derive(Debug)]
pub enum ShellError {
	NixError(nix::Error),
	IoError(io::Error),
	NulError(ffi::NulError),
	ConfigError(String),
	LineTooLong(usize),
}

impl From<nix::Error> for ShellError {
	fn from(e: nix::Error) -> ShellError {
		ShellError::NixError(e)
	}
}
impl From<io::Error> for ShellError {
	fn from(e: io::Error) -> ShellError {
		ShellError::IoError(e)
	}
}
impl From<ffi::NulError> for ShellError {
	fn from(e: ffi::NulError) -> ShellError {
		ShellError::NulError(e)
	}
}
impl From<toml::de::Error> for ShellError {
	fn from(e: toml::de::Error) -> ShellError {
		ShellError::ConfigError(e.to_string())
	}
}

impl fmt::Display for ShellError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ShellError::NixError(ref e) => write!(f, "{}", e.desc()),
			ShellError::IoError(ref e) => write!(f, "{}", e),
			ShellError::NulError(ref e) => write!(f, "Nul char error: {}", e),
			ShellError::ConfigError(ref e) => write!(f, "config: {}", e),
			ShellError::LineTooLong(max) => write!(f, "input line too long (max {} bytes)", max),
		}
	}
}

impl error::Error for ShellError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match *self {
			ShellError::NixError(ref e) => Some(e),
			ShellError::IoError(ref e) => Some(e),
			ShellError::NulError(ref e) => Some(e),
			_ => None,
		}
	}
}

/// The bare system message for an I/O error, without Rust's "(os error N)" suffix.
pub fn os_message(e: &io::Error) -> String {
	match e.raw_os_error() {
		Some(n) => nix::errno::Errno::from_i32(n).desc().to_string(),
		None => e.to_string(),
	}
}
