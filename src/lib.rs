pub mod builtin;
pub mod complete;
pub mod config;
pub mod error;
pub mod eval;
pub mod global;
pub mod history;
pub mod input;
pub mod job;
pub mod logging;
pub mod parser;
pub mod search;
pub mod types;
