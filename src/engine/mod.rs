//! fio invocation
//!
//! This module turns a validated [`ProbeConfig`](crate::config::ProbeConfig)
//! into a fio command line ([`command`]) and runs it under a cancellation
//! token ([`runner`]).
//!
//! # Engine selection
//!
//! fio's asynchronous I/O engine is platform specific: Linux uses the native
//! `libaio` interface, macOS only offers POSIX AIO.

pub mod command;
pub mod runner;

pub use command::FioJob;
pub use runner::{run, RunOutput};

use std::fmt;

/// fio `--ioengine` values used by probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoEngine {
    /// Linux native async IO
    Libaio,
    /// POSIX async IO
    PosixAio,
}

impl IoEngine {
    /// Engine to use on the host platform
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            IoEngine::PosixAio
        } else {
            IoEngine::Libaio
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IoEngine::Libaio => "libaio",
            IoEngine::PosixAio => "posixaio",
        }
    }
}

impl fmt::Display for IoEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_default() {
        let engine = IoEngine::platform_default();
        if cfg!(target_os = "macos") {
            assert_eq!(engine, IoEngine::PosixAio);
        } else {
            assert_eq!(engine, IoEngine::Libaio);
        }
    }

    #[test]
    fn test_engine_names() {
        assert_eq!(IoEngine::Libaio.to_string(), "libaio");
        assert_eq!(IoEngine::PosixAio.to_string(), "posixaio");
    }
}
