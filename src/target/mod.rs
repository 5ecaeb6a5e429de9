//! Probe target management
//!
//! The target of a probe is a scratch directory on the volume being measured.
//! This module prepares and removes that directory and verifies the volume has
//! room for the probe's data set before fio is launched.

pub mod space;
pub mod workspace;

pub use space::{available_space, check_free_space, ensure_free_space};
pub use workspace::Workspace;
