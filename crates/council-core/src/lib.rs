//! Foundation crate shared by every council crate: error taxonomy, structured
//! logging setup, and the small filesystem helpers the artifact store needs
//! (atomic writes, path-escape checks).

pub mod atomic_write;
pub mod error;
pub mod logging;
pub mod paths;
