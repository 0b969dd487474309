//! Host platform queries.

pub mod arch;
pub mod paths;

pub use arch::{Arch, host_arch_name};
