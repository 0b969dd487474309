mod clean;
mod cleanbuild;
mod init;
mod lifecycle;
mod snap;

pub use clean::cmd_clean;
pub use cleanbuild::cmd_cleanbuild;
pub use init::cmd_init;
pub use lifecycle::cmd_step;
pub use snap::cmd_snap;
