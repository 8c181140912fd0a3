//! CLI commands implementation

pub mod init;
pub mod report;
pub mod suggest;

pub use init::*;
pub use report::*;
pub use suggest::*;
