//! CLI commands implementation

pub mod import;
pub mod init;
pub mod status;
pub mod tags;
pub mod videos;

pub use import::*;
pub use init::*;
pub use status::*;
pub use tags::*;
pub use videos::*;
