//! Command implementations for vcpub-cli

pub mod get;
pub mod info;
pub mod init;
pub mod list;
pub mod publish;

pub use get::run_get;
pub use info::run_info;
pub use init::run_init;
pub use list::run_list;
pub use publish::run_publish;
