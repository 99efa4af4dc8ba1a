//! Filesystem side of the vcpub artifact publisher
//!
//! Captures source artifacts as in-memory snapshots, writes retrieved
//! artifacts atomically, and loads configuration files in any supported format.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
