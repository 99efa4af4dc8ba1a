//! Resource descriptors

use chrono::{DateTime, Utc};

/// What is known about a repository location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub location: String,
    pub exists: bool,
    pub last_modified: Option<DateTime<Utc>>,
    /// Content length in bytes; zero for folders and missing resources
    pub size: u64,
}

impl Resource {
    /// A descriptor for a location that does not exist.
    pub fn missing(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            exists: false,
            last_modified: None,
            size: 0,
        }
    }
}
