//! Identity of the module revision being published

use std::fmt;

use serde::{Deserialize, Serialize};

/// `organisation/name` at a given revision string, e.g. `acme/widgets [1.4.0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRevision {
    pub organisation: String,
    pub name: String,
    pub revision: String,
}

impl ModuleRevision {
    pub fn new(
        organisation: impl Into<String>,
        name: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            organisation: organisation.into(),
            name: name.into(),
            revision: revision.into(),
        }
    }

    /// Default message for the revision a publish produces.
    pub fn commit_message(&self) -> String {
        format!("Publishing {self}")
    }
}

impl fmt::Display for ModuleRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} [{}]", self.organisation, self.name, self.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_message() {
        let module = ModuleRevision::new("acme", "widgets", "1.4.0");
        assert_eq!(module.commit_message(), "Publishing acme/widgets [1.4.0]");
    }
}
