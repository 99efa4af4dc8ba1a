//! Transfer notifications

use std::fmt;

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Get,
    Put,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Get => f.write_str("get"),
            TransferKind::Put => f.write_str("put"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Initiated {
        kind: TransferKind,
        location: String,
    },
    Completed {
        kind: TransferKind,
        location: String,
        bytes: u64,
    },
    Failed {
        kind: TransferKind,
        location: String,
        message: String,
    },
}

impl TransferEvent {
    pub fn kind(&self) -> TransferKind {
        match self {
            TransferEvent::Initiated { kind, .. }
            | TransferEvent::Completed { kind, .. }
            | TransferEvent::Failed { kind, .. } => *kind,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            TransferEvent::Initiated { location, .. }
            | TransferEvent::Completed { location, .. }
            | TransferEvent::Failed { location, .. } => location,
        }
    }
}

/// Receives transfer events from an [`crate::ArtifactRepository`].
pub trait TransferListener: Send + Sync {
    fn transfer_event(&self, event: &TransferEvent);
}
