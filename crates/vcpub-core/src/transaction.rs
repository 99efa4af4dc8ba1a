//! Publish transactions
//!
//! A [`PublishTransaction`] collects [`PutOperation`]s and applies them in a
//! single commit editor, so a successful commit produces exactly one new
//! revision and a failed one leaves the repository untouched.
//!
//! Two connections are opened lazily on the first put: an ancillary reader
//! for existence and content probes, and a committer owning the editor.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use vcpub_repo::{
    Author, CommitEditor, CommitInfo, ConnectionParams, Connector, NodeKind, RepositoryCommitter,
    RepositoryReader, Revision, paths,
};

use crate::{
    Error, Result,
    config::BinaryDiffConfig,
    module::ModuleRevision,
    path::{PathResolver, ResolvedPath},
    put::PutOperation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    CommitInProgress,
    Committed,
    Aborted,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Committed | TransactionState::Aborted)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::Open => "open",
            TransactionState::CommitInProgress => "commit in progress",
            TransactionState::Committed => "committed",
            TransactionState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Settings a transaction is created with.
#[derive(Debug, Clone)]
pub struct TransactionOptions {
    pub message: String,
    pub author: Author,
    pub binary_diff: BinaryDiffConfig,
    /// Root destinations must start with; the repository root when `None`
    pub explicit_root: Option<String>,
}

/// A put with its repository-relative target paths.
#[derive(Debug)]
struct QueuedPut {
    operation: PutOperation,
    path: String,
    anchor: Option<String>,
}

struct Connections {
    ancillary: Arc<dyn RepositoryReader>,
    committer: Box<dyn RepositoryCommitter>,
}

pub struct PublishTransaction {
    connector: Arc<dyn Connector>,
    params: ConnectionParams,
    module: ModuleRevision,
    options: TransactionOptions,
    connections: Option<Connections>,
    queue: Vec<QueuedPut>,
    committed_paths: Vec<String>,
    state: TransactionState,
}

impl fmt::Debug for PublishTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishTransaction")
            .field("url", &self.params.url)
            .field("module", &self.module)
            .field("operations", &self.queue.len())
            .field("state", &self.state)
            .finish()
    }
}

impl PublishTransaction {
    /// Open a transaction for `module`.
    ///
    /// Fails with [`Error::IllegalState`] when binary diff is enabled and the
    /// module revision would be stored in the anchor folder itself.
    pub fn begin(
        connector: Arc<dyn Connector>,
        params: ConnectionParams,
        module: ModuleRevision,
        options: TransactionOptions,
    ) -> Result<Self> {
        if options.binary_diff.enabled && module.revision == options.binary_diff.folder_name {
            return Err(Error::illegal_state(format!(
                "module revision '{}' collides with the binary diff folder name",
                module.revision
            )));
        }
        tracing::info!(module = %module, url = %params.url, "Began publish transaction");
        Ok(Self {
            connector,
            params,
            module,
            options,
            connections: None,
            queue: Vec::new(),
            committed_paths: Vec::new(),
            state: TransactionState::Open,
        })
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn module(&self) -> &ModuleRevision {
        &self.module
    }

    pub fn message(&self) -> &str {
        &self.options.message
    }

    /// Queued operations in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = &PutOperation> {
        self.queue.iter().map(|queued| &queued.operation)
    }

    /// Repository-relative paths written by the successful commit.
    pub fn committed_paths(&self) -> &[String] {
        &self.committed_paths
    }

    fn connections(&mut self) -> Result<&Connections> {
        if self.connections.is_none() {
            let ancillary = self.connector.open_reader(&self.params)?;
            let committer = self.connector.open_committer(&self.params)?;
            tracing::debug!(url = %self.params.url, "Opened ancillary and commit connections");
            self.connections = Some(Connections {
                ancillary,
                committer,
            });
        }
        self.connections
            .as_ref()
            .ok_or_else(|| Error::illegal_state("repository connections unavailable"))
    }

    /// Schedule `source` to be written to `destination`.
    pub fn add_put_operation(
        &mut self,
        source: &Path,
        destination: &str,
        overwrite: bool,
    ) -> Result<&PutOperation> {
        if self.state != TransactionState::Open {
            return Err(Error::illegal_state(format!(
                "cannot add operations to a transaction that is {}",
                self.state
            )));
        }

        let repository_root = self.connections()?.ancillary.root().path().to_string();
        let explicit_root = self
            .options
            .explicit_root
            .clone()
            .unwrap_or_else(|| repository_root.clone());
        let operation = PutOperation::create(source, destination, overwrite, Some(&explicit_root))?;
        let resolved = operation.resolved();
        let path = PathResolver::relative_to(&resolved.full_path(), &repository_root)?;
        let anchor = self.anchor_for(resolved, &repository_root)?;

        tracing::info!(
            source = %source.display(),
            path = %path,
            overwrite,
            checksum = %operation.checksum(),
            "Scheduled put"
        );
        self.queue.push(QueuedPut {
            operation,
            path,
            anchor,
        });
        self.queue
            .last()
            .map(|queued| &queued.operation)
            .ok_or_else(|| Error::illegal_state("queued operation missing"))
    }

    /// Anchor path for `resolved`: the same file with its module revision
    /// folder replaced by the anchor folder name.
    ///
    /// Destinations without a revision folder get no anchor and are always
    /// written in full.
    fn anchor_for(&self, resolved: &ResolvedPath, repository_root: &str) -> Result<Option<String>> {
        let binary_diff = &self.options.binary_diff;
        if !binary_diff.enabled {
            return Ok(None);
        }
        if resolved
            .folder_segments()
            .any(|segment| segment == binary_diff.folder_name)
        {
            return Err(Error::illegal_state(format!(
                "destination '{}' lies in the binary diff folder '{}'",
                resolved.full_path(),
                binary_diff.folder_name
            )));
        }
        let Some(anchor) =
            resolved.with_folder_replaced(&self.module.revision, &binary_diff.folder_name)
        else {
            tracing::warn!(
                destination = %resolved.full_path(),
                revision = %self.module.revision,
                "Destination is not inside a revision folder, skipping binary diff"
            );
            return Ok(None);
        };
        PathResolver::relative_to(&anchor.full_path(), repository_root).map(Some)
    }

    /// Apply every queued operation in one revision.
    ///
    /// Returns `None` without touching the repository when nothing was queued.
    pub fn commit(&mut self) -> Result<Option<CommitInfo>> {
        if self.state != TransactionState::Open {
            return Err(Error::illegal_state(format!(
                "cannot commit a transaction that is {}",
                self.state
            )));
        }
        if self.queue.is_empty() {
            tracing::info!(module = %self.module, "Nothing to commit");
            self.state = TransactionState::Committed;
            return Ok(None);
        }

        self.state = TransactionState::CommitInProgress;
        match self.apply() {
            Ok((info, written)) => {
                tracing::info!(
                    module = %self.module,
                    revision = %info.revision,
                    operations = self.queue.len(),
                    "Committed publish transaction"
                );
                self.committed_paths = written;
                self.state = TransactionState::Committed;
                Ok(Some(info))
            }
            Err(e) => {
                tracing::info!(module = %self.module, error = %e, "Publish transaction aborted");
                self.state = TransactionState::Aborted;
                Err(e)
            }
        }
    }

    fn apply(&self) -> Result<(CommitInfo, Vec<String>)> {
        let connections = self
            .connections
            .as_ref()
            .ok_or_else(|| Error::illegal_state("transaction has no connections"))?;
        let base = connections
            .ancillary
            .latest_revision()
            .map_err(Error::commit_failure)?;
        let editor = connections
            .committer
            .open_commit_editor(&self.options.message, &self.options.author)
            .map_err(Error::commit_failure)?;

        let mut batch = Batch {
            reader: connections.ancillary.as_ref(),
            base,
            folders: HashSet::new(),
            written: Vec::new(),
        };
        let info = within_editor(editor, |editor| {
            for queued in &self.queue {
                batch.apply(editor, queued)?;
            }
            Ok(())
        })?;
        Ok((info, batch.written))
    }

    /// Discard the transaction. Calling it again is a no-op.
    pub fn abort(&mut self) {
        if self.state.is_terminal() {
            tracing::debug!(module = %self.module, state = %self.state, "Abort ignored");
            return;
        }
        tracing::info!(
            module = %self.module,
            operations = self.queue.len(),
            "Aborted publish transaction"
        );
        self.queue.clear();
        self.connections = None;
        self.state = TransactionState::Aborted;
    }
}

/// Run `apply` against `editor`, finalizing on success and discarding on
/// any error.
fn within_editor(
    mut editor: Box<dyn CommitEditor>,
    apply: impl FnOnce(&mut dyn CommitEditor) -> Result<()>,
) -> Result<CommitInfo> {
    match apply(editor.as_mut()) {
        Ok(()) => editor.finalize().map_err(Error::commit_failure),
        Err(e) => {
            if let Err(discard) = editor.discard() {
                tracing::warn!(error = %discard, "Failed to discard commit editor");
            }
            Err(e)
        }
    }
}

/// Per-commit bookkeeping over the base revision.
struct Batch<'a> {
    reader: &'a dyn RepositoryReader,
    base: Revision,
    folders: HashSet<String>,
    written: Vec<String>,
}

impl Batch<'_> {
    fn was_written(&self, path: &str) -> bool {
        self.written.iter().any(|written| written == path)
    }

    fn kind(&self, path: &str) -> Result<NodeKind> {
        if self.was_written(path) {
            return Ok(NodeKind::File);
        }
        if self.folders.contains(path) {
            return Ok(NodeKind::Folder);
        }
        self.reader
            .check_path(path, Some(self.base))
            .map_err(Error::commit_failure)
    }

    /// Create every missing folder on the way to `folder`.
    fn ensure_folders(&mut self, editor: &mut dyn CommitEditor, folder: &str) -> Result<()> {
        for ancestor in paths::ancestors(folder) {
            match self.kind(ancestor)? {
                NodeKind::Folder => {}
                NodeKind::None => {
                    tracing::debug!(folder = %ancestor, "Creating folder");
                    editor
                        .ensure_folder(ancestor)
                        .map_err(Error::commit_failure)?;
                }
                NodeKind::File => {
                    return Err(Error::commit_failure(vcpub_repo::Error::PathConflict {
                        path: ancestor.to_string(),
                        existing: NodeKind::File,
                    }));
                }
            }
            self.folders.insert(ancestor.to_string());
        }
        Ok(())
    }

    fn apply(&mut self, editor: &mut dyn CommitEditor, queued: &QueuedPut) -> Result<()> {
        let operation = &queued.operation;
        let path = queued.path.as_str();
        self.ensure_folders(editor, paths::parent(path))?;

        match self.kind(path)? {
            NodeKind::Folder => {
                return Err(Error::commit_failure(vcpub_repo::Error::PathConflict {
                    path: path.to_string(),
                    existing: NodeKind::Folder,
                }));
            }
            NodeKind::File if !operation.overwrite() => {
                return Err(Error::OverwriteDenied {
                    path: operation.resolved().full_path(),
                });
            }
            _ => {}
        }

        let content = operation.content().clone();
        match queued.anchor.as_deref() {
            Some(anchor) => {
                self.ensure_folders(editor, paths::parent(anchor))?;
                if self.anchor_matches(anchor, content.as_ref())? {
                    tracing::debug!(path, anchor, "Content unchanged, referencing anchor");
                    editor
                        .copy_file(anchor, self.base, path)
                        .map_err(Error::commit_failure)?;
                } else {
                    tracing::debug!(path, anchor, bytes = content.len(), "Writing full payload");
                    editor
                        .add_file(anchor, content.clone())
                        .map_err(Error::commit_failure)?;
                    editor
                        .add_file(path, content)
                        .map_err(Error::commit_failure)?;
                    self.written.push(anchor.to_string());
                }
            }
            None => {
                tracing::debug!(path, bytes = content.len(), "Writing full payload");
                editor
                    .add_file(path, content)
                    .map_err(Error::commit_failure)?;
            }
        }
        self.written.push(path.to_string());
        Ok(())
    }

    /// Whether the committed anchor holds exactly `content`.
    ///
    /// An anchor written earlier in this batch never matches: copies can only
    /// reference committed history.
    fn anchor_matches(&self, anchor: &str, content: &[u8]) -> Result<bool> {
        if self.was_written(anchor) {
            return Ok(false);
        }
        let info = self
            .reader
            .info(anchor, Some(self.base))
            .map_err(Error::commit_failure)?;
        match info {
            Some(entry) if entry.kind == NodeKind::File && entry.size == content.len() as u64 => {
                let stored = self
                    .reader
                    .read_bytes(anchor, Some(self.base))
                    .map_err(Error::commit_failure)?;
                Ok(stored == content)
            }
            _ => Ok(false),
        }
    }
}
