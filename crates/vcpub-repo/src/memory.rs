//! In-memory transport
//!
//! A revisioned tree with explicit folders that lives for as long as any
//! handle to it. Every connection opened through [`MemoryConnector`] talks to
//! the same shared state, like separate network connections to one server.
//! Used wherever a real transport would be too heavy, most notably tests.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{
    Error, Result,
    access::{CommitEditor, RepositoryCommitter, RepositoryReader},
    connector::{ConnectionParams, Connector},
    location::RepositoryUrl,
    paths,
    revision::{Author, CommitInfo, DirEntry, NodeKind, Revision},
};

#[derive(Debug, Clone)]
enum Node {
    Folder,
    File(Bytes),
}

impl Node {
    fn kind(&self) -> NodeKind {
        match self {
            Node::Folder => NodeKind::Folder,
            Node::File(_) => NodeKind::File,
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    nodes: BTreeMap<String, Node>,
    committed_at: DateTime<Utc>,
    message: String,
}

#[derive(Debug)]
struct State {
    revisions: Vec<Snapshot>,
    transmitted_bytes: u64,
    copy_references: u64,
    failing_writes: HashSet<String>,
}

impl State {
    fn latest(&self) -> Revision {
        Revision::new(self.revisions.len() as u64 - 1)
    }

    fn snapshot(&self, revision: Option<Revision>) -> Result<(Revision, &Snapshot)> {
        let latest = self.latest();
        let revision = revision.unwrap_or(latest);
        if revision > latest {
            return Err(Error::NoSuchRevision { revision, latest });
        }
        Ok((revision, &self.revisions[revision.get() as usize]))
    }
}

/// Shared in-memory repository.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    root: RepositoryUrl,
    state: Arc<Mutex<State>>,
}

impl MemoryRepository {
    /// Create an empty repository (revision 0) rooted at `root`.
    pub fn new(root: RepositoryUrl) -> Self {
        let initial = Snapshot {
            nodes: BTreeMap::new(),
            committed_at: Utc::now(),
            message: String::new(),
        };
        Self {
            root: root.as_directory(),
            state: Arc::new(Mutex::new(State {
                revisions: vec![initial],
                transmitted_bytes: 0,
                copy_references: 0,
                failing_writes: HashSet::new(),
            })),
        }
    }

    pub fn root(&self) -> &RepositoryUrl {
        &self.root
    }

    pub fn latest_revision(&self) -> Revision {
        self.state.lock().latest()
    }

    /// Commit message recorded for a revision.
    pub fn message(&self, revision: Revision) -> Option<String> {
        let state = self.state.lock();
        state
            .revisions
            .get(revision.get() as usize)
            .map(|s| s.message.clone())
    }

    /// Content of a file in the latest revision.
    pub fn file(&self, path: &str) -> Option<Bytes> {
        let state = self.state.lock();
        let (_, snapshot) = state.snapshot(None).ok()?;
        match snapshot.nodes.get(paths::normalize(path)) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Paths of every node in the latest revision, sorted.
    pub fn paths(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .revisions
            .last()
            .map(|s| s.nodes.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total file content received through `add_file`.
    pub fn transmitted_bytes(&self) -> u64 {
        self.state.lock().transmitted_bytes
    }

    /// Number of `copy_file` operations received.
    pub fn copy_references(&self) -> u64 {
        self.state.lock().copy_references
    }

    /// Make every later `add_file` to `path` fail with a transport error.
    pub fn fail_writes_to(&self, path: &str) {
        self.state
            .lock()
            .failing_writes
            .insert(paths::normalize(path).to_string());
    }

    /// Commit a single file (creating its folders) outside any publish flow.
    pub fn seed_file(&self, path: &str, content: impl Into<Bytes>) -> Result<Revision> {
        let mut editor = self.handle().open_commit_editor("seed", &Author::default())?;
        let path = paths::normalize(path);
        for folder in paths::ancestors(paths::parent(path)) {
            editor.ensure_folder(folder)?;
        }
        editor.add_file(path, content.into())?;
        Ok(editor.finalize()?.revision)
    }

    fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            repository: self.clone(),
        }
    }
}

/// One connection to a [`MemoryRepository`].
struct MemoryHandle {
    repository: MemoryRepository,
}

impl MemoryHandle {
    fn node_kind(snapshot: &Snapshot, path: &str) -> NodeKind {
        let path = paths::normalize(path);
        if path.is_empty() {
            return NodeKind::Folder;
        }
        snapshot.nodes.get(path).map_or(NodeKind::None, Node::kind)
    }
}

fn describe(name: &str, node: &Node, snapshot: &Snapshot) -> DirEntry {
    DirEntry {
        name: name.to_string(),
        kind: node.kind(),
        size: match node {
            Node::File(content) => content.len() as u64,
            Node::Folder => 0,
        },
        last_modified: Some(snapshot.committed_at),
    }
}

impl RepositoryReader for MemoryHandle {
    fn root(&self) -> &RepositoryUrl {
        &self.repository.root
    }

    fn latest_revision(&self) -> Result<Revision> {
        Ok(self.repository.latest_revision())
    }

    fn check_path(&self, path: &str, revision: Option<Revision>) -> Result<NodeKind> {
        let state = self.repository.state.lock();
        let (_, snapshot) = state.snapshot(revision)?;
        Ok(Self::node_kind(snapshot, path))
    }

    fn dir_entries(&self, path: &str, revision: Option<Revision>) -> Result<Vec<DirEntry>> {
        let state = self.repository.state.lock();
        let (revision, snapshot) = state.snapshot(revision)?;
        let path = paths::normalize(path);
        match Self::node_kind(snapshot, path) {
            NodeKind::Folder => {}
            NodeKind::None => {
                return Err(Error::PathNotFound {
                    path: path.to_string(),
                    revision,
                });
            }
            found => {
                return Err(Error::UnexpectedKind {
                    path: path.to_string(),
                    expected: NodeKind::Folder,
                    found,
                });
            }
        }

        Ok(snapshot
            .nodes
            .iter()
            .filter(|(child, _)| paths::parent(child) == path && child.as_str() != path)
            .map(|(child, node)| describe(paths::file_name(child), node, snapshot))
            .collect())
    }

    fn info(&self, path: &str, revision: Option<Revision>) -> Result<Option<DirEntry>> {
        let state = self.repository.state.lock();
        let (_, snapshot) = state.snapshot(revision)?;
        let path = paths::normalize(path);
        if path.is_empty() {
            return Ok(Some(describe("", &Node::Folder, snapshot)));
        }
        Ok(snapshot
            .nodes
            .get(path)
            .map(|node| describe(paths::file_name(path), node, snapshot)))
    }

    fn read_file(
        &self,
        path: &str,
        revision: Option<Revision>,
        out: &mut dyn Write,
    ) -> Result<u64> {
        let content = {
            let state = self.repository.state.lock();
            let (revision, snapshot) = state.snapshot(revision)?;
            file_at(snapshot, revision, path)?
        };
        out.write_all(&content)?;
        Ok(content.len() as u64)
    }
}

fn file_at(snapshot: &Snapshot, revision: Revision, path: &str) -> Result<Bytes> {
    let path = paths::normalize(path);
    match snapshot.nodes.get(path) {
        Some(Node::File(content)) => Ok(content.clone()),
        Some(Node::Folder) => Err(Error::UnexpectedKind {
            path: path.to_string(),
            expected: NodeKind::File,
            found: NodeKind::Folder,
        }),
        None => Err(Error::PathNotFound {
            path: path.to_string(),
            revision,
        }),
    }
}

impl RepositoryCommitter for MemoryHandle {
    fn root(&self) -> &RepositoryUrl {
        &self.repository.root
    }

    fn open_commit_editor(&self, message: &str, author: &Author) -> Result<Box<dyn CommitEditor>> {
        tracing::trace!(author = %author.name, "Opening in-memory commit editor");
        Ok(Box::new(MemoryCommitEditor {
            repository: self.repository.clone(),
            base: self.repository.latest_revision(),
            message: message.to_string(),
            changes: Vec::new(),
        }))
    }
}

enum Change {
    Folder(String),
    Write(String, Bytes),
    Copy {
        from: String,
        revision: Revision,
        to: String,
    },
}

struct MemoryCommitEditor {
    repository: MemoryRepository,
    base: Revision,
    message: String,
    changes: Vec<Change>,
}

fn require_parent(nodes: &BTreeMap<String, Node>, path: &str, revision: Revision) -> Result<()> {
    let parent = paths::parent(path);
    match nodes.get(parent) {
        _ if parent.is_empty() => Ok(()),
        Some(Node::Folder) => Ok(()),
        Some(Node::File(_)) => Err(Error::PathConflict {
            path: parent.to_string(),
            existing: NodeKind::File,
        }),
        None => Err(Error::PathNotFound {
            path: parent.to_string(),
            revision,
        }),
    }
}

fn put_file(
    nodes: &mut BTreeMap<String, Node>,
    path: &str,
    content: Bytes,
    revision: Revision,
) -> Result<()> {
    require_parent(nodes, path, revision)?;
    if let Some(Node::Folder) = nodes.get(path) {
        return Err(Error::PathConflict {
            path: path.to_string(),
            existing: NodeKind::Folder,
        });
    }
    nodes.insert(path.to_string(), Node::File(content));
    Ok(())
}

impl CommitEditor for MemoryCommitEditor {
    fn ensure_folder(&mut self, path: &str) -> Result<()> {
        self.changes
            .push(Change::Folder(paths::normalize(path).to_string()));
        Ok(())
    }

    fn add_file(&mut self, path: &str, content: Bytes) -> Result<()> {
        let path = paths::normalize(path).to_string();
        let mut state = self.repository.state.lock();
        if state.failing_writes.contains(&path) {
            return Err(Error::Transport {
                message: format!("write to '{path}' rejected"),
            });
        }
        state.transmitted_bytes += content.len() as u64;
        drop(state);
        self.changes.push(Change::Write(path, content));
        Ok(())
    }

    fn copy_file(&mut self, from_path: &str, from_revision: Revision, to_path: &str) -> Result<()> {
        self.repository.state.lock().copy_references += 1;
        self.changes.push(Change::Copy {
            from: paths::normalize(from_path).to_string(),
            revision: from_revision,
            to: paths::normalize(to_path).to_string(),
        });
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<CommitInfo> {
        let mut state = self.repository.state.lock();
        let latest = state.latest();
        if latest != self.base {
            return Err(Error::OutOfDate {
                base: self.base,
                latest,
            });
        }

        let (_, base) = state.snapshot(Some(self.base))?;
        let mut nodes = base.nodes.clone();
        for change in &self.changes {
            match change {
                Change::Folder(path) => match nodes.get(path.as_str()) {
                    Some(Node::Folder) => {}
                    Some(Node::File(_)) => {
                        return Err(Error::PathConflict {
                            path: path.clone(),
                            existing: NodeKind::File,
                        });
                    }
                    None => {
                        require_parent(&nodes, path, self.base)?;
                        nodes.insert(path.clone(), Node::Folder);
                    }
                },
                Change::Write(path, content) => {
                    put_file(&mut nodes, path, content.clone(), self.base)?;
                }
                Change::Copy { from, revision, to } => {
                    let (revision, source) = state.snapshot(Some(*revision))?;
                    let content = file_at(source, revision, from)?;
                    put_file(&mut nodes, to, content, self.base)?;
                }
            }
        }

        state.revisions.push(Snapshot {
            nodes,
            committed_at: Utc::now(),
            message: self.message.clone(),
        });
        Ok(CommitInfo {
            revision: state.latest(),
            changes: self.changes.len(),
        })
    }

    fn discard(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Connector handing out connections to one shared [`MemoryRepository`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    repository: MemoryRepository,
}

impl MemoryConnector {
    pub fn new(repository: MemoryRepository) -> Self {
        Self { repository }
    }
}

impl Connector for MemoryConnector {
    fn open_reader(&self, _params: &ConnectionParams) -> Result<Arc<dyn RepositoryReader>> {
        Ok(Arc::new(self.repository.handle()))
    }

    fn open_committer(&self, _params: &ConnectionParams) -> Result<Box<dyn RepositoryCommitter>> {
        Ok(Box::new(self.repository.handle()))
    }
}
