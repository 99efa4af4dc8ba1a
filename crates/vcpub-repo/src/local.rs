//! Local filesystem transport backed by a bare git repository
//!
//! Revision `n` is the `n`-th commit on the first-parent chain of
//! [`REVISIONS_REF`]; revision 0 is the empty tree. Git has no empty
//! folders, so folders exist through the files they contain.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use git2::{
    Commit, ErrorCode, Index, IndexEntry, IndexTime, ObjectType, Oid, Repository,
    RepositoryInitOptions, Signature, Sort, Tree, TreeEntry,
};
use parking_lot::Mutex;

use crate::{
    Error, Result,
    access::{CommitEditor, RepositoryCommitter, RepositoryReader},
    connector::{ConnectionParams, Connector},
    location::RepositoryUrl,
    paths,
    revision::{Author, CommitInfo, DirEntry, NodeKind, Revision},
};

/// Branch whose first-parent history defines revision numbers.
pub const REVISIONS_REF: &str = "refs/heads/main";

const FILE_MODE: u32 = 0o100644;

/// Read handle on a local repository.
pub struct LocalRepository {
    root: RepositoryUrl,
    repo: Mutex<Repository>,
}

impl LocalRepository {
    /// Create an empty repository at `path` and return its URL.
    ///
    /// Fails if a repository already exists there.
    pub fn init(path: &Path) -> Result<RepositoryUrl> {
        let mut opts = RepositoryInitOptions::new();
        opts.bare(true)
            .no_reinit(true)
            .mkpath(true)
            .initial_head("main");
        Repository::init_opts(path, &opts)?;
        tracing::info!(path = %path.display(), "Initialized local repository");
        RepositoryUrl::from_file_path(path)
    }

    /// Open the repository containing the location `url` points at.
    pub fn open(url: &RepositoryUrl) -> Result<Self> {
        let (root, repo) = open_containing(url)?;
        Ok(Self {
            root,
            repo: Mutex::new(repo),
        })
    }
}

/// Walk up from the URL's path to the first directory holding a repository.
fn open_containing(url: &RepositoryUrl) -> Result<(RepositoryUrl, Repository)> {
    let location = url.to_file_path()?;
    for candidate in location.ancestors().filter(|p| p.is_dir()) {
        if let Ok(repo) = Repository::open_bare(candidate) {
            tracing::trace!(root = %candidate.display(), "Located repository root");
            return Ok((RepositoryUrl::from_file_path(candidate)?.as_directory(), repo));
        }
    }
    Err(Error::RepositoryNotFound {
        url: url.to_string(),
    })
}

/// First-parent history of the revisions ref, oldest first.
fn history(repo: &Repository) -> Result<Vec<Oid>> {
    let tip = match repo.refname_to_id(REVISIONS_REF) {
        Ok(oid) => oid,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut walk = repo.revwalk()?;
    walk.push(tip)?;
    walk.simplify_first_parent()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
    Ok(walk.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn latest_of(history: &[Oid]) -> Revision {
    Revision::new(history.len() as u64)
}

/// Tree of one revision, `None` for the empty revision 0.
struct Snapshot<'r> {
    revision: Revision,
    tree: Option<Tree<'r>>,
    committed_at: Option<DateTime<Utc>>,
}

impl<'r> Snapshot<'r> {
    fn load(repo: &'r Repository, revision: Option<Revision>) -> Result<Self> {
        let history = history(repo)?;
        let latest = latest_of(&history);
        let revision = match revision {
            None => latest,
            Some(r) if r > latest => return Err(Error::NoSuchRevision { revision: r, latest }),
            Some(r) => r,
        };
        if revision == Revision::INITIAL {
            return Ok(Self {
                revision,
                tree: None,
                committed_at: None,
            });
        }

        let commit = repo.find_commit(history[(revision.get() - 1) as usize])?;
        Ok(Self {
            revision,
            committed_at: DateTime::from_timestamp(commit.time().seconds(), 0),
            tree: Some(commit.tree()?),
        })
    }

    fn entry(&self, path: &str) -> Result<Option<TreeEntry<'static>>> {
        let Some(tree) = &self.tree else {
            return Ok(None);
        };
        match tree.get_path(Path::new(path)) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn kind(&self, path: &str) -> Result<NodeKind> {
        let path = paths::normalize(path);
        if path.is_empty() {
            return Ok(NodeKind::Folder);
        }
        Ok(self.entry(path)?.map_or(NodeKind::None, |e| kind_of(&e)))
    }

    /// The blob id at `path`, which must name a file.
    fn file_id(&self, path: &str) -> Result<Oid> {
        let path = paths::normalize(path);
        let entry = self.entry(path)?.ok_or_else(|| Error::PathNotFound {
            path: path.to_string(),
            revision: self.revision,
        })?;
        match kind_of(&entry) {
            NodeKind::File => Ok(entry.id()),
            found => Err(Error::UnexpectedKind {
                path: path.to_string(),
                expected: NodeKind::File,
                found,
            }),
        }
    }

    fn folder(&self, repo: &'r Repository, path: &str) -> Result<Option<Tree<'r>>> {
        let path = paths::normalize(path);
        if path.is_empty() {
            return Ok(self.tree.clone());
        }
        let entry = self.entry(path)?.ok_or_else(|| Error::PathNotFound {
            path: path.to_string(),
            revision: self.revision,
        })?;
        match kind_of(&entry) {
            NodeKind::Folder => Ok(Some(repo.find_tree(entry.id())?)),
            found => Err(Error::UnexpectedKind {
                path: path.to_string(),
                expected: NodeKind::Folder,
                found,
            }),
        }
    }
}

fn kind_of(entry: &TreeEntry<'_>) -> NodeKind {
    match entry.kind() {
        Some(ObjectType::Tree) => NodeKind::Folder,
        Some(ObjectType::Blob) => NodeKind::File,
        _ => NodeKind::None,
    }
}

fn describe(repo: &Repository, entry: &TreeEntry<'_>, snapshot: &Snapshot<'_>) -> Result<DirEntry> {
    let kind = kind_of(entry);
    let size = match kind {
        NodeKind::File => repo.find_blob(entry.id())?.size() as u64,
        _ => 0,
    };
    Ok(DirEntry {
        name: String::from_utf8_lossy(entry.name_bytes()).into_owned(),
        kind,
        size,
        last_modified: snapshot.committed_at,
    })
}

impl RepositoryReader for LocalRepository {
    fn root(&self) -> &RepositoryUrl {
        &self.root
    }

    fn latest_revision(&self) -> Result<Revision> {
        let repo = self.repo.lock();
        Ok(latest_of(&history(&repo)?))
    }

    fn check_path(&self, path: &str, revision: Option<Revision>) -> Result<NodeKind> {
        let repo = self.repo.lock();
        Snapshot::load(&repo, revision)?.kind(path)
    }

    fn dir_entries(&self, path: &str, revision: Option<Revision>) -> Result<Vec<DirEntry>> {
        let repo = self.repo.lock();
        let snapshot = Snapshot::load(&repo, revision)?;
        let Some(tree) = snapshot.folder(&repo, path)? else {
            return Ok(Vec::new());
        };
        tree.iter()
            .map(|entry| describe(&repo, &entry, &snapshot))
            .collect()
    }

    fn info(&self, path: &str, revision: Option<Revision>) -> Result<Option<DirEntry>> {
        let repo = self.repo.lock();
        let snapshot = Snapshot::load(&repo, revision)?;
        let path = paths::normalize(path);
        if path.is_empty() {
            return Ok(Some(DirEntry {
                name: String::new(),
                kind: NodeKind::Folder,
                size: 0,
                last_modified: snapshot.committed_at,
            }));
        }
        match snapshot.entry(path)? {
            Some(entry) => describe(&repo, &entry, &snapshot).map(Some),
            None => Ok(None),
        }
    }

    fn read_file(
        &self,
        path: &str,
        revision: Option<Revision>,
        out: &mut dyn Write,
    ) -> Result<u64> {
        let repo = self.repo.lock();
        let snapshot = Snapshot::load(&repo, revision)?;
        let blob = repo.find_blob(snapshot.file_id(path)?)?;
        out.write_all(blob.content())?;
        Ok(blob.size() as u64)
    }
}

/// Commit handle on a local repository.
pub struct LocalCommitter {
    root: RepositoryUrl,
    repo: Arc<Mutex<Repository>>,
}

impl LocalCommitter {
    pub fn open(url: &RepositoryUrl) -> Result<Self> {
        let (root, repo) = open_containing(url)?;
        Ok(Self {
            root,
            repo: Arc::new(Mutex::new(repo)),
        })
    }
}

impl RepositoryCommitter for LocalCommitter {
    fn root(&self) -> &RepositoryUrl {
        &self.root
    }

    fn open_commit_editor(&self, message: &str, author: &Author) -> Result<Box<dyn CommitEditor>> {
        let base = {
            let repo = self.repo.lock();
            history(&repo)?
        };
        tracing::debug!(root = %self.root, base = %latest_of(&base), "Opened commit editor");
        Ok(Box::new(LocalCommitEditor {
            repo: Arc::clone(&self.repo),
            base_revision: latest_of(&base),
            base: base.last().copied(),
            message: message.to_string(),
            author: author.clone(),
            changes: Vec::new(),
        }))
    }
}

enum Change {
    Folder(String),
    Write {
        path: String,
        content: Bytes,
    },
    Copy {
        from: String,
        revision: Revision,
        to: String,
    },
}

/// Buffers changes and writes objects only when finalized.
struct LocalCommitEditor {
    repo: Arc<Mutex<Repository>>,
    base: Option<Oid>,
    base_revision: Revision,
    message: String,
    author: Author,
    changes: Vec<Change>,
}

fn blob_entry(path: &str, id: Oid, size: usize) -> IndexEntry {
    IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode: FILE_MODE,
        uid: 0,
        gid: 0,
        file_size: u32::try_from(size).unwrap_or(u32::MAX),
        id,
        flags: 0,
        flags_extended: 0,
        path: path.as_bytes().to_vec(),
    }
}

impl LocalCommitEditor {
    fn build_tree(&self, repo: &Repository, parent: Option<&Commit<'_>>) -> Result<Oid> {
        let mut index = Index::new()?;
        if let Some(parent) = parent {
            index.read_tree(&parent.tree()?)?;
        }

        for change in &self.changes {
            match change {
                Change::Folder(path) => {
                    tracing::trace!(path = %path, "Folder implied by its contents");
                }
                Change::Write { path, content } => {
                    let id = repo.blob(content)?;
                    index.add(&blob_entry(path, id, content.len()))?;
                }
                Change::Copy { from, revision, to } => {
                    let source = Snapshot::load(repo, Some(*revision))?;
                    let id = source.file_id(from)?;
                    let size = repo.find_blob(id)?.size();
                    index.add(&blob_entry(to, id, size))?;
                }
            }
        }

        Ok(index.write_tree_to(repo)?)
    }
}

impl CommitEditor for LocalCommitEditor {
    fn ensure_folder(&mut self, path: &str) -> Result<()> {
        self.changes
            .push(Change::Folder(paths::normalize(path).to_string()));
        Ok(())
    }

    fn add_file(&mut self, path: &str, content: Bytes) -> Result<()> {
        self.changes.push(Change::Write {
            path: paths::normalize(path).to_string(),
            content,
        });
        Ok(())
    }

    fn copy_file(&mut self, from_path: &str, from_revision: Revision, to_path: &str) -> Result<()> {
        self.changes.push(Change::Copy {
            from: paths::normalize(from_path).to_string(),
            revision: from_revision,
            to: paths::normalize(to_path).to_string(),
        });
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<CommitInfo> {
        let repo = self.repo.lock();
        let history = history(&repo)?;
        if history.last().copied() != self.base {
            return Err(Error::OutOfDate {
                base: self.base_revision,
                latest: latest_of(&history),
            });
        }

        let parent = self.base.map(|oid| repo.find_commit(oid)).transpose()?;
        let tree = repo.find_tree(self.build_tree(&repo, parent.as_ref())?)?;
        let signature = Signature::now(&self.author.name, &self.author.email)?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let oid = repo.commit(
            Some(REVISIONS_REF),
            &signature,
            &signature,
            &self.message,
            &tree,
            &parents,
        )?;

        let revision = self.base_revision.next();
        tracing::debug!(%revision, commit = %oid, changes = self.changes.len(), "Finalized commit");
        Ok(CommitInfo {
            revision,
            changes: self.changes.len(),
        })
    }

    fn discard(self: Box<Self>) -> Result<()> {
        tracing::debug!(
            base = %self.base_revision,
            changes = self.changes.len(),
            "Discarded commit editor"
        );
        Ok(())
    }
}

/// Transport for `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalConnector;

impl Connector for LocalConnector {
    fn open_reader(&self, params: &ConnectionParams) -> Result<Arc<dyn RepositoryReader>> {
        Ok(Arc::new(LocalRepository::open(&params.url)?))
    }

    fn open_committer(&self, params: &ConnectionParams) -> Result<Box<dyn RepositoryCommitter>> {
        Ok(Box::new(LocalCommitter::open(&params.url)?))
    }
}
