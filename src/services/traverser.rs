use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use log::{debug, error};
use tokio::sync::{Semaphore, SemaphorePermit};
use crate::errors::SourceError::{ConnectionError, FileOperationError};
use crate::errors::SourceResult;
use crate::services::materializer::{derive_filename, ensure_directory, materialize};
use crate::services::DriveService;
use crate::types::google_drive::RemoteEntry;
use crate::types::traversal::{FileNode, FileOutcome, FolderNode, TraversalNode};
use crate::utils::parser::{child_parent_path, normalize_folder_name};

/// What the traversal does with each file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalMode {
    /// Mirror folders under `destination` and write file contents into them.
    Write { destination: PathBuf },
    /// Fetch file metadata only.
    Describe,
}

/// Walks a Drive folder tree depth first.
///
/// Siblings are processed concurrently. Every provider request and file write
/// holds one permit, so at most `concurrency` of them run at a time. Permits are
/// released before descending into a sub-folder.
pub struct Traverser {
    service: Arc<dyn DriveService>,
    mode: TraversalMode,
    export_mime_type: String,
    permits: Semaphore,
}

impl Traverser {
    pub fn new(service: Arc<dyn DriveService>, mode: TraversalMode, export_mime_type: &str, concurrency: u16) -> Self {
        Self {
            service,
            mode,
            export_mime_type: export_mime_type.to_string(),
            permits: Semaphore::new(usize::from(concurrency.max(1))),
        }
    }

    pub fn mode(&self) -> &TraversalMode {
        &self.mode
    }

    async fn permit(&self) -> SourceResult<SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|_| ConnectionError("Traversal request pool is closed".to_string()))
    }

    /// List the children of a folder while holding a permit.
    pub async fn list(&self, folder_id: &str) -> SourceResult<Vec<RemoteEntry>> {
        let _permit = self.permit().await?;
        self.service.list_folder(folder_id).await
    }

    /// Traverse `entries`, the children of the folder at relative path `parent`.
    ///
    /// Returns one node per entry, in the order of `entries`. In write mode an
    /// entry whose local name is already taken by an earlier sibling fails
    /// instead of overwriting it.
    pub fn traverse<'a>(&'a self, entries: Vec<RemoteEntry>, parent: &'a str) -> BoxFuture<'a, Vec<TraversalNode>> {
        async move {
            let mut claimed = HashSet::new();
            let pending = entries
                .into_iter()
                .map(|entry| {
                    let collision = self.local_name(&entry)
                        .filter(|name| !claimed.insert(name.clone()));
                    (entry, collision)
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|(entry, collision)| self.traverse_entry(entry, parent, collision));

            join_all(pending).await
        }.boxed()
    }

    /// Name of the directory or file an entry occupies under its parent in write mode.
    fn local_name(&self, entry: &RemoteEntry) -> Option<String> {
        match &self.mode {
            TraversalMode::Write { .. } if entry.is_dir() => Some(normalize_folder_name(entry.name())),
            TraversalMode::Write { .. } => Some(derive_filename(entry, &self.export_mime_type)),
            TraversalMode::Describe => None,
        }
    }

    async fn traverse_entry(&self, entry: RemoteEntry, parent: &str, collision: Option<String>) -> TraversalNode {
        if let Some(name) = collision {
            return duplicate_node(entry, parent, &name);
        }

        if entry.is_dir() {
            TraversalNode::Folder(self.traverse_folder(entry, parent).await)
        } else {
            let outcome = self.fetch_file(&entry, parent).await;
            if let Err(e) = &outcome {
                error!("Failed to fetch {} ({}) in '{}': {}", entry.name(), entry.id(), parent, e);
            }
            TraversalNode::File(FileNode {
                entry,
                parent: parent.to_string(),
                outcome,
            })
        }
    }

    async fn traverse_folder(&self, entry: RemoteEntry, parent: &str) -> FolderNode {
        let folder_name = normalize_folder_name(entry.name());
        let path = child_parent_path(parent, &folder_name);

        let children = match self.prepare_folder(&entry, parent, &folder_name).await {
            Ok(children) => {
                debug!("Descending into {} with {} entries", path, children.len());
                Ok(self.traverse(children, &path).await)
            }
            Err(e) => {
                error!("Failed to read folder {} ({}): {}", path, entry.id(), e);
                Err(e)
            }
        };

        FolderNode {
            entry,
            path,
            children,
        }
    }

    /// Create the mirrored directory (write mode) and list the folder's children.
    async fn prepare_folder(&self, entry: &RemoteEntry, parent: &str, folder_name: &str) -> SourceResult<Vec<RemoteEntry>> {
        if let TraversalMode::Write { destination } = &self.mode {
            let _permit = self.permit().await?;
            ensure_directory(destination, parent, folder_name).await?;
        }

        self.list(entry.id()).await
    }

    async fn fetch_file(&self, entry: &RemoteEntry, parent: &str) -> SourceResult<FileOutcome> {
        let _permit = self.permit().await?;

        match &self.mode {
            TraversalMode::Write { destination } => {
                let written = materialize(
                    self.service.as_ref(),
                    entry,
                    &self.export_mime_type,
                    destination,
                    parent,
                ).await?;
                Ok(FileOutcome::Written(written))
            }
            TraversalMode::Describe => {
                let mut metadata = self.service.get_metadata(entry.id()).await?;
                // The metadata field selector does not include the MIME type.
                if metadata.mime_type.is_empty() {
                    metadata.mime_type = entry.mime_type().to_string();
                }
                Ok(FileOutcome::Described(metadata))
            }
        }
    }
}

fn duplicate_node(entry: RemoteEntry, parent: &str, name: &str) -> TraversalNode {
    error!("Skipping {} ({}): '{}/{}' is already used by a sibling", entry.name(), entry.id(), parent, name);
    let error = FileOperationError(format!(
        "'{}/{}' is already used by another entry in the same folder", parent, name));

    if entry.is_dir() {
        TraversalNode::Folder(FolderNode {
            path: child_parent_path(parent, name),
            entry,
            children: Err(error),
        })
    } else {
        TraversalNode::File(FileNode {
            entry,
            parent: parent.to_string(),
            outcome: Err(error),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use async_trait::async_trait;
    use crate::errors::SourceError::{FileOperationError, GoogleDriveError};
    use crate::types::traversal::{flatten, TraversalReport};
    use crate::utils::file_type::{DOCX_MIME, FOLDER_MIME, GOOGLE_DOCUMENT_MIME};
    use super::*;

    /// In-memory Drive: folder id -> children, file id -> content.
    #[derive(Default)]
    pub(crate) struct FakeDrive {
        pub(crate) folders: HashMap<String, Vec<RemoteEntry>>,
        pub(crate) contents: HashMap<String, Vec<u8>>,
        pub(crate) failing: Vec<String>,
        pub(crate) listed: Mutex<Vec<String>>,
        pub(crate) delay: Option<Duration>,
        in_flight: AtomicUsize,
        pub(crate) max_in_flight: AtomicUsize,
    }

    impl FakeDrive {
        pub(crate) fn folder(mut self, id: &str, children: Vec<RemoteEntry>) -> Self {
            self.folders.insert(id.to_string(), children);
            self
        }

        pub(crate) fn content(mut self, id: &str, content: &[u8]) -> Self {
            self.contents.insert(id.to_string(), content.to_vec());
            self
        }

        pub(crate) fn failing(mut self, id: &str) -> Self {
            self.failing.push(id.to_string());
            self
        }

        fn entry(&self, id: &str) -> Option<RemoteEntry> {
            self.folders
                .values()
                .flatten()
                .find(|entry| entry.id() == id)
                .cloned()
        }

        async fn request(&self, id: &str) -> SourceResult<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.iter().any(|failing| failing == id) {
                return Err(GoogleDriveError(format!("Failed to request {} (status 500)", id)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DriveService for FakeDrive {
        async fn list_folder(&self, folder_id: &str) -> SourceResult<Vec<RemoteEntry>> {
            self.listed.lock().unwrap().push(folder_id.to_string());
            self.request(folder_id).await?;
            Ok(self.folders.get(folder_id).cloned().unwrap_or_default())
        }

        async fn get_metadata(&self, file_id: &str) -> SourceResult<RemoteEntry> {
            self.request(file_id).await?;
            let mut entry = self.entry(file_id)
                .ok_or_else(|| GoogleDriveError(format!("File not found: {}", file_id)))?;
            entry.kind = Some("drive#file".to_string());
            entry.mime_type = String::new();
            Ok(entry)
        }

        async fn download(&self, entry: &RemoteEntry, _export_mime_type: &str) -> SourceResult<Vec<u8>> {
            self.request(entry.id()).await?;
            Ok(self.contents.get(entry.id()).cloned().unwrap_or_default())
        }
    }

    fn folder(id: &str, name: &str) -> RemoteEntry {
        RemoteEntry::new(id, name, FOLDER_MIME)
    }

    fn sample_drive() -> FakeDrive {
        FakeDrive::default()
            .folder("root", vec![
                folder("notes", "My Notes"),
                RemoteEntry::new("report", "report", "application/octet-stream"),
            ])
            .folder("notes", vec![
                RemoteEntry::new("doc", "Ideas", GOOGLE_DOCUMENT_MIME),
                folder("drafts", "Old Drafts"),
            ])
            .folder("drafts", vec![RemoteEntry::new("draft", "draft.txt", "text/plain")])
            .content("report", b"binary report")
            .content("doc", b"docx bytes")
            .content("draft", b"draft text")
    }

    #[tokio::test]
    async fn test_write_mode_mirrors_tree() {
        let _ = env_logger::builder().is_test(true).try_init();
        let destination = tempfile::tempdir().unwrap();
        let drive: Arc<dyn DriveService> = Arc::new(sample_drive());
        let traverser = Traverser::new(
            drive.clone(),
            TraversalMode::Write { destination: destination.path().to_path_buf() },
            DOCX_MIME,
            4);

        let root = traverser.list("root").await.unwrap();
        let nodes = traverser.traverse(root, "").await;

        let root_path = destination.path();
        assert!(root_path.join("my_notes").is_dir());
        assert!(root_path.join("my_notes").join("old_drafts").is_dir());
        assert_eq!(std::fs::read(root_path.join("report")).unwrap(), b"binary report");
        assert_eq!(std::fs::read(root_path.join("my_notes").join("Ideas.docx")).unwrap(), b"docx bytes");
        assert_eq!(
            std::fs::read(root_path.join("my_notes").join("old_drafts").join("draft.txt")).unwrap(),
            b"draft text");

        let parents = flatten(&nodes)
            .iter()
            .map(|file| (file.entry.id().to_string(), file.parent.clone()))
            .collect::<Vec<_>>();
        assert_eq!(parents, vec![
            ("doc".to_string(), "/my_notes".to_string()),
            ("draft".to_string(), "/my_notes/old_drafts".to_string()),
            ("report".to_string(), "".to_string()),
        ]);
    }

    #[tokio::test]
    async fn test_folder_paths_are_normalized() {
        let drive = Arc::new(sample_drive());
        let traverser = Traverser::new(drive.clone(), TraversalMode::Describe, DOCX_MIME, 4);

        let root = traverser.list("root").await.unwrap();
        let nodes = traverser.traverse(root, "").await;

        let TraversalNode::Folder(notes) = &nodes[0] else { panic!("expected a folder") };
        assert_eq!(notes.path, "/my_notes");
        let children = notes.children.as_ref().unwrap();
        let TraversalNode::Folder(drafts) = &children[1] else { panic!("expected a folder") };
        assert_eq!(drafts.path, "/my_notes/old_drafts");

        assert_eq!(*drive.listed.lock().unwrap(), vec!["root", "notes", "drafts"]);
    }

    #[tokio::test]
    async fn test_describe_mode_fetches_metadata_only() {
        let destination = tempfile::tempdir().unwrap();
        let traverser = Traverser::new(Arc::new(sample_drive()), TraversalMode::Describe, DOCX_MIME, 4);

        let root = traverser.list("root").await.unwrap();
        let nodes = traverser.traverse(root, "").await;

        let files = flatten(&nodes);
        assert_eq!(files.len(), 3);
        for file in files {
            let Ok(FileOutcome::Described(metadata)) = &file.outcome else { panic!("expected metadata") };
            assert_eq!(metadata.kind(), Some("drive#file"));
            assert_eq!(metadata.mime_type(), file.entry.mime_type());
        }
        assert_eq!(std::fs::read_dir(destination.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_kept_per_entry() {
        let destination = tempfile::tempdir().unwrap();
        let drive = sample_drive().failing("report").failing("drafts");
        let traverser = Traverser::new(
            Arc::new(drive),
            TraversalMode::Write { destination: destination.path().to_path_buf() },
            DOCX_MIME,
            2);

        let root = traverser.list("root").await.unwrap();
        let nodes = traverser.traverse(root, "").await;

        let TraversalNode::File(report) = &nodes[1] else { panic!("expected a file") };
        assert!(matches!(report.outcome, Err(GoogleDriveError(_))));

        let TraversalNode::Folder(notes) = &nodes[0] else { panic!("expected a folder") };
        let children = notes.children.as_ref().unwrap();
        assert!(matches!(&children[0], TraversalNode::File(FileNode { outcome: Ok(_), .. })));
        let TraversalNode::Folder(drafts) = &children[1] else { panic!("expected a folder") };
        assert!(drafts.children.is_err());

        assert!(destination.path().join("my_notes").join("Ideas.docx").exists());
        assert!(!destination.path().join("report").exists());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let children = (0..12)
            .map(|index| RemoteEntry::new(&format!("file{}", index), &format!("file{}", index), "text/plain"))
            .collect::<Vec<_>>();
        let mut drive = FakeDrive::default().folder("root", children);
        drive.delay = Some(Duration::from_millis(20));
        let drive = Arc::new(drive);

        let traverser = Traverser::new(drive.clone(), TraversalMode::Describe, DOCX_MIME, 3);
        let root = traverser.list("root").await.unwrap();
        let nodes = traverser.traverse(root, "").await;

        assert_eq!(nodes.len(), 12);
        let max = drive.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "max in flight was {}", max);
        assert!(max >= 2, "siblings were not processed concurrently");
    }

    fn colliding_drive() -> FakeDrive {
        FakeDrive::default()
            .folder("root", vec![
                RemoteEntry::new("a", "dup", "text/plain"),
                RemoteEntry::new("b", "dup", "text/plain"),
                folder("upper", "My Notes"),
                folder("lower", "my notes"),
            ])
            .folder("upper", vec![RemoteEntry::new("x1", "x.txt", "text/plain")])
            .folder("lower", vec![RemoteEntry::new("x2", "x.txt", "text/plain")])
            .content("a", b"first")
            .content("b", b"second")
            .content("x1", b"from My Notes")
            .content("x2", b"from my notes")
    }

    #[tokio::test]
    async fn test_colliding_local_names_fail_later_siblings() {
        let destination = tempfile::tempdir().unwrap();
        let drive = Arc::new(colliding_drive());
        let traverser = Traverser::new(
            drive.clone(),
            TraversalMode::Write { destination: destination.path().to_path_buf() },
            DOCX_MIME,
            4);

        let root = traverser.list("root").await.unwrap();
        let nodes = traverser.traverse(root, "").await;
        let report = TraversalReport::from_nodes(&nodes);

        assert_eq!(std::fs::read(destination.path().join("dup")).unwrap(), b"first");
        assert_eq!(
            std::fs::read(destination.path().join("my_notes").join("x.txt")).unwrap(),
            b"from My Notes");

        assert_eq!(report.files_written, 2);
        assert!(!report.is_complete());
        let failed = report.failures.iter().map(|failure| failure.id.as_str()).collect::<Vec<_>>();
        assert_eq!(failed, vec!["b", "lower"]);
        assert!(report.failures.iter().all(|failure| matches!(failure.error, FileOperationError(_))));

        // The shadowed folder is never listed.
        assert!(!drive.listed.lock().unwrap().contains(&"lower".to_string()));
    }

    #[tokio::test]
    async fn test_describe_mode_keeps_same_named_entries() {
        let traverser = Traverser::new(Arc::new(colliding_drive()), TraversalMode::Describe, DOCX_MIME, 4);

        let root = traverser.list("root").await.unwrap();
        let report = TraversalReport::from_nodes(&traverser.traverse(root, "").await);

        assert_eq!(report.files_described, 4);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_empty_folder_yields_no_nodes() {
        let traverser = Traverser::new(
            Arc::new(FakeDrive::default()),
            TraversalMode::Describe,
            DOCX_MIME,
            1);

        let root = traverser.list("root").await.unwrap();
        assert!(traverser.traverse(root, "").await.is_empty());
    }
}
