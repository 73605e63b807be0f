use std::fmt::{Display, Formatter};
use colored::Colorize;
use crate::errors::{SourceError, SourceResult};
use crate::services::materializer::MaterializedFile;
use crate::types::google_drive::RemoteEntry;

/// Result of one traversed entry. Folders carry their children.
#[derive(Debug)]
pub enum TraversalNode {
    Folder(FolderNode),
    File(FileNode),
}

#[derive(Debug)]
pub struct FolderNode {
    pub entry: RemoteEntry,
    /// Relative path of the folder, e.g. `/my_notes/drafts`.
    pub path: String,
    pub children: SourceResult<Vec<TraversalNode>>,
}

#[derive(Debug)]
pub struct FileNode {
    pub entry: RemoteEntry,
    /// Relative path of the containing folder (`""` at the root).
    pub parent: String,
    pub outcome: SourceResult<FileOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written(MaterializedFile),
    Described(RemoteEntry),
}

/// Depth-first pre-order list of the file nodes of a traversal tree.
pub fn flatten(nodes: &[TraversalNode]) -> Vec<&FileNode> {
    let mut files = vec![];
    let mut stack = nodes.iter().rev().collect::<Vec<_>>();

    while let Some(node) = stack.pop() {
        match node {
            TraversalNode::File(file) => files.push(file),
            TraversalNode::Folder(folder) => {
                if let Ok(children) = &folder.children {
                    stack.extend(children.iter().rev());
                }
            }
        }
    }

    files
}

/// A failure attributed to one remote entry (or the root listing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub id: String,
    pub name: String,
    pub path: String,
    pub error: SourceError,
}

impl Display for EntryFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) at '{}': {}", self.name, self.id, self.path, self.error)
    }
}

/// Partial-success summary of one hook invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TraversalReport {
    pub folders: usize,
    pub files_written: usize,
    pub files_described: usize,
    pub nodes_created: usize,
    pub trashed_skipped: usize,
    pub failures: Vec<EntryFailure>,
}

impl TraversalReport {
    /// Collect counts and failures from a traversal tree.
    ///
    /// Failures are listed in depth-first pre-order, like [flatten].
    pub fn from_nodes(nodes: &[TraversalNode]) -> Self {
        let mut report = Self::default();
        let mut stack = nodes.iter().rev().collect::<Vec<_>>();

        while let Some(node) = stack.pop() {
            match node {
                TraversalNode::Folder(folder) => {
                    report.folders += 1;
                    match &folder.children {
                        Ok(children) => stack.extend(children.iter().rev()),
                        Err(e) => report.failures.push(EntryFailure {
                            id: folder.entry.id().to_string(),
                            name: folder.entry.name().to_string(),
                            path: folder.path.clone(),
                            error: e.clone(),
                        }),
                    }
                }
                TraversalNode::File(file) => match &file.outcome {
                    Ok(FileOutcome::Written(_)) => report.files_written += 1,
                    Ok(FileOutcome::Described(_)) => report.files_described += 1,
                    Err(e) => report.failures.push(EntryFailure {
                        id: file.entry.id().to_string(),
                        name: file.entry.name().to_string(),
                        path: file.parent.clone(),
                        error: e.clone(),
                    }),
                },
            }
        }

        report
    }

    pub fn push_failure(&mut self, entry: &RemoteEntry, path: &str, error: SourceError) {
        self.failures.push(EntryFailure {
            id: entry.id().to_string(),
            name: entry.name().to_string(),
            path: path.to_string(),
            error,
        });
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Display for TraversalReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "folders: {}, files written: {}, files described: {}, nodes created: {}, trashed skipped: {}",
            self.folders, self.files_written, self.files_described, self.nodes_created, self.trashed_skipped)?;

        if self.is_complete() {
            write!(f, "{}", "no failures".green())
        } else {
            write!(f, "{}", format!("{} failure(s):", self.failures.len()).red())?;
            for failure in &self.failures {
                write!(f, "\n  - {}", failure)?;
            }
            Ok(())
        }
    }
}
