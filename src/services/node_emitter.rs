use async_trait::async_trait;
use log::{debug, error, info};
use crate::errors::SourceResult;
use crate::types::google_drive::RemoteEntry;
use crate::types::node::ContentNode;
use crate::types::traversal::{flatten, FileNode, FileOutcome, TraversalNode, TraversalReport};

/// Host-side store that receives content nodes.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Register a node. Registering the same id again replaces the node.
    async fn create_node(&self, node: ContentNode) -> SourceResult<()>;
}

/// Described files that are not trashed, in depth-first pre-order,
/// plus the number of trashed entries left out.
fn emittable(nodes: &[TraversalNode]) -> (Vec<(&FileNode, &RemoteEntry)>, usize) {
    let mut trashed = 0;
    let mut files = vec![];

    for file in flatten(nodes) {
        let Ok(FileOutcome::Described(metadata)) = &file.outcome else { continue };
        if metadata.is_trashed() {
            debug!("Skipping trashed entry {}", metadata.id());
            trashed += 1;
        } else {
            files.push((file, metadata));
        }
    }

    (files, trashed)
}

/// Register the nodes of a describe-mode traversal.
///
/// A failed registration is recorded in `report` and does not stop the rest.
pub async fn emit_nodes<R>(nodes: &[TraversalNode], registry: &R, node_type: &str, report: &mut TraversalReport)
where
    R: NodeRegistry + ?Sized,
{
    let (files, trashed) = emittable(nodes);
    report.trashed_skipped += trashed;

    for (file, metadata) in files {
        let node = ContentNode::from_entry(metadata, node_type);
        let id = node.id.clone();

        match registry.create_node(node).await {
            Ok(()) => report.nodes_created += 1,
            Err(e) => {
                error!("Failed to create node {}: {}", id, e);
                report.push_failure(metadata, &file.parent, e);
            }
        }
    }

    info!("Created {} content nodes", report.nodes_created);
}
