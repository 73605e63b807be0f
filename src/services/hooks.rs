use std::sync::Arc;
use log::{error, info, warn};
use time::OffsetDateTime;
use crate::errors::SourceError::FileOperationError;
use crate::errors::SourceResult;
use crate::services::google_drive::GoogleDrive;
use crate::services::node_emitter::{emit_nodes, NodeRegistry};
use crate::services::traverser::{TraversalMode, Traverser};
use crate::services::DriveService;
use crate::types::google_drive::RemoteEntry;
use crate::types::options::PluginOptions;
use crate::types::traversal::{TraversalNode, TraversalReport};
use crate::utils::file_type::FOLDER_MIME;

/// Pre-bootstrap hook: mirror the configured folder below `destination`.
///
/// Invalid options and authentication failures abort with `Err`. Everything
/// after that is reported in the returned [`TraversalReport`].
pub async fn on_pre_bootstrap(options: &PluginOptions) -> SourceResult<TraversalReport> {
    options.validate()?;
    options.destination()?;

    let drive = GoogleDrive::authenticate(options).await?;
    mirror_folder(Arc::new(drive), options).await
}

/// Source-nodes hook: register one content node per non-trashed file.
pub async fn source_nodes<R>(options: &PluginOptions, registry: &R) -> SourceResult<TraversalReport>
where
    R: NodeRegistry + ?Sized,
{
    options.validate()?;

    let drive = GoogleDrive::authenticate(options).await?;
    emit_folder_nodes(Arc::new(drive), options, registry).await
}

/// Write-mode traversal over an already authenticated service.
pub async fn mirror_folder(service: Arc<dyn DriveService>, options: &PluginOptions) -> SourceResult<TraversalReport> {
    let destination = options.destination()?.to_path_buf();
    tokio::fs::create_dir_all(&destination)
        .await
        .map_err(|e| {
            error!("Failed to create destination {}: {:?}", destination.display(), e);
            FileOperationError(format!("Failed to create destination {}: {:?}", destination.display(), e))
        })?;

    let traverser = Traverser::new(
        service,
        TraversalMode::Write { destination },
        &options.export_mime_type,
        options.concurrency());
    let (_, report) = run(&traverser, &options.folder_id).await;

    Ok(report)
}

/// Describe-mode traversal over an already authenticated service, followed by
/// node registration.
pub async fn emit_folder_nodes<R>(
    service: Arc<dyn DriveService>,
    options: &PluginOptions,
    registry: &R,
) -> SourceResult<TraversalReport>
where
    R: NodeRegistry + ?Sized,
{
    let traverser = Traverser::new(
        service,
        TraversalMode::Describe,
        &options.export_mime_type,
        options.concurrency());
    let (nodes, mut report) = run(&traverser, &options.folder_id).await;

    emit_nodes(&nodes, registry, &options.node_type, &mut report).await;

    Ok(report)
}

async fn run(traverser: &Traverser, folder_id: &str) -> (Vec<TraversalNode>, TraversalReport) {
    let started = OffsetDateTime::now_utc();
    info!("Reading folder {} ({:?})", folder_id, traverser.mode());

    let nodes = match traverser.list(folder_id).await {
        Ok(entries) => traverser.traverse(entries, "").await,
        Err(e) => {
            error!("Failed to list root folder {}: {}", folder_id, e);
            let mut report = TraversalReport::default();
            report.push_failure(&RemoteEntry::new(folder_id, folder_id, FOLDER_MIME), "", e);
            return (vec![], report);
        }
    };

    let report = TraversalReport::from_nodes(&nodes);
    let elapsed = OffsetDateTime::now_utc() - started;
    if report.is_complete() {
        info!("Finished folder {} in {:.3}s", folder_id, elapsed.as_seconds_f64());
    } else {
        warn!(
            "Finished folder {} in {:.3}s with {} failure(s)",
            folder_id, elapsed.as_seconds_f64(), report.failures.len());
    }

    (nodes, report)
}
