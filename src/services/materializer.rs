use std::path::{Path, PathBuf};
use log::{error, info};
use crate::errors::SourceError::FileOperationError;
use crate::errors::SourceResult;
use crate::services::DriveService;
use crate::types::google_drive::RemoteEntry;
use crate::utils::file_type::{extension_for_mime, FileType};
use crate::utils::parser::{local_path, validate_path_component};

/// A file written below the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedFile {
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Local filename of a Drive file.
///
/// Native Google documents get the extension of the export MIME type appended
/// (nothing when the export type has no known extension). Every other type keeps
/// the name reported by Drive, even without an extension.
pub fn derive_filename(entry: &RemoteEntry, export_mime_type: &str) -> String {
    match entry.file_type() {
        FileType::GoogleDocument => {
            format!("{}{}", entry.name(), extension_for_mime(export_mime_type).unwrap_or_default())
        }
        _ => entry.name().to_string(),
    }
}

/// Create `destination/<parent>/<folder_name>` and any missing ancestors.
///
/// Creating a directory that already exists, also concurrently, succeeds.
pub async fn ensure_directory(destination: &Path, parent: &str, folder_name: &str) -> SourceResult<PathBuf> {
    validate_path_component(folder_name)?;
    let path = local_path(destination, parent, folder_name);

    info!("Creating folder {}/{}", parent, folder_name);
    tokio::fs::create_dir_all(&path)
        .await
        .map_err(|e| {
            error!("Failed to create directory {}: {:?}", path.display(), e);
            FileOperationError(format!("Failed to create directory {}: {:?}", path.display(), e))
        })?;

    Ok(path)
}

/// Download a file and write it to `destination/<parent>/<derived filename>`.
///
/// An existing file at that path is replaced.
pub async fn materialize<S>(
    service: &S,
    entry: &RemoteEntry,
    export_mime_type: &str,
    destination: &Path,
    parent: &str,
) -> SourceResult<MaterializedFile>
where
    S: DriveService + ?Sized,
{
    let filename = derive_filename(entry, export_mime_type);
    validate_path_component(&filename)?;
    let path = local_path(destination, parent, &filename);

    let content = service.download(entry, export_mime_type).await?;
    tokio::fs::write(&path, &content)
        .await
        .map_err(|e| {
            error!("Failed to write {}: {:?}", path.display(), e);
            FileOperationError(format!("Failed to write file {}: {:?}", path.display(), e))
        })?;
    info!("{} written", entry.name());

    Ok(MaterializedFile {
        filename,
        path,
        size: content.len(),
    })
}
