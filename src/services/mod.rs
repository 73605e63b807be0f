use async_trait::async_trait;
use log::error;
use url::Url;
use crate::errors::{SourceError, SourceResult};
use crate::types::google_drive::RemoteEntry;

pub mod google_drive;
pub mod hooks;
pub mod materializer;
pub mod node_emitter;
pub mod traverser;

/// Remote operations the traversal needs from the storage provider.
#[async_trait]
pub trait DriveService: Send + Sync {
    /// List every direct child of a folder, following all result pages.
    async fn list_folder(&self, folder_id: &str) -> SourceResult<Vec<RemoteEntry>>;

    /// Fetch the lightweight metadata of a file. No content is transferred.
    async fn get_metadata(&self, file_id: &str) -> SourceResult<RemoteEntry>;

    /// Fetch the binary content of a file.
    ///
    /// Native Google documents are exported to `export_mime_type` first.
    async fn download(&self, entry: &RemoteEntry, export_mime_type: &str) -> SourceResult<Vec<u8>>;
}

pub(crate) struct API {
    api_base_uri: String,
}

impl API {
    pub(crate) fn new(api_base_uri: &str) -> Self {
        let api_base_uri = api_base_uri.trim_end_matches('/').to_string();

        Self {
            api_base_uri,
        }
    }

    pub(crate) fn generate_endpoint(&self, endpoint: &str) -> String {
        let endpoint = if endpoint.starts_with("/") {
            endpoint.to_string()
        } else {
            format!("/{}", endpoint)
        };

        format!("{}{}", self.api_base_uri, endpoint)
    }

    pub(crate) fn get_request_url<EF>(&self, endpoint: &str, error_fn: EF) -> SourceResult<Url>
    where
        EF: Fn(String) -> SourceError,
    {
        let api_endpoint = self.generate_endpoint(endpoint);
        match Url::parse(&api_endpoint) {
            Ok(uri) => Ok(uri),
            Err(e) => {
                error!("Failed to parse endpoint: {:?}", e);
                Err(error_fn(format!("Failed to parse endpoint: {}", api_endpoint)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_endpoint() {
        let api = API::new("https://www.googleapis.com/");
        assert_eq!(api.generate_endpoint("/drive/v3/files"), "https://www.googleapis.com/drive/v3/files");
        assert_eq!(api.generate_endpoint("drive/v3/files"), "https://www.googleapis.com/drive/v3/files");
    }

    #[test]
    fn test_get_request_url() {
        let api = API::new("https://www.googleapis.com");
        let url = api.get_request_url("/drive/v3/files/abc", SourceError::GoogleDriveError).unwrap();
        assert_eq!(url.path(), "/drive/v3/files/abc");

        let api = API::new("not a url");
        assert!(matches!(
            api.get_request_url("/drive/v3/files", SourceError::GoogleDriveError),
            Err(SourceError::GoogleDriveError(_))));
    }
}
