use std::future::Future;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{Client, Response};
use crate::errors::SourceError::{ConnectionError, GoogleDriveError, InvalidArgumentError, ParseError};
use crate::errors::SourceResult;
use crate::services::{DriveService, API};
use crate::types::google_drive::{FilesListResponse, RemoteEntry};
use crate::types::options::PluginOptions;
use crate::utils::credential::service_account::ServiceAccountCredential;
use crate::utils::file_type::FileType;
use crate::utils::oauth2::fetch_access_token;
use crate::utils::parser::validate_drive_id;
use crate::utils::reqwest::AuthType::Bearer;
use crate::utils::reqwest::get_client_with_token;

const GOOGLE_API_BASE: &str = "https://www.googleapis.com";
const FILES_ENDPOINT: &str = "/drive/v3/files";
/// Maximum page size accepted by `files.list`.
const PAGE_SIZE: &str = "1000";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, modifiedTime, description, trashed, kind)";
const METADATA_FIELDS: &str = "description, name, kind, modifiedTime, trashed, id";

/// Google Drive v3 client authenticated with a service-account token.
pub struct GoogleDrive {
    client: Client,
    api: API,
}

impl GoogleDrive {
    /// Wrap a client that already carries the `Authorization` header.
    pub fn new(client: Client) -> Self {
        Self::with_base_uri(client, GOOGLE_API_BASE)
    }

    pub fn with_base_uri(client: Client, api_base_uri: &str) -> Self {
        Self {
            client,
            api: API::new(api_base_uri),
        }
    }

    /// Resolve the service-account key from the options, exchange it for an
    /// access token bound to the configured scopes, and build the client.
    pub async fn authenticate(options: &PluginOptions) -> SourceResult<Self> {
        let credential = ServiceAccountCredential::resolve(options)?;

        let token = fetch_access_token(&Client::new(), &credential).await?;
        let client = get_client_with_token(token.access_token(), Bearer)?;

        Ok(Self::new(client))
    }

    async fn list_page(&self, folder_id: &str, page_token: Option<String>) -> SourceResult<FilesListResponse> {
        let url = self.api.get_request_url(FILES_ENDPOINT, GoogleDriveError)?;
        let query = format!("'{}' in parents", folder_id);

        let mut request = self.client
            .get(url)
            .query(&[
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]);
        if let Some(page_token) = page_token.as_deref() {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Google Drive API: {:#?}", e);
                ConnectionError(format!("Failed to send request to Google Drive API: {:?}", e))
            })?;
        let response = check_status(response, "list folder").await?;

        response
            .json::<FilesListResponse>()
            .await
            .map_err(|e| ParseError(format!("Failed to parse response from Google Drive API: {:#?}", e)))
    }
}

#[async_trait]
impl DriveService for GoogleDrive {
    async fn list_folder(&self, folder_id: &str) -> SourceResult<Vec<RemoteEntry>> {
        validate_drive_id(folder_id)?;

        let files = collect_pages(|page_token| self.list_page(folder_id, page_token)).await?;
        info!("Listed {} entries in folder {}", files.len(), folder_id);

        Ok(files)
    }

    async fn get_metadata(&self, file_id: &str) -> SourceResult<RemoteEntry> {
        validate_drive_id(file_id)?;
        let url = self.api.get_request_url(&format!("{}/{}", FILES_ENDPOINT, file_id), GoogleDriveError)?;

        let response = self.client
            .get(url)
            .query(&[("fields", METADATA_FIELDS), ("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Google Drive API: {:#?}", e);
                ConnectionError(format!("Failed to send request to Google Drive API: {:?}", e))
            })?;
        let response = check_status(response, "get metadata").await?;

        response
            .json::<RemoteEntry>()
            .await
            .map_err(|e| ParseError(format!("Failed to parse metadata of {}: {:#?}", file_id, e)))
    }

    async fn download(&self, entry: &RemoteEntry, export_mime_type: &str) -> SourceResult<Vec<u8>> {
        validate_drive_id(entry.id())?;

        let request = match entry.file_type() {
            FileType::GoogleDocument => {
                let url = self.api.get_request_url(
                    &format!("{}/{}/export", FILES_ENDPOINT, entry.id()), GoogleDriveError)?;
                debug!("Exporting {} as {}", entry.name(), export_mime_type);
                self.client.get(url).query(&[("mimeType", export_mime_type)])
            }
            file_type if file_type.is_binary() => {
                let url = self.api.get_request_url(
                    &format!("{}/{}", FILES_ENDPOINT, entry.id()), GoogleDriveError)?;
                self.client.get(url).query(&[("alt", "media"), ("supportsAllDrives", "true")])
            }
            file_type => {
                return Err(InvalidArgumentError(format!(
                    "'{}' has type {} which cannot be downloaded", entry.name(), file_type.mime())));
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Google Drive API: {:#?}", e);
                ConnectionError(format!("Failed to send request to Google Drive API: {:?}", e))
            })?;
        let response = check_status(response, "download").await?;

        let content = response
            .bytes()
            .await
            .map_err(|e| ConnectionError(format!("Failed to read content of {}: {:?}", entry.name(), e)))?;
        debug!("Downloaded {} bytes of {}", content.len(), entry.name());

        Ok(content.to_vec())
    }
}

async fn check_status(response: Response, operation: &str) -> SourceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("Failed to {} for Google Drive API: {} {}", operation, status, body);
    Err(GoogleDriveError(format!("Failed to {} (status {}): {}", operation, status, body)))
}

/// Request pages until the API stops returning a `nextPageToken`,
/// concatenating the entries in page order.
pub(crate) async fn collect_pages<F, Fut>(mut fetch_page: F) -> SourceResult<Vec<RemoteEntry>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = SourceResult<FilesListResponse>>,
{
    let mut files = vec![];
    let mut page_token = None;

    loop {
        let page = fetch_page(page_token.take()).await?;
        let next = page.next_page_token().map(String::from);
        files.extend(page.files);

        match next {
            Some(token) => {
                debug!("Fetching next page of the folder listing");
                page_token = Some(token);
            }
            None => break,
        }
    }

    Ok(files)
}
