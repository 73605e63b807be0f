use serde::{Deserialize, Serialize};
use crate::utils::file_type::FileType;

/// A file or folder record as reported by the Google Drive API.
///
/// The listing call and the metadata call select different fields, so every
/// field except `id` and `name` may be missing from a response.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) trashed: bool,
}

impl RemoteEntry {
    pub fn new(id: &str, name: &str, mime_type: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            kind: None,
            modified_time: None,
            description: None,
            trashed: false,
        }
    }

    pub fn with_modified_time(mut self, modified_time: &str) -> Self {
        self.modified_time = Some(modified_time.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_trashed(mut self, trashed: bool) -> Self {
        self.trashed = trashed;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn modified_time(&self) -> Option<&str> {
        self.modified_time.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_trashed(&self) -> bool {
        self.trashed
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_mime(&self.mime_type)
    }

    pub fn is_dir(&self) -> bool {
        self.file_type() == FileType::GoogleDriveFolder
    }
}

/// One page of a `files.list` response.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilesListResponse {
    #[serde(default)]
    pub(crate) files: Vec<RemoteEntry>,
    #[serde(default)]
    pub(crate) next_page_token: Option<String>,
}

impl FilesListResponse {
    /// Token of the following page. An empty token is treated as the last page.
    pub(crate) fn next_page_token(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}
