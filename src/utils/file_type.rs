pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const GOOGLE_DOCUMENT_MIME: &str = "application/vnd.google-apps.document";
pub const GOOGLE_SHORTCUT_MIME: &str = "application/vnd.google-apps.shortcut";
pub const GOOGLE_THIRD_PARTY_SHORTCUT_MIME: &str = "application/vnd.google-apps.drive-sdk";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const GOOGLE_APPS_PREFIX: &str = "application/vnd.google-apps.";

/// Export formats with a known file extension.
const EXTENSIONS_BY_MIME: [(&str, &str); 8] = [
    ("text/html", ".html"),
    ("application/zip", ".zip"),
    ("text/plain", ".txt"),
    ("application/rtf", ".rtf"),
    ("application/vnd.oasis.opendocument.text", ".odt"),
    ("application/pdf", ".pdf"),
    (DOCX_MIME, ".docx"),
    ("application/epub+zip", ".epub"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileType {
    GoogleDriveFolder,
    GoogleDocument,
    GoogleShortcut,
    GoogleDriveThirdPartyShortcut,
    /// Other Google Workspace types (spreadsheet, presentation, ...).
    GoogleWorkspaceFile(String),
    /// Regular binary content, downloadable as is.
    Binary(String),
    Unknown,
}

impl FileType {
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "" => Self::Unknown,
            FOLDER_MIME => Self::GoogleDriveFolder,
            GOOGLE_DOCUMENT_MIME => Self::GoogleDocument,
            GOOGLE_SHORTCUT_MIME => Self::GoogleShortcut,
            GOOGLE_THIRD_PARTY_SHORTCUT_MIME => Self::GoogleDriveThirdPartyShortcut,
            other if other.starts_with(GOOGLE_APPS_PREFIX) => Self::GoogleWorkspaceFile(other.to_string()),
            other => Self::Binary(other.to_string()),
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            Self::GoogleDriveFolder => FOLDER_MIME,
            Self::GoogleDocument => GOOGLE_DOCUMENT_MIME,
            Self::GoogleShortcut => GOOGLE_SHORTCUT_MIME,
            Self::GoogleDriveThirdPartyShortcut => GOOGLE_THIRD_PARTY_SHORTCUT_MIME,
            Self::GoogleWorkspaceFile(mime) | Self::Binary(mime) => mime,
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Whether the content can be fetched with `alt=media` without conversion.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_) | Self::Unknown)
    }
}

/// File extension (with the leading dot) for an export MIME type.
///
/// Returns [None] for MIME types outside the table. Callers append nothing
/// in that case.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    EXTENSIONS_BY_MIME
        .iter()
        .find(|(known, _)| *known == mime)
        .map(|(_, extension)| *extension)
}
