pub type SourceResult<T> = Result<T, SourceError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Failed to resolve credential: {0}")]
    CredentialError(String),
    #[error("OAuth failed: {0}")]
    OAuth2Error(String),
    #[error("Failed to connect: {0}")]
    ConnectionError(String),
    #[error("Failed to the google drive process: {0}")]
    GoogleDriveError(String),
    #[error("Failed to parse: {0}")]
    ParseError(String),
    #[error("Failed to the file operation: {0}")]
    FileOperationError(String),
    #[error("Get invalid argument error: {0}")]
    InvalidArgumentError(String),
    #[error("Failed to register node: {0}")]
    RegistryError(String),
}
