use std::fs::File;
use std::path::Path;
use log::{debug, error};
use serde::Deserialize;
use crate::errors::SourceError::CredentialError;
use crate::errors::SourceResult;
use crate::types::options::PluginOptions;
use crate::utils::credential::Credential;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The parts of a Google service-account key file used for JWT signing.
#[derive(Deserialize, Clone)]
pub struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"*****")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn private_key_id(&self) -> Option<&str> {
        self.private_key_id.as_deref()
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    fn check(self) -> SourceResult<Self> {
        if self.client_email.is_empty() || self.private_key.is_empty() {
            return Err(CredentialError("'client_email' and 'private_key' must not be empty".to_string()));
        }
        Ok(self)
    }
}

/// Service-account key bound to the scopes of one hook invocation.
#[derive(Debug, Clone)]
pub struct ServiceAccountCredential {
    key: ServiceAccountKey,
    scopes: Vec<String>,
}

impl ServiceAccountCredential {
    pub fn new(key: ServiceAccountKey, scopes: &[String]) -> Self {
        Self {
            key,
            scopes: scopes.to_vec(),
        }
    }

    /// Resolve the credential from the hook options.
    ///
    /// The inline `key` wins. Otherwise the file at `pemFilePath` is loaded when it exists.
    ///
    /// # Errors
    ///
    /// [CredentialError] when neither source yields a key or the key is malformed.
    pub fn resolve(options: &PluginOptions) -> SourceResult<Self> {
        if let Some(inline_key) = options.inline_key() {
            debug!("Using the inline service-account key");
            let key = parse_key(inline_key)?;
            return Ok(Self::new(key, &options.scopes));
        }

        match options.pem_file_path.as_deref() {
            Some(path) if path.exists() => {
                debug!("Loading the service-account key from {}", path.display());
                let key = load_key(path)?;
                Ok(Self::new(key, &options.scopes))
            }
            Some(path) => {
                error!("Service-account key file does not exist: {}", path.display());
                Err(CredentialError(format!(
                    "No inline key given and key file '{}' does not exist", path.display())))
            }
            None => {
                error!("Neither 'key' nor 'pemFilePath' is configured");
                Err(CredentialError("Neither 'key' nor 'pemFilePath' is configured".to_string()))
            }
        }
    }
}

impl Credential for ServiceAccountCredential {
    type CredentialType = ServiceAccountKey;

    fn get_credential(&self) -> &Self::CredentialType {
        &self.key
    }

    fn get_scopes(&self) -> &[String] {
        &self.scopes
    }
}

pub fn parse_key(json: &str) -> SourceResult<ServiceAccountKey> {
    serde_json::from_str::<ServiceAccountKey>(json)
        .map_err(|e| {
            error!("Failed to parse the inline service-account key: {:?}", e);
            CredentialError(format!("Invalid service-account key JSON: {}", e))
        })?
        .check()
}

pub fn load_key<P: AsRef<Path>>(path: P) -> SourceResult<ServiceAccountKey> {
    let key = match File::open(&path) {
        Ok(file) => match serde_json::from_reader::<_, ServiceAccountKey>(&file) {
            Ok(key) => key,
            Err(e) => {
                error!("Failed to parse key file: {:?}", e);
                return Err(CredentialError(
                    format!("Invalid service-account key format in: {}",
                            path.as_ref().to_string_lossy())));
            }
        },
        Err(e) => {
            error!("Failed to open key file: {:?}", e);
            return Err(CredentialError(
                format!("Cannot open key file: {}",
                        path.as_ref().to_string_lossy())));
        }
    };

    key.check()
}
