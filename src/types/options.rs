use std::fs::File;
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::thread::available_parallelism;
use log::error;
use serde::Deserialize;
use crate::errors::SourceError::{InvalidArgumentError, ParseError};
use crate::errors::SourceResult;
use crate::types::node::DEFAULT_NODE_TYPE;
use crate::utils::file_type::DOCX_MIME;
use crate::utils::parser::validate_drive_id;

pub const DEFAULT_FOLDER_ID: &str = "root";
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Options handed to both lifecycle hooks by the host.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    #[serde(default = "default_folder_id")]
    pub folder_id: String,
    /// Inline service-account key JSON.
    #[serde(default)]
    pub key: Option<String>,
    /// Path of a service-account key JSON file.
    #[serde(default)]
    pub pem_file_path: Option<PathBuf>,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Local output directory for write mode.
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// Upper bound of simultaneous provider requests.
    #[serde(default)]
    pub concurrency: Option<NonZero<u16>>,
    #[serde(default = "default_export_mime_type")]
    pub export_mime_type: String,
    #[serde(default = "default_node_type")]
    pub node_type: String,
}

fn default_folder_id() -> String {
    DEFAULT_FOLDER_ID.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![DRIVE_SCOPE.to_string()]
}

fn default_export_mime_type() -> String {
    DOCX_MIME.to_string()
}

fn default_node_type() -> String {
    DEFAULT_NODE_TYPE.to_string()
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            folder_id: default_folder_id(),
            key: None,
            pem_file_path: None,
            scopes: default_scopes(),
            destination: None,
            concurrency: None,
            export_mime_type: default_export_mime_type(),
            node_type: default_node_type(),
        }
    }
}

impl PluginOptions {
    pub fn from_json_str(json: &str) -> SourceResult<Self> {
        serde_json::from_str::<Self>(json)
            .map_err(|e| {
                error!("Failed to parse options: {:?}", e);
                ParseError(format!("Invalid options JSON: {}", e))
            })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let file = File::open(&path)
            .map_err(|e| {
                error!("Failed to open options file: {:?}", e);
                InvalidArgumentError(format!("Cannot open options file: {}", path.as_ref().display()))
            })?;

        serde_json::from_reader::<_, Self>(file)
            .map_err(|e| {
                error!("Failed to parse options file: {:?}", e);
                ParseError(format!("Invalid options format in {}: {}", path.as_ref().display(), e))
            })
    }

    /// Inline key, treating an empty string as absent.
    pub fn inline_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.trim().is_empty())
    }

    /// Configured concurrency, or twice the available parallelism.
    pub fn concurrency(&self) -> u16 {
        if let Some(concurrency) = self.concurrency {
            return concurrency.get();
        }

        let parallelism = available_parallelism()
            // SAFETY: NonZero is always Some if the input is not `0`
            .unwrap_or(NonZero::new(1).unwrap())
            .get() * 2;
        if parallelism > u16::MAX as usize {
            u16::MAX
        } else {
            parallelism as u16
        }
    }

    pub fn validate(&self) -> SourceResult<()> {
        validate_drive_id(&self.folder_id)?;

        if self.scopes.is_empty() || self.scopes.iter().any(|scope| scope.trim().is_empty()) {
            return Err(InvalidArgumentError("At least one non-empty OAuth scope is required".to_string()));
        }
        if self.export_mime_type.is_empty() {
            return Err(InvalidArgumentError("Export MIME type cannot be empty".to_string()));
        }
        if self.node_type.is_empty() {
            return Err(InvalidArgumentError("Node type cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Destination directory, required by write mode.
    pub fn destination(&self) -> SourceResult<&Path> {
        self.destination
            .as_deref()
            .ok_or_else(|| InvalidArgumentError("'destination' is required to write files".to_string()))
    }
}
