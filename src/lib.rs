//! Build-time content source backed by a Google Drive folder.
//!
//! Two hooks are exposed to the host:
//!
//! * [`on_pre_bootstrap`] mirrors the folder tree below a local destination.
//! * [`source_nodes`] registers one [`ContentNode`] per file with a [`NodeRegistry`].
//!
//! Both authenticate with a service-account key and walk the tree with a
//! bounded number of simultaneous Drive requests.

pub mod errors;
pub mod services;
pub mod types;
pub mod utils;

pub use errors::{SourceError, SourceResult};
pub use services::hooks::{on_pre_bootstrap, source_nodes};
pub use services::node_emitter::NodeRegistry;
pub use services::DriveService;
pub use types::node::ContentNode;
pub use types::options::PluginOptions;
pub use types::traversal::TraversalReport;
