pub mod google_drive;
pub mod node;
pub mod options;
pub mod traversal;
