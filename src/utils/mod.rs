pub mod credential;
pub mod file_type;
pub mod oauth2;
pub(crate) mod parser;
pub(crate) mod reqwest;
