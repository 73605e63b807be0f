pub mod service_account;

/// Source of a signed-credential identity for the Drive API.
pub trait Credential {
    type CredentialType;

    fn get_credential(&self) -> &Self::CredentialType;
    fn get_scopes(&self) -> &[String];
}
