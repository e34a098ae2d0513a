/// Credentials presented with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Allow/deny decision for inbound credentials.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credentials: Option<&Credentials>) -> bool;
}
