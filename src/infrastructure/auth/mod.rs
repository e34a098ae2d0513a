mod basic_credential_verifier;

pub use basic_credential_verifier::{StaticCredentialVerifier, decode_basic_authorization};
