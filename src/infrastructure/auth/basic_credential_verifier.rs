use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::application::ports::{CredentialVerifier, Credentials};

/// Accepts exactly one configured username/password pair.
pub struct StaticCredentialVerifier {
    expected: Credentials,
}

impl StaticCredentialVerifier {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            expected: Credentials {
                username: username.into(),
                password: password.into(),
            },
        }
    }
}

impl CredentialVerifier for StaticCredentialVerifier {
    fn verify(&self, credentials: Option<&Credentials>) -> bool {
        credentials.is_some_and(|c| {
            constant_time_eq(c.username.as_bytes(), self.expected.username.as_bytes())
                & constant_time_eq(c.password.as_bytes(), self.expected.password.as_bytes())
        })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Parses an `Authorization: Basic <base64(user:pass)>` header value.
pub fn decode_basic_authorization(header: &str) -> Option<Credentials> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}
