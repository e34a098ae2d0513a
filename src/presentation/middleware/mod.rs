mod require_auth;

pub use require_auth::{AUTH_CHALLENGE, require_auth};
