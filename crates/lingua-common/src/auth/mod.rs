//! Room-scoped credentials

mod credential;

pub use credential::{CredentialAuthority, RoomClaims, DEFAULT_CREDENTIAL_TTL};
