//! Room credentials
//!
//! A credential is an HS256-signed JWT binding one user to one chat room for
//! a bounded time window. Credentials are never stored server-side; they are
//! verified on every connection attempt.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AppError;

/// Default lifetime of an issued credential
pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(15 * 60);

/// Claims carried inside a room credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomClaims {
    pub user_id: i64,
    pub nickname: String,
    pub room_id: String,
    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl RoomClaims {
    /// Check if the credential is expired at the given instant
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expires_at
    }

    /// Check if the credential grants access to the given room
    #[must_use]
    pub fn is_for_room(&self, room_id: &str) -> bool {
        self.room_id == room_id
    }
}

/// Issues and verifies room credentials with a shared secret
#[derive(Clone)]
pub struct CredentialAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl CredentialAuthority {
    /// Create a new authority with the given secret and default lifetime
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Default lifetime of credentials issued by this authority
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a credential with the default lifetime
    pub fn issue(&self, user_id: i64, nickname: &str, room_id: &str) -> Result<String, AppError> {
        self.issue_with_ttl(user_id, nickname, room_id, self.ttl)
    }

    /// Issue a credential with a custom lifetime
    pub fn issue_with_ttl(
        &self,
        user_id: i64,
        nickname: &str,
        room_id: &str,
        ttl: Duration,
    ) -> Result<String, AppError> {
        self.issue_at(user_id, nickname, room_id, ttl, Utc::now())
    }

    /// Issue a credential as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: i64,
        nickname: &str,
        room_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        if nickname.is_empty() {
            return Err(AppError::validation("nickname must not be empty"));
        }
        if room_id.is_empty() {
            return Err(AppError::validation("room_id must not be empty"));
        }

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::TokenCreation(format!("invalid ttl: {e}")))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::TokenCreation("ttl overflows the clock".to_string()))?;

        let claims = RoomClaims {
            user_id,
            nickname: nickname.to_string(),
            room_id: room_id.to_string(),
            issued_at: now.timestamp(),
            expires_at: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::TokenCreation(e.to_string()))
    }

    /// Decode a credential and check its signature
    ///
    /// Expiry is not checked here; see [`Self::authorize`].
    pub fn verify(&self, credential: &str) -> Result<RoomClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let token_data = decode::<RoomClaims>(credential, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Credential rejected");
                AppError::CredentialInvalid
            })?;

        let claims = token_data.claims;
        if claims.nickname.is_empty() || claims.room_id.is_empty() {
            return Err(AppError::CredentialInvalid);
        }

        Ok(claims)
    }

    /// Verify a credential and check that it grants access to `room_id` now
    pub fn authorize(&self, credential: &str, room_id: &str) -> Result<RoomClaims, AppError> {
        self.authorize_at(credential, room_id, Utc::now())
    }

    /// Verify a credential and check that it grants access to `room_id` at `now`
    pub fn authorize_at(
        &self,
        credential: &str,
        room_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RoomClaims, AppError> {
        let claims = self.verify(credential)?;

        if !claims.is_for_room(room_id) {
            return Err(AppError::RoomMismatch);
        }

        if claims.is_expired_at(now) {
            return Err(AppError::CredentialExpired);
        }

        Ok(claims)
    }

    /// Boolean form of [`Self::authorize`]
    #[must_use]
    pub fn is_authorized(&self, credential: &str, room_id: &str) -> bool {
        self.authorize(credential, room_id).is_ok()
    }
}

impl std::fmt::Debug for CredentialAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialAuthority")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
