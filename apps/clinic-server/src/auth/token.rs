// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuing and verification (HS256 JWT).
//!
//! Tokens are stateless: nothing is recorded server-side, so a token stays
//! valid until it expires. Rotating `JWT_SECRET` is the only way to cut every
//! outstanding token at once.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use utoipa::ToSchema;

use super::{AuthError, AuthenticatedUser, Role, TokenClaims};

/// Lifetime of a session token.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Value of the `iss` claim on every token this service mints.
pub const TOKEN_ISSUER: &str = "clinic-portal";

/// A freshly signed token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedToken {
    /// Opaque bearer string
    pub token: String,
    /// Instant after which the token is refused
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in `verify`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    /// Mint a token for `account_id` valid from `now` for 24 hours.
    ///
    /// `now` is truncated to whole seconds, the resolution of JWT timestamps.
    pub fn issue(
        &self,
        account_id: u64,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let issued_at = now.timestamp();
        let expires_at = issued_at + self.ttl.num_seconds();

        let claims = TokenClaims {
            sub: account_id.to_string(),
            role,
            iat: issued_at,
            exp: expires_at,
            iss: TOKEN_ISSUER.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::SigningFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: DateTime::<Utc>::from_timestamp(expires_at, 0)
                .ok_or_else(|| AuthError::SigningFailed("expiry out of range".to_string()))?,
        })
    }

    /// Check signature, structure and expiry; return the caller's identity.
    ///
    /// A token whose expiry is at or before `now` is refused.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::MalformedToken,
            }
        })?;

        let user = AuthenticatedUser::from_claims(data.claims)?;
        if user.expires_at <= now {
            return Err(AuthError::TokenExpired);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::TimeZone;

    const SECRET: &[u8] = b"test-secret-with-enough-bytes-for-hs256";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn issued_token_verifies_within_window() {
        let issuer = TokenIssuer::new(SECRET);
        let issued = issuer.issue(7, Role::Receptionist, t0()).unwrap();

        for offset in [Duration::zero(), Duration::hours(12), Duration::hours(24) - Duration::seconds(1)] {
            let user = issuer.verify(&issued.token, t0() + offset).unwrap();
            assert_eq!(user.account_id, 7);
            assert_eq!(user.role, Role::Receptionist);
        }
        assert_eq!(issued.expires_at, t0() + Duration::hours(24));
    }

    #[test]
    fn token_expires_after_24_hours() {
        let issuer = TokenIssuer::new(SECRET);
        let issued = issuer.issue(7, Role::Doctor, t0()).unwrap();

        assert!(matches!(
            issuer.verify(&issued.token, t0() + Duration::hours(24)),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            issuer.verify(&issued.token, t0() + Duration::days(3)),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let issued = TokenIssuer::new(b"other-secret").issue(7, Role::Doctor, t0()).unwrap();
        let issuer = TokenIssuer::new(SECRET);
        assert!(matches!(
            issuer.verify(&issued.token, t0()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let issuer = TokenIssuer::new(SECRET);
        let issued = issuer.issue(7, Role::Doctor, t0()).unwrap();

        // Swap the role in the payload but keep the original signature.
        let parts: Vec<&str> = issued.token.split('.').collect();
        let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let forged = String::from_utf8(payload)
            .unwrap()
            .replace("\"doctor\"", "\"receptionist\"");
        let forged_token = format!("{}.{}.{}", parts[0], URL_SAFE_NO_PAD.encode(forged), parts[2]);

        assert!(matches!(
            issuer.verify(&forged_token, t0()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let issuer = TokenIssuer::new(SECRET);
        let issued = issuer.issue(7, Role::Doctor, t0()).unwrap();
        let (head, _) = issued.token.rsplit_once('.').unwrap();
        let forged = format!("{head}.{}", URL_SAFE_NO_PAD.encode(b"not-the-signature"));

        assert!(issuer.verify(&forged, t0()).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let issuer = TokenIssuer::new(SECRET);
        assert!(matches!(issuer.verify("", t0()), Err(AuthError::MalformedToken)));
        assert!(matches!(
            issuer.verify("not.a.jwt", t0()),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let claims = TokenClaims {
            sub: "7".to_string(),
            role: Role::Doctor,
            iat: t0().timestamp(),
            exp: (t0() + Duration::hours(1)).timestamp(),
            iss: "someone-else".to_string(),
            jti: "x".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let issuer = TokenIssuer::new(SECRET);
        assert!(matches!(
            issuer.verify(&token, t0()),
            Err(AuthError::InvalidIssuer)
        ));
    }

    #[test]
    fn each_token_gets_a_distinct_id() {
        let issuer = TokenIssuer::new(SECRET);
        let a = issuer.issue(7, Role::Doctor, t0()).unwrap();
        let b = issuer.issue(7, Role::Doctor, t0()).unwrap();
        assert_ne!(a.token, b.token);
        let ua = issuer.verify(&a.token, t0()).unwrap();
        let ub = issuer.verify(&b.token, t0()).unwrap();
        assert_ne!(ua.token_id, ub.token_id);
    }
}
