use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::clock::{Clock, SystemClock};

/// Lifetime of every issued token. Fixed policy, not configurable per call.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Registered claims carried by an ecoswap bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Login identifier (account email)
    pub sub: String,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Why a presented token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token uses an unsupported scheme")]
    Unsupported,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => TokenError::Unsupported,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct SigningError(String);

/// Header fields inspected before any signature work is done.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

/// Issues and verifies HS256 bearer tokens under one process-wide secret.
///
/// The service is immutable once built; share it behind an `Arc` and read it
/// from any number of requests concurrently.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::seconds(TOKEN_TTL_SECS)
    }

    /// Issue a token whose subject is `login_identifier`, valid for one hour.
    pub fn issue(&self, login_identifier: &str) -> Result<String, SigningError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: login_identifier.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl()).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SigningError(e.to_string()))
    }

    /// Check `token` and compare its subject with `expected_login_identifier`.
    ///
    /// Decoding failures are returned as errors. A token that decodes cleanly
    /// yields `Ok(true)` only when the subject matches exactly and the token
    /// has not yet expired.
    pub fn verify(&self, token: &str, expected_login_identifier: &str) -> Result<bool, TokenError> {
        let claims = self.decode_claims(token)?;
        let live = self.clock.now().timestamp() < claims.exp;
        Ok(live && claims.sub == expected_login_identifier)
    }

    /// Shorthand for `verify(..) == Ok(true)`.
    pub fn is_valid(&self, token: &str, expected_login_identifier: &str) -> bool {
        matches!(self.verify(token, expected_login_identifier), Ok(true))
    }

    /// Decode `token` and return the embedded subject.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// Full decode: structure, scheme, signature, claims, then expiry.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        inspect_header(token)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

/// Reject anything that is not three segments with an HS256 JWT header.
fn inspect_header(token: &str) -> Result<(), TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(TokenError::Malformed);
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

    if header.alg != "HS256" {
        return Err(TokenError::Unsupported);
    }
    match header.typ.as_deref() {
        None | Some("JWT") => Ok(()),
        Some(_) => Err(TokenError::Unsupported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use chrono::Utc;

    const SECRET: &[u8] = b"unit-test-secret-unit-test-secret-000";
    const ALICE: &str = "alice@example.com";

    fn service_with_clock() -> (TokenService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (TokenService::with_clock(SECRET, clock.clone()), clock)
    }

    #[test]
    fn issued_token_verifies_immediately() {
        let (tokens, _) = service_with_clock();
        let token = tokens.issue(ALICE).unwrap();

        assert_eq!(tokens.verify(&token, ALICE), Ok(true));
        assert!(tokens.is_valid(&token, ALICE));
    }

    #[test]
    fn extract_subject_round_trips() {
        let (tokens, _) = service_with_clock();
        for subject in [ALICE, "bob@example.org", "x", "ünïcødé@example.com"] {
            let token = tokens.issue(subject).unwrap();
            assert_eq!(tokens.extract_subject(&token).unwrap(), subject);
        }
    }

    #[test]
    fn token_has_three_segments_and_one_hour_window() {
        let (tokens, clock) = service_with_clock();
        let token = tokens.issue(ALICE).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = tokens.decode_claims(&token).unwrap();
        assert_eq!(claims.iat, clock.now().timestamp());
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn subject_mismatch_is_false_not_error() {
        let (tokens, _) = service_with_clock();
        let token = tokens.issue(ALICE).unwrap();

        assert_eq!(tokens.verify(&token, "mallory@example.com"), Ok(false));
        // exact, case-sensitive comparison
        assert_eq!(tokens.verify(&token, "Alice@example.com"), Ok(false));
    }

    #[test]
    fn token_expires_after_one_hour() {
        let (tokens, clock) = service_with_clock();
        let token = tokens.issue(ALICE).unwrap();

        clock.advance(Duration::minutes(59));
        assert_eq!(tokens.verify(&token, ALICE), Ok(true));

        clock.advance(Duration::minutes(2));
        assert_eq!(tokens.verify(&token, ALICE), Err(TokenError::Expired));
        assert_eq!(tokens.extract_subject(&token), Err(TokenError::Expired));
        assert!(!tokens.is_valid(&token, ALICE));
    }

    #[test]
    fn token_is_expired_exactly_at_expiry() {
        let (tokens, clock) = service_with_clock();
        let token = tokens.issue(ALICE).unwrap();

        clock.advance(Duration::seconds(TOKEN_TTL_SECS - 1));
        assert!(tokens.is_valid(&token, ALICE));

        clock.advance(Duration::seconds(1));
        assert_eq!(tokens.verify(&token, ALICE), Err(TokenError::Expired));
    }

    #[test]
    fn different_key_fails_signature() {
        let (tokens, _) = service_with_clock();
        let token = tokens.issue(ALICE).unwrap();

        let other = TokenService::new(b"another-secret-another-secret-00000");
        assert_eq!(other.verify(&token, ALICE), Err(TokenError::InvalidSignature));
        assert_eq!(other.extract_subject(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_claims_fail_signature() {
        let (tokens, _) = service_with_clock();
        let token = tokens.issue(ALICE).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged = Claims {
            sub: "mallory@example.com".to_string(),
            iat: 0,
            exp: i64::MAX / 2,
        };
        let forged_claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        assert_eq!(tokens.extract_subject(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_signature_fails_signature() {
        let (tokens, _) = service_with_clock();
        let token = tokens.issue(ALICE).unwrap();
        let (head, signature) = token.rsplit_once('.').unwrap();
        let replacement = if signature.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{head}.{replacement}{}", &signature[1..]);

        assert_eq!(tokens.verify(&tampered, ALICE), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn malformed_structures_are_rejected() {
        let (tokens, _) = service_with_clock();
        for bad in ["", "abc", "a.b", "a.b.c.d", "not base64!.e30.sig", "e30.e30.sig"] {
            assert_eq!(tokens.extract_subject(bad), Err(TokenError::Malformed), "input: {bad:?}");
        }
    }

    #[test]
    fn missing_claims_are_malformed() {
        let (tokens, _) = service_with_clock();

        #[derive(Serialize)]
        struct NoExpiry<'a> {
            sub: &'a str,
            iat: i64,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExpiry { sub: ALICE, iat: 0 },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(tokens.extract_subject(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn other_algorithms_are_unsupported() {
        let (tokens, clock) = service_with_clock();
        let claims = Claims {
            sub: ALICE.to_string(),
            iat: clock.now().timestamp(),
            exp: clock.now().timestamp() + 60,
        };
        let hs512 = encode(&Header::new(Algorithm::HS512), &claims, &EncodingKey::from_secret(SECRET)).unwrap();
        assert_eq!(tokens.verify(&hs512, ALICE), Err(TokenError::Unsupported));

        let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let unsigned = format!("{none_header}.{body}.");
        assert_eq!(tokens.extract_subject(&unsigned), Err(TokenError::Unsupported));
    }
}
