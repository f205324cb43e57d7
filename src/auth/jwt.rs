use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};
use uuid::Uuid;

use super::{AccessClaims, AuthSubject, error::CodecError};

/// The only algorithm access tokens are signed and accepted with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    pub claims: AccessClaims,
}

#[derive(Clone)]
pub struct AccessTokenCodec {
    keys: JwtKeys,
    ttl: Duration,
    validation: Validation,
}

impl AccessTokenCodec {
    pub fn new(keys: JwtKeys, ttl: Duration) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Expiry is judged by the caller: rotation wants expired tokens.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            keys,
            ttl,
            validation,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &dyn AuthSubject) -> Result<IssuedAccessToken, CodecError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &dyn AuthSubject,
        now: DateTime<Utc>,
    ) -> Result<IssuedAccessToken, CodecError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| CodecError::Encoding("access token expiry out of range".to_string()))?;
        let claims = AccessClaims {
            user_id: subject.id(),
            email: subject.email().to_string(),
            sub: subject.username().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let mut header = Header::new(SIGNING_ALGORITHM);
        header.typ = Some("JWT".into());

        let token = encode(&header, &claims, &self.keys.enc)
            .map_err(|err| CodecError::Encoding(err.to_string()))?;
        Ok(IssuedAccessToken { token, claims })
    }

    /// Checks structure, algorithm and signature. An expired token still verifies.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, CodecError> {
        let header = decode_header(token).map_err(|err| CodecError::Malformed(err.to_string()))?;
        if header.alg != SIGNING_ALGORITHM {
            return Err(CodecError::AlgorithmMismatch {
                expected: SIGNING_ALGORITHM,
                found: header.alg,
            });
        }

        decode::<AccessClaims>(token, &self.keys.dec, &self.validation)
            .map(|data| data.claims)
            .map_err(CodecError::from)
    }

    /// [`AccessTokenCodec::verify`] plus expiry, for guarding protected resources.
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, CodecError> {
        let claims = self.verify(token)?;
        if claims.is_expired_at(now) {
            return Err(CodecError::Expired);
        }
        Ok(claims)
    }
}

impl From<jsonwebtoken::errors::Error> for CodecError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => CodecError::BadSignature,
            _ => CodecError::Malformed(err.to_string()),
        }
    }
}
