//! Credential verification.
//!
//! Two optional mechanisms compose: a static shared secret presented in
//! the `x-api-key` header, and an HS256 bearer token whose issuer and
//! audience claims are validated when configured. When both are set, both
//! must pass. When neither is set, verification degrades to authorized;
//! that is an explicit deployment choice, not a silent default (the
//! server warns at startup).
//!
//! Verification is pure: no side effects, no clock state beyond the
//! token's own expiry check.

use askgate_core::config::AuthConfig;
use askgate_core::{AppError, AppResult};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use subtle::ConstantTimeEq;

/// Claims read from an accepted token.
///
/// Expiry is validated by the decoder; only the subject survives, as the
/// rate-limit identity.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, Default)]
pub struct Verified {
    /// Authenticated subject claim, when a token was presented
    pub subject: Option<String>,
}

struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

/// Validates caller credentials against the configured mechanisms.
pub struct CredentialVerifier {
    api_key: Option<String>,
    token: Option<TokenVerifier>,
}

impl CredentialVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let token = config.jwt.as_ref().map(|jwt| {
            let mut validation = Validation::new(Algorithm::HS256);
            if let Some(issuer) = &jwt.issuer {
                validation.set_issuer(&[issuer]);
            }
            match &jwt.audience {
                Some(audience) => validation.set_audience(&[audience]),
                None => validation.validate_aud = false,
            }

            TokenVerifier {
                decoding_key: DecodingKey::from_secret(jwt.secret.as_bytes()),
                validation,
            }
        });

        Self {
            api_key: config.api_key.clone(),
            token,
        }
    }

    /// Whether no credential mechanism is configured.
    pub fn is_open(&self) -> bool {
        self.api_key.is_none() && self.token.is_none()
    }

    /// Verify the presented credential material.
    ///
    /// `authorization` is the raw `Authorization` header value; the token
    /// must use the bearer scheme.
    pub fn verify(
        &self,
        presented_key: Option<&str>,
        authorization: Option<&str>,
    ) -> AppResult<Verified> {
        if let Some(expected) = &self.api_key {
            let presented =
                presented_key.ok_or_else(|| AppError::Auth("unauthorized".to_string()))?;
            // Constant-time comparison; slices of unequal length compare
            // unequal without early exit on content.
            if expected.as_bytes().ct_eq(presented.as_bytes()).unwrap_u8() == 0 {
                return Err(AppError::Auth("unauthorized".to_string()));
            }
        }

        let mut subject = None;
        if let Some(verifier) = &self.token {
            let header =
                authorization.ok_or_else(|| AppError::Auth("invalid token".to_string()))?;
            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| AppError::Auth("invalid token".to_string()))?;

            let data = decode::<Claims>(token, &verifier.decoding_key, &verifier.validation)
                .map_err(|e| {
                    tracing::debug!(error = %e, "Token verification failed");
                    AppError::Auth("invalid token".to_string())
                })?;
            subject = data.claims.sub;
        }

        Ok(Verified { subject })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askgate_core::config::JwtConfig;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aud: Option<String>,
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn mint_token(secret: &str, claims: &TestClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier(api_key: Option<&str>, jwt: Option<JwtConfig>) -> CredentialVerifier {
        CredentialVerifier::new(&AuthConfig {
            api_key: api_key.map(str::to_string),
            jwt,
        })
    }

    fn jwt_config(issuer: Option<&str>, audience: Option<&str>) -> JwtConfig {
        JwtConfig {
            secret: "t0p-secret".to_string(),
            issuer: issuer.map(str::to_string),
            audience: audience.map(str::to_string),
        }
    }

    #[test]
    fn test_open_mode_authorizes_everyone() {
        let verifier = verifier(None, None);
        assert!(verifier.is_open());
        let verified = verifier.verify(None, None).unwrap();
        assert!(verified.subject.is_none());
    }

    #[test]
    fn test_api_key_must_match() {
        let verifier = verifier(Some("s3cret"), None);
        assert!(!verifier.is_open());

        assert!(verifier.verify(Some("s3cret"), None).is_ok());

        let err = verifier.verify(Some("wrong"), None).unwrap_err();
        assert!(matches!(err, AppError::Auth(ref reason) if reason == "unauthorized"));

        let err = verifier.verify(None, None).unwrap_err();
        assert!(matches!(err, AppError::Auth(ref reason) if reason == "unauthorized"));
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let verifier = verifier(None, Some(jwt_config(Some("askgate"), Some("callers"))));
        let token = mint_token(
            "t0p-secret",
            &TestClaims {
                sub: "user-7".to_string(),
                exp: unix_now() + 300,
                iss: Some("askgate".to_string()),
                aud: Some("callers".to_string()),
            },
        );

        let verified = verifier
            .verify(None, Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(verified.subject.as_deref(), Some("user-7"));
    }

    #[test]
    fn test_token_without_bearer_scheme_rejected() {
        let verifier = verifier(None, Some(jwt_config(None, None)));
        let token = mint_token(
            "t0p-secret",
            &TestClaims {
                sub: "user-7".to_string(),
                exp: unix_now() + 300,
                iss: None,
                aud: None,
            },
        );

        let err = verifier.verify(None, Some(&token)).unwrap_err();
        assert!(matches!(err, AppError::Auth(ref reason) if reason == "invalid token"));

        let err = verifier.verify(None, None).unwrap_err();
        assert!(matches!(err, AppError::Auth(ref reason) if reason == "invalid token"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = verifier(None, Some(jwt_config(None, None)));
        let token = mint_token(
            "t0p-secret",
            &TestClaims {
                sub: "user-7".to_string(),
                exp: unix_now() - 3600,
                iss: None,
                aud: None,
            },
        );

        let err = verifier
            .verify(None, Some(&format!("Bearer {}", token)))
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ref reason) if reason == "invalid token"));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let verifier = verifier(None, Some(jwt_config(Some("askgate"), None)));
        let token = mint_token(
            "t0p-secret",
            &TestClaims {
                sub: "user-7".to_string(),
                exp: unix_now() + 300,
                iss: Some("someone-else".to_string()),
                aud: None,
            },
        );

        assert!(verifier
            .verify(None, Some(&format!("Bearer {}", token)))
            .is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let verifier = verifier(None, Some(jwt_config(None, Some("callers"))));
        let token = mint_token(
            "t0p-secret",
            &TestClaims {
                sub: "user-7".to_string(),
                exp: unix_now() + 300,
                iss: None,
                aud: Some("other-app".to_string()),
            },
        );

        assert!(verifier
            .verify(None, Some(&format!("Bearer {}", token)))
            .is_err());
    }

    #[test]
    fn test_bad_signature_rejected() {
        let verifier = verifier(None, Some(jwt_config(None, None)));
        let token = mint_token(
            "a-different-secret",
            &TestClaims {
                sub: "user-7".to_string(),
                exp: unix_now() + 300,
                iss: None,
                aud: None,
            },
        );

        assert!(verifier
            .verify(None, Some(&format!("Bearer {}", token)))
            .is_err());
    }

    #[test]
    fn test_both_mechanisms_must_pass() {
        let verifier = verifier(Some("s3cret"), Some(jwt_config(None, None)));
        let token = mint_token(
            "t0p-secret",
            &TestClaims {
                sub: "user-7".to_string(),
                exp: unix_now() + 300,
                iss: None,
                aud: None,
            },
        );
        let bearer = format!("Bearer {}", token);

        // Valid token alone is not enough
        let err = verifier.verify(None, Some(&bearer)).unwrap_err();
        assert!(matches!(err, AppError::Auth(ref reason) if reason == "unauthorized"));

        // Valid key alone is not enough
        assert!(verifier.verify(Some("s3cret"), None).is_err());

        // Both together pass
        let verified = verifier.verify(Some("s3cret"), Some(&bearer)).unwrap();
        assert_eq!(verified.subject.as_deref(), Some("user-7"));
    }
}
