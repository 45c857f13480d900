//! Session token service
//!
//! Issues and validates the HS256 session JWT and turns its claims into a
//! [`CurrentUser`]. The token travels either as `Authorization: Bearer` or
//! as the `session` cookie.

use chrono::{Duration, Utc};
use http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::models::Role;
use thiserror::Error;

use super::permissions;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing secret (at least 32 bytes outside development)
    pub secret: String,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn from_config(config: &crate::Config) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration_minutes: config.jwt_expiry_minutes,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
        }
    }
}

/// Claims carried by the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    /// Role name, e.g. `TENANT_ADMIN`
    pub role: String,
    /// Organization id, absent for SUPER_ADMIN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<i64>,
    /// Customer id, CUSTOMER role only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<i64>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

/// JWT errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token generation failed: {0}")]
    GenerationFailed(String),

    #[error("malformed claims: {0}")]
    MalformedClaims(String),
}

/// Session token service
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for an authenticated user
    pub fn issue(&self, user: &CurrentUser) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            org: user.organization_id,
            cid: user.customer_id,
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Validate signature, expiry, issuer and audience
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validate a token and build the caller identity
    pub fn resolve(&self, token: &str) -> Result<CurrentUser, JwtError> {
        let claims = self.validate_token(token)?;
        CurrentUser::try_from(claims)
    }

    /// Token lifetime in seconds (cookie `Max-Age`)
    pub fn lifetime_seconds(&self) -> i64 {
        self.config.expiration_minutes * 60
    }

    /// Extract a bearer token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Where a request's token came from
#[derive(Debug, PartialEq, Eq)]
pub enum TokenSource<'a> {
    Bearer(&'a str),
    Cookie(&'a str),
    /// `Authorization` present but not a bearer token
    MalformedHeader,
    Missing,
}

/// Locate the session token: `Authorization: Bearer` first, then the cookie
pub fn token_from_headers(headers: &HeaderMap) -> TokenSource<'_> {
    if let Some(value) = headers.get(http::header::AUTHORIZATION) {
        return match value.to_str().ok().and_then(JwtService::extract_from_header) {
            Some(token) => TokenSource::Bearer(token),
            None => TokenSource::MalformedHeader,
        };
    }

    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map_or(TokenSource::Missing, |(_, value)| TokenSource::Cookie(value))
}

/// `Set-Cookie` value carrying a fresh session token
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}{secure}")
}

/// `Set-Cookie` value clearing the session
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Authenticated caller, built from validated claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    /// `None` only for SUPER_ADMIN
    pub organization_id: Option<i64>,
    /// Linked customer record, CUSTOMER only
    pub customer_id: Option<i64>,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id: i64 = claims
            .sub
            .parse()
            .map_err(|_| JwtError::MalformedClaims(format!("subject is not a user id: {}", claims.sub)))?;
        let role: Role = claims
            .role
            .parse()
            .map_err(|e: shared::models::UnknownRole| JwtError::MalformedClaims(e.to_string()))?;

        match (role, claims.org) {
            (Role::SuperAdmin, Some(_)) => {
                return Err(JwtError::MalformedClaims(
                    "platform administrator cannot belong to an organization".into(),
                ));
            }
            (r, None) if r.requires_organization() => {
                return Err(JwtError::MalformedClaims(format!("{r} requires an organization")));
            }
            _ => {}
        }
        if role == Role::Customer && claims.cid.is_none() {
            return Err(JwtError::MalformedClaims(
                "CUSTOMER requires a customer id".into(),
            ));
        }

        Ok(Self {
            id,
            email: claims.email,
            role,
            organization_id: claims.org,
            customer_id: if role == Role::Customer { claims.cid } else { None },
        })
    }
}

impl CurrentUser {
    /// Platform administrator
    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }

    /// Check a `resource:action` permission against the role's grants
    ///
    /// Supports wildcard matching:
    /// - `"products:*"` matches `"products:read"`, `"products:write"` etc.
    /// - `"all"` matches everything
    pub fn has_permission(&self, permission: &str) -> bool {
        permissions::role_has_permission(self.role, permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-key-that-is-long-enough-32".into(),
            expiration_minutes: 60,
            issuer: "commerce-cloud".into(),
            audience: "commerce-clients".into(),
        })
    }

    fn staff() -> CurrentUser {
        CurrentUser {
            id: 7,
            email: "staff@acme.test".into(),
            role: Role::Staff,
            organization_id: Some(1),
            customer_id: None,
        }
    }

    fn claims(role: &str, org: Option<i64>, cid: Option<i64>) -> Claims {
        Claims {
            sub: "1".into(),
            email: "a@b.test".into(),
            role: role.into(),
            org,
            cid,
            exp: Utc::now().timestamp() + 60,
            iat: Utc::now().timestamp(),
            iss: "commerce-cloud".into(),
            aud: "commerce-clients".into(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let svc = service();
        let token = svc.issue(&staff()).unwrap();
        let user = svc.resolve(&token).unwrap();
        assert_eq!(user, staff());
    }

    #[test]
    fn test_expired_token() {
        let svc = JwtService::with_config(JwtConfig {
            expiration_minutes: -5,
            ..service().config
        });
        let token = svc.issue(&staff()).unwrap();
        assert!(matches!(svc.validate_token(&token), Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_tampered_token() {
        let svc = service();
        let token = svc.issue(&staff()).unwrap();
        let other = JwtService::with_config(JwtConfig {
            secret: "another-secret-key-that-is-long-enough".into(),
            ..service().config
        });
        assert!(matches!(other.validate_token(&token), Err(JwtError::InvalidSignature)));
        assert!(svc.validate_token("not.a.token").is_err());
    }

    #[test]
    fn test_wrong_audience() {
        let token = service().issue(&staff()).unwrap();
        let other = JwtService::with_config(JwtConfig {
            audience: "someone-else".into(),
            ..service().config
        });
        assert!(matches!(other.validate_token(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_claims_consistency() {
        assert!(CurrentUser::try_from(claims("SUPER_ADMIN", None, None)).is_ok());
        assert!(CurrentUser::try_from(claims("TENANT_ADMIN", Some(3), None)).is_ok());
        assert!(CurrentUser::try_from(claims("CUSTOMER", Some(3), Some(9))).is_ok());

        for bad in [
            claims("SUPER_ADMIN", Some(3), None),
            claims("STAFF", None, None),
            claims("CUSTOMER", Some(3), None),
            claims("OWNER", Some(3), None),
        ] {
            assert!(matches!(
                CurrentUser::try_from(bad),
                Err(JwtError::MalformedClaims(_))
            ));
        }

        let mut c = claims("STAFF", Some(3), None);
        c.sub = "abc".into();
        assert!(CurrentUser::try_from(c).is_err());
    }

    #[test]
    fn test_customer_id_dropped_for_non_customers() {
        let user = CurrentUser::try_from(claims("STAFF", Some(3), Some(9))).unwrap();
        assert_eq!(user.customer_id, None);
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), TokenSource::Missing);

        headers.insert(http::header::COOKIE, "theme=dark; session=abc.def".parse().unwrap());
        assert_eq!(token_from_headers(&headers), TokenSource::Cookie("abc.def"));

        headers.insert(http::header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
        assert_eq!(token_from_headers(&headers), TokenSource::Bearer("xyz"));

        headers.insert(http::header::AUTHORIZATION, "Basic Zm9v".parse().unwrap());
        assert_eq!(token_from_headers(&headers), TokenSource::MalformedHeader);
    }

    #[test]
    fn test_empty_session_cookie_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::COOKIE, "session=".parse().unwrap());
        assert_eq!(token_from_headers(&headers), TokenSource::Missing);
    }

    #[test]
    fn test_session_cookie_format() {
        let c = session_cookie("tok", 3600, true);
        assert!(c.starts_with("session=tok;"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("Max-Age=3600"));
        assert!(c.ends_with("; Secure"));
        assert!(!clear_session_cookie(false).contains("Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
