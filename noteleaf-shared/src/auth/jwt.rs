/// Bearer token generation and validation
///
/// This module provides the JWT functionality behind the `/auth/token`
/// endpoint. Tokens are signed with HS256 (HMAC-SHA256) and carry the
/// username as their subject; the authentication layer resolves the subject
/// back to a user row on every request, so deactivating an account takes
/// effect immediately even while its tokens are still within their window.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable, short-lived (default 15 minutes)
/// - **Validation**: Signature, expiration, issuer, and not-before checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use noteleaf_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "your-secret-key-at-least-32-bytes!!";
///
/// let claims = Claims::new("ada");
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, "ada");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer written into and required from every token
pub const ISSUER: &str = "noteleaf";

/// Default token lifetime in minutes
pub const DEFAULT_EXPIRY_MINUTES: i64 = 15;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token issuer does not match
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims structure
///
/// Standard claims only; the subject is the username, not the user id,
/// matching what the token endpoint issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - username of the authenticated account
    pub sub: String,

    /// Issuer - always "noteleaf"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims with the default 15-minute expiration
    ///
    /// # Example
    ///
    /// ```
    /// use noteleaf_shared::auth::jwt::Claims;
    ///
    /// let claims = Claims::new("ada");
    /// assert_eq!(claims.sub, "ada");
    /// ```
    pub fn new(username: &str) -> Self {
        Self::with_expiration(username, Duration::minutes(DEFAULT_EXPIRY_MINUTES))
    }

    /// Creates claims with a custom expiration
    ///
    /// # Example
    ///
    /// ```
    /// use noteleaf_shared::auth::jwt::Claims;
    /// use chrono::Duration;
    ///
    /// let claims = Claims::with_expiration("ada", Duration::hours(1));
    /// ```
    pub fn with_expiration(username: &str, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: username.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Time remaining until expiration, None if already expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Creates a signed token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
///
/// # Security
///
/// The secret should be at least 32 bytes (256 bits) for HS256, randomly
/// generated, and supplied through configuration rather than source code.
///
/// # Example
///
/// ```
/// use noteleaf_shared::auth::jwt::{create_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new("ada");
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes!!")?;
/// assert!(!token.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired
/// - Issuer is "noteleaf"
/// - Token is not used before its nbf time
///
/// # Errors
///
/// Returns `JwtError::Expired` for an expired token, `JwtError::InvalidIssuer`
/// for a wrong issuer, and `JwtError::ValidationError` for everything else
/// (bad signature, malformed token).
///
/// # Example
///
/// ```
/// use noteleaf_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "your-secret-key-at-least-32-bytes!!";
///
/// let claims = Claims::new("ada");
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, "ada");
/// # Ok(())
/// # }
/// ```
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("ada");

        assert_eq!(claims.sub, "ada");
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_with_custom_expiration() {
        let claims = Claims::with_expiration("ada", Duration::hours(1));

        let time_left = claims.time_until_expiration().unwrap();
        assert!(time_left.num_seconds() > 3500);
        assert!(time_left.num_seconds() <= 3600);
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = Claims::new("ada");
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, "ada");
        assert_eq!(validated.iss, ISSUER);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new("ada");
        let token = create_token(&claims, SECRET).expect("Should create token");

        let result = validate_token(&token, "a-completely-different-secret-key!!!");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        // Expired well past the decoder's leeway window
        let claims = Claims::with_expiration("ada", Duration::minutes(-10));

        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_tampered_token() {
        let claims = Claims::new("ada");
        let token = create_token(&claims, SECRET).expect("Should create token");

        // Flip a character in the payload segment
        let mut tampered: Vec<char> = token.chars().collect();
        let mid = tampered.len() / 2;
        tampered[mid] = if tampered[mid] == 'a' { 'b' } else { 'a' };
        let tampered: String = tampered.into_iter().collect();

        assert!(validate_token(&tampered, SECRET).is_err());
    }

    #[test]
    fn test_validate_garbage_token() {
        assert!(validate_token("not-a-token", SECRET).is_err());
    }
}
