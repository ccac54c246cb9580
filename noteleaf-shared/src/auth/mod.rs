/// Authentication utilities
///
/// This module provides the security primitives for Noteleaf:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Bearer token generation and validation
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Bearer Tokens**: HS256-signed JWTs with configurable expiration
/// - **Constant-time Comparison**: Password verification is constant-time
///
/// # Example
///
/// ```no_run
/// use noteleaf_shared::auth::password::{hash_password, verify_password};
/// use noteleaf_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// // Token generation
/// let claims = Claims::new("ada");
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
