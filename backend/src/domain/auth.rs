//! Authentication primitives: login credentials and password digests.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use constant_time_eq::constant_time_eq;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const SALT_LEN: usize = 16;
const DIGEST_PREFIX: &str = "v1";

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is trimmed, lowercased, and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use fest_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@iiit.ac.in", "password").unwrap();
/// assert_eq!(creds.email(), "ada@iiit.ac.in");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email string suitable for user lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Errors raised when parsing a stored password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordHashParseError {
    /// The stored value does not match the `v1$salt$digest` layout.
    Malformed,
}

impl fmt::Display for PasswordHashParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "stored password digest is malformed"),
        }
    }
}

impl std::error::Error for PasswordHashParseError {}

/// Salted SHA-256 password digest stored as `v1$<salt-hex>$<digest-hex>`.
///
/// Verification recomputes the digest over `salt || password` and compares
/// in constant time so mismatches never leak timing information.
///
/// # Examples
/// ```
/// use fest_backend::domain::PasswordHash;
///
/// let hash = PasswordHash::derive("hunter2");
/// assert!(hash.verify("hunter2"));
/// assert!(!hash.verify("hunter3"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Derive a digest for a new password using a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        Self(Self::encode(&salt, password))
    }

    /// Reconstruct a digest from its stored representation.
    pub fn from_stored(stored: impl Into<String>) -> Result<Self, PasswordHashParseError> {
        let stored = stored.into();
        let mut parts = stored.split('$');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next(), parts.next()),
            (Some(DIGEST_PREFIX), Some(salt), Some(digest), None)
                if hex::decode(salt).is_ok() && hex::decode(digest).is_ok()
        );
        if !valid {
            return Err(PasswordHashParseError::Malformed);
        }
        Ok(Self(stored))
    }

    /// Stored representation suitable for persistence.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check a candidate password against the stored digest.
    pub fn verify(&self, password: &str) -> bool {
        let mut parts = self.0.split('$');
        let (Some(_), Some(salt_hex), Some(digest_hex)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        let Ok(expected) = hex::decode(digest_hex) else {
            return false;
        };
        constant_time_eq(&Self::digest(&salt, password), &expected)
    }

    fn encode(salt: &[u8], password: &str) -> String {
        format!(
            "{DIGEST_PREFIX}${}${}",
            hex::encode(salt),
            hex::encode(Self::digest(salt, password))
        )
    }

    fn digest(salt: &[u8], password: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().into()
    }
}
