//! Authentication utilities library
//!
//! Provides reusable credential primitives for services:
//! - Password hashing (Argon2id, configurable work factor)
//! - Opaque session and reset token generation
//! - Basic authorization header decoding
//!
//! Nothing here knows about users or storage. Services own their domain
//! rules and call into these helpers.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Tokens
//! ```
//! let token = auth::generate_token().unwrap();
//! assert_eq!(token.len(), 43);
//! ```
//!
//! ## Basic Credentials
//! ```
//! use auth::BasicCredentials;
//!
//! let credentials = BasicCredentials::from_header("Basic Ym9iQGV4YW1wbGUuY29tOnB3ZA==").unwrap();
//! assert_eq!(credentials.email, "bob@example.com");
//! assert_eq!(credentials.password, "pwd");
//! ```

pub mod basic;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use basic::BasicAuthError;
pub use basic::BasicCredentials;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::generate_token;
pub use token::TokenError;
