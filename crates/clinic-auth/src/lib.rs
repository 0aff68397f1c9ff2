//! Clinic Auth
//!
//! Salted password hashing, the credential store over the `logins` store, and
//! the session value handed to the rest of the system after login.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 digests with a random 16-byte
//! salt per login and compared in constant time. Plaintext is never stored.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod credentials;
pub mod error;
pub mod hash;
pub mod session;

pub use credentials::CredentialStore;
pub use error::{AuthError, AuthResult};
pub use hash::{hash_password, verify_password, PasswordHash, DEFAULT_ROUNDS};
pub use session::{Role, Session};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
