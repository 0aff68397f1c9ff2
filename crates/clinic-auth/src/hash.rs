//! PBKDF2-HMAC-SHA256 password hashing
//!
//! Encoded form: `pbkdf2-sha256$<rounds>$<salt hex>$<digest hex>`. Every hash
//! carries its own random salt, so equal passwords never produce equal hashes.

use crate::error::{AuthError, AuthResult};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

/// Default PBKDF2 iteration count
pub const DEFAULT_ROUNDS: u32 = 100_000;
/// Salt length in bytes
pub const SALT_LENGTH: usize = 16;
/// Digest length in bytes
pub const DIGEST_LENGTH: usize = 32;

const SCHEME: &str = "pbkdf2-sha256";

/// Salted password digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    rounds: u32,
    salt: [u8; SALT_LENGTH],
    digest: [u8; DIGEST_LENGTH],
}

impl PasswordHash {
    /// Hash `password` with a fresh random salt
    #[must_use]
    pub fn new(password: &str, rounds: u32) -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        rand::rng().fill_bytes(&mut salt);
        Self::with_salt(password, rounds, salt)
    }

    /// Hash `password` with a given salt
    #[must_use]
    pub fn with_salt(password: &str, rounds: u32, salt: [u8; SALT_LENGTH]) -> Self {
        let rounds = rounds.max(1);
        Self {
            rounds,
            salt,
            digest: derive(password, rounds, &salt),
        }
    }

    /// Iteration count
    #[inline]
    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Check `password` in constant time
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let candidate = derive(password, self.rounds, &self.salt);
        candidate[..].ct_eq(&self.digest[..]).into()
    }
}

fn derive(password: &str, rounds: u32, salt: &[u8]) -> [u8; DIGEST_LENGTH] {
    let mut digest = [0u8; DIGEST_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut digest);
    digest
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}${}${}${}",
            self.rounds,
            hex::encode(self.salt),
            hex::encode(self.digest)
        )
    }
}

impl FromStr for PasswordHash {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('$');
        let (Some(scheme), Some(rounds), Some(salt), Some(digest), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AuthError::malformed("expected four '$'-separated parts"));
        };
        if scheme != SCHEME {
            return Err(AuthError::malformed(format!("unsupported scheme '{scheme}'")));
        }

        let rounds: u32 = rounds
            .parse()
            .map_err(|_| AuthError::malformed(format!("bad round count '{rounds}'")))?;
        if rounds == 0 {
            return Err(AuthError::malformed("round count must be positive"));
        }
        let mut hash = Self {
            rounds,
            salt: [0u8; SALT_LENGTH],
            digest: [0u8; DIGEST_LENGTH],
        };
        hex::decode_to_slice(salt, &mut hash.salt)
            .map_err(|e| AuthError::malformed(format!("salt: {e}")))?;
        hex::decode_to_slice(digest, &mut hash.digest)
            .map_err(|e| AuthError::malformed(format!("digest: {e}")))?;
        Ok(hash)
    }
}

/// Hash a password into its encoded form
#[must_use]
pub fn hash_password(password: &str, rounds: u32) -> String {
    PasswordHash::new(password, rounds).to_string()
}

/// Verify a password against an encoded hash
pub fn verify_password(password: &str, encoded: &str) -> AuthResult<bool> {
    Ok(encoded.parse::<PasswordHash>()?.verify(password))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUNDS: u32 = 1_000;

    #[test]
    fn verify_accepts_only_the_right_password() {
        let hash = PasswordHash::new("hunter2", ROUNDS);
        assert!(hash.verify("hunter2"));
        assert!(!hash.verify("hunter3"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn same_password_different_hashes() {
        let a = hash_password("secret", ROUNDS);
        let b = hash_password("secret", ROUNDS);
        assert_ne!(a, b);
        assert!(verify_password("secret", &a).unwrap());
        assert!(verify_password("secret", &b).unwrap());
    }

    #[test]
    fn fixed_salt_is_deterministic() {
        let salt = [7u8; SALT_LENGTH];
        assert_eq!(
            PasswordHash::with_salt("pw", ROUNDS, salt),
            PasswordHash::with_salt("pw", ROUNDS, salt)
        );
    }

    #[test]
    fn encoded_form_parses_back() {
        let hash = PasswordHash::new("pw", ROUNDS);
        let encoded = hash.to_string();
        assert!(encoded.starts_with("pbkdf2-sha256$1000$"));
        assert_eq!(encoded.parse::<PasswordHash>().unwrap(), hash);
    }

    #[test]
    fn malformed_hashes_are_rejected() {
        for bad in [
            "",
            "plaintext-password",
            "sha256$1000$00$00",
            "pbkdf2-sha256$many$00$00",
            "pbkdf2-sha256$0$00$00",
            "pbkdf2-sha256$1000$zz$00",
            "pbkdf2-sha256$1000$00$00$extra",
        ] {
            assert!(
                matches!(verify_password("pw", bad), Err(AuthError::MalformedHash(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn zero_rounds_clamped() {
        assert_eq!(PasswordHash::new("pw", 0).rounds(), 1);
    }
}
