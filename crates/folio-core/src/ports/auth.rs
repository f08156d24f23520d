//! Credential hashing port.

/// Hashes and checks passwords for the credentials provider.
///
/// Implementations own the algorithm and its parameters; stored hashes
/// are self-describing strings, so `verify` needs no extra context.
pub trait PasswordService: Send + Sync {
    /// Hash a plain-text password for storage.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plain-text password against a stored hash.
    ///
    /// `Ok(false)` means the password does not match; `Err` means the
    /// check itself could not run (for example an unparseable hash).
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}
