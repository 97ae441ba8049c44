use bcrypt::BcryptError;
use thiserror::Error;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password is {0} bytes, bcrypt accepts at most 72")]
    TooLong(usize),
    #[error(transparent)]
    Bcrypt(#[from] BcryptError),
}

/// One-way salted password hashing (bcrypt).
///
/// Both operations are CPU-bound on purpose; async callers run them on the
/// blocking pool. `verify` compares digests in constant time. Inputs over
/// `MAX_PASSWORD_BYTES` are never truncated: `hash` refuses them and
/// `verify` reports a mismatch.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: akiba_config::DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong(password.len()));
        }
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored digest is unusable.
    pub fn verify(&self, digest: &str, candidate: &str) -> Result<bool, PasswordError> {
        if candidate.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        Ok(bcrypt::verify(candidate, digest)?)
    }
}
