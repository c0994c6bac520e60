use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{rngs::OsRng, RngCore};
use tracing::error;

use crate::{config::PasswordConfig, error::AppError};

const SALT_LEN: usize = 16;
const DUMMY_SALT: [u8; SALT_LEN] = [0x5a; SALT_LEN];

/// Argon2id hasher with fixed cost parameters.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
    // Hash under the current params, verified against when a login names no user.
    dummy: Arc<str>,
}

impl CredentialHasher {
    pub fn new(cfg: &PasswordConfig) -> Result<Self, AppError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| AppError::Crypto(format!("invalid argon2 params: {}", e)))?;
        let salt = SaltString::encode_b64(&DUMMY_SALT)
            .map_err(|e| AppError::Crypto(e.to_string()))?;
        let dummy = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
            .hash_password(b"artmarket-absent-user", &salt)
            .map_err(|e| AppError::Crypto(e.to_string()))?
            .to_string();
        Ok(Self {
            params,
            dummy: dummy.into(),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng.try_fill_bytes(&mut salt_bytes).map_err(|e| {
            error!(error = %e, "os rng unavailable");
            AppError::Crypto(e.to_string())
        })?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
            error!(error = %e, "argon2 salt encode error");
            AppError::Crypto(e.to_string())
        })?;
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AppError::Crypto(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Parameters are read back from the stored PHC string, so hashes made
    /// under an older cost setting still verify.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            AppError::Crypto(e.to_string())
        })?;
        Ok(self
            .argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Spends the same argon2 work as [`verify`](Self::verify) when the login
    /// names no user, so a miss and a wrong password take about as long.
    pub fn verify_absent(&self, plain: &str) {
        let _ = self.verify(plain, &self.dummy);
    }

    #[cfg(test)]
    fn dummy_hash(&self) -> &str {
        &self.dummy
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> CredentialHasher {
    CredentialHasher::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("cheap params are valid")
}
