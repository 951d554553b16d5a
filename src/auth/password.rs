use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::{auth::error::AuthError, config::PasswordConfig};

/// Argon2id hashing with configurable cost.
#[derive(Clone)]
pub struct PasswordService {
    params: Params,
}

impl PasswordService {
    pub fn from_config(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!(e.to_string()))
            .context("invalid argon2 parameters")?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Fresh random salt on every call, so equal inputs give different PHC strings.
    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// `false` for a wrong password and for a hash that does not parse.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        // Cost parameters come from the PHC string, not from `self.params`.
        self.argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    pub async fn hash_blocking(&self, plain: String) -> Result<String, AuthError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.hash(&plain))
            .await
            .context("password hashing task")?
    }

    pub async fn verify_blocking(&self, plain: String, hash: String) -> Result<bool, AuthError> {
        let this = self.clone();
        let ok = tokio::task::spawn_blocking(move || this.verify(&plain, &hash))
            .await
            .context("password verification task")?;
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::from_config(&PasswordConfig::default()).unwrap()
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let svc = service();
        let password = "Secur3P@ssw0rd!";
        let hash = svc.hash(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(svc.verify(password, &hash));
    }

    #[test]
    fn same_password_gets_a_new_salt_each_time() {
        let svc = service();
        let a = svc.hash("pw123").unwrap();
        let b = svc.hash("pw123").unwrap();
        assert_ne!(a, b);
        assert!(svc.verify("pw123", &a));
        assert!(svc.verify("pw123", &b));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let svc = service();
        let hash = svc.hash("correct-horse-battery-staple").unwrap();
        for wrong in ["wrong-password", "", "correct-horse-battery-stapl", "Correct-horse-battery-staple"] {
            assert!(!svc.verify(wrong, &hash), "{wrong:?} must not verify");
        }
    }

    #[test]
    fn malformed_hash_is_false_not_an_error() {
        let svc = service();
        assert!(!svc.verify("anything", "not-a-valid-hash"));
        assert!(!svc.verify("anything", ""));
        assert!(!svc.verify("anything", "$argon2id$v=19$m=19456,t=2,p=1$garbage"));
    }

    #[test]
    fn cost_parameters_come_from_config() {
        let svc = PasswordService::from_config(&PasswordConfig {
            memory_kib: 8192,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let hash = svc.hash("pw").unwrap();
        assert!(hash.contains("m=8192,t=1,p=1"), "{hash}");

        // verification follows the parameters recorded in the hash
        assert!(service().verify("pw", &hash));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let res = PasswordService::from_config(&PasswordConfig {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 0,
        });
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn blocking_wrappers_match_sync_behaviour() {
        let svc = service();
        let hash = svc.hash_blocking("pw".into()).await.unwrap();
        assert!(svc.verify_blocking("pw".into(), hash.clone()).await.unwrap());
        assert!(!svc.verify_blocking("nope".into(), hash).await.unwrap());
    }
}
