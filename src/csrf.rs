//! Anti-forgery tokens bound to an intent string (e.g. `delete42`)

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, RolegateError};

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies `hex(HMAC-SHA256(secret, intent))` tokens
#[derive(Clone)]
pub struct CsrfTokens {
    secret: Vec<u8>,
}

impl std::fmt::Debug for CsrfTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfTokens").finish_non_exhaustive()
    }
}

impl CsrfTokens {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(RolegateError::Config("csrf secret must not be empty".into()));
        }
        Ok(CsrfTokens { secret: secret.to_vec() })
    }

    /// Random 32-byte secret, hex encoded
    pub fn generate_secret() -> Result<String> {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).map_err(|e| RolegateError::Config(e.to_string()))?;
        Ok(hex::encode(bytes))
    }

    fn mac(&self, intent: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(intent.as_bytes());
        mac
    }

    pub fn issue(&self, intent: &str) -> String {
        hex::encode(self.mac(intent).finalize().into_bytes())
    }

    /// Constant-time check of a submitted token
    pub fn verify(&self, intent: &str, token: &str) -> bool {
        match hex::decode(token.trim()) {
            Ok(sig) => self.mac(intent).verify_slice(&sig).is_ok(),
            Err(_) => false,
        }
    }
}

/// Intent a role delete token is bound to
pub fn delete_intent(role: u64) -> String {
    format!("delete{}", role)
}
