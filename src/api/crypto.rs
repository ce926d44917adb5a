//! Built-in `crypto` namespace

use crate::crypto::{decrypt_user_data, verify_watermark, DecryptedUserData};
use crate::error::WechatError;

/// Decrypts Mini Program payloads on behalf of one appid.
///
/// Needs no access token and makes no network calls.
#[derive(Debug, Clone)]
pub struct CryptoApi {
    appid: String,
}

impl CryptoApi {
    pub fn new(appid: impl Into<String>) -> Self {
        Self {
            appid: appid.into(),
        }
    }

    pub fn appid(&self) -> &str {
        &self.appid
    }

    /// Decrypts `encrypted_data` and rejects payloads whose watermark names
    /// another appid.
    ///
    /// # Errors
    /// `WechatError::Crypto` for malformed input or a failed decryption,
    /// `WechatError::Signature` for a foreign watermark.
    pub fn decrypt_data(
        &self,
        session_key: &str,
        encrypted_data: &str,
        iv: &str,
    ) -> Result<DecryptedUserData, WechatError> {
        let data = decrypt_user_data(session_key, encrypted_data, iv)?;
        verify_watermark(&data, &self.appid)?;
        Ok(data)
    }
}
