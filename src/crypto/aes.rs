//! AES-128-CBC decryption for WeChat encrypted user data

use aes::cipher::{BlockDecryptMut, KeyIvInit};
use aes::Aes128;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use cbc::cipher::block_padding::Pkcs7;
use cbc::Decryptor;

use crate::error::WechatError;
use crate::types::Watermark;

type Aes128CbcDecryptor = Decryptor<Aes128>;

const BLOCK_LEN: usize = 16;

/// Decrypted user data with watermark
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DecryptedUserData {
    /// Scenario-specific fields (openId, unionId, phoneNumber, ...)
    #[serde(flatten)]
    pub data: serde_json::Value,
    pub watermark: Watermark,
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, WechatError> {
    BASE64
        .decode(value)
        .map_err(|e| WechatError::Crypto(format!("Invalid {}: {}", name, e)))
}

fn decode_block_sized(name: &str, value: &str) -> Result<Vec<u8>, WechatError> {
    let bytes = decode_field(name, value)?;
    if bytes.len() != BLOCK_LEN {
        return Err(WechatError::Crypto(format!(
            "Invalid {} length: expected {}, got {}",
            name,
            BLOCK_LEN,
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Decrypt WeChat encrypted user data
///
/// All three inputs are base64 encoded as delivered by the Mini Program:
/// the 16-byte `session_key` from code2Session is the AES key, `iv` is the
/// 16-byte CBC IV and `encrypted_data` the PKCS#7 padded ciphertext of a
/// JSON document.
pub fn decrypt_user_data(
    session_key: &str,
    encrypted_data: &str,
    iv: &str,
) -> Result<DecryptedUserData, WechatError> {
    let key = decode_block_sized("session_key", session_key)?;
    let mut buffer = decode_field("encrypted_data", encrypted_data)?;
    let iv_bytes = decode_block_sized("iv", iv)?;

    let decryptor = Aes128CbcDecryptor::new(key.as_slice().into(), iv_bytes.as_slice().into());
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map_err(|e| WechatError::Crypto(format!("Decryption failed: {:?}", e)))?;

    let json_str = std::str::from_utf8(plaintext)
        .map_err(|e| WechatError::Crypto(format!("Invalid UTF-8: {}", e)))?;

    serde_json::from_str(json_str).map_err(|e| WechatError::Crypto(format!("Invalid JSON: {}", e)))
}

/// Verify watermark appid matches expected appid
pub fn verify_watermark(data: &DecryptedUserData, expected_appid: &str) -> Result<(), WechatError> {
    if !data.watermark.is_for(expected_appid) {
        return Err(WechatError::Signature(format!(
            "Watermark appid mismatch: expected {}, got {}",
            expected_appid, data.watermark.appid
        )));
    }
    Ok(())
}
