use aes::cipher::{BlockEncryptMut, KeyIvInit};
use aes::Aes128;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use cbc::cipher::block_padding::Pkcs7;
use cbc::Encryptor;
use wechat_mp_dispatch::crypto::{decrypt_user_data, verify_watermark, DecryptedUserData, Watermark};
use wechat_mp_dispatch::{WechatError, WechatMp};

type Aes128CbcEnc = Encryptor<Aes128>;

/// Returns base64 (session_key, encrypted_data, iv) as the Mini Program would send them.
fn encrypt(key: &[u8; 16], iv: &[u8; 16], plaintext: &str) -> (String, String, String) {
    let msg_len = plaintext.len();
    let mut buffer = vec![0u8; msg_len + 16];
    buffer[..msg_len].copy_from_slice(plaintext.as_bytes());

    let ciphertext = Aes128CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<Pkcs7>(&mut buffer, msg_len)
        .unwrap()
        .to_vec();

    (
        BASE64.encode(key),
        BASE64.encode(ciphertext),
        BASE64.encode(iv),
    )
}

#[test]
fn test_invalid_base64_encrypted_data() {
    let result = decrypt_user_data(
        "MTIzNDU2Nzg5MDEyMzQ1Ng==",
        "not-valid!!!",
        "MTIzNDU2Nzg5MDEyMzQ1Ng==",
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Invalid encrypted_data"));
}

#[test]
fn test_invalid_key_length() {
    let result = decrypt_user_data(
        "MTIzNDU2Nzg5",
        "MTIzNDU2Nzg5MDEyMzQ1Ng==",
        "MTIzNDU2Nzg5MDEyMzQ1Ng==",
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Invalid session_key length"));
}

#[test]
fn test_invalid_iv_length() {
    let result = decrypt_user_data(
        "MTIzNDU2Nzg5MDEyMzQ1Ng==",
        "MTIzNDU2Nzg5MDEyMzQ1Ng==",
        "MTIzNDU2",
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Invalid iv length"));
}

#[test]
fn test_wrong_key_fails_padding_check() {
    let plaintext = r#"{"openId":"o1","watermark":{"timestamp":1,"appid":"wx1"}}"#;
    let (_, encrypted, iv) = encrypt(b"0123456789abcdef", b"abcdefghijklmnop", plaintext);
    let other_key = BASE64.encode(b"fedcba9876543210");

    let result = decrypt_user_data(&other_key, &encrypted, &iv);
    assert!(matches!(result, Err(WechatError::Crypto(_))));
}

#[test]
fn test_end_to_end_phone_number() {
    let plaintext = r#"{"phoneNumber":"13800138000","purePhoneNumber":"13800138000","countryCode":"86","watermark":{"timestamp":1612137600,"appid":"wxphonedemo123"}}"#;
    let (key, encrypted, iv) = encrypt(b"sessionkey123456", b"initialvec123456", plaintext);

    let decrypted = decrypt_user_data(&key, &encrypted, &iv).unwrap();
    assert_eq!(decrypted.data["phoneNumber"], "13800138000");
    assert_eq!(decrypted.data["countryCode"], "86");
    assert_eq!(decrypted.watermark.appid, "wxphonedemo123");
    assert_eq!(decrypted.watermark.timestamp, 1612137600);
}

#[test]
fn test_end_to_end_multi_block_with_unicode() {
    let plaintext = r#"{"nickName":"用户昵称","city":"Shenzhen","data":"longer than a single sixteen byte AES block","watermark":{"timestamp":1609459200,"appid":"wxaabbccddeefff"}}"#;
    let (key, encrypted, iv) = encrypt(b"key123456789012a", b"iv12345678901234", plaintext);

    let decrypted = decrypt_user_data(&key, &encrypted, &iv).unwrap();
    assert_eq!(decrypted.data["nickName"], "用户昵称");
    assert_eq!(
        decrypted.data["data"],
        "longer than a single sixteen byte AES block"
    );
}

#[test]
fn test_verify_watermark() {
    let data = DecryptedUserData {
        data: serde_json::json!({"openid": "test"}),
        watermark: Watermark {
            timestamp: 1234567890,
            appid: "wx1234567890".to_string(),
        },
    };
    assert!(verify_watermark(&data, "wx1234567890").is_ok());

    let err = verify_watermark(&data, "wx9999999999").unwrap_err();
    assert!(err.to_string().contains("Watermark appid mismatch"));
}

#[test]
fn test_crypto_namespace_checks_watermark() {
    let wechat = WechatMp::new("wxaabbccddeefff", "secret").unwrap();
    let plaintext = r#"{"openId":"oXXXX","watermark":{"timestamp":1609459200,"appid":"wxaabbccddeefff"}}"#;
    let (key, encrypted, iv) = encrypt(b"key123456789012a", b"iv12345678901234", plaintext);

    let decrypted = wechat.crypto().decrypt_data(&key, &encrypted, &iv).unwrap();
    assert_eq!(decrypted.data["openId"], "oXXXX");

    let other = WechatMp::new("wxsomeotherapp", "secret").unwrap();
    let result = other.crypto().decrypt_data(&key, &encrypted, &iv);
    assert!(matches!(result, Err(WechatError::Signature(_))));
}
