//! Decryption of user data sent up from the Mini Program
//!
//! WeChat hands the Mini Program AES-encrypted blobs (user info, phone
//! numbers, share tickets). The server decrypts them with the `session_key`
//! obtained from code2Session. Most callers go through
//! [`CryptoApi`](crate::api::CryptoApi), which also checks the watermark.
//!
//! ```rust,ignore
//! use wechat_mp_dispatch::crypto;
//!
//! let decrypted = crypto::decrypt_user_data(session_key, encrypted_data, iv)?;
//! crypto::verify_watermark(&decrypted, "wx1234567890abcdef")?;
//! ```

pub mod aes;

pub use crate::types::Watermark;
pub use aes::{decrypt_user_data, verify_watermark, DecryptedUserData};
