use serde::{Deserialize, Serialize};

/// Watermark embedded in decrypted user data
///
/// Carries the appid of the Mini Program the payload was encrypted for, so a
/// payload captured from one app cannot be replayed against another.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Watermark {
    /// Unix timestamp (seconds) at which WeChat encrypted the payload
    pub timestamp: i64,
    pub appid: String,
}

impl Watermark {
    pub fn is_for(&self, appid: &str) -> bool {
        self.appid == appid
    }
}
