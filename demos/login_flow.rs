//! Complete login flow example
//!
//! 1. Receive code from mini program client
//! 2. Call code2Session to get openid and session_key
//! 3. Decrypt user data with the session_key
//!
//! Run with: cargo run --example login_flow

use wechat_mp_dispatch::{WechatError, WechatMp};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let wechat = WechatMp::new("wx1234567890abcdef", "your_app_secret_here")?;
    let js_code = "code_from_wx_login";

    let session = match wechat.auth().login(js_code).await {
        Ok(session) => session,
        Err(WechatError::Api { code, message }) => {
            eprintln!("Login rejected ({}): {}", code, message);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Login successful!");
    println!("OpenID: {}", session.openid);
    if let Some(unionid) = &session.unionid {
        println!("UnionID: {}", unionid);
    }

    // encryptedData and iv come from wx.getUserInfo() on the client
    let encrypted_data = "encrypted_data_from_client";
    let iv = "iv_from_client";

    match wechat
        .crypto()
        .decrypt_data(&session.session_key, encrypted_data, iv)
    {
        Ok(user) => println!("User data: {}", user.data),
        Err(e) => eprintln!("Decryption failed: {}", e),
    }

    Ok(())
}
