//! Basic usage example for wechat-mp-dispatch
//!
//! Run with: cargo run --example basic_usage

use std::time::Duration;

use wechat_mp_dispatch::{
    types::{AppId, AppSecret},
    WechatMp,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let wechat = WechatMp::builder()
        .appid(AppId::new("wx1234567890abcdef")?)
        .secret(AppSecret::new("your_app_secret_here")?)
        .timeout(Duration::from_secs(10))
        .build()?;

    println!("Client created successfully!");
    println!("AppID: {}", wechat.appid());
    println!("Modules: {}", wechat.registry().names().join(", "));

    match wechat.get_access_token().await {
        Ok(token) => println!("Access token: {}...", &token[..token.len().min(8)]),
        Err(e) => eprintln!("Token error: {}", e),
    }

    Ok(())
}
