//! Calling WeChat endpoints by module and method name
//!
//! Run with: cargo run --example module_dispatch

use std::sync::Arc;

use serde_json::json;
use wechat_mp_dispatch::{
    middleware::LoggingMiddleware,
    types::{AppId, AppSecret},
    MemoryTokenStore, ModuleDefinition, Namespace, Params, WechatMp,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let wechat = WechatMp::builder()
        .appid(AppId::new("wx1234567890abcdef")?)
        .secret(AppSecret::new("your_app_secret_here")?)
        .token_store(Arc::new(MemoryTokenStore::new()))
        .register_module(
            ModuleDefinition::new("livebroadcast")
                .method("getLiveInfo", "/wxa/business/getliveinfo"),
        )
        .with_middleware(LoggingMiddleware::new())
        .build()?;

    let check = wechat
        .module("security")?
        .call("msgSecCheck", &json!({"content": "hello world", "version": 2}), &Params::new())
        .await?;
    println!("msgSecCheck: {:?}", check.as_json());

    let qrcode = wechat
        .module("wxacode")?
        .call(
            "getUnlimited",
            &json!({"scene": "id=42", "page": "pages/index/index"}),
            &Params::new(),
        )
        .await?;
    if let Some(png) = qrcode.into_bytes() {
        std::fs::write("qrcode.png", png)?;
        println!("QR code saved to qrcode.png");
    }

    let mut params = Params::new();
    params.insert("lang".to_string(), "zh_CN".to_string());
    if let Namespace::Module(live) = wechat.namespace("LiveBroadcast")? {
        let rooms = live
            .call("getLiveInfo", &json!({"start": 0, "limit": 10}), &params)
            .await?;
        println!("live rooms: {:?}", rooms.as_json());
    }

    println!("loaded modules: {:?}", wechat.loaded_modules());
    Ok(())
}
