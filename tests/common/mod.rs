// tests/common/mod.rs
//
// Shared helpers: in-process fake services bound to an ephemeral local port.

#![allow(dead_code)]

use axum::Router;
use text_insight_analyzer::config::Tuning;

/// Serve `app` on 127.0.0.1 and return its base URL (no trailing slash).
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server");
    });
    format!("http://{addr}")
}

pub fn http() -> reqwest::Client {
    Tuning::default().http_client().expect("http client")
}
