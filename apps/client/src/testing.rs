//! Fake analysis backend for tests, served by axum on an ephemeral port.

use std::time::Duration;

use axum::Router;
use bytes::Bytes;

use crate::config::base_url;
use crate::models::resume::ResumeFile;
use crate::transport::ApiClient;

/// Serves `app` on 127.0.0.1 and returns its base address.
pub async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

/// A base address nothing is listening on.
pub async fn unused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

pub fn client_for(base: &str, timeout: Duration) -> ApiClient {
    ApiClient::new(base_url(base).unwrap(), timeout).unwrap()
}

pub fn pdf(name: &str, size: usize) -> ResumeFile {
    ResumeFile::new(name, "application/pdf", Bytes::from(vec![b'%'; size]))
}

pub fn file(name: &str, mime_type: &str) -> ResumeFile {
    ResumeFile::new(name, mime_type, Bytes::from_static(b"resume"))
}
