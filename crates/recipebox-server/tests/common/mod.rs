//! Shared harness for the HTTP integration tests.
#![allow(dead_code)]

use recipebox_server::{AppConfig, build_app};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    pub media_root: TempDir,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(AppConfig::default()).await
    }

    pub async fn start_with(mut config: AppConfig) -> Self {
        let media_root = tempfile::tempdir().expect("media dir");
        config.media.root = media_root.path().to_path_buf();

        let app = build_app(&config).await.expect("build app");

        // Bind to an ephemeral port
        let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind");
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await;
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            media_root,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Signs up `email` and returns an `Authorization` header value.
    pub async fn user(&self, email: &str) -> String {
        let res = self
            .client
            .post(self.url("/api/user/create"))
            .json(&json!({ "email": email, "password": "testpass123", "name": "Test" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201, "signup for {email}");

        let res = self
            .client
            .post(self.url("/api/user/token"))
            .json(&json!({ "email": email, "password": "testpass123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        format!("Token {}", body["token"].as_str().unwrap())
    }

    pub async fn get(&self, auth: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("Authorization", auth)
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, auth: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put(&self, auth: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn patch(&self, auth: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, auth: &str, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .header("Authorization", auth)
            .send()
            .await
            .unwrap()
    }

    /// Creates a recipe from `extra` merged over sample defaults.
    pub async fn recipe(&self, auth: &str, extra: Value) -> Value {
        let mut body = json!({ "title": "Sample recipe", "time_minutes": 22, "price": "5.25" });
        if let (Some(base), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let res = self.post(auth, "/api/recipe/recipes", body).await;
        assert_eq!(res.status(), 201);
        res.json().await.unwrap()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Sorted names of a `tags`/`ingredients` array.
pub fn names(list: &Value) -> Vec<String> {
    let mut names: Vec<String> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}
