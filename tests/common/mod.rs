#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use studyhall::StudyhallError;
use studyhall::db::DbActorHandle;
use studyhall::gemini::Dispatch;
use studyhall_schema::Content;
use tempfile::TempDir;

/// Spawns a `DbActor` backed by a fresh SQLite file. The returned guard
/// keeps the directory (and database) alive for the test's duration.
pub async fn spawn_temp_db() -> (DbActorHandle, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = dir.path().join("studyhall_test.sqlite");
    let database_url = format!("sqlite:{}", db_path.to_str().unwrap());
    let handle = studyhall::db::spawn(&database_url).await;
    (handle, dir)
}

/// Scripted dispatcher standing in for the Gemini endpoint.
pub struct StubDispatcher {
    reply: Result<String, ()>,
    pub calls: Mutex<Vec<(Vec<Content>, Option<String>)>>,
}

impl StubDispatcher {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, contents: Vec<Content>, image: Option<String>) {
        self.calls.lock().unwrap().push((contents, image));
    }

    fn respond(&self) -> Result<String, StudyhallError> {
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(()) => Err(StudyhallError::UpstreamStatus(
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
            )),
        }
    }
}

#[async_trait]
impl Dispatch for StubDispatcher {
    async fn generate_text(&self, contents: Vec<Content>) -> Result<String, StudyhallError> {
        self.record(contents, None);
        self.respond()
    }

    async fn generate_with_image(
        &self,
        contents: Vec<Content>,
        image_base64: &str,
    ) -> Result<String, StudyhallError> {
        self.record(contents, Some(image_base64.to_string()));
        self.respond()
    }
}
