//! C1: player IPC client. One-shot line-delimited JSON commands over a
//! local Unix stream socket (§4.1, §6). Each call opens its own
//! connection, writes one line, and — for `get_property` — reads one
//! reply line; nothing is kept open between calls, and a failed connect
//! fails only that operation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use broadcast_contracts::player::{PlayerControl, PlayerError, PlayerResult, PlayerValue};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::{debug, warn};

pub struct MpvIpcClient {
    socket_path: PathBuf,
    request_id: AtomicU64,
}

impl MpvIpcClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            request_id: AtomicU64::new(1),
        }
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn connect(&self) -> PlayerResult<UnixStream> {
        UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| PlayerError::Connect(e.to_string()))
    }

    async fn send_line(&self, stream: &mut UnixStream, payload: &Value) -> PlayerResult<()> {
        let mut line = payload.to_string();
        line.push('\n');
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| PlayerError::Send(e.to_string()))
    }

    async fn send_and_read(&self, payload: Value) -> Option<Value> {
        let mut stream = match self.connect().await {
            Ok(s) => s,
            Err(err) => {
                warn!(error = %err, "player IPC connect failed");
                return None;
            }
        };
        if let Err(err) = self.send_line(&mut stream, &payload).await {
            warn!(error = %err, "player IPC send failed");
            return None;
        }
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => serde_json::from_str::<Value>(&line).ok(),
        }
    }

    async fn send_fire_and_forget(&self, payload: Value) {
        let Ok(mut stream) = self.connect().await else {
            warn!("player IPC connect failed; dropping command");
            return;
        };
        if let Err(err) = self.send_line(&mut stream, &payload).await {
            warn!(error = %err, "player IPC send failed");
        }
    }

    async fn get_property_raw(&self, name: &str) -> Option<Value> {
        let payload = json!({
            "command": ["get_property", name],
            "request_id": self.next_request_id(),
        });
        let reply = self.send_and_read(payload).await?;
        reply.get("data").cloned()
    }
}

#[async_trait]
impl PlayerControl for MpvIpcClient {
    async fn command(&self, payload: &[&str]) {
        let value = json!({
            "command": payload,
            "request_id": self.next_request_id(),
        });
        self.send_fire_and_forget(value).await;
    }

    async fn get_property(&self, name: &str) -> PlayerValue {
        match self.get_property_raw(name).await {
            Some(value) => PlayerValue::from_json(&value),
            None => PlayerValue::Empty,
        }
    }

    async fn set_property(&self, name: &str, value: Value) {
        let payload = json!({
            "command": ["set_property", name, value],
            "request_id": self.next_request_id(),
        });
        self.send_fire_and_forget(payload).await;
    }

    async fn load(&self, path: &str, seek_seconds: f64) -> PlayerResult<()> {
        self.command(&["loadfile", path, "replace"]).await;

        let deadline = tokio::time::Instant::now() + Duration::from_millis(1000);
        let mut ready = false;
        while tokio::time::Instant::now() < deadline {
            let current_path = self.get_property("path").await;
            let duration = self.get_property("duration").await;
            let path_matches = current_path.as_str().is_some_and(|p| p == path);
            let has_duration = duration.as_f64().is_some_and(|d| d > 0.0);
            if path_matches || has_duration {
                ready = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if !ready {
            debug!(path, "load did not confirm readiness within the polling deadline");
            return Err(PlayerError::LoadTimeout);
        }

        if seek_seconds > 0.0 {
            self.seek_absolute(seek_seconds).await;
            tokio::time::sleep(Duration::from_millis(150)).await;
            self.seek_absolute(seek_seconds).await;
        }

        self.set_property("pause", json!(false)).await;
        Ok(())
    }

    async fn add_filter(&self, label: &str, spec: &str) {
        self.command(&["vf", "add", &format!("@{label}:{spec}")]).await;
    }

    async fn remove_filter(&self, label: &str) {
        self.command(&["vf", "remove", &format!("@{label}")]).await;
    }
}

impl MpvIpcClient {
    async fn seek_absolute(&self, seconds: f64) {
        let payload = json!({
            "command": ["seek", seconds, "absolute", "exact"],
            "request_id": self.next_request_id(),
        });
        self.send_fire_and_forget(payload).await;
    }
}

/// Checks whether the player's IPC socket has appeared on disk yet, used
/// by the supervisor's startup readiness wait (§4.11).
pub fn socket_exists(path: &Path) -> bool {
    path.exists()
}
