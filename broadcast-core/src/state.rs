//! Runtime state (§3): a tiny file-system message bus. The controller is
//! the sole writer for everything under its state root, except the
//! externally-written command/volume/mute/pending-alert/schedule-config
//! files (§5). Every accessor here is a thin wrapper over one file; the
//! consume-and-delete discipline for commands lives at the call site
//! (C11/C10), not in this module, so it stays obvious which reads are
//! one-shot.

use std::path::PathBuf;

use broadcast_config::Paths;
use broadcast_contracts::ids::ChannelNumber;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RuntimeState {
    paths: Paths,
}

async fn read_trimmed(path: &PathBuf) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Some(text.trim().to_string()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read state file");
            None
        }
    }
}

async fn write_atomic(path: &PathBuf, contents: &str) {
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    if let Err(err) = tokio::fs::write(path, contents).await {
        warn!(path = %path.display(), error = %err, "failed to write state file");
    }
}

async fn remove(path: &PathBuf) {
    match tokio::fs::remove_file(path).await {
        Ok(()) | Err(_) => {}
    }
}

async fn exists(path: &PathBuf) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

impl RuntimeState {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub async fn current_channel(&self) -> Option<ChannelNumber> {
        read_trimmed(&self.paths.current_channel())
            .await
            .and_then(|s| s.parse().ok())
            .map(ChannelNumber)
    }

    pub async fn set_current_channel(&self, channel: ChannelNumber) {
        write_atomic(&self.paths.current_channel(), &channel.0.to_string()).await;
    }

    /// Consumes (reads then deletes) the pending channel-command file, if
    /// any (§4.10, §6).
    pub async fn take_channel_cmd(&self) -> Option<String> {
        let path = self.paths.channel_cmd();
        let value = read_trimmed(&path).await?;
        remove(&path).await;
        Some(value)
    }

    pub async fn take_volume_cmd(&self) -> Option<i32> {
        let path = self.paths.volume_cmd();
        let value = read_trimmed(&path).await?;
        remove(&path).await;
        value.parse().ok()
    }

    pub async fn take_mute_cmd(&self) -> bool {
        let path = self.paths.mute_cmd();
        if exists(&path).await {
            remove(&path).await;
            true
        } else {
            false
        }
    }

    pub async fn is_parental_unlocked(&self) -> bool {
        exists(&self.paths.parental_unlocked()).await
    }

    pub async fn set_parental_unlocked(&self, unlocked: bool) {
        if unlocked {
            write_atomic(&self.paths.parental_unlocked(), "1").await;
        } else {
            remove(&self.paths.parental_unlocked()).await;
        }
    }

    pub async fn is_off_air(&self, channel: ChannelNumber) -> bool {
        exists(&self.paths.off_air_flag(channel.0)).await
    }

    pub async fn set_off_air(&self, channel: ChannelNumber, off_air: bool) {
        if off_air {
            write_atomic(&self.paths.off_air_flag(channel.0), "1").await;
        } else {
            remove(&self.paths.off_air_flag(channel.0)).await;
        }
    }

    pub async fn is_eas_active(&self) -> bool {
        exists(&self.paths.eas_active_flag()).await
    }

    pub async fn set_eas_active(&self, active: bool) {
        if active {
            write_atomic(&self.paths.eas_active_flag(), "1").await;
        } else {
            remove(&self.paths.eas_active_flag()).await;
        }
    }

    pub async fn set_eas_resume_channel(&self, channel: ChannelNumber) {
        write_atomic(&self.paths.eas_resume_channel(), &channel.0.to_string()).await;
    }

    pub async fn eas_resume_channel(&self) -> Option<ChannelNumber> {
        read_trimmed(&self.paths.eas_resume_channel())
            .await
            .and_then(|s| s.parse().ok())
            .map(ChannelNumber)
    }

    pub async fn set_eas_crawl(&self, text: &str, expiry_epoch_seconds: i64) {
        write_atomic(&self.paths.eas_crawl_text(), text).await;
        write_atomic(&self.paths.eas_crawl_expiry(), &expiry_epoch_seconds.to_string()).await;
    }

    pub async fn eas_crawl(&self) -> Option<(String, i64)> {
        let text = read_trimmed(&self.paths.eas_crawl_text()).await?;
        let expiry = read_trimmed(&self.paths.eas_crawl_expiry())
            .await
            .and_then(|s| s.parse().ok());
        Some((text, expiry.unwrap_or(0)))
    }

    pub async fn clear_eas_crawl(&self) {
        remove(&self.paths.eas_crawl_text()).await;
        remove(&self.paths.eas_crawl_expiry()).await;
        remove(&self.paths.eas_crawl_active()).await;
    }

    pub async fn is_crawl_active(&self) -> bool {
        exists(&self.paths.eas_crawl_active()).await
    }

    pub async fn set_crawl_active(&self, active: bool) {
        if active {
            write_atomic(&self.paths.eas_crawl_active(), "1").await;
        } else {
            remove(&self.paths.eas_crawl_active()).await;
        }
    }

    pub async fn set_mtv_metadata(&self, json_text: &str) {
        write_atomic(&self.paths.mtv_metadata(), json_text).await;
    }

    pub async fn clear_mtv_metadata(&self) {
        remove(&self.paths.mtv_metadata()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> (tempfile::TempDir, RuntimeState) {
        let tmp = tempfile::tempdir().unwrap();
        (tmp, RuntimeState::new(Paths::new(tmp.path())))
    }

    #[tokio::test]
    async fn channel_cmd_is_consumed_on_read() {
        let (tmp, state) = state();
        tokio::fs::create_dir_all(tmp.path().join("state")).await.unwrap();
        tokio::fs::write(tmp.path().join("state/channel_cmd"), "up").await.unwrap();

        assert_eq!(state.take_channel_cmd().await, Some("up".to_string()));
        assert_eq!(state.take_channel_cmd().await, None);
    }

    #[tokio::test]
    async fn off_air_flag_round_trips_per_channel() {
        let (_tmp, state) = state();
        assert!(!state.is_off_air(ChannelNumber(5)).await);
        state.set_off_air(ChannelNumber(5), true).await;
        assert!(state.is_off_air(ChannelNumber(5)).await);
        assert!(!state.is_off_air(ChannelNumber(6)).await);
        state.set_off_air(ChannelNumber(5), false).await;
        assert!(!state.is_off_air(ChannelNumber(5)).await);
    }

    #[tokio::test]
    async fn mute_flag_is_a_presence_file() {
        let (tmp, state) = state();
        assert!(!state.take_mute_cmd().await);
        tokio::fs::create_dir_all(tmp.path().join("state")).await.unwrap();
        tokio::fs::write(tmp.path().join("state/mute"), "").await.unwrap();
        assert!(state.take_mute_cmd().await);
        assert!(!state.take_mute_cmd().await);
    }
}
