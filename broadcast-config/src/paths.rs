use std::path::{Path, PathBuf};

/// Well-known file/directory layout rooted at a single configurable
/// directory. Keeping every path derivation in one place means the
/// runtime-state file contract (§3/§6) and the config file contract live
/// next to each other instead of being re-derived ad hoc at call sites.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // --- configuration surface ---

    pub fn channel_table(&self) -> PathBuf {
        self.root.join("config/channels.tsv")
    }

    pub fn schedule_config(&self) -> PathBuf {
        self.root.join("config/schedule.json")
    }

    pub fn parental_config(&self) -> PathBuf {
        self.root.join("config/parental.json")
    }

    pub fn eas_config(&self) -> PathBuf {
        self.root.join("config/eas.json")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    /// Per-station index file: `index/<STATION>.tsv`.
    pub fn station_index(&self, station: &str) -> PathBuf {
        self.root.join("index").join(format!("{station}.tsv"))
    }

    // --- runtime state (controller-owned, single writer) ---

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn current_channel(&self) -> PathBuf {
        self.state_dir().join("current_channel")
    }

    pub fn channel_cmd(&self) -> PathBuf {
        self.state_dir().join("channel_cmd")
    }

    pub fn volume_cmd(&self) -> PathBuf {
        self.state_dir().join("volume")
    }

    pub fn mute_cmd(&self) -> PathBuf {
        self.state_dir().join("mute")
    }

    pub fn parental_unlocked(&self) -> PathBuf {
        self.state_dir().join("parental_unlocked")
    }

    pub fn off_air_flag(&self, channel: u32) -> PathBuf {
        self.state_dir().join(format!("off_air.{channel}"))
    }

    pub fn eas_active_flag(&self) -> PathBuf {
        self.state_dir().join("eas_active")
    }

    pub fn eas_resume_channel(&self) -> PathBuf {
        self.state_dir().join("eas_resume_channel")
    }

    pub fn eas_crawl_text(&self) -> PathBuf {
        self.state_dir().join("eas_crawl_text")
    }

    pub fn eas_crawl_expiry(&self) -> PathBuf {
        self.state_dir().join("eas_crawl_expiry")
    }

    pub fn eas_crawl_active(&self) -> PathBuf {
        self.state_dir().join("eas_crawl_active")
    }

    pub fn mtv_metadata(&self) -> PathBuf {
        self.state_dir().join("mtv_metadata")
    }

    pub fn player_ipc_socket(&self) -> PathBuf {
        self.root.join("run/player.sock")
    }

    pub fn epg_music_pidfile(&self) -> PathBuf {
        self.root.join("run/epg-music.pid")
    }

    pub fn supervisor_lock(&self) -> PathBuf {
        self.root.join("run/controller.lock")
    }

    // --- EAS alert pipeline ---

    pub fn pending_alerts_dir(&self) -> PathBuf {
        self.root.join("alerts/pending")
    }

    pub fn generated_alerts_dir(&self) -> PathBuf {
        self.root.join("alerts/generated")
    }

    pub fn crawl_font(&self) -> PathBuf {
        self.root.join("assets/crawl_font.ttf")
    }
}
