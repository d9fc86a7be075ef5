//! # Broadcast Controller
//!
//! Drives a local media player through an emulated broadcast TV head-end:
//! channel tuning, scheduled programming, MTV-style music rotation,
//! interstitial bumpers/commercials, EAS preemption, and parental locks.
//!
//! The controller owns one player process and a small set of file-backed
//! state under its state root; everything else (schedule, parental policy,
//! EAS configuration) is read from that same root (see `broadcast-config`).

mod collaborators;
mod supervisor;

use std::path::PathBuf;

use clap::Parser;
use supervisor::ServerArgs;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments for the broadcast controller.
#[derive(Parser, Debug)]
#[command(name = "broadcast-server")]
#[command(about = "Broadcast TV head-end controller: tuning, scheduling, EAS, and parental locks")]
struct Args {
    /// Root directory for config, state, and index files.
    #[arg(long, env = "BROADCAST_STATE_ROOT")]
    state_root: PathBuf,

    /// Path to the media player executable.
    #[arg(long, env = "BROADCAST_PLAYER_BINARY", default_value = "mpv")]
    player_binary: String,

    /// Executable that plays EPG background music.
    #[arg(long, env = "BROADCAST_EPG_MUSIC_BINARY", default_value = "mpv")]
    epg_music_binary: String,

    /// Executable used to resolve YouTube-configured stations to live URLs.
    #[arg(long, env = "BROADCAST_YOUTUBE_RESOLVER_BINARY", default_value = "yt-dlp")]
    youtube_resolver_binary: String,

    /// Executable that renders an EAS alert descriptor into a video file.
    #[arg(long, env = "BROADCAST_ALERT_GENERATOR_BINARY")]
    alert_generator_binary: String,

    /// Snow/static placeholder asset path.
    #[arg(long, env = "BROADCAST_SNOW_PLACEHOLDER", default_value = "/assets/snow.mp4")]
    snow_placeholder: String,

    /// Sign-off test pattern image path.
    #[arg(long, env = "BROADCAST_TEST_PATTERN_IMAGE", default_value = "/assets/test_pattern.png")]
    test_pattern_image: String,

    /// Off-air animation asset path, played at the sign-off/sign-on boundary.
    #[arg(long, env = "BROADCAST_OFF_AIR_ANIMATION", default_value = "/assets/off_air.mp4")]
    off_air_animation: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "broadcast_server=info,broadcast_core=info,broadcast_config=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let paths = broadcast_config::Paths::new(&args.state_root);
    info!(root = %paths.root().display(), "loading configuration");

    let mut loader = broadcast_config::ConfigLoader::new(paths.clone());
    let config = loader.load().map_err(|err| {
        error!(error = %err, "failed to load configuration");
        err
    })?;

    let server_args = ServerArgs {
        player_binary: args.player_binary,
        epg_music_binary: args.epg_music_binary,
        youtube_resolver_binary: args.youtube_resolver_binary,
        alert_generator_binary: args.alert_generator_binary,
        snow_placeholder: args.snow_placeholder,
        test_pattern_image: args.test_pattern_image,
        off_air_animation: args.off_air_animation,
    };

    supervisor::run(paths, config, server_args).await
}
