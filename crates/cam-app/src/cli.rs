use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cam_core::config::{self, CaptureConfig, ConfigOverrides};
use clap::Parser;

/// camscii : webcam en ASCII art dans le terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Compression horizontale : largeur d'un bloc en pixels [défaut : 20].
    #[arg(long = "cx", allow_negative_numbers = true)]
    pub cx: Option<i64>,

    /// Compression verticale : hauteur d'un bloc en pixels [défaut : 30].
    #[arg(long = "cy", allow_negative_numbers = true)]
    pub cy: Option<i64>,

    /// Périphérique de capture [défaut : /dev/video0].
    #[arg(long)]
    pub device: Option<PathBuf>,

    /// Demuxer ffmpeg du périphérique : v4l2, avfoundation, dshow [défaut : v4l2].
    #[arg(long)]
    pub input_format: Option<String>,

    /// Exécutable ffmpeg [défaut : ffmpeg, cherché dans le PATH].
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Attente maximale d'une frame, en secondes [défaut : 5].
    #[arg(long)]
    pub wait: Option<u64>,

    /// Fichier de configuration TOML (section [capture]).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Parse `std::env::args_os()`, accepting `-cx`/`-cy` as well as `--cx`/`--cy`.
    #[must_use]
    pub fn parse_env() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Config file (if any) merged with command-line overrides, validated.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be loaded or if a value is
    /// out of range (non-positive compression factor, zero wait).
    pub fn resolve_config(&self) -> Result<CaptureConfig> {
        let base = match self.config {
            Some(ref path) => config::load_config(path)?,
            None => CaptureConfig::default(),
        };
        base.with_overrides(ConfigOverrides {
            device: self.device.clone(),
            input_format: self.input_format.clone(),
            ffmpeg: self.ffmpeg.clone(),
            wait_secs: self.wait,
            compression_x: self.cx,
            compression_y: self.cy,
        })
        .context("Options en ligne de commande invalides")
    }
}

/// Rewrite the single-dash long flags `-cx`/`-cy` (and `-cx=N`) to `--cx`/`--cy`.
///
/// clap would otherwise read `-cx` as `-c x`.
#[must_use]
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some(s)
                if ["-cx", "-cy"]
                    .iter()
                    .any(|flag| s == *flag || s.starts_with(&format!("{flag}="))) =>
            {
                OsString::from(format!("-{s}"))
            }
            _ => arg,
        })
        .collect()
}
