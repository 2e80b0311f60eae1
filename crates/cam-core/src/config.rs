use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::CoreError;

/// Facteur de compression horizontal par défaut (pixels par bloc).
pub const DEFAULT_COMPRESSION_X: u32 = 20;
/// Facteur de compression vertical par défaut (pixels par bloc).
pub const DEFAULT_COMPRESSION_Y: u32 = 30;
/// Attente maximale d'une frame avant de signaler un timeout.
pub const DEFAULT_WAIT_SECS: u64 = 5;

/// Taille d'un bloc en pixels. Les deux côtés sont ≥ 1.
///
/// Fixée au démarrage et jamais modifiée ensuite.
///
/// # Example
/// ```
/// use cam_core::config::BlockSize;
/// let block = BlockSize::new(20, 30).unwrap();
/// assert_eq!((block.width(), block.height()), (20, 30));
/// assert!(BlockSize::new(0, 30).is_err());
/// assert!(BlockSize::new(20, -1).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockSize {
    width: u32,
    height: u32,
}

impl BlockSize {
    /// Validate a pair of compression factors.
    ///
    /// Accepts any integer type so that raw CLI values (which may be
    /// negative) go through the same check as config values.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if either factor is not a positive
    /// integer that fits in `u32`.
    pub fn new(width: impl Into<i64>, height: impl Into<i64>) -> Result<Self, CoreError> {
        Ok(Self {
            width: positive("compression_x", width.into())?,
            height: positive("compression_y", height.into())?,
        })
    }

    /// Block width in pixels.
    #[inline]
    #[must_use]
    pub fn width(self) -> u32 {
        self.width
    }

    /// Block height in pixels.
    #[inline]
    #[must_use]
    pub fn height(self) -> u32 {
        self.height
    }

    /// Pixels per block.
    #[inline]
    #[must_use]
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_COMPRESSION_X,
            height: DEFAULT_COMPRESSION_Y,
        }
    }
}

fn positive(name: &str, value: i64) -> Result<u32, CoreError> {
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(CoreError::Config(format!(
            "{name} doit être un entier strictement positif (reçu {value})"
        ))),
    }
}

/// Configuration de capture et de rendu, immuable une fois la boucle lancée.
///
/// # Example
/// ```
/// use cam_core::config::CaptureConfig;
/// let config = CaptureConfig::default();
/// assert_eq!(config.block.width(), 20);
/// assert_eq!(config.block.height(), 30);
/// assert_eq!(config.wait.as_secs(), 5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    /// Chemin du périphérique de capture.
    pub device: PathBuf,
    /// Demuxer ffmpeg utilisé pour ouvrir le périphérique ("v4l2", "avfoundation", "dshow").
    pub input_format: String,
    /// Exécutable ffmpeg (nom cherché dans le PATH ou chemin).
    pub ffmpeg: PathBuf,
    /// Attente maximale par frame.
    pub wait: Duration,
    /// Facteurs de compression (taille d'un bloc).
    pub block: BlockSize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/video0"),
            input_format: "v4l2".to_string(),
            ffmpeg: PathBuf::from("ffmpeg"),
            wait: Duration::from_secs(DEFAULT_WAIT_SECS),
            block: BlockSize::default(),
        }
    }
}

/// Overrides applied on top of a config, typically from the command line.
///
/// Every field is optional; `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub device: Option<PathBuf>,
    pub input_format: Option<String>,
    pub ffmpeg: Option<PathBuf>,
    pub wait_secs: Option<u64>,
    pub compression_x: Option<i64>,
    pub compression_y: Option<i64>,
}

impl CaptureConfig {
    /// Apply overrides, re-validating the block size.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for a non-positive compression factor
    /// or a zero wait.
    ///
    /// # Example
    /// ```
    /// use cam_core::config::{CaptureConfig, ConfigOverrides};
    /// let config = CaptureConfig::default()
    ///     .with_overrides(ConfigOverrides { compression_x: Some(8), ..Default::default() })
    ///     .unwrap();
    /// assert_eq!(config.block.width(), 8);
    /// assert_eq!(config.block.height(), 30);
    /// ```
    pub fn with_overrides(mut self, o: ConfigOverrides) -> Result<Self, CoreError> {
        if let Some(v) = o.device {
            self.device = v;
        }
        if let Some(v) = o.input_format {
            self.input_format = v;
        }
        if let Some(v) = o.ffmpeg {
            self.ffmpeg = v;
        }
        if let Some(v) = o.wait_secs {
            if v == 0 {
                return Err(CoreError::Config(
                    "wait_secs doit être strictement positif".to_string(),
                ));
            }
            self.wait = Duration::from_secs(v);
        }
        if o.compression_x.is_some() || o.compression_y.is_some() {
            self.block = BlockSize::new(
                o.compression_x.unwrap_or_else(|| i64::from(self.block.width())),
                o.compression_y.unwrap_or_else(|| i64::from(self.block.height())),
            )?;
        }
        Ok(self)
    }
}

/// Fichier TOML, toutes les clés optionnelles.
#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    capture: CaptureSection,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CaptureSection {
    device: Option<PathBuf>,
    input_format: Option<String>,
    ffmpeg: Option<PathBuf>,
    wait_secs: Option<u64>,
    compression_x: Option<i64>,
    compression_y: Option<i64>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if a value is
/// out of range (zero or negative compression factor, zero wait).
///
/// # Example
/// ```no_run
/// use cam_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("camscii.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<CaptureConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide dans {}", path.display()))
}

/// Same as [`load_config`] on an in-memory TOML document.
///
/// # Errors
/// Returns an error if the document cannot be parsed or a value is out of range.
///
/// # Example
/// ```
/// use cam_core::config::parse_config;
/// let config = parse_config("[capture]\ncompression_x = 10\n").unwrap();
/// assert_eq!(config.block.width(), 10);
/// ```
pub fn parse_config(content: &str) -> Result<CaptureConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let c = file.capture;
    let config = CaptureConfig::default().with_overrides(ConfigOverrides {
        device: c.device,
        input_format: c.input_format,
        ffmpeg: c.ffmpeg,
        wait_secs: c.wait_secs,
        compression_x: c.compression_x,
        compression_y: c.compression_y,
    })?;
    log::debug!("Config chargée : {config:?}");
    Ok(config)
}
