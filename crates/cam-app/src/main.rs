use std::io::{self, BufWriter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use cam_app::cli::Cli;
use cam_app::render_loop::RenderLoop;
use cam_source::decode::JpegDecoder;
use cam_source::ffmpeg::FfmpegDevice;
use cam_source::session::DeviceSession;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse_env();

    // 2. Initialiser le logging (stderr, comme les diagnostics de timeout)
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config et valider les facteurs de compression,
    //    avant toute ouverture du périphérique
    let config = cli.resolve_config()?;
    log::info!(
        "Blocs de {}x{} px, attente max {:?}",
        config.block.width(),
        config.block.height(),
        config.wait
    );

    // 4. Arrêt propre sur Ctrl+C
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("Installation du handler Ctrl+C")?;
    }

    // 5. Ouvrir et démarrer le périphérique ; fermé au drop de la session
    let device = FfmpegDevice::open(&config)
        .with_context(|| format!("Ouverture de {}", config.device.display()))?;
    let session = DeviceSession::start(device).context("Démarrage de la capture")?;

    // 6. Boucle de rendu
    let stdout = BufWriter::new(io::stdout().lock());
    let mut render = RenderLoop::new(session, JpegDecoder, &config, stdout, io::stderr());
    render.run(&stop)
}
