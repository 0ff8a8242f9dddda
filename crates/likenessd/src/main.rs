use anyhow::Result;
use likeness_client::MatcherClient;
use likeness_core::{MosaicLayout, ScrfdDetector};
use likeness_hw::Camera;
use tracing_subscriber::EnvFilter;

mod config;
mod pipeline;
mod sprites;

use config::Config;
use pipeline::{PipelineConfig, StabilizedFrame};
use sprites::MosaicEvent;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("likenessd starting");

    let config = Config::from_env();

    let camera = Camera::open(&config.camera_device)?;
    let detector = ScrfdDetector::load(&config.scrfd_model_path())?;
    let client = MatcherClient::from_env()?;
    let layout = MosaicLayout::new(config.grid_rows, config.grid_cols);

    let (mut handle, streams) = pipeline::spawn_pipeline(
        camera,
        detector,
        client,
        layout,
        PipelineConfig {
            square_size: config.square_size,
            tick_interval: config.tick_interval,
        },
        tokio::runtime::Handle::current(),
    )?;

    tracing::info!(
        rows = config.grid_rows,
        cols = config.grid_cols,
        square = config.square_size,
        "likenessd ready"
    );

    // The display surface subscribes to these streams; until one is
    // attached, events are drained here so the channels never back up.
    let drain = tokio::spawn(drain_display_streams(streams));

    tokio::signal::ctrl_c().await?;
    tracing::info!("likenessd shutting down");

    handle.stop();
    drain.abort();

    Ok(())
}

async fn drain_display_streams(mut streams: pipeline::DisplayStreams) {
    loop {
        tokio::select! {
            frame = streams.frames.recv() => match frame {
                Some(StabilizedFrame { size, .. }) => {
                    tracing::trace!(size, "stabilized frame ready");
                }
                None => break,
            },
            event = streams.mosaic.recv() => match event {
                Some(MosaicEvent::CellReady { position, sprites }) => {
                    tracing::debug!(
                        row = position.row,
                        col = position.col,
                        sprites = sprites.len(),
                        "mosaic cell ready"
                    );
                }
                Some(MosaicEvent::Complete) => tracing::info!("mosaic refresh complete"),
                None => break,
            },
        }
    }
}
