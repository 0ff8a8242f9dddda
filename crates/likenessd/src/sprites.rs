//! Mosaic sprite loading.
//!
//! Runs off the capture loop, once per new-face event: each placed match
//! image is loaded from shared storage, sliced into 100×100 tiles, and
//! announced to the display per cell, with a terminal completion event.

use image::RgbImage;
use likeness_core::sprite::slice_sprites;
use likeness_core::{GridPosition, MatchEntry, MosaicLayout, RankedMatches};
use tokio::sync::mpsc;

/// Display-facing notifications for one mosaic refresh.
#[derive(Debug)]
pub enum MosaicEvent {
    /// One grid cell's sprite sequence is ready, replacing any prior
    /// set at that position.
    CellReady {
        position: GridPosition,
        sprites: Vec<RgbImage>,
    },
    /// Every placed entry has been processed.
    Complete,
}

/// Load sprites for every placed match, nearest cells first.
///
/// A match image that fails to load is skipped and its cell stays
/// empty; the refresh always runs to completion. A closed receiver
/// means the display is gone and remaining work is abandoned silently.
pub fn load_mosaic(
    layout: &MosaicLayout,
    matches: &RankedMatches,
    tx: &mpsc::UnboundedSender<MosaicEvent>,
) {
    let placements = layout.placements(matches);
    tracing::info!(
        cells = placements.len(),
        most = matches.most_similar.len(),
        least = matches.least_similar.len(),
        "loading mosaic"
    );

    for placement in placements {
        let sprites = match load_entry(&placement.entry) {
            Ok(sprites) => sprites,
            Err(err) => {
                tracing::error!(
                    path = %placement.entry.path,
                    error = %err,
                    "skipping unloadable match image"
                );
                continue;
            }
        };
        if sprites.is_empty() {
            tracing::warn!(path = %placement.entry.path, "match image yielded no tiles");
            continue;
        }
        if tx
            .send(MosaicEvent::CellReady {
                position: placement.position,
                sprites,
            })
            .is_err()
        {
            tracing::debug!("display gone, abandoning mosaic load");
            return;
        }
    }

    let _ = tx.send(MosaicEvent::Complete);
    tracing::info!("mosaic loading complete");
}

fn load_entry(entry: &MatchEntry) -> Result<Vec<RgbImage>, image::ImageError> {
    let source = image::open(&entry.path)?.to_rgb8();
    Ok(slice_sprites(&source, entry.num_images))
}

#[cfg(test)]
mod tests {
    use super::*;
    use likeness_core::sprite::{TILE_SIZE, TILES_PER_ROW};

    /// Write a packed source image holding `tiles` full tiles to disk.
    fn write_source(dir: &std::path::Path, name: &str, tiles: u32) -> String {
        let cols = tiles.min(TILES_PER_ROW);
        let rows = tiles.div_ceil(TILES_PER_ROW);
        let img = RgbImage::from_pixel(cols * TILE_SIZE, rows * TILE_SIZE, image::Rgb([9, 9, 9]));
        let path = dir.join(name);
        img.save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<MosaicEvent>) -> Vec<MosaicEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_load_emits_cells_then_complete() {
        let dir = tempfile::tempdir().unwrap();
        let matches = RankedMatches {
            most_similar: vec![MatchEntry {
                path: write_source(dir.path(), "most.png", 2),
                num_images: 2,
            }],
            least_similar: vec![MatchEntry {
                path: write_source(dir.path(), "least.png", 1),
                num_images: 1,
            }],
        };
        let layout = MosaicLayout::with_reserve(5, 5, 0);
        let (tx, rx) = mpsc::unbounded_channel();

        load_mosaic(&layout, &matches, &tx);
        drop(tx);

        let events = drain(rx);
        assert_eq!(events.len(), 3);

        let MosaicEvent::CellReady { position, sprites } = &events[0] else {
            panic!("expected cell event");
        };
        // Nearest eligible cell is left of center, fed from leastSimilar.
        assert_eq!(*position, GridPosition { row: 2, col: 1 });
        assert_eq!(sprites.len(), 1);

        let MosaicEvent::CellReady { position, sprites } = &events[1] else {
            panic!("expected cell event");
        };
        assert_eq!(*position, GridPosition { row: 2, col: 3 });
        assert_eq!(sprites.len(), 2);
        assert_eq!(sprites[0].dimensions(), (TILE_SIZE, TILE_SIZE));

        assert!(matches!(events[2], MosaicEvent::Complete));
    }

    /// A missing source image is skipped; the rest of the refresh loads.
    #[test]
    fn test_unloadable_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let matches = RankedMatches {
            most_similar: vec![
                MatchEntry {
                    path: dir.path().join("missing.png").to_string_lossy().into_owned(),
                    num_images: 4,
                },
                MatchEntry {
                    path: write_source(dir.path(), "ok.png", 1),
                    num_images: 1,
                },
            ],
            least_similar: vec![],
        };
        let layout = MosaicLayout::with_reserve(5, 5, 0);
        let (tx, rx) = mpsc::unbounded_channel();

        load_mosaic(&layout, &matches, &tx);
        drop(tx);

        let events = drain(rx);
        assert_eq!(events.len(), 2);
        let MosaicEvent::CellReady { position, .. } = &events[0] else {
            panic!("expected cell event");
        };
        // The second-nearest right cell; the nearest consumed the bad entry.
        assert_eq!(*position, GridPosition { row: 1, col: 3 });
        assert!(matches!(events[1], MosaicEvent::Complete));
    }

    /// A torn-down display ends the refresh without panicking.
    #[test]
    fn test_closed_receiver_abandons_load() {
        let dir = tempfile::tempdir().unwrap();
        let matches = RankedMatches {
            most_similar: vec![MatchEntry {
                path: write_source(dir.path(), "a.png", 1),
                num_images: 1,
            }],
            least_similar: vec![],
        };
        let layout = MosaicLayout::with_reserve(5, 5, 0);
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        load_mosaic(&layout, &matches, &tx);
    }

    #[test]
    fn test_empty_matches_only_complete() {
        let layout = MosaicLayout::with_reserve(5, 5, 0);
        let (tx, rx) = mpsc::unbounded_channel();

        load_mosaic(&layout, &RankedMatches::default(), &tx);
        drop(tx);

        let events = drain(rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], MosaicEvent::Complete));
    }
}
