//! Sprite extraction: slicing a match source image into fixed-size tiles.
//!
//! Source images pack their sub-images in a row-major grid of 100×100
//! tiles, 19 tiles per row. An entry's `num_images` declares how many
//! tiles the source actually contains.

use image::{imageops, RgbImage};

/// Side length of one sprite tile in pixels.
pub const TILE_SIZE: u32 = 100;
/// Tiles per row in a packed source image.
pub const TILES_PER_ROW: u32 = 19;

/// Slice up to `count` tiles out of a packed source image, in tile order.
/// Tiles that would fall outside the source bounds are discarded.
pub fn slice_sprites(source: &RgbImage, count: u32) -> Vec<RgbImage> {
    let mut sprites = Vec::with_capacity(count as usize);

    for i in 0..count {
        let x = (i % TILES_PER_ROW) * TILE_SIZE;
        let y = (i / TILES_PER_ROW) * TILE_SIZE;
        if x + TILE_SIZE > source.width() || y + TILE_SIZE > source.height() {
            continue;
        }
        sprites.push(imageops::crop_imm(source, x, y, TILE_SIZE, TILE_SIZE).to_image());
    }

    sprites
}
