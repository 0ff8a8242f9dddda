use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, in frame-pixel coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl BoundingBox {
    /// Center of the box, used as the motion-filter measurement.
    pub fn centroid(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One ranked match returned by the similarity service: a source image
/// on shared storage plus the number of 100×100 tiles it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub path: String,
    #[serde(rename = "numImages")]
    pub num_images: u32,
}

/// Both ranked lists from one similarity request, each ordered best-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMatches {
    pub most_similar: Vec<MatchEntry>,
    pub least_similar: Vec<MatchEntry>,
}

/// A cell in the thumbnail grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

impl GridPosition {
    /// Row-major index of this cell in a grid `cols` wide.
    pub fn index(&self, cols: usize) -> usize {
        self.row * cols + self.col
    }
}
