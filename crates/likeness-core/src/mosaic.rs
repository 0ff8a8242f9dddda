//! Similarity-ranked mosaic placement.
//!
//! Ranked matches are assigned to grid cells by proximity to the grid
//! center: nearest eligible cells first, most-similar entries on the
//! right half, least-similar on the left. The center column and a
//! rectangular block around the center cell are reserved for the live
//! video display and never receive a sprite.

use crate::types::{GridPosition, MatchEntry, RankedMatches};

/// Columns reserved on each side of the center column for the live
/// video block (the installation's video spans the grid center).
const DEFAULT_RESERVE_HALF_COLS: usize = 4;
/// Rows reserved above and below the center row.
const RESERVE_HALF_ROWS: usize = 1;

/// One assigned grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub position: GridPosition,
    pub entry: MatchEntry,
}

/// Fixed grid geometry with a central exclusion zone.
#[derive(Debug, Clone, Copy)]
pub struct MosaicLayout {
    rows: usize,
    cols: usize,
    reserve_half_cols: usize,
}

impl MosaicLayout {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_reserve(rows, cols, DEFAULT_RESERVE_HALF_COLS)
    }

    /// Layout with an explicit horizontal reserve half-width, for grids
    /// too narrow for the default video block.
    pub fn with_reserve(rows: usize, cols: usize, reserve_half_cols: usize) -> Self {
        Self {
            rows,
            cols,
            reserve_half_cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total cell count, sent to the matcher as `numVids`.
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn center(&self) -> GridPosition {
        GridPosition {
            row: self.rows / 2,
            col: self.cols / 2,
        }
    }

    /// Cells reserved for the live video: the entire center column plus
    /// the block spanning the center row ±1 and the center column
    /// ±`reserve_half_cols`.
    pub fn is_excluded(&self, pos: GridPosition) -> bool {
        let center = self.center();
        if pos.col == center.col {
            return true;
        }
        let row_near = pos.row.abs_diff(center.row) <= RESERVE_HALF_ROWS;
        let col_near = pos.col.abs_diff(center.col) <= self.reserve_half_cols;
        row_near && col_near
    }

    /// Eligible cells ordered nearest-to-center first (squared Euclidean
    /// distance; ties broken by row-major enumeration order).
    pub fn cells_by_proximity(&self) -> Vec<GridPosition> {
        let center = self.center();
        let mut cells: Vec<GridPosition> = (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| GridPosition { row, col }))
            .filter(|&pos| !self.is_excluded(pos))
            .collect();
        // Stable sort keeps row-major order within equal distances.
        cells.sort_by_key(|pos| {
            let dr = pos.row.abs_diff(center.row) as u64;
            let dc = pos.col.abs_diff(center.col) as u64;
            dr * dr + dc * dc
        });
        cells
    }

    /// Deterministically assign ranked matches to cells: walking cells
    /// nearest-first, a cell left of center consumes the next
    /// least-similar entry and a cell right of center the next
    /// most-similar entry. An exhausted list leaves its remaining cells
    /// unassigned.
    pub fn placements(&self, matches: &RankedMatches) -> Vec<Placement> {
        let center_col = self.center().col;
        let mut most = matches.most_similar.iter();
        let mut least = matches.least_similar.iter();
        let mut placements = Vec::new();

        for position in self.cells_by_proximity() {
            let next = if position.col < center_col {
                least.next()
            } else {
                most.next()
            };
            if let Some(entry) = next {
                placements.push(Placement {
                    position,
                    entry: entry.clone(),
                });
            }
        }

        placements
    }
}
