use crate::config::Position;

/// Rectangular screen area assigned to one widget for a render tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Map declared grid positions to screen regions, in input order.
///
/// The grid is implicit: as many rows/columns as the highest row/col
/// index used, clamped so no dimension exceeds the terminal. The
/// terminal is divided evenly with the remainder going to the last
/// row/column. Positions at or past the clamped edge land in the last
/// valid cell. Widgets sharing a cell all receive the same region;
/// the caller draws them in input order so the later one ends up on top.
pub fn resolve_layout(positions: &[Position], width: u16, height: u16) -> Vec<Region> {
    if positions.is_empty() {
        return Vec::new();
    }
    let max_row = positions.iter().map(|p| p.row).max().unwrap_or(0);
    let max_col = positions.iter().map(|p| p.col).max().unwrap_or(0);
    let rows = (max_row + 1).min(height.max(1) as usize);
    let cols = (max_col + 1).min(width.max(1) as usize);

    let row_bounds = split_axis(height, rows);
    let col_bounds = split_axis(width, cols);

    positions
        .iter()
        .map(|p| {
            let (y, h) = row_bounds[p.row.min(rows - 1)];
            let (x, w) = col_bounds[p.col.min(cols - 1)];
            Region {
                x,
                y,
                width: w,
                height: h,
            }
        })
        .collect()
}

/// Split `total` cells into `parts` contiguous (offset, size) spans,
/// remainder on the last span. `parts` is at least 1.
fn split_axis(total: u16, parts: usize) -> Vec<(u16, u16)> {
    let base = total / parts as u16;
    let mut spans = Vec::with_capacity(parts);
    let mut offset = 0u16;
    for i in 0..parts {
        let size = if i == parts - 1 { total - offset } else { base };
        spans.push((offset, size));
        offset += size;
    }
    spans
}
