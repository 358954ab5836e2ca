//! Signature placement geometry.
//!
//! Fits an image into the pixel box of a cell span (contain, centered), then
//! expresses the top-left corner as a cell anchor plus an EMU offset inside
//! that cell, which is how a `oneCellAnchor` positions a picture.

use crate::cell_ref::{CellAddr, Span};
use crate::parser::f64_to_i64_rounded;
use crate::types::{Grid, PlacementTarget};

use super::RenderOptions;

/// Where and how large one signature picture is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Cell holding the picture's top-left corner
    pub anchor: CellAddr,
    pub col_offset_emu: i64,
    pub row_offset_emu: i64,
    pub width_emu: i64,
    pub height_emu: i64,
    pub width_px: f64,
    pub height_px: f64,
}

/// Pixel sizes of the columns and rows a span covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub col_px: Vec<f64>,
    pub row_px: Vec<f64>,
}

impl Container {
    pub fn measure(grid: &Grid, anchor: CellAddr, span: Span, options: &RenderOptions) -> Self {
        let col_px = (anchor.col..anchor.col + span.cols)
            .map(|c| grid.column_width_units(c) * options.px_per_width_unit)
            .collect();
        let row_px = (anchor.row..anchor.row + span.rows)
            .map(|r| grid.row_height_points(r) * options.px_per_point)
            .collect();
        Self { col_px, row_px }
    }

    pub fn width(&self) -> f64 {
        self.col_px.iter().sum()
    }

    pub fn height(&self) -> f64 {
        self.row_px.iter().sum()
    }
}

/// Scale `aspect` (width / height) to fit inside `max_w` x `max_h`.
///
/// Degenerate inputs fall back to a 1x1 px box.
pub fn fit_contain(aspect: f64, max_w: f64, max_h: f64) -> (f64, f64) {
    let (w, h) = if max_w / aspect <= max_h {
        (max_w, max_w / aspect)
    } else {
        (max_h * aspect, max_h)
    };
    if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 {
        (w, h)
    } else {
        (1.0, 1.0)
    }
}

/// Consume whole cells from `pad` while it covers them; returns the skip count
/// and the leftover offset. Never skips past the last cell.
pub fn split_padding(pad: f64, sizes: &[f64]) -> (u32, f64) {
    let mut remaining = pad.max(0.0);
    let mut skipped = 0;
    for size in sizes.iter().take(sizes.len().saturating_sub(1)) {
        if remaining < *size {
            break;
        }
        remaining -= size;
        skipped += 1;
    }
    (skipped, remaining)
}

/// Lay out an image of `aspect` centered in `target`'s span.
pub fn place(grid: &Grid, target: PlacementTarget, aspect: f64, options: &RenderOptions) -> Placement {
    let container = Container::measure(grid, target.cell, target.span, options);
    let (container_w, container_h) = (container.width(), container.height());

    let (width_px, height_px) = fit_contain(
        aspect,
        container_w * options.fill_ratio,
        container_h * options.fill_ratio,
    );

    let pad_w = ((container_w - width_px) / 2.0).max(0.0);
    let pad_h = ((container_h - height_px) / 2.0).max(0.0);
    let (cols_skip, x_px) = split_padding(pad_w, &container.col_px);
    let (rows_skip, y_px) = split_padding(pad_h, &container.row_px);

    let emu = options.emu_per_px;
    let placement = Placement {
        anchor: target.cell.offset(rows_skip, cols_skip),
        col_offset_emu: f64_to_i64_rounded(x_px * emu),
        row_offset_emu: f64_to_i64_rounded(y_px * emu),
        width_emu: f64_to_i64_rounded(width_px * emu).max(1),
        height_emu: f64_to_i64_rounded(height_px * emu).max(1),
        width_px,
        height_px,
    };
    log::debug!(
        "placement at {}: container {container_w:.1}x{container_h:.1}px, image {width_px:.1}x{height_px:.1}px, anchor {} (+{}, +{}) emu",
        target.cell,
        placement.anchor,
        placement.col_offset_emu,
        placement.row_offset_emu
    );
    placement
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn addr(s: &str) -> CellAddr {
        s.parse().unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn test_square_image_in_default_cell() {
        let grid = Grid::new("S").with_dimension(10, 10);
        let options = RenderOptions::default();
        let target = PlacementTarget {
            cell: addr("B2"),
            span: Span::SINGLE,
        };
        let container = Container::measure(&grid, target.cell, target.span, &options);
        assert!(approx(container.width(), 63.225));
        assert!(approx(container.height(), 19.95));

        let p = place(&grid, target, 400.0 / 400.0, &options);
        // height-limited
        assert!(approx(p.height_px, 16.96));
        assert!((p.width_px / p.height_px - 1.0).abs() < 1e-9);
        assert_eq!(p.anchor, addr("B2"));

        let pad_w = p.col_offset_emu as f64 / 9525.0;
        let pad_h = p.row_offset_emu as f64 / 9525.0;
        assert!(approx(pad_w, 23.13));
        assert!(approx(pad_h, 1.50));
    }

    #[test]
    fn test_wide_image_in_merged_block_skips_rows() {
        // A39:L40, two rows of 15pt and twelve columns of 8.43
        let mut grid = Grid::new("S").with_dimension(40, 12);
        grid.add_merge(addr("A39"), Span::new(2, 12));
        let options = RenderOptions::default();
        let p = place(
            &grid,
            PlacementTarget {
                cell: addr("A39"),
                span: Span::new(2, 12),
            },
            3.0,
            &options,
        );
        // container 758.7 x 39.9; height-limited at 33.9px
        assert!(approx(p.height_px, 33.915));
        assert!(approx(p.width_px, 101.745));
        // pad_w ~328.5px skips five 63.2px columns
        assert_eq!(p.anchor, addr("F39"));
        assert!(p.col_offset_emu > 0);
        assert!(p.col_offset_emu < f64_to_i64_rounded(63.225 * 9525.0));
    }

    #[test]
    fn test_split_padding_stays_inside_span() {
        assert_eq!(split_padding(10.0, &[4.0, 4.0, 4.0]), (2, 2.0));
        assert_eq!(split_padding(100.0, &[4.0, 4.0]), (1, 96.0));
        assert_eq!(split_padding(-3.0, &[4.0]), (0, 0.0));
    }

    #[test]
    fn test_degenerate_inputs_fall_back_to_one_pixel() {
        assert_eq!(fit_contain(0.0, 50.0, 20.0), (1.0, 1.0));
        assert_eq!(fit_contain(f64::NAN, 50.0, 20.0), (1.0, 1.0));

        let mut grid = Grid::new("S").with_dimension(3, 3);
        grid.set_column_width(1, 0.0);
        let p = place(
            &grid,
            PlacementTarget {
                cell: addr("A1"),
                span: Span::SINGLE,
            },
            2.0,
            &RenderOptions::default(),
        );
        assert_eq!((p.width_px, p.height_px), (1.0, 1.0));
        assert!(p.col_offset_emu >= 0 && p.row_offset_emu >= 0);
        assert_eq!(p.width_emu, 9525);
    }
}
