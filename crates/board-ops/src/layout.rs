//! Child arrangement for built groups.
//!
//! Every strategy returns child offsets relative to the group origin and
//! the group size that encloses them with `padding` on every side.

use board_core::{Point, Size};

use crate::schema::GroupLayout;

/// Offsets for each child, in input order, and the enclosing group size.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub offsets: Vec<Point>,
    pub size: Size,
}

/// Layout parameters shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub padding: f64,
    pub spacing: f64,
    pub grid_columns: usize,
}

/// Arranges `sizes` under `layout`. `manual` holds the caller-supplied
/// offsets (only read by [`GroupLayout::Manual`]); it may be shorter than
/// `sizes`. Returns `None` when there are no children.
pub fn arrange(
    layout: GroupLayout,
    sizes: &[Size],
    manual: &[(Option<f64>, Option<f64>)],
    spacing: Spacing,
) -> Option<Arrangement> {
    if sizes.is_empty() {
        return None;
    }
    Some(match layout {
        GroupLayout::Vertical => stack(sizes, spacing, true),
        GroupLayout::Horizontal => stack(sizes, spacing, false),
        GroupLayout::Grid => grid(sizes, spacing),
        GroupLayout::Manual => manual_cascade(sizes, manual, spacing),
    })
}

fn stack(sizes: &[Size], s: Spacing, vertical: bool) -> Arrangement {
    let mut offsets = Vec::with_capacity(sizes.len());
    let mut cursor = s.padding;
    let mut cross: f64 = 0.0;
    for size in sizes {
        if vertical {
            offsets.push(Point::new(s.padding, cursor));
            cursor += size.height + s.spacing;
            cross = cross.max(size.width);
        } else {
            offsets.push(Point::new(cursor, s.padding));
            cursor += size.width + s.spacing;
            cross = cross.max(size.height);
        }
    }
    // The cursor ran one spacing past the last child.
    let along = cursor - s.spacing + s.padding;
    let across = cross + 2.0 * s.padding;
    let size = if vertical {
        Size::new(across, along)
    } else {
        Size::new(along, across)
    };
    Arrangement { offsets, size }
}

/// Non-uniform grid: each column is as wide as its widest cell and each
/// row as tall as its tallest.
fn grid(sizes: &[Size], s: Spacing) -> Arrangement {
    let columns = s.grid_columns.max(1).min(sizes.len());
    let rows = sizes.len().div_ceil(columns);
    let mut widths = vec![0.0_f64; columns];
    let mut heights = vec![0.0_f64; rows];
    for (i, size) in sizes.iter().enumerate() {
        let (row, col) = (i / columns, i % columns);
        widths[col] = widths[col].max(size.width);
        heights[row] = heights[row].max(size.height);
    }

    let offsets = (0..sizes.len())
        .map(|i| {
            let (row, col) = (i / columns, i % columns);
            let x = s.padding + widths[..col].iter().sum::<f64>() + s.spacing * col as f64;
            let y = s.padding + heights[..row].iter().sum::<f64>() + s.spacing * row as f64;
            Point::new(x, y)
        })
        .collect();

    let width = widths.iter().sum::<f64>() + s.spacing * (columns - 1) as f64 + 2.0 * s.padding;
    let height = heights.iter().sum::<f64>() + s.spacing * (rows - 1) as f64 + 2.0 * s.padding;
    Arrangement {
        offsets,
        size: Size::new(width, height),
    }
}

/// Caller-supplied offsets; a missing coordinate falls back to a diagonal
/// cascade `padding + i * 50`.
fn manual_cascade(sizes: &[Size], manual: &[(Option<f64>, Option<f64>)], s: Spacing) -> Arrangement {
    let mut offsets = Vec::with_capacity(sizes.len());
    let (mut right, mut bottom) = (0.0_f64, 0.0_f64);
    for (i, size) in sizes.iter().enumerate() {
        let cascade = s.padding + i as f64 * 50.0;
        let (x, y) = manual.get(i).copied().unwrap_or((None, None));
        let offset = Point::new(x.unwrap_or(cascade), y.unwrap_or(cascade));
        right = right.max(offset.x + size.width);
        bottom = bottom.max(offset.y + size.height);
        offsets.push(offset);
    }
    Arrangement {
        offsets,
        size: Size::new(right + s.padding, bottom + s.padding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAPS: Spacing = Spacing {
        padding: 20.0,
        spacing: 10.0,
        grid_columns: 2,
    };

    #[test]
    fn vertical_stacks_down() {
        let sizes = [Size::new(100.0, 50.0), Size::new(200.0, 30.0)];
        let out = arrange(GroupLayout::Vertical, &sizes, &[], GAPS).unwrap();
        assert_eq!(out.offsets, vec![Point::new(20.0, 20.0), Point::new(20.0, 80.0)]);
        assert_eq!(out.size, Size::new(240.0, 130.0));
    }

    #[test]
    fn horizontal_stacks_right() {
        let sizes = [Size::new(100.0, 50.0), Size::new(200.0, 30.0)];
        let out = arrange(GroupLayout::Horizontal, &sizes, &[], GAPS).unwrap();
        assert_eq!(out.offsets, vec![Point::new(20.0, 20.0), Point::new(130.0, 20.0)]);
        assert_eq!(out.size, Size::new(350.0, 90.0));
    }

    #[test]
    fn grid_columns_and_rows_adapt_to_content() {
        let sizes = [
            Size::new(100.0, 50.0),
            Size::new(300.0, 40.0),
            Size::new(150.0, 80.0),
        ];
        let out = arrange(GroupLayout::Grid, &sizes, &[], GAPS).unwrap();
        // column widths [150, 300], row heights [50, 80]
        assert_eq!(
            out.offsets,
            vec![
                Point::new(20.0, 20.0),
                Point::new(180.0, 20.0),
                Point::new(20.0, 80.0),
            ]
        );
        assert_eq!(out.size, Size::new(500.0, 180.0));

        let again = arrange(GroupLayout::Grid, &sizes, &[], GAPS).unwrap();
        assert_eq!(out, again);
    }

    #[test]
    fn grid_with_fewer_children_than_columns() {
        let sizes = [Size::new(100.0, 50.0)];
        let wide = Spacing {
            grid_columns: 4,
            ..GAPS
        };
        let out = arrange(GroupLayout::Grid, &sizes, &[], wide).unwrap();
        assert_eq!(out.size, Size::new(140.0, 90.0));
    }

    #[test]
    fn manual_uses_given_offsets_then_cascades() {
        let sizes = [Size::new(100.0, 50.0), Size::new(100.0, 50.0)];
        let manual = [(Some(300.0), Some(0.0)), (None, None)];
        let out = arrange(GroupLayout::Manual, &sizes, &manual, GAPS).unwrap();
        assert_eq!(out.offsets, vec![Point::new(300.0, 0.0), Point::new(70.0, 70.0)]);
        assert_eq!(out.size, Size::new(420.0, 140.0));
    }

    #[test]
    fn no_children_no_arrangement() {
        assert!(arrange(GroupLayout::Grid, &[], &[], GAPS).is_none());
    }
}
