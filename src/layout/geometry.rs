//! Page, section and column geometry.
//!
//! Sections sit on a grid of `page.columns` equal columns separated by
//! `page.columnGap`. A section spanning `w` grid columns is `w` columns plus
//! `w - 1` gaps wide. Inside, positive border margins inset the content box,
//! which is then split into `section.columns` dish columns separated by
//! `section.columnMargin`.

use crate::model::{Edges, Page, Section};

/// Resolved geometry of one page, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub content_x: f64,
    pub content_y: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub grid_columns: usize,
    pub grid_column_width: f64,
    pub column_gap: f64,
}

impl PageGeometry {
    /// Resolve geometry for `page`. `canvas_size` is the page block's size
    /// when the canvas has one; it wins over the configured page size.
    pub fn resolve(page: &Page, canvas_size: Option<(f64, f64)>) -> Self {
        let (width, height) = canvas_size
            .filter(|(w, h)| *w > 0.0 && *h > 0.0)
            .unwrap_or_else(|| page.size.dimensions());
        let grid_columns = page.columns.max(1) as usize;
        let content_width = (width - page.margins.horizontal()).max(0.0);
        let content_height = (height - page.margins.vertical()).max(0.0);
        let total_gap = page.column_gap * (grid_columns - 1) as f64;
        let grid_column_width = ((content_width - total_gap) / grid_columns as f64).max(0.0);

        PageGeometry {
            width,
            height,
            content_x: page.margins.left,
            content_y: page.margins.top,
            content_width,
            content_height,
            grid_columns,
            grid_column_width,
            column_gap: page.column_gap,
        }
    }

    pub fn content_bottom(&self) -> f64 {
        self.content_y + self.content_height
    }

    /// Grid columns a section covers, clamped to the page grid.
    pub fn grid_span(&self, section: &Section) -> std::ops::Range<usize> {
        let range = section.placement.column_range();
        let start = range.start.min(self.grid_columns - 1);
        let end = range.end.clamp(start + 1, self.grid_columns);
        start..end
    }

    /// Horizontal frame of a section and its dish columns.
    pub fn section_frame(&self, section: &Section) -> SectionFrame {
        let span = self.grid_span(section);
        let cells = span.len() as f64;
        let x = self.content_x + span.start as f64 * (self.grid_column_width + self.column_gap);
        let width = cells * self.grid_column_width + (cells - 1.0) * self.column_gap;

        let inset = section
            .border
            .as_ref()
            .map(|b| b.margins.positive())
            .unwrap_or_default();
        let inner_x = x + inset.left;
        let inner_width = (width - inset.horizontal()).max(0.0);

        let count = section.column_count() as usize;
        let total_margin = section.column_margin * (count - 1) as f64;
        let column_width = ((inner_width - total_margin) / count as f64).max(0.0);
        let columns = (0..count)
            .map(|i| ColumnFrame {
                index: i as u32,
                x: inner_x + i as f64 * (column_width + section.column_margin),
                width: column_width,
            })
            .collect();

        SectionFrame {
            x,
            width,
            grid_span: span,
            inset,
            columns,
        }
    }
}

/// Horizontal placement of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionFrame {
    pub x: f64,
    pub width: f64,
    pub grid_span: std::ops::Range<usize>,
    /// Positive border margins reserved around the content.
    pub inset: Edges,
    pub columns: Vec<ColumnFrame>,
}

/// One dish column inside a section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnFrame {
    pub index: u32,
    pub x: f64,
    pub width: f64,
}
