//! Line-number resolution: printed margin numbers first, reconstructed body lines otherwise.

pub mod body;
pub mod margin;
pub mod resolve;

use anyhow::{ensure, Result};
use tracing::debug;

use crate::core::geometry::cm_to_points;
use crate::core::model::PageContent;

pub use body::{index_body_lines, BodyLine};
pub use margin::{detect_line_numbers, DetectedLineNumber};

pub const DEFAULT_HEADER_MARGIN_CM: f64 = 1.5;
pub const DEFAULT_MARGIN_FRACTION: f64 = 0.15;

/// Detection thresholds, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineConfig {
    /// Distance from the top of the page treated as running header.
    pub header_margin_cm: f64,
    /// Share of the page width, from the left edge, searched for printed numbers.
    pub margin_fraction: f64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            header_margin_cm: DEFAULT_HEADER_MARGIN_CM,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
        }
    }
}

impl LineConfig {
    pub fn new(header_margin_cm: f64, margin_fraction: f64) -> Self {
        Self {
            header_margin_cm,
            margin_fraction,
        }
    }

    pub fn header_margin_points(&self) -> f64 {
        cm_to_points(self.header_margin_cm)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.header_margin_cm.is_finite() && self.header_margin_cm >= 0.0,
            "header margin must be a non-negative number of centimetres, got {}",
            self.header_margin_cm
        );
        ensure!(
            self.margin_fraction.is_finite()
                && self.margin_fraction > 0.0
                && self.margin_fraction <= 1.0,
            "margin fraction must be in (0, 1], got {}",
            self.margin_fraction
        );
        Ok(())
    }
}

/// Where a page's line identifiers come from.
#[derive(Debug, Clone, PartialEq)]
pub enum LineSource {
    Margin(Vec<DetectedLineNumber>),
    Body(Vec<BodyLine>),
}

impl LineSource {
    /// Body lines are only reconstructed when the margin yields nothing.
    pub fn for_page(page: &PageContent, config: &LineConfig) -> Self {
        let numbers = detect_line_numbers(&page.words, &page.geometry, config);
        if !numbers.is_empty() {
            debug!(
                page = page.page_number(),
                count = numbers.len(),
                "using printed margin line numbers"
            );
            return LineSource::Margin(numbers);
        }

        let lines = index_body_lines(&page.blocks, &page.geometry, config);
        debug!(
            page = page.page_number(),
            count = lines.len(),
            "no margin numbers, falling back to body lines"
        );
        LineSource::Body(lines)
    }

    /// Line identifier for a vertical position on the page.
    pub fn resolve(&self, y_center: f64) -> Option<usize> {
        match self {
            LineSource::Margin(numbers) => {
                resolve::resolve_from_margin(y_center, numbers).map(|n| n as usize)
            }
            LineSource::Body(lines) => resolve::resolve_from_body(y_center, lines),
        }
    }

    pub fn is_margin(&self) -> bool {
        matches!(self, LineSource::Margin(_))
    }
}
