use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::core::model::{PageGeometry, TextToken};
use crate::lines::LineConfig;

/// A printed line number and the averaged vertical center of its occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectedLineNumber {
    pub line_number: u32,
    pub y_center: f64,
}

/// ASCII digits only: margin numbering from LaTeX `lineno` and word processors is never
/// printed in other scripts, and `u32::from_str` would reject them anyway.
fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Scans a page's words for printed line numbers in the left margin, below the header band.
///
/// Repeated values are merged into one entry at their mean vertical center. The result is
/// ordered top to bottom, equal centers by ascending number. An empty result means the page
/// carries no usable printed numbers.
pub fn detect_line_numbers(
    tokens: &[TextToken],
    geometry: &PageGeometry,
    config: &LineConfig,
) -> Vec<DetectedLineNumber> {
    let margin_x = geometry.margin_cutoff_x(config.margin_fraction);
    let header_y = geometry.header_cutoff_y(config.header_margin_points());

    let mut by_number: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for token in tokens {
        if token.bbox.x1 > margin_x || token.bbox.y0 < header_y {
            continue;
        }
        let text = token.text.trim();
        if !is_numeric(text) {
            continue;
        }
        let Ok(line_number) = text.parse::<u32>() else {
            trace!(text, "skipping unparseable margin number");
            continue;
        };
        by_number
            .entry(line_number)
            .or_default()
            .push(token.bbox.vertical_center());
    }

    let mut detected: Vec<DetectedLineNumber> = by_number
        .into_iter()
        .map(|(line_number, centers)| DetectedLineNumber {
            line_number,
            y_center: centers.iter().sum::<f64>() / centers.len() as f64,
        })
        .collect();
    detected.sort_by(|a, b| {
        a.y_center
            .total_cmp(&b.y_center)
            .then(a.line_number.cmp(&b.line_number))
    });
    detected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use pretty_assertions::assert_eq;

    fn page() -> PageGeometry {
        PageGeometry::new(600.0, 800.0)
    }

    fn token(text: &str, x0: f64, y0: f64) -> TextToken {
        TextToken::new(text, BBox::new(x0, y0, x0 + 10.0, y0 + 10.0))
    }

    #[test]
    fn keeps_only_margin_digits_below_header() {
        let tokens = vec![
            token("1", 20.0, 100.0),
            token("2", 20.0, 120.0),
            // right edge past the 90pt margin cutoff
            token("3", 85.0, 140.0),
            // inside the 1.5cm header band
            token("4", 20.0, 10.0),
            token("5a", 20.0, 160.0),
            token("Intro", 20.0, 180.0),
            token("17", 300.0, 200.0),
        ];
        let detected = detect_line_numbers(&tokens, &page(), &LineConfig::default());
        assert_eq!(
            detected,
            vec![
                DetectedLineNumber {
                    line_number: 1,
                    y_center: 105.0
                },
                DetectedLineNumber {
                    line_number: 2,
                    y_center: 125.0
                },
            ]
        );
    }

    #[test]
    fn averages_repeated_numbers() {
        let tokens = vec![token("8", 20.0, 200.0), token("8", 40.0, 210.0)];
        let detected = detect_line_numbers(&tokens, &page(), &LineConfig::default());
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].line_number, 8);
        assert_eq!(detected[0].y_center, 210.0);
    }

    #[test]
    fn orders_by_vertical_position_not_value() {
        let tokens = vec![token("30", 20.0, 300.0), token("5", 20.0, 100.0)];
        let numbers: Vec<u32> = detect_line_numbers(&tokens, &page(), &LineConfig::default())
            .iter()
            .map(|d| d.line_number)
            .collect();
        assert_eq!(numbers, vec![5, 30]);
    }

    #[test]
    fn skips_numbers_that_overflow() {
        let tokens = vec![token("99999999999999", 20.0, 100.0), token("3", 20.0, 120.0)];
        let detected = detect_line_numbers(&tokens, &page(), &LineConfig::default());
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].line_number, 3);
    }

    #[test]
    fn rejects_non_ascii_digits() {
        let tokens = vec![token("²", 20.0, 100.0), token("٣", 20.0, 120.0)];
        assert!(detect_line_numbers(&tokens, &page(), &LineConfig::default()).is_empty());
    }

    #[test]
    fn keeps_tokens_touching_both_cutoffs() {
        let config = LineConfig::default();
        let margin_x = page().margin_cutoff_x(config.margin_fraction);
        let header_y = page().header_cutoff_y(config.header_margin_points());
        let tokens = vec![
            // right edge exactly on the margin cutoff
            TextToken::new("6", BBox::new(margin_x - 10.0, 300.0, margin_x, 310.0)),
            // top edge exactly on the header cutoff
            TextToken::new("7", BBox::new(20.0, header_y, 30.0, header_y + 10.0)),
            TextToken::new("8", BBox::new(margin_x - 9.99, 400.0, margin_x + 0.01, 410.0)),
            TextToken::new("9", BBox::new(20.0, header_y - 0.01, 30.0, header_y + 10.0)),
        ];
        let numbers: Vec<u32> = detect_line_numbers(&tokens, &page(), &config)
            .iter()
            .map(|d| d.line_number)
            .collect();
        assert_eq!(numbers, vec![7, 6]);
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(detect_line_numbers(&[], &page(), &LineConfig::default()).is_empty());
    }
}
