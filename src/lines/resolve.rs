use crate::lines::{BodyLine, DetectedLineNumber};

/// Printed number whose center is nearest to `y_center`. Equal distances go to the lower
/// number so the answer does not depend on detection order.
pub fn resolve_from_margin(y_center: f64, numbers: &[DetectedLineNumber]) -> Option<u32> {
    numbers
        .iter()
        .min_by(|a, b| {
            (a.y_center - y_center)
                .abs()
                .total_cmp(&(b.y_center - y_center).abs())
                .then(a.line_number.cmp(&b.line_number))
        })
        .map(|d| d.line_number)
}

/// Rank of the body line containing `y_center`, or failing that the line with the nearest
/// top or bottom edge. The first line in page order wins either way.
pub fn resolve_from_body(y_center: f64, lines: &[BodyLine]) -> Option<usize> {
    if let Some(line) = lines.iter().find(|line| line.rect.spans_y(y_center)) {
        return Some(line.index);
    }

    let mut best: Option<(f64, usize)> = None;
    for line in lines {
        let dist = line.rect.edge_distance_y(y_center);
        match best {
            Some((best_dist, _)) if dist >= best_dist => {}
            _ => best = Some((dist, line.index)),
        }
    }
    best.map(|(_, index)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use pretty_assertions::assert_eq;

    fn number(line_number: u32, y_center: f64) -> DetectedLineNumber {
        DetectedLineNumber {
            line_number,
            y_center,
        }
    }

    fn body(index: usize, y0: f64, y1: f64) -> BodyLine {
        BodyLine {
            index,
            rect: BBox::new(50.0, y0, 500.0, y1),
            text: format!("line {index}"),
        }
    }

    #[test]
    fn picks_nearest_printed_number() {
        let numbers = vec![number(41, 88.0), number(42, 100.0), number(43, 112.0)];
        assert_eq!(resolve_from_margin(101.0, &numbers), Some(42));
        assert_eq!(resolve_from_margin(500.0, &numbers), Some(43));
        assert_eq!(resolve_from_margin(0.0, &numbers), Some(41));
    }

    #[test]
    fn breaks_margin_ties_by_lowest_number() {
        let numbers = vec![number(9, 90.0), number(4, 110.0)];
        assert_eq!(resolve_from_margin(100.0, &numbers), Some(4));
    }

    #[test]
    fn margin_without_numbers_is_unresolved() {
        assert_eq!(resolve_from_margin(100.0, &[]), None);
    }

    #[test]
    fn containment_beats_nearest_edge() {
        // A tall first line contains the center, while line 2's top edge is closer to it.
        let lines = vec![body(1, 100.0, 140.0), body(2, 139.5, 150.0)];
        assert_eq!(resolve_from_body(139.0, &lines), Some(1));
    }

    #[test]
    fn falls_back_to_nearest_edge() {
        let lines = vec![body(1, 100.0, 110.0), body(2, 120.0, 130.0), body(3, 140.0, 150.0)];
        assert_eq!(resolve_from_body(117.0, &lines), Some(2));
        assert_eq!(resolve_from_body(112.0, &lines), Some(1));
        assert_eq!(resolve_from_body(400.0, &lines), Some(3));
    }

    #[test]
    fn equal_edge_distance_keeps_first_line() {
        let lines = vec![body(1, 100.0, 110.0), body(2, 120.0, 130.0)];
        assert_eq!(resolve_from_body(115.0, &lines), Some(1));
    }

    #[test]
    fn no_body_lines_is_unresolved() {
        assert_eq!(resolve_from_body(100.0, &[]), None);
    }
}
