use serde::{Deserialize, Serialize};

/// Points per centimetre (72 pt per inch, 2.54 cm per inch).
pub const CM_TO_PT: f64 = 72.0 / 2.54;

pub fn cm_to_points(cm: f64) -> f64 {
    cm * CM_TO_PT
}

/// Axis-aligned rectangle in page space: `y0` is the top edge, `y1` the bottom edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Builds a box from two opposite corners given in any order.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) * 0.5, (self.y0 + self.y1) * 0.5)
    }

    pub fn vertical_center(&self) -> f64 {
        (self.y0 + self.y1) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Overlapping part of both boxes, or `None` when they do not overlap.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x0 > x1 || y0 > y1 {
            None
        } else {
            Some(Self { x0, y0, x1, y1 })
        }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.x0 <= x && x <= self.x1 && self.y0 <= y && y <= self.y1
    }

    /// True when `y` lies within the closed vertical band `[y0, y1]`.
    pub fn spans_y(&self, y: f64) -> bool {
        self.y0 <= y && y <= self.y1
    }

    /// Distance from `y` to whichever horizontal edge is nearer.
    pub fn edge_distance_y(&self, y: f64) -> f64 {
        (y - self.y0).abs().min((y - self.y1).abs())
    }

    /// Maps a box given in PDF user space (y up) into the top-down space of `page_box`,
    /// itself expressed in user space.
    pub fn to_top_down(&self, page_box: &BBox) -> Self {
        Self::from_corners(
            self.x0 - page_box.x0,
            page_box.y1 - self.y0,
            self.x1 - page_box.x0,
            page_box.y1 - self.y1,
        )
    }
}

/// Union of all boxes, `None` for an empty iterator.
pub fn union_all<'a, I>(boxes: I) -> Option<BBox>
where
    I: IntoIterator<Item = &'a BBox>,
{
    boxes
        .into_iter()
        .fold(None, |acc: Option<BBox>, b| match acc {
            Some(a) => Some(a.union(b)),
            None => Some(*b),
        })
}
