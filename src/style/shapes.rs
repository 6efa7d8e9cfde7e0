use std::fmt::Write;

use super::{CornerDotType, CornerSquareType, DotType};

/// Axis-aligned rectangle with an individual radius per corner,
/// ordered top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub radii: [f64; 4],
}

impl RoundedRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64, radius: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            radii: [radius; 4],
        }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        if px < self.x || py < self.y || px > self.x + self.w || py > self.y + self.h {
            return false;
        }
        let [tl, tr, br, bl] = self.radii;
        let corners = [
            (tl, self.x + tl, self.y + tl, px < self.x + tl && py < self.y + tl),
            (
                tr,
                self.x + self.w - tr,
                self.y + tr,
                px > self.x + self.w - tr && py < self.y + tr,
            ),
            (
                br,
                self.x + self.w - br,
                self.y + self.h - br,
                px > self.x + self.w - br && py > self.y + self.h - br,
            ),
            (
                bl,
                self.x + bl,
                self.y + self.h - bl,
                px < self.x + bl && py > self.y + self.h - bl,
            ),
        ];
        corners.iter().all(|&(r, cx, cy, in_corner)| {
            !in_corner || r <= 0.0 || (px - cx).powi(2) + (py - cy).powi(2) <= r * r
        })
    }

    /// Closed SVG sub-path, clockwise.
    pub fn svg_path(&self) -> String {
        let [tl, tr, br, bl] = self.radii;
        let (x, y, w, h) = (self.x, self.y, self.w, self.h);
        let mut d = String::new();
        let _ = write!(d, "M{},{}", fmt(x + tl), fmt(y));
        let _ = write!(d, "H{}", fmt(x + w - tr));
        if tr > 0.0 {
            let _ = write!(d, "A{r},{r} 0 0 1 {},{}", fmt(x + w), fmt(y + tr), r = fmt(tr));
        }
        let _ = write!(d, "V{}", fmt(y + h - br));
        if br > 0.0 {
            let _ = write!(d, "A{r},{r} 0 0 1 {},{}", fmt(x + w - br), fmt(y + h), r = fmt(br));
        }
        let _ = write!(d, "H{}", fmt(x + bl));
        if bl > 0.0 {
            let _ = write!(d, "A{r},{r} 0 0 1 {},{}", fmt(x), fmt(y + h - bl), r = fmt(bl));
        }
        let _ = write!(d, "V{}", fmt(y + tl));
        if tl > 0.0 {
            let _ = write!(d, "A{r},{r} 0 0 1 {},{}", fmt(x + tl), fmt(y), r = fmt(tl));
        }
        d.push('Z');
        d
    }
}

/// Outer shape minus inner shape, used for the finder frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub outer: RoundedRect,
    pub inner: RoundedRect,
}

impl Ring {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        self.outer.contains(px, py) && !self.inner.contains(px, py)
    }

    /// Path to be filled with `fill-rule="evenodd"`.
    pub fn svg_path(&self) -> String {
        format!("{}{}", self.outer.svg_path(), self.inner.svg_path())
    }
}

/// Which orthogonal neighbours of a data module are also drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbours {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

/// Shape of one data module at `(x, y)` with side `size`.
pub fn dot(kind: DotType, x: f64, y: f64, size: f64, n: Neighbours) -> RoundedRect {
    let half = size / 2.0;
    // a corner is exposed when neither adjacent side continues the shape
    let exposed = [
        !n.left && !n.top,
        !n.right && !n.top,
        !n.right && !n.bottom,
        !n.left && !n.bottom,
    ];
    let pick = |radius: [f64; 4]| {
        let mut radii = [0.0; 4];
        for i in 0..4 {
            if exposed[i] {
                radii[i] = radius[i];
            }
        }
        radii
    };
    let radii = match kind {
        DotType::Square => [0.0; 4],
        DotType::Dots => [half; 4],
        DotType::Rounded => pick([size * 0.3; 4]),
        DotType::ExtraRounded => pick([half; 4]),
        DotType::Classy => pick([half, 0.0, half, 0.0]),
        DotType::ClassyRounded => pick([half, size * 0.2, half, size * 0.2]),
    };
    RoundedRect {
        x,
        y,
        w: size,
        h: size,
        radii,
    }
}

/// 7x7 finder frame with its top-left corner at `(x, y)`.
pub fn corner_square(kind: CornerSquareType, x: f64, y: f64, module: f64) -> Ring {
    let (outer_r, inner_r) = match kind {
        CornerSquareType::Square => (0.0, 0.0),
        CornerSquareType::Dot => (3.5 * module, 2.5 * module),
        CornerSquareType::ExtraRounded => (2.5 * module, 1.5 * module),
    };
    Ring {
        outer: RoundedRect::new(x, y, 7.0 * module, 7.0 * module, outer_r),
        inner: RoundedRect::new(x + module, y + module, 5.0 * module, 5.0 * module, inner_r),
    }
}

/// 3x3 finder centre for a frame whose top-left corner is `(x, y)`.
pub fn corner_dot(kind: CornerDotType, x: f64, y: f64, module: f64) -> RoundedRect {
    let radius = match kind {
        CornerDotType::Square => 0.0,
        CornerDotType::Dot => 1.5 * module,
    };
    RoundedRect::new(
        x + 2.0 * module,
        y + 2.0 * module,
        3.0 * module,
        3.0 * module,
        radius,
    )
}

/// Compact number formatting for SVG attributes.
pub fn fmt(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_dot_fills_its_corners() {
        let rect = dot(DotType::Square, 0.0, 0.0, 10.0, Neighbours::default());
        assert!(rect.contains(0.1, 0.1));
        assert!(rect.contains(9.9, 9.9));
        assert!(!rect.contains(10.5, 5.0));
    }

    #[test]
    fn round_dot_clips_corners() {
        let circle = dot(DotType::Dots, 0.0, 0.0, 10.0, Neighbours::default());
        assert!(circle.contains(5.0, 5.0));
        assert!(!circle.contains(0.5, 0.5));
    }

    #[test]
    fn rounded_dot_keeps_corners_touching_neighbours() {
        let joined = Neighbours {
            right: true,
            ..Neighbours::default()
        };
        let rect = dot(DotType::ExtraRounded, 0.0, 0.0, 10.0, joined);
        assert!(!rect.contains(0.3, 0.3));
        assert!(rect.contains(9.8, 0.2));
        assert!(rect.contains(9.8, 9.8));
    }

    #[test]
    fn classy_rounds_only_diagonal_corners() {
        let rect = dot(DotType::Classy, 0.0, 0.0, 10.0, Neighbours::default());
        assert_eq!(rect.radii, [5.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn ring_excludes_inner_area() {
        let ring = corner_square(CornerSquareType::Square, 0.0, 0.0, 10.0);
        assert!(ring.contains(5.0, 5.0));
        assert!(!ring.contains(35.0, 35.0));
        let centre = corner_dot(CornerDotType::Square, 0.0, 0.0, 10.0);
        assert!(centre.contains(35.0, 35.0));
    }

    #[test]
    fn svg_path_is_closed() {
        let path = RoundedRect::new(0.0, 0.0, 10.0, 10.0, 2.5).svg_path();
        assert!(path.starts_with("M2.5,0"));
        assert!(path.ends_with('Z'));
        assert_eq!(path.matches('A').count(), 4);
        assert_eq!(fmt(1.0), "1");
        assert_eq!(fmt(1.256), "1.26");
    }
}
