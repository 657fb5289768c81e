use thiserror::Error;

/// Face location in `(top, right, bottom, left)` pixel coordinates.
///
/// `right` and `bottom` are exclusive edges, so `width = right - left`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl BoundingBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Builds a box from `x1, y1, x2, y2` corners in any order, rounding to
    /// the nearest pixel.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            top: y1.min(y2).round() as i32,
            right: x1.max(x2).round() as i32,
            bottom: y1.max(y2).round() as i32,
            left: x1.min(x2).round() as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> i64 {
        self.width().max(0) as i64 * self.height().max(0) as i64
    }

    pub fn center_x(&self) -> i32 {
        self.left + self.width() / 2
    }

    /// Restricts the box to `[0, width] x [0, height]`, keeping
    /// `top <= bottom` and `left <= right`.
    pub fn clamp_to(&self, width: u32, height: u32) -> BoundingBox {
        let w = width as i32;
        let h = height as i32;
        let left = self.left.clamp(0, w);
        let top = self.top.clamp(0, h);
        BoundingBox {
            top,
            right: self.right.clamp(left, w),
            bottom: self.bottom.clamp(top, h),
            left,
        }
    }

    /// Square box around the centre, with sides grown by `margin` (0.1 = 10 %).
    pub fn expanded_square(&self, margin: f64) -> BoundingBox {
        let side = self.width().max(self.height()) as f64 * (1.0 + margin);
        let cx = (self.left + self.right) as f64 / 2.0;
        let cy = (self.top + self.bottom) as f64 / 2.0;
        let half = side / 2.0;
        BoundingBox::from_corners(cx - half, cy - half, cx + half, cy + half)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("scale factors must be in (0, 1], got ({fx}, {fy})")]
pub struct ScaleError {
    pub fx: f64,
    pub fy: f64,
}

/// Per-axis factors used to shrink a frame before detection.
///
/// The same factors must map boxes back to full resolution, or they drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    fx: f64,
    fy: f64,
}

impl ScaleFactors {
    pub fn new(fx: f64, fy: f64) -> Result<Self, ScaleError> {
        let valid = |f: f64| f > 0.0 && f <= 1.0;
        if valid(fx) && valid(fy) {
            Ok(Self { fx, fy })
        } else {
            Err(ScaleError { fx, fy })
        }
    }

    pub fn uniform(f: f64) -> Result<Self, ScaleError> {
        Self::new(f, f)
    }

    pub fn fx(&self) -> f64 {
        self.fx
    }

    pub fn fy(&self) -> f64 {
        self.fy
    }

    /// Maps a box found on the downsampled frame back to full resolution.
    pub fn rescale_to_full(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox {
            top: (b.top as f64 / self.fy).round() as i32,
            right: (b.right as f64 / self.fx).round() as i32,
            bottom: (b.bottom as f64 / self.fy).round() as i32,
            left: (b.left as f64 / self.fx).round() as i32,
        }
    }

    /// Maps a full-resolution box onto the downsampled frame.
    pub fn downscale(&self, b: &BoundingBox) -> BoundingBox {
        BoundingBox {
            top: (b.top as f64 * self.fy).round() as i32,
            right: (b.right as f64 * self.fx).round() as i32,
            bottom: (b.bottom as f64 * self.fy).round() as i32,
            left: (b.left as f64 * self.fx).round() as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_dimensions() {
        let b = BoundingBox::new(10, 60, 40, 20);
        assert_eq!(b.width(), 40);
        assert_eq!(b.height(), 30);
        assert_eq!(b.area(), 1200);
        assert_eq!(b.center_x(), 40);
    }

    #[test]
    fn test_from_corners_orders_and_rounds() {
        let b = BoundingBox::from_corners(50.6, 40.4, 10.2, 5.5);
        assert_eq!(b, BoundingBox::new(6, 51, 40, 10));
    }

    #[test]
    fn test_clamp_keeps_ordering() {
        let b = BoundingBox::new(-10, 700, 500, -5).clamp_to(640, 480);
        assert_eq!(b, BoundingBox::new(0, 640, 480, 0));

        // Entirely outside on the right collapses to a zero-width box at the edge
        let outside = BoundingBox::new(10, 900, 20, 800).clamp_to(640, 480);
        assert_eq!(outside.left, 640);
        assert_eq!(outside.right, 640);
        assert!(outside.top <= outside.bottom);
    }

    #[test]
    fn test_expanded_square_grows_around_center() {
        let b = BoundingBox::new(0, 100, 50, 0).expanded_square(0.1);
        // side = 100 * 1.1 = 110, centre = (50, 25)
        assert_eq!(b, BoundingBox::new(-30, 105, 80, -5));
    }

    #[rstest]
    #[case(0.0, 0.5)]
    #[case(0.5, 0.0)]
    #[case(1.5, 0.5)]
    #[case(-0.25, -0.25)]
    fn test_scale_factors_reject_out_of_range(#[case] fx: f64, #[case] fy: f64) {
        assert_eq!(ScaleFactors::new(fx, fy), Err(ScaleError { fx, fy }));
    }

    #[test]
    fn test_rescale_to_full_quarter() {
        let s = ScaleFactors::uniform(0.25).unwrap();
        let b = s.rescale_to_full(&BoundingBox::new(10, 40, 30, 20));
        assert_eq!(b, BoundingBox::new(40, 160, 120, 80));
    }

    #[test]
    fn test_rescale_rounds_to_nearest() {
        let s = ScaleFactors::new(0.3, 0.7).unwrap();
        let b = s.rescale_to_full(&BoundingBox::new(7, 11, 9, 2));
        // 7/0.7=10, 11/0.3=36.67, 9/0.7=12.86, 2/0.3=6.67
        assert_eq!(b, BoundingBox::new(10, 37, 13, 7));
    }

    #[rstest]
    fn test_rescale_round_trip_within_one_pixel(
        #[values(0.1, 0.25, 0.33, 0.6, 0.75, 1.0)] fx: f64,
        #[values(0.1, 0.25, 0.5, 0.9)] fy: f64,
    ) {
        let s = ScaleFactors::new(fx, fy).unwrap();
        for &(t, r, b, l) in &[(0, 10, 10, 0), (3, 57, 41, 17), (99, 160, 120, 1)] {
            let small = BoundingBox::new(t, r, b, l);
            let back = s.downscale(&s.rescale_to_full(&small));
            assert!((back.top - small.top).abs() <= 1);
            assert!((back.right - small.right).abs() <= 1);
            assert!((back.bottom - small.bottom).abs() <= 1);
            assert!((back.left - small.left).abs() <= 1);
        }
    }
}
