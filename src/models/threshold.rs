/// Inclusive band `[low, high]` and the value written for samples inside it
///
/// `low > high` is allowed and selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThresholdRange {
    /// Lowest sample value kept
    pub low: u8,
    /// Highest sample value kept
    pub high: u8,
    /// Output value for kept samples
    pub fill: u8,
}

impl ThresholdRange {
    /// Create a new range
    pub fn new(low: u8, high: u8, fill: u8) -> Self {
        Self { low, high, fill }
    }

    /// Range with the conventional white fill (255)
    pub fn gray(low: u8, high: u8) -> Self {
        Self::new(low, high, u8::MAX)
    }

    /// Saturate floating-point parameters into the 8-bit domain.
    ///
    /// Bounds are floored, the fill is rounded half-to-even. Values outside
    /// [0, 255] are clamped and NaN becomes 0.
    pub fn saturating(low: f64, high: f64, fill: f64) -> Self {
        Self {
            low: saturate_u8(low.floor()),
            high: saturate_u8(high.floor()),
            fill: saturate_u8(fill.round_ties_even()),
        }
    }

    /// True when `value` falls inside the band
    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        self.low <= value && value <= self.high
    }

    /// True when no value can fall inside the band
    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }
}

fn saturate_u8(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0) as u8
}

/// Half-open interval `[start, end)` of row indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRange {
    /// First row
    pub start: usize,
    /// One past the last row
    pub end: usize,
}

impl RowRange {
    /// Create a new row range
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "row range {}..{} is inverted", start, end);
        Self { start, end }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the range holds no rows
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_parameters() {
        let range = ThresholdRange::saturating(99.9, 200.7, 254.5);
        assert_eq!(range, ThresholdRange::new(99, 200, 254));

        let range = ThresholdRange::saturating(-20.0, 300.0, 1000.0);
        assert_eq!(range, ThresholdRange::new(0, 255, 255));

        let range = ThresholdRange::saturating(f64::NAN, -0.5, f64::NAN);
        assert_eq!(range, ThresholdRange::new(0, 0, 0));
    }

    #[test]
    fn test_contains() {
        let range = ThresholdRange::gray(100, 200);
        assert!(!range.contains(99));
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(201));
        assert_eq!(range.fill, 255);

        let inverted = ThresholdRange::gray(200, 100);
        assert!(inverted.is_empty());
        assert!(!inverted.contains(150));
    }

    #[test]
    fn test_row_range_len() {
        let r = RowRange::new(3, 7);
        assert_eq!(r.len(), 4);
        assert!(!r.is_empty());
        assert!(RowRange::new(5, 5).is_empty());
    }
}
