use serde::{Deserialize, Serialize};
use skyview_base::{Axis, AxisRange, AxisRanges, Color};

pub type CutRanges = AxisRanges;

pub const DEFAULT_CUT_COLOR: Color = Color::rgb(0xff, 0x6b, 0x3d);

/// Clipping plane parameters. `offset` always lies inside the active axis
/// range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CutPlane {
    axis: Axis,
    offset: f64,
    ranges: CutRanges,
    pub enabled: bool,
    pub visible: bool,
    pub color: Color,
}

impl Default for CutPlane {
    fn default() -> Self {
        let ranges = CutRanges::default();
        Self {
            axis: Axis::X,
            offset: ranges.x.midpoint(),
            ranges,
            enabled: false,
            visible: true,
            color: DEFAULT_CUT_COLOR,
        }
    }
}

impl CutPlane {
    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn ranges(&self) -> &CutRanges {
        &self.ranges
    }

    pub fn active_range(&self) -> AxisRange {
        self.ranges.get(self.axis)
    }

    pub fn set_axis(&mut self, axis: Axis) {
        self.axis = axis;
        let range = self.active_range();
        self.offset = range.clamp(range.midpoint());
    }

    pub fn set_offset(&mut self, value: f64) {
        self.offset = self.active_range().clamp(value);
    }

    /// Returns `false` when `ranges` equals the current ranges and nothing
    /// changed.
    pub fn set_ranges(&mut self, ranges: CutRanges) -> bool {
        if ranges == self.ranges {
            return false;
        }
        self.ranges = ranges;
        let range = self.active_range();
        if !range.contains(self.offset) {
            self.offset = range.clamp(range.midpoint());
        }
        true
    }

    /// Restores every field at once, re-establishing the offset invariant.
    pub fn restore(&mut self, axis: Axis, ranges: CutRanges, offset: f64) {
        self.axis = axis;
        self.ranges = ranges;
        self.offset = self.active_range().clamp(offset);
    }
}
