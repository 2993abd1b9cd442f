use std::time::Duration;

use cgmath::{EuclideanSpace, MetricSpace};
use serde::Serialize;
use skyview_base::Point3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeasurementResult {
    pub distance: f64,
    pub midpoint: Point3,
}

impl MeasurementResult {
    pub fn between(a: Point3, b: Point3) -> Self {
        Self {
            distance: a.distance(b),
            midpoint: Point3::midpoint(a, b),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasurementPhase {
    Idle,
    Empty,
    OnePoint,
    Resolved,
}

/// Two-point distance measurement with a timed auto-reset.
#[derive(Clone, Debug, Default)]
pub struct Measurement {
    active: bool,
    points: Vec<Point3>,
    result: Option<MeasurementResult>,
    reset_at: Option<Duration>,
}

impl Measurement {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn result(&self) -> Option<MeasurementResult> {
        self.result
    }

    pub fn reset_at(&self) -> Option<Duration> {
        self.reset_at
    }

    pub fn phase(&self) -> MeasurementPhase {
        if !self.active {
            return MeasurementPhase::Idle;
        }
        match self.points.len() {
            0 => MeasurementPhase::Empty,
            1 => MeasurementPhase::OnePoint,
            _ => MeasurementPhase::Resolved,
        }
    }

    pub fn toggle(&mut self) {
        self.active = !self.active;
        self.clear_points();
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.clear_points();
    }

    fn clear_points(&mut self) {
        self.points.clear();
        self.result = None;
        self.reset_at = None;
    }

    /// Captures `point` at clock time `now`. A third point slides the pair to
    /// `[previous second, point]`.
    pub fn add_point(&mut self, point: Point3, now: Duration, timeout: Duration) -> bool {
        if !self.active {
            return false;
        }
        if self.points.len() >= 2 {
            let last = self.points[self.points.len() - 1];
            self.points.clear();
            self.points.push(last);
        }
        self.points.push(point);
        if let [a, b] = self.points[..] {
            self.result = Some(MeasurementResult::between(a, b));
            self.reset_at = now.checked_add(timeout);
        } else {
            self.result = None;
            self.reset_at = None;
        }
        true
    }

    /// Clears the session once the clock passes the scheduled reset.
    pub fn expire(&mut self, now: Duration) -> bool {
        match self.reset_at {
            Some(deadline) if now >= deadline => {
                self.reset();
                true
            }
            _ => false,
        }
    }
}
