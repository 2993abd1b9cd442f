//! Wing parameters derived from free-text prompts.
//!
//! The heuristics look for a number next to a keyword ("30m wingspan",
//! "span: 30", "25 degree sweep", "taper ratio: 0.4"). Anything not found
//! falls back to a default. The first matching pattern wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, Result};

pub const DEFAULT_SPAN: f64 = 10.0;
pub const DEFAULT_ROOT_CHORD: f64 = 2.0;
pub const DEFAULT_SWEEP_DEG: f64 = 25.0;
pub const DEFAULT_TAPER: f64 = 0.5;

const MIN_SEMI_SPAN: f64 = 1.0;
const MIN_ROOT_CHORD: f64 = 0.5;
const MIN_TAPER: f64 = 0.1;

fn patterns(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|source| Regex::new(source).expect("valid prompt pattern"))
        .collect()
}

static SPAN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(\d+(?:\.\d+)?)\s*(?:m|meters?|metres?)?\s*(?:wing\s*span|span)",
        r"span\s*[:=]\s*(\d+(?:\.\d+)?)",
    ])
});

static ROOT_CHORD: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(\d+(?:\.\d+)?)\s*(?:m|meters?|metres?)?\s*root\s*chord",
        r"chord\s*[:=]\s*(\d+(?:\.\d+)?)",
    ])
});

static SWEEP: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(\d+(?:\.\d+)?)\s*(?:°|deg(?:rees?)?)?\s*(?:of\s*)?sweep",
        r"sweep(?:\s*angle)?\s*[:=]\s*(-?\d+(?:\.\d+)?)",
    ])
});

static TAPER: LazyLock<Vec<Regex>> =
    LazyLock::new(|| patterns(&[r"taper(?:\s*ratio)?\s*[:=]\s*(\d+(?:\.\d+)?)"]));

fn find_number(patterns: &[Regex], text: &str) -> Option<f64> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|value| value.as_str().parse().ok())
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WingParameters {
    pub root_chord: f64,
    /// Half of the total wingspan, in meters.
    pub semi_span: f64,
    pub sweep_angle_deg: f64,
    pub taper_ratio: f64,
}

impl Default for WingParameters {
    fn default() -> Self {
        Self {
            root_chord: DEFAULT_ROOT_CHORD,
            semi_span: DEFAULT_SPAN / 2.0,
            sweep_angle_deg: DEFAULT_SWEEP_DEG,
            taper_ratio: DEFAULT_TAPER,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WingMetrics {
    pub total_span: f64,
    pub tip_chord: f64,
    pub wing_area: f64,
    pub aspect_ratio: Option<f64>,
}

impl WingParameters {
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(GenerateError::InvalidParameters(message));
        if !(self.root_chord > 0.0) {
            return invalid(format!("root chord must be positive, got {}", self.root_chord));
        }
        if !(self.semi_span > 0.0) {
            return invalid(format!("semi span must be positive, got {}", self.semi_span));
        }
        if !(self.taper_ratio > 0.0) {
            return invalid(format!("taper ratio must be positive, got {}", self.taper_ratio));
        }
        if !(-90.0..=90.0).contains(&self.sweep_angle_deg) {
            return invalid(format!(
                "sweep angle must lie in [-90, 90] degrees, got {}",
                self.sweep_angle_deg
            ));
        }
        Ok(())
    }

    pub fn tip_chord(&self) -> f64 {
        self.root_chord * self.taper_ratio
    }

    pub fn total_span(&self) -> f64 {
        self.semi_span * 2.0
    }

    pub fn metrics(&self) -> WingMetrics {
        let total_span = self.total_span();
        let tip_chord = self.tip_chord();
        let wing_area = self.semi_span * (self.root_chord + tip_chord);
        WingMetrics {
            total_span,
            tip_chord,
            wing_area,
            aspect_ratio: (wing_area > 0.0).then(|| total_span * total_span / wing_area),
        }
    }
}

pub fn extract_parameters(prompt: &str) -> WingParameters {
    let text = prompt.to_lowercase();
    let span = find_number(&SPAN, &text).unwrap_or(DEFAULT_SPAN);
    let root_chord = find_number(&ROOT_CHORD, &text).unwrap_or(DEFAULT_ROOT_CHORD);
    let sweep = find_number(&SWEEP, &text).unwrap_or(DEFAULT_SWEEP_DEG);
    let taper = find_number(&TAPER, &text).unwrap_or(DEFAULT_TAPER);

    WingParameters {
        root_chord: root_chord.max(MIN_ROOT_CHORD),
        semi_span: (span / 2.0).max(MIN_SEMI_SPAN),
        sweep_angle_deg: sweep,
        taper_ratio: taper.max(MIN_TAPER),
    }
}
