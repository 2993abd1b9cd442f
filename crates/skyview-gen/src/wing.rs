//! Procedural wing geometry: a NACA 4-digit profile lofted along a swept,
//! tapered planform.
//!
//! Axes follow the viewer convention: `x` runs chordwise from the root
//! leading edge, `y` is up, `z` runs spanwise (right half positive).

use std::f64::consts::PI;
use std::str::FromStr;

use skyview_base::{Color, Point3};
use skyview_scene::{Material, MeshData, ModelSpec};

use crate::error::{GenerateError, Result};
use crate::prompt::{WingMetrics, WingParameters};

/// Spanwise stations per half, root and tip included.
pub const SPAN_SECTIONS: usize = 12;
/// Chordwise samples per surface.
pub const PROFILE_SAMPLES: usize = 40;
pub const DEFAULT_PROFILE: &str = "2412";
pub const WING_COLOR: Color = Color::rgb(0x9f, 0xb4, 0xc7);

const MIN_CHORD: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NacaProfile {
    /// Maximum camber as a fraction of chord.
    pub max_camber: f64,
    /// Chordwise position of maximum camber.
    pub camber_position: f64,
    pub thickness: f64,
}

impl Default for NacaProfile {
    fn default() -> Self {
        Self {
            max_camber: 0.02,
            camber_position: 0.4,
            thickness: 0.12,
        }
    }
}

impl FromStr for NacaProfile {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().trim_start_matches("NACA").trim_start_matches("naca").trim();
        let digits: Vec<u32> = code.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() != 4 || code.chars().count() != 4 {
            return Err(GenerateError::InvalidParameters(format!(
                "expected a NACA 4-digit code, got {s:?}"
            )));
        }
        let thickness = f64::from(digits[2] * 10 + digits[3]) / 100.0;
        if thickness <= 0.0 {
            return Err(GenerateError::InvalidParameters(format!(
                "NACA {code} has zero thickness"
            )));
        }
        Ok(Self {
            max_camber: f64::from(digits[0]) / 100.0,
            camber_position: f64::from(digits[1]) / 10.0,
            thickness,
        })
    }
}

impl NacaProfile {
    fn half_thickness(&self, x: f64) -> f64 {
        5.0 * self.thickness
            * (0.2969 * x.sqrt() - 0.1260 * x - 0.3516 * x.powi(2) + 0.2843 * x.powi(3)
                - 0.1036 * x.powi(4))
    }

    fn camber(&self, x: f64) -> (f64, f64) {
        let (m, p) = (self.max_camber, self.camber_position);
        if m == 0.0 || p <= 0.0 || p >= 1.0 {
            return (0.0, 0.0);
        }
        if x < p {
            (m / (p * p) * (2.0 * p * x - x * x), 2.0 * m / (p * p) * (p - x))
        } else {
            let q = (1.0 - p) * (1.0 - p);
            (
                m / q * ((1.0 - 2.0 * p) + 2.0 * p * x - x * x),
                2.0 * m / q * (p - x),
            )
        }
    }

    /// Closed outline in unit-chord coordinates: upper surface from the
    /// trailing edge forward, then the lower surface back aft. The trailing
    /// edge appears once.
    pub fn outline(&self, samples: usize) -> Vec<(f64, f64)> {
        let samples = samples.max(4);
        let stations: Vec<f64> = (0..=samples)
            .map(|i| 0.5 * (1.0 - (PI * i as f64 / samples as f64).cos()))
            .collect();
        let surface = |x: f64, upper: bool| {
            let yt = self.half_thickness(x);
            let (yc, slope) = self.camber(x);
            let theta = slope.atan();
            if upper {
                (x - yt * theta.sin(), yc + yt * theta.cos())
            } else {
                (x + yt * theta.sin(), yc - yt * theta.cos())
            }
        };

        let mut outline = Vec::with_capacity(samples * 2);
        outline.extend(stations.iter().rev().map(|x| surface(*x, true)));
        outline.extend(
            stations[1..samples]
                .iter()
                .map(|x| surface(*x, false)),
        );
        outline
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WingSide {
    Left,
    Right,
}

impl WingSide {
    fn sign(self) -> f64 {
        match self {
            WingSide::Left => -1.0,
            WingSide::Right => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WingSide::Left => "Left Wing",
            WingSide::Right => "Right Wing",
        }
    }
}

/// Both wing halves, ready for export or for loading into a scene.
#[derive(Clone, Debug)]
pub struct WingModel {
    pub parameters: WingParameters,
    pub profile: NacaProfile,
    pub left: MeshData,
    pub right: MeshData,
}

impl WingModel {
    pub fn build(parameters: &WingParameters, profile: NacaProfile) -> Result<Self> {
        parameters.validate()?;
        let outline = profile.outline(PROFILE_SAMPLES);
        Ok(Self {
            parameters: *parameters,
            profile,
            left: build_half(parameters, &outline, WingSide::Left),
            right: build_half(parameters, &outline, WingSide::Right),
        })
    }

    pub fn metrics(&self) -> WingMetrics {
        self.parameters.metrics()
    }

    pub fn halves(&self) -> [(WingSide, &MeshData); 2] {
        [(WingSide::Left, &self.left), (WingSide::Right, &self.right)]
    }

    pub fn to_model_spec(&self) -> ModelSpec {
        self.halves()
            .into_iter()
            .fold(ModelSpec::group("Wing"), |spec, (side, mesh)| {
                spec.with_child(ModelSpec::mesh(side.label(), mesh.clone()))
            })
    }
}

fn build_half(params: &WingParameters, outline: &[(f64, f64)], side: WingSide) -> MeshData {
    let ring = outline.len();
    let sweep = params.sweep_angle_deg.to_radians().tan();
    let mut positions = Vec::with_capacity(SPAN_SECTIONS * ring + 1);

    for station in 0..SPAN_SECTIONS {
        let fraction = station as f64 / (SPAN_SECTIONS - 1) as f64;
        let span = fraction * params.semi_span;
        let chord =
            (params.root_chord * (1.0 - (1.0 - params.taper_ratio) * fraction)).max(MIN_CHORD);
        let leading_edge = span * sweep;
        positions.extend(outline.iter().map(|(x, y)| {
            Point3::new(leading_edge + x * chord, y * chord, side.sign() * span)
        }));
    }

    let mut triangles = Vec::with_capacity((SPAN_SECTIONS - 1) * ring * 2 + ring);
    let flip = side == WingSide::Left;
    let mut push = |a: usize, b: usize, c: usize| {
        let tri = if flip { [a, c, b] } else { [a, b, c] };
        triangles.push(tri.map(|index| index as u32));
    };

    for station in 0..SPAN_SECTIONS - 1 {
        let here = station * ring;
        let next = here + ring;
        for k in 0..ring {
            let k1 = (k + 1) % ring;
            push(here + k, next + k, here + k1);
            push(here + k1, next + k, next + k1);
        }
    }

    // tip cap, fanned around the outline centroid
    let tip = (SPAN_SECTIONS - 1) * ring;
    let centroid = positions[tip..].iter().fold(Point3::new(0.0, 0.0, 0.0), |acc, p| {
        Point3::new(acc.x + p.x, acc.y + p.y, acc.z + p.z)
    });
    let count = ring as f64;
    positions.push(Point3::new(centroid.x / count, centroid.y / count, centroid.z / count));
    let center = positions.len() - 1;
    for k in 0..ring {
        push(tip + k, tip + (k + 1) % ring, center);
    }

    MeshData::new(positions, triangles).with_material(Material::with_color(WING_COLOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_digit_codes() -> Result<()> {
        let profile: NacaProfile = "NACA 2412".parse()?;
        assert_eq!(profile, NacaProfile::default());
        let symmetric: NacaProfile = "0012".parse()?;
        assert_eq!(symmetric.max_camber, 0.0);
        assert!("24120".parse::<NacaProfile>().is_err());
        assert!("2400".parse::<NacaProfile>().is_err());
        Ok(())
    }

    #[test]
    fn outline_closes_at_trailing_edge() {
        let outline = NacaProfile::default().outline(20);
        assert_eq!(outline.len(), 40);
        let (first, nose) = (outline[0], outline[20]);
        assert!((first.0 - 1.0).abs() < 1e-9);
        assert!(first.1.abs() < 1e-3);
        assert!(nose.0.abs() < 1e-9);
        let thickest = outline.iter().map(|p| p.1).fold(f64::MIN, f64::max);
        assert!(thickest > 0.05 && thickest < 0.12);
    }

    #[test]
    fn halves_mirror_across_the_root() -> Result<()> {
        let params = WingParameters {
            root_chord: 2.0,
            semi_span: 15.0,
            sweep_angle_deg: 25.0,
            taper_ratio: 0.5,
        };
        let wing = WingModel::build(&params, NacaProfile::default())?;
        let ring = PROFILE_SAMPLES * 2;
        assert_eq!(wing.right.positions.len(), SPAN_SECTIONS * ring + 1);
        assert_eq!(wing.left.triangles.len(), wing.right.triangles.len());

        let right = wing.right.local_bounds();
        let left = wing.left.local_bounds();
        assert_eq!(right.map(|b| b.max.z), Some(15.0));
        assert_eq!(left.map(|b| b.min.z), Some(-15.0));
        // swept tip leading edge sits aft of the root
        assert!(right.is_some_and(|b| b.max.x > 15.0 * 25f64.to_radians().tan()));
        Ok(())
    }

    #[test]
    fn model_spec_has_two_meshes() -> Result<()> {
        let wing = WingModel::build(&WingParameters::default(), NacaProfile::default())?;
        let spec = wing.to_model_spec();
        assert_eq!(spec.children.len(), 2);
        assert_eq!(spec.node_count(), 3);
        Ok(())
    }
}
