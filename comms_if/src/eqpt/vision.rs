//! # Vision Equipment Signals
//!
//! Signals published by the line, zone and victim vision producers. Every error is normalised to
//! the range [-1, 1] (negative is left of the image centre), and every confidence to [0, 1].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Angle value used by legacy producers to mean "no angle could be measured".
pub const LEGACY_UNDEFINED_ANGLE_DEG: f64 = -181.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Output of the line-tracking producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSignal {
    /// True if the tracked line is currently visible.
    pub found: bool,

    /// Lateral offset of the line from the image centre.
    ///
    /// Units: normalised, -1 (far left) to +1 (far right)
    pub lateral_error: f64,

    /// Direction indicated by any intersection marker currently in view.
    pub turn_marker: TurnMarker,
}

/// Task trigger signals: the mission exit marker and the silver evacuation strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitSignal {
    /// True if the exit marker is in view.
    pub found: bool,

    /// Orientation of the exit marker relative to straight ahead, or `None` if it couldn't be
    /// measured.
    ///
    /// Units: degrees
    pub angle_deg: Option<f64>,

    /// Fraction of the image classified as silver strip.
    ///
    /// Units: normalised, 0 to 1
    pub silver_probability: f64,
}

/// Output of the victim detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VictimDetection {
    /// Class of the best detection, or `None` if nothing is detected.
    pub kind: Option<VictimKind>,

    /// Lateral offset of the detection from the image centre.
    ///
    /// Units: normalised, -1 to +1
    pub lateral_error: f64,

    /// Detector confidence.
    ///
    /// Units: normalised, 0 to 1
    pub confidence: f64,

    /// Apparent width of the detection box, or `None` if unknown.
    ///
    /// Units: pixels
    pub apparent_width: Option<f64>,
}

/// A single coloured deposit zone marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneMarker {
    pub found: bool,

    /// Units: normalised, -1 to +1
    pub lateral_error: f64,
}

/// Both deposit zone markers as seen by the zone producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneMarkers {
    pub green: ZoneMarker,
    pub red: ZoneMarker,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Direction indicated by an intersection marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnMarker {
    Straight,
    Left,
    Right,
    AboutFace,
}

/// Victim categories the detector can classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictimKind {
    /// A live victim, represented by a silver ball.
    Silver,

    /// A dead victim, represented by a black ball.
    Black,
}

/// Colour of a deposit zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositColour {
    Green,
    Red,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for TurnMarker {
    fn default() -> Self {
        TurnMarker::Straight
    }
}

impl Default for DepositColour {
    fn default() -> Self {
        DepositColour::Green
    }
}

impl TurnMarker {
    /// Parse the direction strings used by legacy producers.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "straight" => Some(TurnMarker::Straight),
            "left" => Some(TurnMarker::Left),
            "right" => Some(TurnMarker::Right),
            "turn_around" | "about_face" => Some(TurnMarker::AboutFace),
            _ => None,
        }
    }
}

impl VictimKind {
    /// Classify a detector label. Anything other than the two known classes is not a victim.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "silver" => Some(VictimKind::Silver),
            "black" => Some(VictimKind::Black),
            _ => None,
        }
    }
}

impl DepositColour {
    /// Live victims go to the green zone, dead victims to the red zone.
    pub fn for_victim(kind: VictimKind) -> Self {
        match kind {
            VictimKind::Silver => DepositColour::Green,
            VictimKind::Black => DepositColour::Red,
        }
    }
}

impl std::fmt::Display for DepositColour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepositColour::Green => write!(f, "green"),
            DepositColour::Red => write!(f, "red"),
        }
    }
}

impl LineSignal {
    /// Return a copy with the error clamped into its normalised range.
    pub fn normalised(self) -> Self {
        Self {
            lateral_error: clamp_error(self.lateral_error),
            ..self
        }
    }
}

impl ExitSignal {
    pub fn normalised(self) -> Self {
        Self {
            angle_deg: self.angle_deg.filter(|a| a.is_finite()),
            silver_probability: clamp_unit(self.silver_probability),
            ..self
        }
    }
}

impl VictimDetection {
    pub fn normalised(self) -> Self {
        Self {
            lateral_error: clamp_error(self.lateral_error),
            confidence: clamp_unit(self.confidence),
            apparent_width: self.apparent_width.filter(|w| w.is_finite() && *w >= 0.0),
            ..self
        }
    }

    /// True if a victim is detected with at least the given confidence.
    pub fn is_detected(&self, min_confidence: f64) -> bool {
        self.kind.is_some() && self.confidence >= min_confidence
    }
}

impl ZoneMarkers {
    pub fn get(&self, colour: DepositColour) -> ZoneMarker {
        match colour {
            DepositColour::Green => self.green,
            DepositColour::Red => self.red,
        }
    }

    pub fn normalised(self) -> Self {
        Self {
            green: ZoneMarker {
                lateral_error: clamp_error(self.green.lateral_error),
                ..self.green
            },
            red: ZoneMarker {
                lateral_error: clamp_error(self.red.lateral_error),
                ..self.red
            },
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a legacy angle, where -181 means undefined, into an optional angle.
pub fn angle_from_legacy(angle_deg: f64) -> Option<f64> {
    if angle_deg == LEGACY_UNDEFINED_ANGLE_DEG || !angle_deg.is_finite() {
        None
    } else {
        Some(angle_deg)
    }
}

/// Convert a legacy box width, where any negative value means unknown, into an optional width.
pub fn width_from_legacy(width: f64) -> Option<f64> {
    if width < 0.0 || !width.is_finite() {
        None
    } else {
        Some(width)
    }
}

/// NaN is mapped to zero so a broken producer reads as "centred".
fn clamp_error(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(-1.0).min(1.0)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0).min(1.0)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
