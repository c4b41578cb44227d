//! Compass points and the Beaufort scale.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the 16 compass points, each covering 22.5°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardinalDirection {
    /// North.
    N,
    /// North-northeast.
    Nne,
    /// Northeast.
    Ne,
    /// East-northeast.
    Ene,
    /// East.
    E,
    /// East-southeast.
    Ese,
    /// Southeast.
    Se,
    /// South-southeast.
    Sse,
    /// South.
    S,
    /// South-southwest.
    Ssw,
    /// Southwest.
    Sw,
    /// West-southwest.
    Wsw,
    /// West.
    W,
    /// West-northwest.
    Wnw,
    /// Northwest.
    Nw,
    /// North-northwest.
    Nnw,
}

impl CardinalDirection {
    /// All points clockwise from north.
    pub const ALL: [Self; 16] = [
        Self::N,
        Self::Nne,
        Self::Ne,
        Self::Ene,
        Self::E,
        Self::Ese,
        Self::Se,
        Self::Sse,
        Self::S,
        Self::Ssw,
        Self::Sw,
        Self::Wsw,
        Self::W,
        Self::Wnw,
        Self::Nw,
        Self::Nnw,
    ];

    /// Nearest compass point to a bearing in degrees.
    ///
    /// Bearings outside `[0, 360)` wrap; NaN maps to north.
    pub fn from_degrees(degrees: f64) -> Self {
        let bucket = ((degrees + 11.25) / 22.5).floor().rem_euclid(16.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // 0..16 after rem_euclid
        let index = bucket as usize;
        Self::ALL[index % 16]
    }

    /// Short code, e.g. `"NNW"`.
    pub fn code(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::Nne => "NNE",
            Self::Ne => "NE",
            Self::Ene => "ENE",
            Self::E => "E",
            Self::Ese => "ESE",
            Self::Se => "SE",
            Self::Sse => "SSE",
            Self::S => "S",
            Self::Ssw => "SSW",
            Self::Sw => "SW",
            Self::Wsw => "WSW",
            Self::W => "W",
            Self::Wnw => "WNW",
            Self::Nw => "NW",
            Self::Nnw => "NNW",
        }
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Beaufort wind force, numbered 1 (calm) through 13 (hurricane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BeaufortForce {
    /// Calm, below 0.5 m/s.
    Calm = 1,
    /// Light air.
    LightAir,
    /// Light breeze.
    LightBreeze,
    /// Gentle breeze.
    GentleBreeze,
    /// Moderate breeze.
    ModerateBreeze,
    /// Fresh breeze.
    FreshBreeze,
    /// Strong breeze.
    StrongBreeze,
    /// Moderate gale.
    ModerateGale,
    /// Gale.
    Gale,
    /// Severe gale.
    SevereGale,
    /// Storm.
    Storm,
    /// Violent storm.
    ViolentStorm,
    /// Hurricane force, above 32.6 m/s.
    Hurricane,
}

/// Inclusive upper bounds in m/s for `LightAir` through `ViolentStorm`.
const BEAUFORT_UPPER_MPS: [(f64, BeaufortForce); 11] = [
    (1.5, BeaufortForce::LightAir),
    (3.3, BeaufortForce::LightBreeze),
    (5.5, BeaufortForce::GentleBreeze),
    (7.9, BeaufortForce::ModerateBreeze),
    (10.7, BeaufortForce::FreshBreeze),
    (13.8, BeaufortForce::StrongBreeze),
    (17.1, BeaufortForce::ModerateGale),
    (20.7, BeaufortForce::Gale),
    (24.4, BeaufortForce::SevereGale),
    (28.4, BeaufortForce::Storm),
    (32.6, BeaufortForce::ViolentStorm),
];

/// Speeds strictly below this are calm.
const CALM_BELOW_MPS: f64 = 0.5;

impl BeaufortForce {
    /// Classifies a wind speed in m/s.
    pub fn from_speed(mps: f64) -> Self {
        if mps < CALM_BELOW_MPS || mps.is_nan() {
            return Self::Calm;
        }
        BEAUFORT_UPPER_MPS
            .iter()
            .find(|(upper, _)| mps <= *upper)
            .map_or(Self::Hurricane, |(_, force)| *force)
    }

    /// Scale number, 1 through 13.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
