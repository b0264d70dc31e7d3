pub mod air;
pub mod bessel;
pub mod bore;
pub mod cache;
pub mod complex;
pub mod elements;
pub mod embouchure;
pub mod error;
pub mod frequency_response;
pub mod hole;
pub mod profile;
pub mod radiation;
pub mod transfer_matrix;
pub mod wave;
pub mod woodwind;

pub use bore::{Bore, BoreSegment};
pub use embouchure::EmbouchureHole;
pub use error::{ConfigError, Error, FingeringError, Result};
pub use frequency_response::{
    impedance_sweep, played_sweep, ImpedancePoint, PlayedFingering, PlayedRow, SweepRange,
};
pub use hole::{Fingering, Hole, Key};
pub use profile::{pressure_profile, ProfilePoint};
pub use transfer_matrix::TransferMatrix;
pub use woodwind::{Head, UnitCell, Woodwind};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared interface types
// ---------------------------------------------------------------------------

/// Longest bore segment kept by [`Woodwind::discretise`] in the reference
/// model (m).
pub const MAX_SEGMENT_LENGTH: f64 = 5.0e-3;

/// Effective radius of the opening left uncovered by the player's lip (m).
pub const EMBOUCHURE_ENTRY_RADIUS: f64 = 3.9e-3;

/// Trait for acoustic elements that can produce a 2×2 transfer matrix at a
/// given frequency.
pub trait AcousticElement: Send + Sync {
    /// Transfer matrix at `f` Hz, using the speed of sound and density
    /// assigned to the element.
    fn transfer_matrix(&self, f: f64) -> transfer_matrix::TransferMatrix;
}

/// Temperature and composition of the air inside the instrument.
///
/// Temperature falls off linearly with distance from the embouchure at
/// `gradient` °C/m and never drops below `t_ambient`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirConditions {
    /// Temperature at the embouchure in °C.
    pub t0: f64,
    /// Room temperature in °C.
    pub t_ambient: f64,
    /// Temperature gradient along the bore in °C/m.
    pub gradient: f64,
    /// Relative humidity (0–1).
    pub humidity: f64,
    /// CO₂ mole fraction.
    pub x_co2: f64,
}

impl Default for AirConditions {
    fn default() -> Self {
        Self::played()
    }
}

impl AirConditions {
    /// Air in a flute being played: warm, saturated breath cooling towards
    /// room temperature along the tube.
    pub fn played() -> Self {
        Self {
            t0: 30.3,
            t_ambient: 21.0,
            gradient: -7.7,
            humidity: 1.0,
            x_co2: 0.025,
        }
    }

    /// Still room air at a single temperature.
    pub fn uniform(temperature: f64, humidity: f64) -> Self {
        Self {
            t0: temperature,
            t_ambient: temperature,
            gradient: 0.0,
            humidity,
            x_co2: 0.0004,
        }
    }

    /// [`AirConditions::uniform`] with the temperature limited to 0–30 °C
    /// and the humidity to 0–1.
    pub fn try_uniform(temperature: f64, humidity: f64) -> std::result::Result<Self, ConfigError> {
        if !(0.0..=30.0).contains(&temperature) {
            return Err(ConfigError::Temperature(temperature));
        }
        if !(0.0..=1.0).contains(&humidity) {
            return Err(ConfigError::Humidity(humidity));
        }
        Ok(Self::uniform(temperature, humidity))
    }

    /// Temperature at distance `x` from the embouchure.
    pub fn temperature_at(&self, x: f64) -> f64 {
        (self.t0 + self.gradient * x).max(self.t_ambient)
    }

    /// Speed of sound (m/s) and density (kg/m³) at distance `x` from the
    /// embouchure.
    pub fn properties_at(&self, x: f64) -> (f64, f64) {
        air::speed_of_sound_and_density(self.temperature_at(x), self.humidity, self.x_co2)
    }
}

/// Check an embouchure entry ratio lies in (0, 1].
pub fn validate_entry_ratio(entry_ratio: f64) -> std::result::Result<f64, ConfigError> {
    if entry_ratio > 0.0 && entry_ratio <= 1.0 {
        Ok(entry_ratio)
    } else {
        Err(ConfigError::EntryRatio(entry_ratio))
    }
}

/// Check a MIDI note number lies in 1..=127. The face correction takes the
/// logarithm of the note, so note 0 has no meaning.
pub fn validate_midi(midi: u8) -> std::result::Result<u8, ConfigError> {
    if (1..=127).contains(&midi) {
        Ok(midi)
    } else {
        Err(ConfigError::Midi(midi))
    }
}
