use crate::error::ConfigError;
use crate::validate_midi;
use crate::woodwind::Woodwind;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An evenly spaced set of frequencies, `low + i·step` up to and including
/// `high`.
///
/// Built only through [`SweepRange::new`] or [`Default`], so a range always
/// ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepRange {
    low: f64,
    high: f64,
    step: f64,
}

impl Default for SweepRange {
    fn default() -> Self {
        Self {
            low: 200.0,
            high: 4000.0,
            step: 2.0,
        }
    }
}

impl SweepRange {
    /// Validate a range. Bounds given in the wrong order are swapped.
    pub fn new(low: f64, high: f64, step: f64) -> Result<Self, ConfigError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(ConfigError::Step(step));
        }
        if !low.is_finite() || !high.is_finite() || low <= 0.0 || high <= 0.0 {
            return Err(ConfigError::Frequency { low, high });
        }
        let (low, high) = if low > high { (high, low) } else { (low, high) };
        // a step below one ulp of `low` would repeat the first frequency forever
        if low + step == low {
            return Err(ConfigError::Step(step));
        }
        Ok(Self { low, high, step })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn frequencies(&self) -> impl Iterator<Item = f64> {
        let Self { low, high, step } = *self;
        (0u64..)
            .map(move |i| low + i as f64 * step)
            .take_while(move |&f| f <= high)
    }

    pub fn len(&self) -> usize {
        self.frequencies().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One sample of an impedance spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpedancePoint {
    pub frequency: f64,
    pub impedance: Complex64,
}

impl ImpedancePoint {
    /// `20·log10|Z|`.
    pub fn magnitude_db(&self) -> f64 {
        20.0 * self.impedance.norm().log10()
    }
}

/// A note to sweep: its pitch and the fingering that sounds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedFingering {
    pub midi: u8,
    pub fingering: String,
}

/// One frequency of a multi-fingering sweep, with `|Z|` in dB per
/// fingering.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedRow {
    pub frequency: f64,
    pub magnitudes_db: Vec<f64>,
}

/// Input impedance at every frequency in `range`.
pub fn impedance_sweep(
    woodwind: &mut Woodwind,
    range: &SweepRange,
    entry_ratio: f64,
) -> Vec<ImpedancePoint> {
    debug!(
        low = range.low(),
        high = range.high(),
        step = range.step(),
        entry_ratio,
        "impedance sweep"
    );
    range
        .frequencies()
        .map(|frequency| ImpedancePoint {
            frequency,
            impedance: woodwind.input_impedance(frequency, entry_ratio),
        })
        .collect()
}

/// Played impedance of each fingering at every frequency in `range`.
///
/// Fingerings are switched at each frequency so that every cell's open and
/// closed caches stay warm across the notes. Every note number is checked
/// before the sweep starts; a bad fingering stops it.
pub fn played_sweep(
    woodwind: &mut Woodwind,
    range: &SweepRange,
    notes: &[PlayedFingering],
) -> crate::Result<Vec<PlayedRow>> {
    debug!(
        low = range.low(),
        high = range.high(),
        step = range.step(),
        notes = notes.len(),
        "played sweep"
    );
    for note in notes {
        validate_midi(note.midi)?;
    }
    let mut rows = Vec::with_capacity(range.len());
    for frequency in range.frequencies() {
        let mut magnitudes_db = Vec::with_capacity(notes.len());
        for note in notes {
            woodwind.set_fingering(&note.fingering)?;
            let point = ImpedancePoint {
                frequency,
                impedance: woodwind.played_impedance(frequency, note.midi),
            };
            magnitudes_db.push(point.magnitude_db());
        }
        rows.push(PlayedRow {
            frequency,
            magnitudes_db,
        });
    }
    Ok(rows)
}
