use thiserror::Error;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fingering(#[from] FingeringError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A fingering string that does not describe the instrument's holes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingeringError {
    #[error("fingering has {found} holes but the instrument has {expected}")]
    Length { expected: usize, found: usize },

    #[error(
        "invalid fingering character {character:?} at position {position} (expected 'O' or 'X')"
    )]
    Character { character: char, position: usize },
}

/// An out-of-range configuration value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("frequency step {0} is not positive or does not advance the sweep")]
    Step(f64),

    #[error("frequencies must be positive and finite, got {low}..{high}")]
    Frequency { low: f64, high: f64 },

    #[error("temperature {0} °C is outside 0..=30")]
    Temperature(f64),

    #[error("relative humidity {0} is outside 0..=1")]
    Humidity(f64),

    #[error("entry ratio {0} is outside (0, 1]")]
    EntryRatio(f64),

    #[error("profile step must be positive, got {0}")]
    ProfileStep(f64),

    #[error("MIDI note {0} is outside 1..=127")]
    Midi(u8),
}
