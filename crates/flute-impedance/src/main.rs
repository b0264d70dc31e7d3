//! Acoustic impedance of flutes from a JSON geometry description.
//!
//! # Usage
//!
//! ```bash
//! # Input impedance of an instrument in room air
//! flute-impedance impedance flute.json --fingering XXXOOO --temperature 22
//!
//! # Played impedance in dB for a list of notes (midi<TAB>fingering per line)
//! flute-impedance played notes.tsv flute.json --low 250 --high 2500
//!
//! # Standing waves along the bore
//! flute-impedance waves 74 587.3 flute.json --fingering XOOOOO
//! ```
//!
//! Log output goes to stderr and is controlled by `RUST_LOG`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use flute_core::{
    impedance_sweep, played_sweep, pressure_profile, validate_entry_ratio, validate_midi,
    AirConditions, PlayedFingering, SweepRange, Woodwind, MAX_SEGMENT_LENGTH,
};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flute-impedance")]
#[command(about = "Transfer-matrix model of flute input impedance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RangeArgs {
    /// Lowest frequency in Hz
    #[arg(short, long, default_value_t = 200.0)]
    low: f64,

    /// Highest frequency in Hz
    #[arg(long, default_value_t = 4000.0)]
    high: f64,

    /// Frequency step in Hz
    #[arg(short = 'r', long, default_value_t = 2.0)]
    step: f64,
}

impl RangeArgs {
    fn range(&self) -> Result<SweepRange> {
        Ok(SweepRange::new(self.low, self.high, self.step)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Input impedance (real and imaginary parts) in still air
    Impedance {
        /// Instrument geometry (JSON)
        instrument: PathBuf,

        /// Hole fingering, one 'O' (open) or 'X' (closed) per hole
        #[arg(short, long, default_value = "")]
        fingering: String,

        /// Air temperature in °C (0 to 30)
        #[arg(short, long, default_value_t = 25.0)]
        temperature: f64,

        /// Relative humidity (0 to 1)
        #[arg(short = 'u', long, default_value_t = 0.5)]
        humidity: f64,

        #[command(flatten)]
        range: RangeArgs,

        /// Embouchure entry radius as a fraction of the outer radius
        #[arg(short, long, default_value_t = 1.0)]
        entry_ratio: f64,
    },

    /// Played impedance in dB for several notes
    Played {
        /// Notes to evaluate: one "midi<TAB>fingering" pair per line
        notes: PathBuf,

        /// Instrument geometry (JSON)
        instrument: PathBuf,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Pressure and flow along the bore at one frequency
    Waves {
        /// MIDI note number being played (1 to 127)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=127))]
        midi: u8,

        /// Frequency in Hz
        frequency: f64,

        /// Instrument geometry (JSON)
        instrument: PathBuf,

        /// Hole fingering, one 'O' (open) or 'X' (closed) per hole
        #[arg(short, long, default_value = "")]
        fingering: String,

        /// Distance between samples in metres
        #[arg(short = 'r', long, default_value_t = 2.0e-3)]
        step: f64,
    },
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_instrument(path: &Path) -> Result<Woodwind> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let woodwind: Woodwind = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse instrument {}", path.display()))?;
    info!(
        path = %path.display(),
        holes = woodwind.hole_count(),
        "loaded instrument"
    );
    Ok(woodwind)
}

fn parse_notes(text: &str) -> Result<Vec<PlayedFingering>> {
    let mut notes = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(midi) = fields.next() else {
            continue;
        };
        let midi = midi
            .parse()
            .with_context(|| format!("line {}: invalid MIDI number {midi:?}", number + 1))?;
        let midi = validate_midi(midi)
            .with_context(|| format!("line {}", number + 1))?;
        let fingering = fields.next().unwrap_or_default().to_string();
        if let Some(extra) = fields.next() {
            bail!("line {}: unexpected field {extra:?}", number + 1);
        }
        notes.push(PlayedFingering { midi, fingering });
    }
    if notes.is_empty() {
        bail!("no notes given");
    }
    Ok(notes)
}

/// Scientific notation with a six-digit mantissa and a signed two-digit
/// exponent, e.g. `2.000000e+02`.
fn sci(x: f64) -> String {
    let formatted = format!("{x:.6e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

fn run_impedance(
    instrument: &Path,
    fingering: &str,
    temperature: f64,
    humidity: f64,
    range: &RangeArgs,
    entry_ratio: f64,
) -> Result<()> {
    let air = AirConditions::try_uniform(temperature, humidity)?;
    let entry_ratio = validate_entry_ratio(entry_ratio)?;
    let range = range.range()?;

    let mut woodwind = load_instrument(instrument)?;
    woodwind.set_air_properties(&air);
    woodwind
        .set_fingering(fingering)
        .with_context(|| format!("{fingering:?} is an invalid fingering for this instrument"))?;

    let mut out = BufWriter::new(io::stdout().lock());
    for point in impedance_sweep(&mut woodwind, &range, entry_ratio) {
        writeln!(
            out,
            "{}\t{}\t{}",
            sci(point.frequency),
            sci(point.impedance.re),
            sci(point.impedance.im)
        )?;
    }
    out.flush()?;
    Ok(())
}

fn run_played(notes: &Path, instrument: &Path, range: &RangeArgs) -> Result<()> {
    let range = range.range()?;
    let text = fs::read_to_string(notes)
        .with_context(|| format!("failed to read {}", notes.display()))?;
    let notes = parse_notes(&text)
        .with_context(|| format!("failed to parse notes {}", notes.display()))?;

    let mut woodwind = load_instrument(instrument)?;
    woodwind.discretise(MAX_SEGMENT_LENGTH);
    woodwind.set_air_properties(&AirConditions::played());
    let rows = played_sweep(&mut woodwind, &range, &notes)?;

    let mut out = BufWriter::new(io::stdout().lock());
    for note in &notes {
        write!(out, "\t{}", note.midi)?;
    }
    writeln!(out)?;
    for row in rows {
        write!(out, "{:.2}", row.frequency)?;
        for db in row.magnitudes_db {
            write!(out, "\t{db:.3}")?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn run_waves(
    midi: u8,
    frequency: f64,
    instrument: &Path,
    fingering: &str,
    step: f64,
) -> Result<()> {
    if !frequency.is_finite() || frequency <= 0.0 {
        bail!("invalid frequency {frequency}");
    }
    let mut woodwind = load_instrument(instrument)?;
    woodwind.discretise(MAX_SEGMENT_LENGTH);
    woodwind.set_air_properties(&AirConditions::played());
    woodwind
        .set_fingering(fingering)
        .with_context(|| format!("{fingering:?} is an invalid fingering for this instrument"))?;

    let mut out = BufWriter::new(io::stdout().lock());
    for point in pressure_profile(&mut woodwind, frequency, midi, step)? {
        writeln!(
            out,
            "{:.1}\t{:.3}\t{:.3}",
            point.x * 1e3,
            point.pressure,
            point.flow
        )?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    match cli.command {
        Commands::Impedance {
            instrument,
            fingering,
            temperature,
            humidity,
            range,
            entry_ratio,
        } => run_impedance(
            &instrument,
            &fingering,
            temperature,
            humidity,
            &range,
            entry_ratio,
        ),
        Commands::Played {
            notes,
            instrument,
            range,
        } => run_played(&notes, &instrument, &range),
        Commands::Waves {
            midi,
            frequency,
            instrument,
            fingering,
            step,
        } => run_waves(midi, frequency, &instrument, &fingering, step),
    }
}
