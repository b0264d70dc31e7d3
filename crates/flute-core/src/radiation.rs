//! Radiation impedance of open and closed terminations.
//!
//! Refer to Dalmont, Nederveen and Joly (2001), "Radiation impedance of tubes
//! with different flanges: numerical and experimental investigations",
//! J. Sound Vib. 244(3), 505–534. Equation numbers below are theirs.

use crate::complex::{self, real, J, ONE, OPEN_CIRCUIT};
use crate::wave::{characteristic_impedance, lossless_wave_number};
use num_complex::Complex64;

/// Flange value for a stopped (rigid) termination.
pub const STOPPED: f64 = -1.0;

/// Flange value for an unflanged open pipe.
pub const UNFLANGED: f64 = 0.0;

/// Radiation impedance of a termination of radius `a`.
///
/// `flange` selects the model: negative for a stopped end
/// ([`OPEN_CIRCUIT`]), zero for an unflanged pipe, otherwise the ratio of
/// annulus thickness to `a`. An infinite ratio is the infinite-flange limit.
pub fn radiation_impedance(f: f64, c: f64, rho: f64, a: f64, flange: f64) -> Complex64 {
    if flange < 0.0 {
        return OPEN_CIRCUIT;
    }
    if flange == 0.0 {
        return unflanged_impedance(f, c, rho, a);
    }

    let k = lossless_wave_number(f, c);
    let ka = k * a;
    let z0 = characteristic_impedance(c, rho, a);

    let d_unflanged = end_correction(unflanged_impedance(f, c, rho, a), z0, k);
    let d_flanged = end_correction(flanged_impedance(f, c, rho, a), z0, k);

    let b = a * (1.0 + flange);
    let a_on_b = a / b;

    // (41): blend between the two limiting cases
    let d = d_flanged
        + real(a_on_b) * (d_unflanged - d_flanged)
        + real(0.057 * a_on_b * (1.0 - a_on_b.powi(5)) * a);

    // (42): reflection without the edge wave, then the diffracted term
    let mut r = -complex::exp(Complex64::new(0.0, -2.0 * k) * d);
    if b.is_finite() {
        let mod_edge = -0.43 * (b - a) * a / b.powi(2) * (k * b / (1.85 - a_on_b)).sin().powi(2);
        let phase_edge = -k * b * (1.0 + a_on_b * (2.3 - a_on_b - 0.3 * ka.powi(2)));
        r += real(mod_edge) * complex::exp_j(real(phase_edge));
    }

    z0 * complex::div(ONE + r, ONE - r)
}

/// Radiation impedance of an unflanged pipe, (14b) and (14c).
pub fn unflanged_impedance(f: f64, c: f64, rho: f64, a: f64) -> Complex64 {
    let k = lossless_wave_number(f, c);
    let ka = k * a;
    let ka2 = ka.powi(2);
    let ratio = (1.0 + 0.044 * ka2) / (1.0 + 0.19 * ka2);
    let length = 0.6133 * a * (ratio - 0.02 * (2.0 * ka).sin().powi(2));
    let mod_r = (1.0 + 0.2 * ka - 0.084 * ka2) / (1.0 + 0.2 * ka + (0.5 - 0.084) * ka2);
    impedance_from_end_correction(characteristic_impedance(c, rho, a), k, length, mod_r)
}

/// Radiation impedance of an infinitely flanged pipe, (15a) and (15b).
pub fn flanged_impedance(f: f64, c: f64, rho: f64, a: f64) -> Complex64 {
    let k = lossless_wave_number(f, c);
    let ka = k * a;
    let length = 0.8216 * a / (1.0 + (0.77 * ka).powi(2) / (1.0 + 0.77 * ka));
    let ka2 = ka.powi(2);
    let mod_r = (1.0 + 0.323 * ka - 0.077 * ka2) / (1.0 + 0.323 * ka + (1.0 - 0.077) * ka2);
    impedance_from_end_correction(characteristic_impedance(c, rho, a), k, length, mod_r)
}

/// Complex end correction `atan(Z/(j·Z0))/k` equivalent to the load `z`.
pub fn end_correction(z: Complex64, z0: Complex64, k: f64) -> Complex64 {
    complex::div(complex::atan(complex::div(z, J * z0)), real(k))
}

/// `j·Z0·tan(k·d)` for a complex length `d`.
pub fn end_correction_impedance(z0: Complex64, k: f64, d: Complex64) -> Complex64 {
    J * (z0 * complex::tan(real(k) * d))
}

// (9): the imaginary part of the end correction carries |R|.
fn impedance_from_end_correction(z0: Complex64, k: f64, length: f64, mod_r: f64) -> Complex64 {
    let d = Complex64::new(length, mod_r.ln() / (2.0 * k));
    end_correction_impedance(z0, k, d)
}
