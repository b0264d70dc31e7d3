//! Tone holes, their keys, and the equivalent circuit of a hole in the bore.
//!
//! A hole appears in the main bore as a shunt `1/(Z_i + Z_hole)` followed by
//! a series impedance `Z_a`. `Z_hole` is the input impedance of the chimney
//! loaded by a termination chosen by fingering and by the presence of a key.
//! Length corrections follow Dalmont et al. (2002), Nederveen et al. (1998)
//! and Dubos et al. (1999).

use crate::complex::{self, imaginary, real, OPEN_CIRCUIT};
use crate::elements::tube_matrix;
use crate::radiation::{
    end_correction, end_correction_impedance, flanged_impedance, radiation_impedance,
};
use crate::transfer_matrix::TransferMatrix;
use crate::wave::{characteristic_impedance, lossless_wave_number};
use crate::AcousticElement;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Empirical corrections, as fractions of the hole radius.
pub const CORR_OPEN_FINGER_HOLE_LENGTH: f64 = -0.15;
pub const CORR_OPEN_KEYED_HOLE_LENGTH: f64 = 0.1;
pub const CORR_CLOSED_FINGER_HOLE_LENGTH: f64 = -0.76;
pub const CORR_CLOSED_KEYED_HOLE_LENGTH: f64 = -0.05;

/// Wall losses applied inside hole chimneys.
const HOLE_ALPHA_CORRECTION: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fingering {
    #[default]
    Open,
    Closed,
}

impl Fingering {
    /// `'O'` is open and `'X'` is closed; anything else is not a fingering.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'O' => Some(Fingering::Open),
            'X' => Some(Fingering::Closed),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Fingering::Open => 'O',
            Fingering::Closed => 'X',
        }
    }
}

/// Geometry of a key covering a hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Radius of the key pad.
    pub radius: f64,
    /// Radius of the perforation in the pad (zero for a solid pad).
    pub hole_radius: f64,
    /// Regulation height of the open key above the chimney.
    pub height: f64,
    /// Pad thickness.
    pub thickness: f64,
    /// Thickness of the chimney wall.
    pub wall_thickness: f64,
    /// Height of the chimney above the bore; zero for holes cut straight
    /// into the tube.
    pub chimney_height: f64,
}

/// A tone hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub radius: f64,
    /// Chimney length.
    pub length: f64,
    /// Radius of the main bore at the hole.
    pub bore_radius: f64,
    #[serde(default)]
    pub key: Option<Key>,
    #[serde(skip)]
    pub c: f64,
    #[serde(skip)]
    pub rho: f64,
    #[serde(default)]
    pub fingering: Fingering,
}

impl Hole {
    pub fn new(radius: f64, length: f64, bore_radius: f64, key: Option<Key>) -> Self {
        Self {
            radius,
            length,
            bore_radius,
            key,
            c: 0.0,
            rho: 0.0,
            fingering: Fingering::Open,
        }
    }

    fn k(&self, f: f64) -> f64 {
        lossless_wave_number(f, self.c)
    }

    fn z0_hole(&self) -> Complex64 {
        characteristic_impedance(self.c, self.rho, self.radius)
    }

    /// Input impedance of the chimney (including the matching volume) seen
    /// from the bore.
    pub fn input_impedance(&self, f: f64) -> Complex64 {
        let t = self.length + matching_length_correction(self.bore_radius, self.radius);
        let chimney = tube_matrix(f, self.c, self.rho, t, self.radius, HOLE_ALPHA_CORRECTION);
        chimney.input_impedance(self.load_impedance(f))
    }

    /// Termination of the chimney for the current fingering.
    pub fn load_impedance(&self, f: f64) -> Complex64 {
        match (self.fingering, &self.key) {
            (Fingering::Closed, None) => self.closed_finger_load(f),
            (Fingering::Closed, Some(_)) => self.closed_keyed_load(f),
            (Fingering::Open, None) => self.open_finger_load(f),
            (Fingering::Open, Some(key)) => self.open_keyed_load(f, key),
        }
    }

    /// A finger covering the hole: a short closed tube.
    pub fn closed_finger_load(&self, f: f64) -> Complex64 {
        let delta = self.radius / self.bore_radius;
        let t_finger = CORR_CLOSED_FINGER_HOLE_LENGTH * delta * self.radius;
        imaginary(-self.z0_hole().re / (self.k(f) * t_finger).tan())
    }

    /// A pad resting on the chimney.
    pub fn closed_keyed_load(&self, f: f64) -> Complex64 {
        let t_keypad = CORR_CLOSED_KEYED_HOLE_LENGTH * self.radius;
        if t_keypad == 0.0 {
            return OPEN_CIRCUIT;
        }
        imaginary(-self.z0_hole().re / (self.k(f) * t_keypad).tan())
    }

    /// Radiation from an open finger hole, flanged by the outside of the
    /// tube wall.
    pub fn open_finger_load(&self, f: f64) -> Complex64 {
        let a = self.radius;
        let b = self.bore_radius + self.length;
        let k = self.k(f);
        let z0 = self.z0_hole();
        let d_flanged = end_correction(flanged_impedance(f, self.c, self.rho, a), z0, k);
        let thick_wall = real(0.47 * a * (a / b).powf(0.8));
        let d_cylinder = d_flanged - thick_wall + real(CORR_OPEN_FINGER_HOLE_LENGTH * a);
        end_correction_impedance(z0, k, d_cylinder)
    }

    /// Radiation from a hole with an open key hovering above it, after
    /// Dalmont et al. (2001) eqs. (48), (51) and (52).
    pub fn open_keyed_load(&self, f: f64, key: &Key) -> Complex64 {
        let a = self.radius;
        let d = key.radius;
        let q = key.hole_radius;
        let h = key.height;
        let e = key.thickness;
        // holes cut straight into the tube have no chimney wall to act as a
        // finite flange
        let w = if key.chimney_height == 0.0 {
            f64::INFINITY
        } else {
            key.wall_thickness
        };
        let k = self.k(f);
        let z0 = self.z0_hole();

        let chimney_term = 3.5 * (h / a).powf(0.8) * (h / a + 3.0 * w / a).powf(-0.4);
        let pad_term = 30.0 * (h / d).powf(2.6);
        let mut d_corr = a / (chimney_term + pad_term);
        d_corr += CORR_OPEN_KEYED_HOLE_LENGTH * a;
        if q > 0.0 {
            let d_e_on_a = 1.64 * a / q - 0.15 * a / d - 1.1 + e * a / (q * q);
            d_corr /= 1.0 + 5.0 * d_e_on_a.powf(-1.35) * (h / a).powf(-0.2);
        }

        let z_annulus = radiation_impedance(f, self.c, self.rho, a, w / a);
        let d_disk = end_correction(z_annulus, z0, k) + real(d_corr);
        let z = end_correction_impedance(z0, k, d_disk);
        // empirical resistance
        z + z0 * real(0.4 * (k * a).powi(2))
    }

    /// Inner radiation (added mass on the bore side of the hole).
    pub fn inner_radiation_impedance(&self, f: f64) -> Complex64 {
        let t_i = inner_radiation_length_correction(self.bore_radius, self.radius);
        imaginary(t_i * self.k(f) * self.z0_hole().re)
    }

    /// Series impedance from flow widening at the junction.
    pub fn series_impedance(&self, f: f64) -> Complex64 {
        let a = self.bore_radius;
        let b = self.radius;
        let delta = b / a;
        let t = self.length;
        let z0 = characteristic_impedance(self.c, self.rho, a).re;
        let t_a = match self.fingering {
            Fingering::Closed => {
                let t_0 = if self.key.is_none() {
                    let taper = 0.4 / (6.5 * t / a).cosh() * (delta - 1.0);
                    b * (0.55 - 0.15 / (9.0 * t / a).cosh() + taper)
                } else {
                    0.0
                };
                closed_hole_series_length_correction(a, b, t - t_0)
            }
            Fingering::Open => open_hole_series_length_correction(a, b),
        };
        imaginary(t_a * self.k(f) * z0)
    }

    /// Two-port of the bore across the hole.
    pub fn traverse_matrix(&self, f: f64) -> TransferMatrix {
        let z_hole = self.input_impedance(f);
        let z_i = self.inner_radiation_impedance(f);
        let z_a = self.series_impedance(f);
        TransferMatrix {
            b: z_a,
            c: complex::div(complex::ONE, z_i + z_hole),
            ..TransferMatrix::identity()
        }
    }
}

impl AcousticElement for Hole {
    fn transfer_matrix(&self, f: f64) -> TransferMatrix {
        self.traverse_matrix(f)
    }
}

/// Length correction for the matching volume where a hole of radius `b`
/// meets a bore of radius `a` (Dalmont 2002 eq. 6, Nederveen 1998 eq. 37).
pub fn matching_length_correction(a: f64, b: f64) -> f64 {
    let delta = b / a;
    b * delta * (1.0 + 0.207 * delta.powi(3)) / 8.0
}

/// Inner radiation length correction (Dalmont 2002 eq. 4, Nederveen 1998
/// eq. 40).
pub fn inner_radiation_length_correction(a: f64, b: f64) -> f64 {
    let delta = b / a;
    b * (0.82 - 1.4 * delta.powi(2) + 0.75 * delta.powf(2.7))
}

/// Series length correction for a closed hole with effective height `t`.
pub fn closed_hole_series_length_correction(a: f64, b: f64, t: f64) -> f64 {
    let delta = b / a;
    let tail = 0.940 + 0.540 * delta + 0.285 * delta.powi(2);
    if t > 0.0 {
        -b * delta.powi(2) / (1.78 / (1.84 * t / b).tanh() + tail)
    } else if t < 0.0 {
        -b * delta.powi(2) / (1.78 / (1.84 * t / b) + tail)
    } else {
        0.0
    }
}

/// Series length correction for an open hole (Dubos 1999 eq. 74, without
/// the dependence on height).
pub fn open_hole_series_length_correction(a: f64, b: f64) -> f64 {
    let delta = b / a;
    -b * delta.powi(2) / (1.78 + 0.940 + 0.540 * delta + 0.285 * delta.powi(2))
}
