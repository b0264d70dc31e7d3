use crate::complex::{self, imaginary, real};
use crate::elements::{cone_matrix, tube_matrix};
use crate::hole::{
    inner_radiation_length_correction, matching_length_correction,
    open_hole_series_length_correction,
};
use crate::transfer_matrix::TransferMatrix;
use crate::wave::{characteristic_impedance, lossless_wave_number};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Wall losses applied in the riser.
const RISER_ALPHA_CORRECTION: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbouchureHole {
    /// Radius where the riser meets the bore.
    pub radius_in: f64,
    /// Radius at the lip plate.
    pub radius_out: f64,
    /// Riser length.
    pub length: f64,
    /// Radius of the main bore under the hole.
    pub bore_radius: f64,
    #[serde(skip)]
    pub c: f64,
    #[serde(skip)]
    pub rho: f64,
}

impl EmbouchureHole {
    pub fn new(radius_in: f64, radius_out: f64, length: f64, bore_radius: f64) -> Self {
        Self {
            radius_in,
            radius_out,
            length,
            bore_radius,
            c: 0.0,
            rho: 0.0,
        }
    }

    /// Two-port from the lip plate into the main bore.
    ///
    /// `entry_ratio` scales `radius_out` to the effective entry radius and
    /// `branch_z` is the impedance of the bore on the far side of the hole
    /// from the one being cascaded.
    pub fn matrix(&self, f: f64, entry_ratio: f64, branch_z: Complex64) -> TransferMatrix {
        let k = lossless_wave_number(f, self.c);
        let z0_hole = characteristic_impedance(self.c, self.rho, self.radius_in).re;
        let z0_bore = characteristic_impedance(self.c, self.rho, self.bore_radius).re;
        let t_m = matching_length_correction(self.bore_radius, self.radius_in);

        // jet losses at the entry
        let mut m = TransferMatrix {
            b: self.series_resistance(f, entry_ratio),
            c: self.shunt_conductance(f, entry_ratio),
            ..TransferMatrix::identity()
        };

        let radius_out = entry_ratio * self.radius_out;
        let riser = if self.radius_in == radius_out {
            tube_matrix(
                f,
                self.c,
                self.rho,
                self.length + t_m,
                self.radius_in,
                RISER_ALPHA_CORRECTION,
            )
        } else {
            cone_matrix(
                f,
                self.c,
                self.rho,
                self.length + t_m,
                radius_out,
                self.radius_in,
                RISER_ALPHA_CORRECTION,
            )
        };
        m.right_multiply(&riser);

        let t_i = inner_radiation_length_correction(self.bore_radius, self.radius_in)
            + length_correction(self.bore_radius, self.radius_in);
        m.right_multiply(&TransferMatrix::series(imaginary(t_i * k * z0_hole)));

        // corner: half the series impedance on each side of the branch
        let t_a = open_hole_series_length_correction(self.bore_radius, self.radius_in);
        let half_z_a = complex::div(imaginary(t_a * k * z0_bore), real(2.0));
        let corner = TransferMatrix {
            b: half_z_a,
            c: complex::div(complex::ONE, branch_z + half_z_a),
            ..TransferMatrix::identity()
        };
        m.right_multiply(&corner);
        m
    }

    /// Empirical series resistance of the jet.
    pub fn series_resistance(&self, f: f64, entry_ratio: f64) -> Complex64 {
        real(self.entry_impedance(entry_ratio) * 6.9e-6 * f)
    }

    /// Empirical shunt conductance of the jet.
    pub fn shunt_conductance(&self, f: f64, entry_ratio: f64) -> Complex64 {
        real(1.3e-4 * f / self.entry_impedance(entry_ratio))
    }

    fn entry_impedance(&self, entry_ratio: f64) -> f64 {
        characteristic_impedance(self.c, self.rho, entry_ratio * self.radius_out).re
    }
}

/// Extra inner length correction of an embouchure hole of radius `b` in a
/// bore of radius `a`.
pub fn length_correction(a: f64, b: f64) -> f64 {
    let delta = b / a;
    b * 0.5 * delta.powi(2)
}
