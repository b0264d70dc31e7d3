//! Plane-wave propagation in a lossy cylindrical duct, after Fletcher and
//! Rossing (1998).

use num_complex::Complex64;
use std::f64::consts::PI;

/// Cross-sectional area (m²) of a duct of radius `a`.
pub fn area(a: f64) -> f64 {
    PI * a * a
}

/// Angular frequency of `f` Hz.
pub fn omega(f: f64) -> f64 {
    2.0 * PI * f
}

/// Lossless wave number `ω/c`.
pub fn lossless_wave_number(f: f64, c: f64) -> f64 {
    omega(f) / c
}

/// Phase velocity in a duct of radius `a`, slowed by boundary-layer effects.
pub fn phase_velocity(f: f64, c: f64, a: f64) -> f64 {
    c * (1.0 - 1.65e-3 / (a * f.sqrt()))
}

/// Wall-loss attenuation coefficient, scaled by `alpha_correction`
/// (0 disables losses, 1 is the nominal value).
pub fn attenuation(f: f64, a: f64, alpha_correction: f64) -> f64 {
    alpha_correction * (3.0e-5 * f.sqrt()) / a
}

/// Complex wave number `ω/v − j·α` including wall losses.
pub fn wave_number(f: f64, c: f64, a: f64, alpha_correction: f64) -> Complex64 {
    Complex64::new(
        omega(f) / phase_velocity(f, c, a),
        -attenuation(f, a, alpha_correction),
    )
}

/// Characteristic impedance `ρc/S` of a cylindrical duct of radius `a`.
pub fn characteristic_impedance(c: f64, rho: f64, a: f64) -> Complex64 {
    Complex64::new(rho * c / area(a), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_losses_scale_with_correction() {
        let k0 = wave_number(440.0, 343.0, 0.0095, 0.0);
        let k1 = wave_number(440.0, 343.0, 0.0095, 1.0);
        let k2 = wave_number(440.0, 343.0, 0.0095, 2.0);
        assert_eq!(k0.im, 0.0);
        assert!(k1.im < 0.0);
        assert!((k2.im - 2.0 * k1.im).abs() < 1e-15);
        assert_eq!(k0.re, k1.re);
    }

    #[test]
    fn test_narrow_ducts_are_slower() {
        let wide = phase_velocity(500.0, 343.0, 0.02);
        let narrow = phase_velocity(500.0, 343.0, 0.002);
        assert!(narrow < wide && wide < 343.0);
    }

    #[test]
    fn test_characteristic_impedance() {
        let z = characteristic_impedance(343.0, 1.2, 0.01);
        assert!((z.re - 1.2 * 343.0 / (PI * 1e-4)).abs() < 1e-6);
        assert_eq!(z.im, 0.0);
    }
}
