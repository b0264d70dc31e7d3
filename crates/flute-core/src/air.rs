//! Thermodynamic properties of humid air.
//!
//! Temperatures `t` are in °C unless a parameter is named `t_kelvin`,
//! pressures in Pa, humidity as a fraction between 0 and 1 and CO₂ as a mole
//! fraction. Parameter ranges are not enforced.

/// Standard atmospheric pressure in Pa.
pub const P_ATM: f64 = 101_325.0;

const KELVIN_OFFSET: f64 = 273.15;

/// Saturation vapour pressure of water (Pa) at absolute temperature `t_kelvin`.
pub fn saturation_vapour_pressure(t_kelvin: f64) -> f64 {
    const C1: f64 = 1.2811805e-5;
    const C2: f64 = 1.9509874e-2;
    const C3: f64 = 34.04926034;
    const C4: f64 = 6.3536311e3;
    (C1 * t_kelvin.powi(2) - C2 * t_kelvin + C3 - C4 / t_kelvin).exp()
}

/// Mole fraction of water vapour from relative humidity, using the
/// enhancement factor of Cramer (1993), appendix.
pub fn water_mole_fraction(t: f64, p: f64, h: f64) -> f64 {
    let f = 1.00062 + 3.14e-8 * p + 5.6e-7 * t.powi(2);
    h * f * saturation_vapour_pressure(t + KELVIN_OFFSET) / p
}

/// Speed of sound (m/s) in humid air with relative humidity `h`.
pub fn speed_of_sound(t: f64, p: f64, h: f64, x_c: f64) -> f64 {
    speed_of_sound_cramer(t, p, water_mole_fraction(t, p, h), x_c)
}

/// Speed of sound (m/s) from Cramer (1993) J. Acoust. Soc. Am. 93(5), p. 2514,
/// given the mole fractions of water vapour `x_w` and CO₂ `x_c`.
pub fn speed_of_sound_cramer(t: f64, p: f64, x_w: f64, x_c: f64) -> f64 {
    const A: [f64; 16] = [
        331.5024, 0.603055, -0.000528, 51.471935, 0.1495874, -0.000782, -1.82e-7, 3.73e-8,
        -2.93e-10, -85.20931, -0.228525, 5.91e-5, -2.835149, -2.15e-13, 29.179762, 0.000486,
    ];
    let terms = [
        1.0,
        t,
        t.powi(2),
        x_w,
        t * x_w,
        t.powi(2) * x_w,
        p,
        t * p,
        t.powi(2) * p,
        x_c,
        t * x_c,
        t.powi(2) * x_c,
        x_w.powi(2),
        p.powi(2),
        x_c.powi(2),
        x_w * p * x_c,
    ];
    A.iter().zip(terms.iter()).map(|(a, term)| a * term).sum()
}

/// Density of air (kg/m³) from the ideal gas law applied to the partial
/// pressures of dry air, water vapour and CO₂.
pub fn density_ideal(t: f64, p: f64, h: f64, x_c: f64) -> f64 {
    const R_AIR: f64 = 287.05;
    const R_WATER: f64 = 461.5;
    const R_CO2: f64 = 189.0;
    let t_kelvin = t + KELVIN_OFFSET;
    let p_w = h * saturation_vapour_pressure(t_kelvin);
    let p_c = x_c * p;
    let p_a = p - p_w - p_c;
    p_a / (R_AIR * t_kelvin) + p_w / (R_WATER * t_kelvin) + p_c / (R_CO2 * t_kelvin)
}

/// Density of air (kg/m³) after Giacomo (1982), Metrologia 18, 33–40.
pub fn density_giacomo(t: f64, p: f64, h: f64, x_c: f64) -> f64 {
    const R: f64 = 8.314472;
    const M_WATER: f64 = 18.015e-3;
    let t_kelvin = t + KELVIN_OFFSET;
    let m_air = (28.9635 + 12.011 * (x_c - 0.0004)) * 1e-3;
    let x_w = water_mole_fraction(t, p, h);
    let z = compressibility(t, p, x_w);
    p * m_air * (1.0 - x_w * (1.0 - M_WATER / m_air)) / (z * R * t_kelvin)
}

/// Compressibility factor of humid air.
pub fn compressibility(t: f64, p: f64, x_w: f64) -> f64 {
    const A0: f64 = 1.62419e-6;
    const A1: f64 = -2.8969e-8;
    const A2: f64 = 1.0880e-10;
    const B0: f64 = 5.757e-6;
    const B1: f64 = -2.589e-8;
    const C0: f64 = 1.9297e-4;
    const C1: f64 = -2.285e-6;
    const D: f64 = 1.73e-11;
    const E: f64 = -1.034e-8;
    let t_kelvin = t + KELVIN_OFFSET;
    let a_term = A0 + A1 * t + A2 * t.powi(2);
    let b_term = (B0 + B1 * t) * x_w;
    let c_term = (C0 + C1 * t) * x_w.powi(2);
    1.0 - p * (a_term + b_term + c_term) / t_kelvin
        + p.powi(2) * (D + E * x_w.powi(2)) / t_kelvin.powi(2)
}

/// Speed of sound (m/s) and density (kg/m³) at atmospheric pressure.
pub fn speed_of_sound_and_density(t: f64, humidity: f64, x_co2: f64) -> (f64, f64) {
    (
        speed_of_sound(t, P_ATM, humidity, x_co2),
        density_giacomo(t, P_ATM, humidity, x_co2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_speed_of_sound_at_20c() {
        let (c, rho) = speed_of_sound_and_density(20.0, 0.0, 0.000314);
        assert!((c - 343.2).abs() < 0.5, "c = {c}");
        assert!((rho - 1.204).abs() < 0.01, "rho = {rho}");
    }

    #[test]
    fn test_humidity_raises_speed_and_lowers_density() {
        let (c_dry, rho_dry) = speed_of_sound_and_density(25.0, 0.0, 0.0004);
        let (c_wet, rho_wet) = speed_of_sound_and_density(25.0, 0.5, 0.0004);
        assert!(c_wet > c_dry);
        assert!(rho_wet < rho_dry);
        assert!((c_wet - 347.0).abs() < 1.0, "c = {c_wet}");
    }

    #[test]
    fn test_vapour_pressure_at_boiling_point() {
        let p = saturation_vapour_pressure(373.15);
        assert!((p - P_ATM).abs() / P_ATM < 0.01, "p_sv = {p}");
    }

    #[test]
    fn test_density_models_agree() {
        let ideal = density_ideal(20.0, P_ATM, 0.5, 0.0004);
        let giacomo = density_giacomo(20.0, P_ATM, 0.5, 0.0004);
        assert_abs_diff_eq!(ideal, giacomo, epsilon = 5e-3);
    }

    #[test]
    fn test_dry_air_is_nearly_ideal() {
        let z = compressibility(20.0, P_ATM, 0.0);
        assert!(z < 1.0 && z > 0.999, "Z = {z}");
    }
}
