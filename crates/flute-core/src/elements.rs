use crate::bessel;
use crate::complex::{self, imaginary, real, J, ZERO};
use crate::transfer_matrix::TransferMatrix;
use crate::wave::{area, characteristic_impedance, omega, wave_number};

/// Number of evanescent modes summed by [`discontinuity_matrix`] in the
/// reference model. Every mode adds a positive inertance that shrinks as a
/// power of `n`, so a lower order slightly underestimates the added mass.
pub const DISCONTINUITY_ORDER: usize = 100;

/// A uniform cylindrical duct of length `l` and radius `a`.
pub fn tube_matrix(
    f: f64,
    c: f64,
    rho: f64,
    l: f64,
    a: f64,
    alpha_correction: f64,
) -> TransferMatrix {
    if l == 0.0 {
        return TransferMatrix::identity();
    }
    let z0 = characteristic_impedance(c, rho, a);
    let jkl = J * (wave_number(f, c, a, alpha_correction) * real(l));
    let cosh = complex::cosh(jkl);
    let sinh = complex::sinh(jkl);
    TransferMatrix::new(cosh, z0 * sinh, complex::div(sinh, z0), cosh)
}

/// A truncated cone of length `l` from radius `a1` to radius `a2`.
///
/// Uses the distances from the apex to each end, found from similar
/// triangles. A cone with equal end radii has no apex and is evaluated as a
/// cylinder.
pub fn cone_matrix(
    f: f64,
    c: f64,
    rho: f64,
    l: f64,
    a1: f64,
    a2: f64,
    alpha_correction: f64,
) -> TransferMatrix {
    if l == 0.0 {
        return TransferMatrix::identity();
    }
    if a1 == a2 {
        return tube_matrix(f, c, rho, l, a1, alpha_correction);
    }

    let rhoc = rho * c;
    let x1 = l / (a2 / a1 - 1.0);
    let x2 = x1 + l;
    let a2 = a1 * (1.0 + l / x1);
    let s1 = area(a1);
    let s2 = area(a2);

    // geometric mean radius for the wall losses
    let k = wave_number(f, c, (a1 * a2).sqrt(), alpha_correction);
    let kl = k * real(l);
    let theta1 = complex::atan(k * real(x1));
    let theta2 = complex::atan(k * real(x2));
    let sin_theta1 = complex::sin(theta1);
    let sin_theta2 = complex::sin(theta2);

    let a = -complex::div(complex::sin(kl - theta2), sin_theta2);
    let b = J * (real(rhoc / s2) * complex::sin(kl));
    let sin_sum = complex::sin(kl + (theta1 - theta2));
    let c = imaginary(s1 / rhoc) * complex::div(sin_sum, sin_theta1 * sin_theta2);
    let d = real(s1 / s2) * complex::div(complex::sin(kl + theta1), sin_theta1);
    TransferMatrix::new(a, b, c, d)
}

/// An abrupt change of radius from `a1` to `a2`, after Pagneux, Amir and
/// Kergomard (1996) J. Acoust. Soc. Am. 100, 2034–2048.
///
/// The plane wave couples to `order` evanescent modes whose reactive energy
/// appears as a series inertance; only `b` differs from the identity.
pub fn discontinuity_matrix(
    f: f64,
    c: f64,
    rho: f64,
    a1: f64,
    a2: f64,
    order: usize,
) -> TransferMatrix {
    let x = a1 / a2;
    let w = omega(f);
    let s2 = area(a2);
    let mut correction = ZERO;
    for gamma in bessel::j1_zeros(order) {
        let f0n = 2.0 * bessel::j1(x * gamma) / (x * gamma * bessel::j0(gamma));
        let k_squared = real((w / c).powi(2) - (gamma / a2).powi(2));
        let k = -complex::sqrt(k_squared);
        let z_mode = complex::div(real(w * rho / s2), k);
        correction += z_mode * real(f0n.powi(2));
    }
    TransferMatrix::series(correction)
}
