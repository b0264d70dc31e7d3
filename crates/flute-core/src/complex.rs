//! Complex arithmetic with an open-circuit sentinel.
//!
//! Values are plain [`Complex64`]. The functions here differ from the
//! inherent `num_complex` methods in two ways: division by exact zero yields
//! [`OPEN_CIRCUIT`] instead of NaN, and the transcendental functions are built
//! from the exponential and logarithm identities so that every impedance in
//! the engine is evaluated the same way.

use num_complex::Complex64;

pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);
pub const ONE: Complex64 = Complex64::new(1.0, 0.0);
pub const J: Complex64 = Complex64::new(0.0, 1.0);

/// Infinite impedance (zero admittance).
///
/// Produced by dividing by exact zero and recognised by
/// [`TransferMatrix::input_impedance`](crate::transfer_matrix::TransferMatrix::input_impedance)
/// as a rigid termination. Compares equal to itself.
pub const OPEN_CIRCUIT: Complex64 = Complex64::new(f64::MAX, 0.0);

/// True if `z` is exactly the open-circuit sentinel.
pub fn is_open_circuit(z: Complex64) -> bool {
    z == OPEN_CIRCUIT
}

pub fn real(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

pub fn imaginary(y: f64) -> Complex64 {
    Complex64::new(0.0, y)
}

/// `z1 / z2`, or [`OPEN_CIRCUIT`] when `z2` is exactly zero.
pub fn div(z1: Complex64, z2: Complex64) -> Complex64 {
    if z2 == ZERO {
        return OPEN_CIRCUIT;
    }
    let denom = z2.re * z2.re + z2.im * z2.im;
    Complex64::new(
        (z1.re * z2.re + z1.im * z2.im) / denom,
        (z1.im * z2.re - z1.re * z2.im) / denom,
    )
}

/// Principal argument, `atan2(im, re)`.
pub fn arg(z: Complex64) -> f64 {
    z.im.atan2(z.re)
}

pub fn modulus(z: Complex64) -> f64 {
    (z.re * z.re + z.im * z.im).sqrt()
}

pub fn exp(z: Complex64) -> Complex64 {
    let m = z.re.exp();
    Complex64::new(m * z.im.cos(), m * z.im.sin())
}

/// `exp(j·z)`.
pub fn exp_j(z: Complex64) -> Complex64 {
    exp(J * z)
}

/// Principal logarithm.
pub fn ln(z: Complex64) -> Complex64 {
    Complex64::new(modulus(z).ln(), arg(z))
}

/// Principal square root, `sqrt(|z|)·exp(j·arg(z)/2)`.
pub fn sqrt(z: Complex64) -> Complex64 {
    real(modulus(z).sqrt()) * exp_j(real(arg(z) / 2.0))
}

pub fn cosh(z: Complex64) -> Complex64 {
    div(exp(z) + exp(-z), real(2.0))
}

pub fn sinh(z: Complex64) -> Complex64 {
    div(exp(z) - exp(-z), real(2.0))
}

pub fn cos(z: Complex64) -> Complex64 {
    cosh(J * z)
}

pub fn sin(z: Complex64) -> Complex64 {
    div(sinh(J * z), J)
}

pub fn tan(z: Complex64) -> Complex64 {
    div(sin(z), cos(z))
}

pub fn cot(z: Complex64) -> Complex64 {
    div(cos(z), sin(z))
}

/// Inverse tangent, `(j/2)·ln((j + z)/(j − z))`.
pub fn atan(z: Complex64) -> Complex64 {
    div(J, real(2.0)) * ln(div(J + z, J - z))
}

/// Two impedances in parallel.
pub fn parallel(z1: Complex64, z2: Complex64) -> Complex64 {
    div(z1 * z2, z1 + z2)
}
