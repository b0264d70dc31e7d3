use crate::complex::{self, ONE, ZERO};
use num_complex::Complex64;

/// A 2×2 complex transfer matrix representing an acoustic two-port.
///
/// ```text
/// [p_in]   [a  b] [p_out]
/// [U_in] = [c  d] [U_out]
/// ```
///
/// Flow is positive into the input and out of the output. `b` carries units
/// of acoustic impedance and `c` of acoustic admittance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferMatrix {
    pub a: Complex64,
    pub b: Complex64,
    pub c: Complex64,
    pub d: Complex64,
}

impl Default for TransferMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransferMatrix {
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { a, b, c, d }
    }

    /// Identity matrix (no-op element).
    pub fn identity() -> Self {
        Self {
            a: ONE,
            b: ZERO,
            c: ZERO,
            d: ONE,
        }
    }

    /// A series impedance `z`.
    pub fn series(z: Complex64) -> Self {
        Self {
            b: z,
            ..Self::identity()
        }
    }

    /// A shunt admittance `y`.
    pub fn shunt(y: Complex64) -> Self {
        Self {
            c: y,
            ..Self::identity()
        }
    }

    /// Chain (multiply) this matrix with another: self · other.
    pub fn chain(&self, other: &TransferMatrix) -> TransferMatrix {
        TransferMatrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
        }
    }

    /// Replace self with `other · self` (prepend an upstream section).
    pub fn left_multiply(&mut self, other: &TransferMatrix) {
        *self = other.chain(self);
    }

    /// Replace self with `self · other` (append a downstream section).
    pub fn right_multiply(&mut self, other: &TransferMatrix) {
        *self = self.chain(other);
    }

    pub fn determinant(&self) -> Complex64 {
        self.a * self.d - self.b * self.c
    }

    /// Invert in place. A zero determinant leaves every element at the
    /// open-circuit sentinel.
    pub fn invert(&mut self) {
        *self = self.inverse();
    }

    pub fn inverse(&self) -> TransferMatrix {
        let det = self.determinant();
        TransferMatrix {
            a: complex::div(self.d, det),
            b: complex::div(-self.b, det),
            c: complex::div(-self.c, det),
            d: complex::div(self.a, det),
        }
    }

    /// Input impedance seen through this matrix when the output is loaded by
    /// `z_load`.
    ///
    /// The load is expressed as a normalised pressure/flow pair
    /// (`Z/(Z+1)`, `1/(Z+1)`), so an open-circuit load maps to `(1, 0)` and
    /// never needs a division by infinity.
    pub fn input_impedance(&self, z_load: Complex64) -> Complex64 {
        let (p_out, u_out) = if complex::is_open_circuit(z_load) {
            (ONE, ZERO)
        } else {
            (
                complex::div(z_load, z_load + ONE),
                complex::div(ONE, z_load + ONE),
            )
        };
        let p_in = self.a * p_out + self.b * u_out;
        let u_in = self.c * p_out + self.d * u_out;
        complex::div(p_in, u_in)
    }
}
