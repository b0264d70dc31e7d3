use std::f64::consts::PI;

const NEWTON_ITERATIONS: usize = 8;

pub fn j0(x: f64) -> f64 {
    libm::j0(x)
}

pub fn j1(x: f64) -> f64 {
    libm::j1(x)
}

/// The `n`-th positive zero of J1 (`n` starts at 1; the zero at the origin
/// is not counted).
///
/// McMahon's asymptotic expansion gives a starting point within 1e-3 even
/// for `n = 1`; Newton's method on `J1` with `J1'(x) = J0(x) − J1(x)/x`
/// refines it to machine precision.
pub fn j1_zero(n: usize) -> f64 {
    debug_assert!(n >= 1, "J1 zeros are numbered from 1");
    let beta = (n as f64 + 0.25) * PI;
    let mut x = beta - 3.0 / (8.0 * beta) + 36.0 / (3.0 * (8.0 * beta).powi(3));
    for _ in 0..NEWTON_ITERATIONS {
        let step = j1(x) / (j0(x) - j1(x) / x);
        x -= step;
        if step.abs() <= f64::EPSILON * x {
            break;
        }
    }
    x
}

/// The first `count` positive zeros of J1.
pub fn j1_zeros(count: usize) -> Vec<f64> {
    (1..=count).map(j1_zero).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_first_zeros_match_tables() {
        assert_abs_diff_eq!(j1_zero(1), 3.831_705_970_207_512, epsilon = 1e-12);
        assert_abs_diff_eq!(j1_zero(2), 7.015_586_669_815_619, epsilon = 1e-12);
        assert_abs_diff_eq!(j1_zero(3), 10.173_468_135_062_722, epsilon = 1e-12);
    }

    #[test]
    fn test_zeros_are_roots_and_increasing() {
        let zeros = j1_zeros(100);
        assert_eq!(zeros.len(), 100);
        for pair in zeros.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap > 3.0 && gap < 3.3, "gap = {gap}");
        }
        for &z in &zeros {
            assert!(j1(z).abs() < 1e-12, "J1({z}) = {}", j1(z));
        }
    }
}
