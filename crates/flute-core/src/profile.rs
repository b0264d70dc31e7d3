use crate::error::ConfigError;
use crate::wave::characteristic_impedance;
use crate::woodwind::Woodwind;
use crate::{validate_midi, EMBOUCHURE_ENTRY_RADIUS};
use num_complex::Complex64;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    /// Position from the embouchure (m), negative towards the cork.
    pub x: f64,
    /// `|p|`
    pub pressure: f64,
    /// `|Z0|·|U|`, flow scaled to pressure units.
    pub flow: f64,
}

/// Pressure and flow at intervals of `step` metres along the bore when the
/// instrument is driven at `f` Hz as note `midi`.
///
/// The drive is normalised so that `|p|² + |Z0·U|² = 1` at the entry, with
/// the pressure drop across the player's face removed.
pub fn pressure_profile(
    woodwind: &mut Woodwind,
    f: f64,
    midi: u8,
    step: f64,
) -> crate::Result<Vec<ProfilePoint>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(ConfigError::ProfileStep(step).into());
    }
    validate_midi(midi)?;
    let Some((c, rho)) = woodwind.entry_air() else {
        return Ok(Vec::new());
    };

    let z_in = woodwind.played_impedance(f, midi);
    let z_face = woodwind.face_impedance(f, midi);
    let z0 = characteristic_impedance(c, rho, EMBOUCHURE_ENTRY_RADIUS).norm();
    let u_in = Complex64::new(1.0 / (z_in.norm_sqr() + z0 * z0).sqrt(), 0.0);
    let p_in = (z_in - z_face) * u_in;

    let entry_ratio = EMBOUCHURE_ENTRY_RADIUS / woodwind.entry_radius();
    let x_min = (-woodwind.length_upstream() / step).ceil() * step;
    let x_max = (woodwind.length_downstream() / step).ceil() * step;
    debug!(f, midi, x_min, x_max, step, "pressure profile");

    let points = (0u64..)
        .map(|i| x_min + i as f64 * step)
        .take_while(|&x| x < x_max)
        .map(|x| {
            let m = woodwind.matrix_at(f, entry_ratio, x).inverse();
            let p = m.a * p_in + m.b * u_in;
            let u = m.c * p_in + m.d * u_in;
            ProfilePoint {
                x,
                pressure: p.norm(),
                flow: z0 * u.norm(),
            }
        })
        .collect();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bore::{Bore, BoreSegment};
    use crate::error::Error;
    use crate::radiation::STOPPED;
    use crate::woodwind::Head;
    use crate::{AirConditions, EmbouchureHole};
    use approx::assert_relative_eq;

    fn pipe() -> Woodwind {
        let mut pipe = Woodwind::pipe(Bore::new(vec![BoreSegment::cylinder(0.0085, 0.6)]));
        pipe.set_air_properties(&AirConditions::uniform(20.0, 0.5));
        pipe
    }

    #[test]
    fn test_step_must_be_positive() {
        let mut pipe = pipe();
        let err = pressure_profile(&mut pipe, 440.0, 69, 0.0).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ProfileStep(_))));
    }

    #[test]
    fn test_note_zero_is_rejected() {
        let mut pipe = pipe();
        let err = pressure_profile(&mut pipe, 440.0, 0, 2e-3).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Midi(0))));
    }

    #[test]
    fn test_pipe_profile_starts_at_the_drive() {
        let mut pipe = pipe();
        let points = pressure_profile(&mut pipe, 300.0, 62, 2e-3).unwrap();
        assert_eq!(points.len(), 300);
        assert_eq!(points[0].x, 0.0);

        let z_in = pipe.played_impedance(300.0, 62);
        let z_face = pipe.face_impedance(300.0, 62);
        let (c, rho) = pipe.entry_air().unwrap();
        let z0 = characteristic_impedance(c, rho, EMBOUCHURE_ENTRY_RADIUS).norm();
        let u_in = 1.0 / (z_in.norm_sqr() + z0 * z0).sqrt();
        assert_relative_eq!(
            points[0].pressure,
            (z_in - z_face).norm() * u_in,
            max_relative = 1e-12
        );
        assert_relative_eq!(points[0].flow, z0 * u_in, max_relative = 1e-12);
    }

    #[test]
    fn test_profile_covers_the_upstream_bore() {
        let head = Head::new(
            Some(EmbouchureHole::new(0.0048, 0.0052, 0.0043, 0.0095)),
            Bore::new(vec![BoreSegment::cylinder(0.0095, 0.017)]),
            STOPPED,
            Bore::new(vec![BoreSegment::cylinder(0.0095, 0.3)]),
        );
        let mut w = Woodwind::new(head, Vec::new(), 0.0);
        w.set_air_properties(&AirConditions::played());
        let points = pressure_profile(&mut w, 500.0, 71, 2e-3).unwrap();
        assert_relative_eq!(points[0].x, -0.016, max_relative = 1e-9);
        assert!(points.last().unwrap().x < 0.3);
        assert!(points
            .iter()
            .all(|p| p.pressure.is_finite() && p.flow.is_finite()));
    }

    #[test]
    fn test_empty_instrument_has_no_profile() {
        let mut empty = Woodwind::pipe(Bore::default());
        let points = pressure_profile(&mut empty, 440.0, 69, 1e-3).unwrap();
        assert!(points.is_empty());
    }
}
