// FSRS memory model: stability, difficulty and retrievability updates.
// Every function reads its weights from an explicit `Parameters` value.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::params::Parameters;

type R = f64;
type S = f64;
type D = f64;
type T = f64;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;
pub const MIN_STABILITY: f64 = 0.1;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn from_u8(n: u8) -> Option<Rating> {
        match n {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Rating::Again => 1,
            Rating::Hard => 2,
            Rating::Good => 3,
            Rating::Easy => 4,
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = EngineError;

    fn try_from(n: i64) -> Result<Rating> {
        u8::try_from(n)
            .ok()
            .and_then(Rating::from_u8)
            .ok_or(EngineError::InvalidRating(n))
    }
}

impl From<Rating> for f64 {
    fn from(g: Rating) -> f64 {
        g.value() as f64
    }
}

pub fn retrievability(p: &Parameters, t: T, s: S) -> R {
    (1.0 + p.factor() * (t / s)).powf(p.decay())
}

/// Unrounded review interval in days for stability `s` at the requested retention.
pub fn interval(p: &Parameters, s: S) -> T {
    (s / p.factor()) * (p.request_retention().powf(1.0 / p.decay()) - 1.0)
}

pub fn s_0(p: &Parameters, g: Rating) -> S {
    f64::max(p.w(g.value() as usize - 1), MIN_STABILITY)
}

pub fn d_0(p: &Parameters, g: Rating) -> D {
    let g: f64 = g.into();
    clamp_d(p.w(4) - f64::exp(p.w(5) * (g - 1.0)) + 1.0)
}

fn clamp_d(d: D) -> D {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Mean reversion towards the initial Good difficulty.
pub fn difficulty(p: &Parameters, d: D, g: Rating) -> D {
    let g: f64 = g.into();
    let shifted = d - p.w(6) * (g - 3.0);
    clamp_d(p.w(7) * d_0(p, Rating::Good) + (1.0 - p.w(7)) * shifted)
}

/// Stability after a learning or relearning step, driven by `w17` and `w18`.
pub fn s_short_term(p: &Parameters, s: S, g: Rating) -> S {
    let g: f64 = g.into();
    s * f64::exp(p.w(17) * (g - 3.0 + p.w(18)))
}

pub fn s_success(p: &Parameters, d: D, s: S, r: R, g: Rating) -> S {
    let t_d = 11.0 - d;
    let t_s = s.powf(-p.w(9));
    let t_r = f64::exp(p.w(10) * (1.0 - r)) - 1.0;
    let h = if g == Rating::Hard { p.w(15) } else { 1.0 };
    let b = if g == Rating::Easy { p.w(16) } else { 1.0 };
    let c = f64::exp(p.w(8));
    let alpha = 1.0 + t_d * t_s * t_r * h * b * c;
    s * alpha
}

/// Post-lapse stability, never above the pre-lapse value.
pub fn s_fail(p: &Parameters, d: D, s: S, r: R) -> S {
    let d_f = d.powf(-p.w(12));
    let s_f = (s + 1.0).powf(p.w(13)) - 1.0;
    let r_f = f64::exp(p.w(14) * (1.0 - r));
    let c_f = p.w(11);
    let s_f = d_f * s_f * r_f * c_f;
    f64::min(s_f, s)
}

pub fn stability(p: &Parameters, d: D, s: S, r: R, g: Rating) -> S {
    if g == Rating::Again {
        s_fail(p, d, s, r)
    } else {
        s_success(p, d, s, r, g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DEFAULT_WEIGHTS;

    #[test]
    fn retrievability_at_zero() {
        let p = Parameters::default();
        let r = retrievability(&p, 0.0, 1.0);
        assert!((r - 1.0).abs() < 1e-10);
    }

    #[test]
    fn retrievability_is_ninety_percent_at_stability() {
        let p = Parameters::default();
        let r = retrievability(&p, 7.0, 7.0);
        assert!((r - 0.9).abs() < 1e-10);
    }

    #[test]
    fn interval_roundtrip() {
        // For request retention 0.9, interval(s) should equal s
        let p = Parameters::default();
        let s = 5.0;
        let i = interval(&p, s);
        assert!((i - s).abs() < 1e-10);
    }

    #[test]
    fn rating_parsing() {
        assert_eq!(Rating::try_from(3).unwrap(), Rating::Good);
        assert!(matches!(
            Rating::try_from(0),
            Err(EngineError::InvalidRating(0))
        ));
        assert!(Rating::try_from(5).is_err());
        assert!(Rating::try_from(-1).is_err());
        assert!(Rating::try_from(259).is_err());
    }

    #[test]
    fn initial_stability_indexes_by_rating() {
        let p = Parameters::default();
        assert_eq!(s_0(&p, Rating::Again), DEFAULT_WEIGHTS[0]);
        assert_eq!(s_0(&p, Rating::Easy), DEFAULT_WEIGHTS[3]);
    }

    #[test]
    fn initial_stability_floored() {
        let mut w = DEFAULT_WEIGHTS;
        w[0] = 0.01;
        let p = Parameters::from_weights(&w).unwrap();
        assert_eq!(s_0(&p, Rating::Again), MIN_STABILITY);
    }

    #[test]
    fn initial_difficulty_decreases_with_rating() {
        let p = Parameters::default();
        let ds: Vec<f64> = Rating::ALL.iter().map(|&g| d_0(&p, g)).collect();
        assert!(ds.windows(2).all(|w| w[0] >= w[1]));
        assert!(ds.iter().all(|d| (1.0..=10.0).contains(d)));
    }

    #[test]
    fn stability_increases_on_good() {
        let p = Parameters::default();
        let d = 5.0;
        let s = 3.0;
        let r = retrievability(&p, s, s);
        let new_s = s_success(&p, d, s, r, Rating::Good);
        assert!(new_s > s);
    }

    #[test]
    fn stability_decreases_on_again() {
        let p = Parameters::default();
        let d = 5.0;
        let s = 3.0;
        let r = retrievability(&p, s, s);
        let new_s = s_fail(&p, d, s, r);
        assert!(new_s < s);
    }

    #[test]
    fn forget_stability_capped_at_previous() {
        let p = Parameters::default();
        // Tiny prior stability with long elapsed time would otherwise grow
        let s = 0.2;
        let r = retrievability(&p, 100.0, s);
        assert!(s_fail(&p, 1.0, s, r) <= s);
    }

    #[test]
    fn short_term_uses_extended_weights() {
        let p = Parameters::default();
        let s = 2.0;
        let expected = s * f64::exp(DEFAULT_WEIGHTS[17] * DEFAULT_WEIGHTS[18]);
        let got = s_short_term(&p, s, Rating::Good);
        assert!(got.is_finite());
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn short_term_from_core_vector_is_finite() {
        let p = Parameters::from_weights(&DEFAULT_WEIGHTS[..17]).unwrap();
        for g in Rating::ALL {
            assert!(s_short_term(&p, 1.5, g).is_finite());
        }
    }

    #[test]
    fn difficulty_clamped() {
        let p = Parameters::default();
        // Repeated again should not push difficulty above 10
        let mut d = d_0(&p, Rating::Again);
        for _ in 0..100 {
            d = difficulty(&p, d, Rating::Again);
        }
        assert!(d <= 10.0);
        assert!(d >= 1.0);

        // Repeated easy should not push difficulty below 1
        let mut d = d_0(&p, Rating::Easy);
        for _ in 0..100 {
            d = difficulty(&p, d, Rating::Easy);
        }
        assert!(d >= 1.0);
        assert!(d <= 10.0);
    }

    #[test]
    fn hard_penalty_and_easy_bonus_order_recall_stability() {
        let p = Parameters::default();
        let (d, s) = (5.0, 10.0);
        let r = retrievability(&p, 10.0, s);
        let hard = stability(&p, d, s, r, Rating::Hard);
        let good = stability(&p, d, s, r, Rating::Good);
        let easy = stability(&p, d, s, r, Rating::Easy);
        assert!(hard < good);
        assert!(good < easy);
    }
}
