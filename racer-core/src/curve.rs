use serde::{Deserialize, Serialize};

use crate::error::TuningError;

pub const CURVE_SAMPLES: usize = 11;

/// A curve sampled at 11 evenly spaced points over the normalized domain
/// `[0, 1]` (torque against RPM rate, grip against slip magnitude).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct CurveTable {
    samples: [f64; CURVE_SAMPLES],
}

impl CurveTable {
    pub fn new(samples: [f64; CURVE_SAMPLES]) -> Result<CurveTable, TuningError> {
        if let Some(index) = samples.iter().position(|sample| !sample.is_finite()) {
            return Err(TuningError::NonFiniteSample { index });
        }
        Ok(CurveTable { samples })
    }

    // For literal tables compiled into the crate; skips the finiteness check
    pub(crate) const fn builtin(samples: [f64; CURVE_SAMPLES]) -> CurveTable {
        CurveTable { samples }
    }

    /// Linear interpolation at `rate`. The caller keeps `rate` inside
    /// `[0, 1]`; anything at or past the last sample returns the last sample.
    pub fn interpolate(&self, rate: f64) -> f64 {
        let last = CURVE_SAMPLES - 1;
        let index = rate * last as f64;
        let floor = index.floor();
        let frac = index - floor;

        if floor >= last as f64 {
            return self.samples[last];
        }
        // a negative rate is a caller bug; pin it to the first sample rather
        // than indexing out of bounds
        if floor < 0.0 {
            return self.samples[0];
        }

        let i = floor as usize;
        self.samples[i] * (1.0 - frac) + self.samples[i + 1] * frac
    }

    pub fn samples(&self) -> &[f64; CURVE_SAMPLES] {
        &self.samples
    }

    pub fn max_sample(&self) -> f64 {
        self.samples
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl TryFrom<Vec<f64>> for CurveTable {
    type Error = TuningError;

    fn try_from(samples: Vec<f64>) -> Result<Self, Self::Error> {
        let got = samples.len();
        let samples: [f64; CURVE_SAMPLES] =
            samples
                .try_into()
                .map_err(|_| TuningError::CurveLength {
                    expected: CURVE_SAMPLES,
                    got,
                })?;
        CurveTable::new(samples)
    }
}

impl From<CurveTable> for Vec<f64> {
    fn from(table: CurveTable) -> Self {
        table.samples.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> CurveTable {
        CurveTable::new([0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]).unwrap()
    }

    fn bumpy() -> CurveTable {
        CurveTable::new([3.0, -1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0]).unwrap()
    }

    #[test]
    fn endpoints_are_exact() {
        let table = bumpy();
        assert_eq!(table.interpolate(0.0), 3.0);
        assert_eq!(table.interpolate(1.0), 5.0);
    }

    #[test]
    fn exact_sample_points_return_samples() {
        let table = bumpy();
        for (i, expected) in table.samples().iter().enumerate() {
            let rate = i as f64 / (CURVE_SAMPLES - 1) as f64;
            assert!((table.interpolate(rate) - expected).abs() < 1e-9, "sample {}", i);
        }
    }

    #[test]
    fn midpoints_are_averages() {
        let table = bumpy();
        // halfway between samples 4 (5.0) and 5 (9.0)
        assert!((table.interpolate(0.45) - 7.0).abs() < 1e-9);
        // halfway between samples 0 (3.0) and 1 (-1.0)
        assert!((table.interpolate(0.05) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn past_the_end_clamps_to_last_sample() {
        let table = bumpy();
        assert_eq!(table.interpolate(1.5), 5.0);
        assert_eq!(table.interpolate(-0.5), 3.0);
    }

    #[test]
    fn result_lies_between_bounding_samples() {
        let table = bumpy();
        let samples = table.samples();
        for step in 0..=1000 {
            let rate = step as f64 / 1000.0;
            let index = ((rate * 10.0).floor() as usize).min(CURVE_SAMPLES - 1);
            let next = (index + 1).min(CURVE_SAMPLES - 1);
            let lo = samples[index].min(samples[next]);
            let hi = samples[index].max(samples[next]);
            let value = table.interpolate(rate);
            assert!(value >= lo - 1e-9 && value <= hi + 1e-9, "rate {}", rate);
        }
    }

    #[test]
    fn monotonic_table_gives_monotonic_output() {
        let table = ramp();
        let mut previous = table.interpolate(0.0);
        for step in 1..=1000 {
            let value = table.interpolate(step as f64 / 1000.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let err = CurveTable::try_from(vec![1.0; 10]).unwrap_err();
        assert!(matches!(err, TuningError::CurveLength { expected: 11, got: 10 }));
    }

    #[test]
    fn rejects_non_finite_samples() {
        let mut samples = vec![1.0; 11];
        samples[7] = f64::NAN;
        let err = CurveTable::try_from(samples).unwrap_err();
        assert!(matches!(err, TuningError::NonFiniteSample { index: 7 }));
    }

    #[test]
    fn deserializes_from_yaml_sequence() {
        let table: CurveTable =
            serde_yaml::from_str("[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]").unwrap();
        assert_eq!(table, ramp());
        assert!(serde_yaml::from_str::<CurveTable>("[0, 1, 2]").is_err());
    }

    #[test]
    fn max_sample_finds_peak() {
        assert_eq!(bumpy().max_sample(), 9.0);
    }
}
