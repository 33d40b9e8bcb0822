use std::f32::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ClimateConfig;
use crate::rng::RngExt;

/// One month's climate inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Climate {
    /// Degrees Fahrenheit.
    pub temperature: f32,
    /// Inches, never negative.
    pub precipitation: f32,
}

impl Climate {
    /// Seasonal angle of a zero-based month, centred mid-month.
    pub fn season_angle(month: u32) -> f32 {
        (30.0 * month as f32 + 15.0) * (PI / 180.0)
    }

    /// Draws the climate of `month`. Temperature noise is drawn before
    /// precipitation noise.
    pub fn for_month<R: Rng>(month: u32, config: &ClimateConfig, rng: &mut R) -> Self {
        let ang = Self::season_angle(month);

        let temp = config.avg_temp - config.amp_temp * ang.cos();
        let temperature = temp + rng.uniform(-config.random_temp, config.random_temp);

        let precip = config.avg_precip + config.amp_precip * ang.sin();
        let precipitation =
            (precip + rng.uniform(-config.random_precip, config.random_precip)).max(0.0);

        Self {
            temperature,
            precipitation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;

    fn quiet() -> ClimateConfig {
        ClimateConfig {
            random_temp: 0.0,
            random_precip: 0.0,
            ..ClimateConfig::default()
        }
    }

    #[test]
    fn without_noise_follows_the_seasonal_curve() {
        let config = quiet();
        let mut rng = SimRng::from_seed(0);

        let january = Climate::for_month(0, &config, &mut rng);
        let july = Climate::for_month(6, &config, &mut rng);

        assert!(january.temperature < config.avg_temp);
        assert!(july.temperature > config.avg_temp);
        let expected = config.avg_temp - config.amp_temp * Climate::season_angle(0).cos();
        assert_eq!(january.temperature, expected);
    }

    #[test]
    fn precipitation_is_clamped_at_zero() {
        let config = ClimateConfig {
            avg_precip: -50.0,
            ..quiet()
        };
        let mut rng = SimRng::from_seed(3);
        for month in 0..12 {
            assert_eq!(Climate::for_month(month, &config, &mut rng).precipitation, 0.0);
        }
    }

    #[test]
    fn noise_is_bounded() {
        let config = ClimateConfig::default();
        let mut rng = SimRng::from_seed(11);
        for round in 0..1_200u32 {
            let month = round % 12;
            let climate = Climate::for_month(month, &config, &mut rng);
            let ang = Climate::season_angle(month);
            let base = config.avg_temp - config.amp_temp * ang.cos();
            assert!((climate.temperature - base).abs() <= config.random_temp + 1e-3);
            assert!(climate.precipitation >= 0.0);
        }
    }
}
