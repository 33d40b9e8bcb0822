use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::OutputFormat;

fn default_name() -> String {
    "grain_valley".to_string()
}

/// Every start-up constant of a run. Missing sections fall back to the
/// reference model, so an empty file is a valid scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    /// Fixed seed for the climate noise. Drawn from OS entropy when absent.
    pub seed: Option<u64>,
    pub calendar: CalendarConfig,
    pub initial: InitialConfig,
    pub climate: ClimateConfig,
    pub grain: GrainConfig,
    pub predation: PredationConfig,
    pub output: OutputConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            seed: None,
            calendar: CalendarConfig::default(),
            initial: InitialConfig::default(),
            climate: ClimateConfig::default(),
            grain: GrainConfig::default(),
            predation: PredationConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub start_year: i32,
    /// Zero-based, 0 = January.
    pub start_month: u32,
    /// The run stops once the clock reaches January of this year.
    pub end_year: i32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start_year: 2025,
            start_month: 0,
            end_year: 2031,
        }
    }
}

impl CalendarConfig {
    /// Rounds between the start date and January of `end_year`.
    pub fn total_rounds(&self) -> u64 {
        if self.end_year <= self.start_year {
            return 0;
        }
        let years = (self.end_year - self.start_year) as u64;
        (years * 12).saturating_sub(self.start_month as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConfig {
    pub deer: u32,
    pub wolves: u32,
    pub grain_height: f32,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            deer: 20,
            wolves: 5,
            grain_height: 100.0,
        }
    }
}

/// Seasonal climate: a sinusoid around the averages plus uniform noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    pub avg_temp: f32,
    pub amp_temp: f32,
    pub random_temp: f32,
    pub avg_precip: f32,
    pub amp_precip: f32,
    pub random_precip: f32,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            avg_temp: 60.0,
            amp_temp: 20.0,
            random_temp: 10.0,
            avg_precip: 15.0,
            amp_precip: 6.0,
            random_precip: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainConfig {
    pub grows_per_month: f32,
    pub one_deer_eats_per_month: f32,
    pub mid_temp: f32,
    pub mid_precip: f32,
    /// Width of the Gaussian temperature/precipitation response curves.
    pub response_width: f32,
}

impl Default for GrainConfig {
    fn default() -> Self {
        Self {
            grows_per_month: 50.0,
            one_deer_eats_per_month: 1.0,
            mid_temp: 40.0,
            mid_precip: 10.0,
            response_width: 10.0,
        }
    }
}

/// Lotka-Volterra coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredationConfig {
    /// Deer growth rate.
    pub alpha: f32,
    /// Deer death rate per wolf.
    pub beta: f32,
    /// Wolf growth rate per deer.
    pub delta: f32,
    /// Wolf death rate.
    pub gamma: f32,
    /// Time step in months.
    pub dt: f32,
}

impl Default for PredationConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.015,
            delta: 0.01,
            gamma: 0.9,
            dt: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Write a column header before the first CSV record.
    pub csv_header: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("start_month must be within 0..=11, got {0}")]
    StartMonth(u32),
    #[error("end_year {end} is before start_year {start}")]
    EndBeforeStart { start: i32, end: i32 },
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

impl SimConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: SimConfig =
            serde_yaml::from_str(text).context("Failed to parse simulation config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize simulation config")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let calendar = &self.calendar;
        if calendar.start_month > 11 {
            return Err(ConfigError::StartMonth(calendar.start_month));
        }
        if calendar.end_year < calendar.start_year {
            return Err(ConfigError::EndBeforeStart {
                start: calendar.start_year,
                end: calendar.end_year,
            });
        }

        let climate = &self.climate;
        let grain = &self.grain;
        let predation = &self.predation;
        let finite = [
            ("initial.grain_height", self.initial.grain_height),
            ("climate.avg_temp", climate.avg_temp),
            ("climate.amp_temp", climate.amp_temp),
            ("climate.random_temp", climate.random_temp),
            ("climate.avg_precip", climate.avg_precip),
            ("climate.amp_precip", climate.amp_precip),
            ("climate.random_precip", climate.random_precip),
            ("grain.grows_per_month", grain.grows_per_month),
            ("grain.one_deer_eats_per_month", grain.one_deer_eats_per_month),
            ("grain.mid_temp", grain.mid_temp),
            ("grain.mid_precip", grain.mid_precip),
            ("grain.response_width", grain.response_width),
            ("predation.alpha", predation.alpha),
            ("predation.beta", predation.beta),
            ("predation.delta", predation.delta),
            ("predation.gamma", predation.gamma),
            ("predation.dt", predation.dt),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        let non_negative = [
            ("initial.grain_height", self.initial.grain_height),
            ("climate.random_temp", climate.random_temp),
            ("climate.random_precip", climate.random_precip),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let positive = [
            ("grain.response_width", grain.response_width),
            ("predation.dt", predation.dt),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        Ok(())
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<SimConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SimConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }
}
