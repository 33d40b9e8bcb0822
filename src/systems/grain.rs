use crate::climate::Climate;
use crate::config::GrainConfig;
use crate::state::StateView;

use super::Agent;

/// Gaussian response in `(0, 1]`, peaking at `mid`.
fn response(value: f32, mid: f32, width: f32) -> f32 {
    let scaled = (value - mid) / width;
    (-(scaled * scaled)).exp()
}

pub fn next_grain_height(height: f32, deer: u32, climate: &Climate, params: &GrainConfig) -> f32 {
    let temp_factor = response(climate.temperature, params.mid_temp, params.response_width);
    let precip_factor = response(climate.precipitation, params.mid_precip, params.response_width);

    let grown = height + temp_factor * precip_factor * params.grows_per_month;
    let eaten = deer as f32 * params.one_deer_eats_per_month;
    (grown - eaten).max(0.0)
}

pub struct GrainAgent {
    params: GrainConfig,
}

impl GrainAgent {
    pub fn new(params: GrainConfig) -> Self {
        Self { params }
    }
}

impl Agent for GrainAgent {
    type Value = f32;

    fn name(&self) -> &'static str {
        "grain"
    }

    fn compute(&self, view: &StateView<'_>) -> f32 {
        next_grain_height(view.grain_height(), view.deer(), &view.climate(), &self.params)
    }
}
