use crate::config::PredationConfig;
use crate::state::StateView;

use super::{clamp_count, nudge_toward, Agent};

/// Prey side of the Lotka-Volterra pair. The fractional part of the delta is
/// dropped (truncation toward zero) before it reaches the integer count.
pub fn next_deer(deer: u32, wolves: u32, grain_height: f32, params: &PredationConfig) -> u32 {
    let herd = deer as f32;
    let pack = wolves as f32;
    let delta = ((params.alpha * herd - params.beta * herd * pack) * params.dt) as i64;

    let capacity = grain_height as i64;
    clamp_count(nudge_toward((deer as i64).saturating_add(delta), capacity))
}

pub struct DeerAgent {
    params: PredationConfig,
}

impl DeerAgent {
    pub fn new(params: PredationConfig) -> Self {
        Self { params }
    }
}

impl Agent for DeerAgent {
    type Value = u32;

    fn name(&self) -> &'static str {
        "deer"
    }

    fn compute(&self, view: &StateView<'_>) -> u32 {
        next_deer(view.deer(), view.wolves(), view.grain_height(), &self.params)
    }
}
