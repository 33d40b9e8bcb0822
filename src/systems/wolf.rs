use crate::config::PredationConfig;
use crate::state::StateView;

use super::{clamp_count, nudge_toward, Agent};

/// Predator side of the Lotka-Volterra pair, damped one unit toward the deer
/// count.
pub fn next_wolves(wolves: u32, deer: u32, params: &PredationConfig) -> u32 {
    let herd = deer as f32;
    let pack = wolves as f32;
    let delta = ((params.delta * herd * pack - params.gamma * pack) * params.dt) as i64;

    clamp_count(nudge_toward((wolves as i64).saturating_add(delta), deer as i64))
}

pub struct WolfAgent {
    params: PredationConfig,
}

impl WolfAgent {
    pub fn new(params: PredationConfig) -> Self {
        Self { params }
    }
}

impl Agent for WolfAgent {
    type Value = u32;

    fn name(&self) -> &'static str {
        "wolf"
    }

    fn compute(&self, view: &StateView<'_>) -> u32 {
        next_wolves(view.wolves(), view.deer(), &self.params)
    }
}
