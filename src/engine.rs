use std::panic;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::barrier::SpinBarrier;
use crate::climate::Climate;
use crate::config::{ConfigError, SimConfig};
use crate::record::{RecordError, RecordSink};
use crate::rng::SimRng;
use crate::state::{Readings, SimDate, SimState, Writers};
use crate::systems::{run_agent, DeerAgent, GrainAgent, RoundContext, Watcher, WolfAgent, TASKS};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sink(#[from] RecordError),
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub name: String,
    /// Seed of the climate noise, when the engine chose the source.
    pub seed: Option<u64>,
    pub rounds: u64,
    pub records: u64,
    /// Completed barrier rounds; three per simulated month.
    pub barrier_generations: u64,
    pub final_state: Readings,
    pub elapsed: Duration,
}

pub struct Simulation {
    config: SimConfig,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs with the configured seed, or a fresh one from OS entropy.
    pub fn run<S: RecordSink + Send>(&self, sink: S) -> Result<RunSummary, EngineError> {
        let rng = match self.config.seed {
            Some(seed) => SimRng::from_seed(seed),
            None => SimRng::from_entropy(),
        };
        let seed = rng.seed();
        info!(seed, "climate noise seeded");
        let mut summary = self.run_with_rng(rng, sink)?;
        summary.seed = Some(seed);
        Ok(summary)
    }

    /// Runs the four tasks to the end year with `rng` as the climate noise
    /// source. Month 0's climate is drawn from `rng` before the tasks start.
    ///
    /// A task that panics mid-run leaves the others waiting at the barrier,
    /// so this call does not return. A panic seen at join is re-raised.
    pub fn run_with_rng<R, S>(&self, mut rng: R, sink: S) -> Result<RunSummary, EngineError>
    where
        R: Rng + Send,
        S: RecordSink + Send,
    {
        let config = &self.config;
        let calendar = config.calendar;
        let barrier = SpinBarrier::new(TASKS);
        info!(
            name = %config.name,
            participants = barrier.participants(),
            start_year = calendar.start_year,
            end_year = calendar.end_year,
            rounds = calendar.total_rounds(),
            "starting simulation"
        );

        let start = SimDate::start(&calendar);
        let climate = Climate::for_month(start.month, &config.climate, &mut rng);
        let mut state = SimState::new(start, climate, &config.initial);

        let started = Instant::now();
        let (view, writers) = state.split();
        let Writers {
            deer,
            wolves,
            grain,
            watcher: watcher_cells,
        } = writers;
        let ctx = RoundContext::new(view, &barrier, calendar.end_year);

        let deer_agent = DeerAgent::new(config.predation);
        let wolf_agent = WolfAgent::new(config.predation);
        let grain_agent = GrainAgent::new(config.grain);
        let watcher = Watcher::new(config.climate, rng, sink);

        let (deer_rounds, wolf_rounds, grain_rounds, report) = thread::scope(|scope| {
            let ctx = &ctx;
            let deer_task = scope.spawn(move || run_agent(&deer_agent, ctx, deer));
            let wolf_task = scope.spawn(move || run_agent(&wolf_agent, ctx, wolves));
            let grain_task = scope.spawn(move || run_agent(&grain_agent, ctx, grain));
            let watcher_task = scope.spawn(move || watcher.run(ctx, watcher_cells));

            (
                deer_task.join().unwrap_or_else(|e| panic::resume_unwind(e)),
                wolf_task.join().unwrap_or_else(|e| panic::resume_unwind(e)),
                grain_task.join().unwrap_or_else(|e| panic::resume_unwind(e)),
                watcher_task.join().unwrap_or_else(|e| panic::resume_unwind(e)),
            )
        });
        let elapsed = started.elapsed();

        debug_assert!(
            deer_rounds == report.rounds
                && wolf_rounds == report.rounds
                && grain_rounds == report.rounds
        );

        info!(
            rounds = report.rounds,
            records = report.emitted,
            elapsed_ms = elapsed.as_secs_f64() * 1_000.0,
            "simulation finished"
        );

        if let Some(err) = report.failure {
            return Err(err.into());
        }

        Ok(RunSummary {
            name: config.name.clone(),
            seed: None,
            rounds: report.rounds,
            records: report.emitted,
            barrier_generations: barrier.generation(),
            final_state: state.readings(),
            elapsed,
        })
    }
}
