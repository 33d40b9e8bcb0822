pub mod barrier;
pub mod climate;
pub mod config;
pub mod engine;
pub mod record;
pub mod rng;
pub mod state;
pub mod systems;

pub use barrier::SpinBarrier;
pub use config::{ConfigLoader, SimConfig};
pub use engine::{EngineError, RunSummary, Simulation};
pub use record::{MonthRecord, OutputFormat, RecordSink, VecSink, WriterSink};
