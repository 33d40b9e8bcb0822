use rand::Rng;
use tracing::{debug, error, info_span, trace};

use crate::climate::Climate;
use crate::config::ClimateConfig;
use crate::record::{MonthRecord, RecordError, RecordSink};
use crate::state::WatcherWriters;

use super::{Phase, RoundContext};

/// Drives the calendar. Between the commit and observe barriers it emits the
/// finished month, advances the clock and draws the next month's climate.
pub struct Watcher<R, S> {
    climate: ClimateConfig,
    rng: R,
    sink: S,
}

#[derive(Debug)]
pub struct WatcherReport {
    pub rounds: u64,
    pub emitted: u64,
    /// First sink failure. Later records are dropped but the round cadence
    /// continues so the other tasks can finish.
    pub failure: Option<RecordError>,
}

impl<R: Rng + Send, S: RecordSink + Send> Watcher<R, S> {
    pub fn new(climate: ClimateConfig, rng: R, sink: S) -> Self {
        Self { climate, rng, sink }
    }

    pub fn run(mut self, ctx: &RoundContext<'_>, mut cells: WatcherWriters<'_>) -> WatcherReport {
        let span = info_span!("task", name = "watcher");
        let _entered = span.enter();

        let mut report = WatcherReport {
            rounds: 0,
            emitted: 0,
            failure: None,
        };

        while ctx.running() {
            ctx.wait(Phase::Computed);
            ctx.wait(Phase::Committed);

            let readings = ctx.view.readings();
            let record = MonthRecord::from(&readings);
            trace!(?record, "month complete");
            if report.failure.is_none() {
                match self.sink.emit(&record) {
                    Ok(()) => report.emitted += 1,
                    Err(err) => {
                        error!(
                            %err,
                            total_months = record.total_months,
                            "record sink failed; dropping further records"
                        );
                        report.failure = Some(err);
                    }
                }
            }

            let next = readings.date.next();
            cells.commit_date(next);
            cells.commit_climate(Climate::for_month(next.month, &self.climate, &mut self.rng));

            ctx.wait(Phase::Observed);
            report.rounds += 1;
        }

        if let Err(err) = self.sink.finish() {
            error!(%err, "record sink failed to flush");
            if report.failure.is_none() {
                report.failure = Some(err);
            }
        }

        debug!(rounds = report.rounds, emitted = report.emitted, "task finished");
        report
    }
}
