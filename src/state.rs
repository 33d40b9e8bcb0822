//! Shared simulation state.
//!
//! Every entity lives in a [`Published`] cell with exactly one writer. Cells
//! are relaxed atomics: they make concurrent access well-defined but order
//! nothing. Visibility between tasks comes from the barrier that separates a
//! commit from the next read.
//!
//! [`SimState::split`] hands out the read-only [`StateView`] and one
//! [`Writers`] set. Writer handles are not `Clone` and `split` borrows the
//! state mutably, so each cell has a single writer for the whole run.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::climate::Climate;
use crate::config::{CalendarConfig, InitialConfig};

/// Values that fit in one 32-bit cell.
pub trait Word: Copy {
    fn into_word(self) -> u32;
    fn from_word(word: u32) -> Self;
}

impl Word for u32 {
    fn into_word(self) -> u32 {
        self
    }

    fn from_word(word: u32) -> Self {
        word
    }
}

impl Word for i32 {
    fn into_word(self) -> u32 {
        self as u32
    }

    fn from_word(word: u32) -> Self {
        word as i32
    }
}

impl Word for f32 {
    fn into_word(self) -> u32 {
        self.to_bits()
    }

    fn from_word(word: u32) -> Self {
        f32::from_bits(word)
    }
}

pub struct Published<T: Word> {
    word: AtomicU32,
    _value: PhantomData<T>,
}

impl<T: Word> Published<T> {
    pub fn new(value: T) -> Self {
        Self {
            word: AtomicU32::new(value.into_word()),
            _value: PhantomData,
        }
    }

    pub fn get(&self) -> T {
        T::from_word(self.word.load(Ordering::Relaxed))
    }

    fn set(&self, value: T) {
        self.word.store(value.into_word(), Ordering::Relaxed);
    }
}

impl<T: Word + std::fmt::Debug> std::fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.get().fmt(f)
    }
}

/// Exclusive write access to one cell.
pub struct Writer<'a, T: Word> {
    cell: &'a Published<T>,
}

impl<T: Word> Writer<'_, T> {
    pub fn commit(&mut self, value: T) {
        self.cell.set(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimDate {
    pub year: i32,
    /// Zero-based, 0 = January.
    pub month: u32,
    /// Months elapsed since the start of the run.
    pub total_months: u32,
}

impl SimDate {
    pub fn start(calendar: &CalendarConfig) -> Self {
        Self {
            year: calendar.start_year,
            month: calendar.start_month,
            total_months: 0,
        }
    }

    /// The following month, rolling December into January of the next year.
    pub fn next(self) -> Self {
        let (year, month) = if self.month >= 11 {
            (self.year + 1, 0)
        } else {
            (self.year, self.month + 1)
        };
        Self {
            year,
            month,
            total_months: self.total_months + 1,
        }
    }
}

/// Plain copy of every entity at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub date: SimDate,
    pub climate: Climate,
    pub grain_height: f32,
    pub deer: u32,
    pub wolves: u32,
}

#[derive(Debug)]
pub struct SimState {
    year: Published<i32>,
    month: Published<u32>,
    total_months: Published<u32>,
    temperature: Published<f32>,
    precipitation: Published<f32>,
    grain_height: Published<f32>,
    deer: Published<u32>,
    wolves: Published<u32>,
}

impl SimState {
    pub fn new(date: SimDate, climate: Climate, initial: &InitialConfig) -> Self {
        Self {
            year: Published::new(date.year),
            month: Published::new(date.month),
            total_months: Published::new(date.total_months),
            temperature: Published::new(climate.temperature),
            precipitation: Published::new(climate.precipitation.max(0.0)),
            grain_height: Published::new(initial.grain_height.max(0.0)),
            deer: Published::new(initial.deer),
            wolves: Published::new(initial.wolves),
        }
    }

    pub fn view(&self) -> StateView<'_> {
        StateView { state: self }
    }

    /// Splits the state into its read view and the one set of writers.
    pub fn split(&mut self) -> (StateView<'_>, Writers<'_>) {
        let state: &SimState = self;
        let writers = Writers {
            deer: Writer { cell: &state.deer },
            wolves: Writer {
                cell: &state.wolves,
            },
            grain: Writer {
                cell: &state.grain_height,
            },
            watcher: WatcherWriters {
                year: Writer { cell: &state.year },
                month: Writer { cell: &state.month },
                total_months: Writer {
                    cell: &state.total_months,
                },
                temperature: Writer {
                    cell: &state.temperature,
                },
                precipitation: Writer {
                    cell: &state.precipitation,
                },
            },
        };
        (state.view(), writers)
    }

    pub fn readings(&self) -> Readings {
        self.view().readings()
    }
}

/// Read-only access to every cell.
#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    state: &'a SimState,
}

impl StateView<'_> {
    pub fn year(&self) -> i32 {
        self.state.year.get()
    }

    pub fn date(&self) -> SimDate {
        SimDate {
            year: self.state.year.get(),
            month: self.state.month.get(),
            total_months: self.state.total_months.get(),
        }
    }

    pub fn climate(&self) -> Climate {
        Climate {
            temperature: self.state.temperature.get(),
            precipitation: self.state.precipitation.get(),
        }
    }

    pub fn grain_height(&self) -> f32 {
        self.state.grain_height.get()
    }

    pub fn deer(&self) -> u32 {
        self.state.deer.get()
    }

    pub fn wolves(&self) -> u32 {
        self.state.wolves.get()
    }

    pub fn readings(&self) -> Readings {
        Readings {
            date: self.date(),
            climate: self.climate(),
            grain_height: self.grain_height(),
            deer: self.deer(),
            wolves: self.wolves(),
        }
    }
}

pub struct Writers<'a> {
    pub deer: Writer<'a, u32>,
    pub wolves: Writer<'a, u32>,
    pub grain: Writer<'a, f32>,
    pub watcher: WatcherWriters<'a>,
}

/// Cells owned by the watcher: the clock and the climate.
pub struct WatcherWriters<'a> {
    year: Writer<'a, i32>,
    month: Writer<'a, u32>,
    total_months: Writer<'a, u32>,
    temperature: Writer<'a, f32>,
    precipitation: Writer<'a, f32>,
}

impl WatcherWriters<'_> {
    pub fn commit_date(&mut self, date: SimDate) {
        self.year.commit(date.year);
        self.month.commit(date.month);
        self.total_months.commit(date.total_months);
    }

    pub fn commit_climate(&mut self, climate: Climate) {
        self.temperature.commit(climate.temperature);
        self.precipitation.commit(climate.precipitation.max(0.0));
    }
}
