use std::time::Duration;

/// Fixed-step scheduler. Owns the accumulator; callers hand it wall-clock
/// deltas and a callback that runs once per elapsed period.
#[derive(Clone, Debug)]
pub(crate) struct Ticker {
    period: Duration,
    accum: Duration,
    ticks: u64,
    max_catch_up: u32,
}

impl Ticker {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            accum: Duration::ZERO,
            ticks: 0,
            max_catch_up: 5,
        }
    }

    pub(crate) fn period(&self) -> Duration {
        self.period
    }

    /// Runs `on_tick` for every whole period in the accumulated time. After a
    /// long stall at most `max_catch_up` ticks fire and the backlog is dropped.
    pub(crate) fn advance(&mut self, dt: Duration, mut on_tick: impl FnMut(u64)) -> u32 {
        self.accum = self.accum.saturating_add(dt);
        let mut fired = 0;
        while self.accum >= self.period {
            if fired == self.max_catch_up {
                self.accum = Duration::ZERO;
                break;
            }
            on_tick(self.ticks);
            self.ticks += 1;
            self.accum -= self.period;
            fired += 1;
        }
        fired
    }
}
