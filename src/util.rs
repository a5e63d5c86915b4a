use std::{
    thread,
    time::{Duration, Instant},
};

// Paces a loop to a fixed period. Each sleep is shortened by the time the
// loop body took and by whatever the previous sleep overshot, so loop bodies
// start one period apart on average. Lag worth more than a period is dropped
// rather than repaid with a burst of back-to-back iterations.

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum IntervalAccuracy {
    Default,
    High,
}

#[derive(Debug)]
pub struct Interval {
    label: &'static str,
    pub period: Duration,

    // longest stretch allowed without yielding the thread
    yield_limit: Duration,

    woke_at: Instant,
    overshoot: Duration,
    awake_for: Duration,

    accuracy: IntervalAccuracy,
}

impl Interval {
    pub fn new(
        label: &'static str,
        period: Duration,
        yield_limit: Duration,
        accuracy: IntervalAccuracy,
    ) -> Self {
        Interval {
            label,
            period,
            yield_limit,
            woke_at: Instant::now(),
            overshoot: Duration::ZERO,
            awake_for: Duration::ZERO,
            accuracy,
        }
    }

    pub fn from_frequency(label: &'static str, frequency: u32, accuracy: IntervalAccuracy) -> Self {
        Interval::new(
            label,
            Duration::from_secs_f64(1.0 / frequency.max(1) as f64),
            Duration::from_millis(8),
            accuracy,
        )
    }

    pub fn reset(&mut self) {
        self.woke_at = Instant::now();
        self.overshoot = Duration::ZERO;
        self.awake_for = Duration::ZERO;
    }

    pub fn sleep(&mut self) {
        let busy = self.woke_at.elapsed();
        self.awake_for += busy;

        let owed = self.period.saturating_sub(busy).saturating_sub(self.overshoot);
        let must_yield = self.awake_for >= self.yield_limit;

        let slept = if owed.is_zero() && !must_yield {
            self.overshoot = Duration::ZERO;
            Duration::ZERO
        } else {
            let target = owed.max(Duration::from_nanos(1));
            let before = Instant::now();

            match self.accuracy {
                IntervalAccuracy::High => spin_sleep::sleep(target),
                IntervalAccuracy::Default => thread::sleep(target),
            }

            self.overshoot = before.elapsed().saturating_sub(target);
            self.awake_for = Duration::ZERO;
            target
        };

        log::trace!(
            "{}: busy {} us, slept {} us, overshoot {} us",
            self.label,
            busy.as_micros(),
            slept.as_micros(),
            self.overshoot.as_micros()
        );

        self.woke_at = Instant::now();
    }
}

/// Converts elapsed wall-clock time into whole timer ticks at a fixed frequency.
/// Leftover time carries into the next call so no ticks are lost to rounding.
#[derive(Debug, Clone)]
pub struct TimerClock {
    period: Duration,
    accumulated: Duration,
}

impl TimerClock {
    // timers are a byte wide so catching up on more ticks than this is pointless
    const MAX_TICKS: u32 = u8::MAX as u32;

    pub fn new(frequency: u32) -> Self {
        TimerClock {
            period: Duration::from_nanos(1_000_000_000 / frequency.max(1) as u64),
            accumulated: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated = self.accumulated.saturating_add(elapsed);

        let ticks = (self.accumulated.as_nanos() / self.period.as_nanos()) as u64;
        if ticks > Self::MAX_TICKS as u64 {
            log::debug!("dropping {} timer ticks", ticks - Self::MAX_TICKS as u64);
            self.accumulated = Duration::ZERO;
            return Self::MAX_TICKS;
        }

        self.accumulated -= self.period * ticks as u32;
        ticks as u32
    }
}
