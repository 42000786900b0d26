// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Progress ticks and end-of-recording detection.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, sleep_until};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub current_ms: u64,
    pub total_ms: u64,
}

impl Progress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total_ms == 0 {
            1.0
        } else {
            self.current_ms as f64 / self.total_ms as f64
        }
    }
}

/// Sent by a running timer. `run` identifies the run that produced it so
/// that events from a superseded run can be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { run: u64, progress: Progress },
    Finished { run: u64 },
}

impl TimerEvent {
    pub fn run(&self) -> u64 {
        match self {
            TimerEvent::Tick { run, .. } | TimerEvent::Finished { run } => *run,
        }
    }
}

#[derive(Debug)]
struct Running {
    from_ms: u64,
    anchor: Instant,
    task: JoinHandle<()>,
}

/// Counts from an offset up to the total duration, reporting every tick.
///
/// Each run is a task that sends at most one [`TimerEvent::Finished`].
/// Starting a new run or stopping aborts the previous task.
#[derive(Debug)]
pub struct ProgressTimer {
    total_ms: u64,
    tick: Duration,
    events: mpsc::UnboundedSender<TimerEvent>,
    run: u64,
    running: Option<Running>,
    stopped_at_ms: u64,
}

impl ProgressTimer {
    pub fn new(total_ms: u64, tick: Duration, events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            total_ms,
            tick: tick.max(Duration::from_millis(1)),
            events,
            run: 0,
            running: None,
            stopped_at_ms: 0,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start a run from `from_ms` counting from `anchor`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn run_anchored(&mut self, from_ms: u64, anchor: Instant) {
        self.halt();
        self.run += 1;

        let run = self.run;
        let from_ms = from_ms.min(self.total_ms);
        let total_ms = self.total_ms;
        let tick = self.tick;
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            if from_ms >= total_ms {
                let _ = events.send(TimerEvent::Finished { run });
                return;
            }
            let end = anchor + Duration::from_millis(total_ms - from_ms);
            let mut interval = tokio::time::interval_at(anchor + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                // The last tick lands on the end even when `tick` does not divide it.
                let at = tokio::select! {
                    at = interval.tick() => at,
                    () = sleep_until(end) => end,
                };
                let elapsed = at.saturating_duration_since(anchor).as_millis() as u64;
                let current_ms = (from_ms + elapsed).min(total_ms);
                trace!(run, current_ms, "progress tick");
                let progress = Progress {
                    current_ms,
                    total_ms,
                };
                if events.send(TimerEvent::Tick { run, progress }).is_err() {
                    return;
                }
                if current_ms >= total_ms {
                    let _ = events.send(TimerEvent::Finished { run });
                    return;
                }
            }
        });

        self.running = Some(Running {
            from_ms,
            anchor,
            task,
        });
    }

    pub fn run(&mut self, from_ms: u64) {
        self.run_anchored(from_ms, Instant::now());
    }

    /// Stop the current run, keeping its position.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
            self.stopped_at_ms = Self::position(&running, self.total_ms, Instant::now());
        }
    }

    /// Current position of the timer.
    pub fn current_ms(&self) -> u64 {
        match &self.running {
            Some(running) => Self::position(running, self.total_ms, Instant::now()),
            None => self.stopped_at_ms,
        }
    }

    /// Whether `event` belongs to the live run. A `Finished` event from the
    /// live run also ends it.
    pub fn accept(&mut self, event: &TimerEvent) -> bool {
        if self.running.is_none() || event.run() != self.run {
            return false;
        }
        if let TimerEvent::Finished { .. } = event {
            self.running = None;
            self.stopped_at_ms = self.total_ms;
        }
        true
    }

    fn halt(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }

    fn position(running: &Running, total_ms: u64, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(running.anchor).as_millis() as u64;
        (running.from_ms + elapsed).min(total_ms)
    }
}

impl Drop for ProgressTimer {
    fn drop(&mut self) {
        self.halt();
    }
}
