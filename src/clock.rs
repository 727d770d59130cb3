//! Game clock for the interactive loop
//!
//! The engine never looks at wall-clock time. This clock holds the two
//! deadlines a running game needs, the next tick and the end of the current
//! pause, and reports whichever comes first. Both can be cancelled, which is
//! how a restart makes sure no timer from the old game fires into the new one.

use std::pin::Pin;
use std::time::Duration;
use tokio::time::{Sleep, sleep};

use crate::game::{ResumeRequest, ResumeToken};

/// A deadline that ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Tick,
    Resume(ResumeToken),
}

#[derive(Default)]
pub struct GameClock {
    tick: Option<Pin<Box<Sleep>>>,
    resume: Option<(Pin<Box<Sleep>>, ResumeToken)>,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next tick, replacing any earlier one
    pub fn arm_tick(&mut self, delay: Duration) {
        self.tick = Some(Box::pin(sleep(delay)));
    }

    /// Schedule the end of a pause, replacing any earlier one
    pub fn arm_resume(&mut self, request: ResumeRequest) {
        self.resume = Some((Box::pin(sleep(request.delay)), request.token));
    }

    /// Drop both deadlines
    pub fn cancel_all(&mut self) {
        self.tick = None;
        self.resume = None;
    }

    pub fn tick_armed(&self) -> bool {
        self.tick.is_some()
    }

    pub fn resume_armed(&self) -> bool {
        self.resume.is_some()
    }

    /// Wait for the earliest armed deadline and disarm it.
    ///
    /// Never completes while nothing is armed. Cancel-safe: dropping the
    /// future leaves both deadlines in place.
    pub async fn next_event(&mut self) -> ClockEvent {
        let event = tokio::select! {
            biased;
            token = wait_resume(self.resume.as_mut()) => ClockEvent::Resume(token),
            _ = wait_tick(self.tick.as_mut()) => ClockEvent::Tick,
        };

        match event {
            ClockEvent::Tick => self.tick = None,
            ClockEvent::Resume(_) => self.resume = None,
        }
        event
    }
}

async fn wait_tick(sleep: Option<&mut Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.await,
        None => std::future::pending().await,
    }
}

async fn wait_resume(slot: Option<&mut (Pin<Box<Sleep>>, ResumeToken)>) -> ResumeToken {
    match slot {
        Some((sleep, token)) => {
            sleep.await;
            *token
        }
        None => std::future::pending().await,
    }
}
