//! Timer-backed scheduler
//!
//! One timer task per conversation. Jobs fire in the order they were
//! scheduled, each no earlier than its own deadline, so equal delays give
//! FIFO delivery.

use super::traits::Scheduler;
use super::Command;
use crate::state_machine::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct Job {
    deadline: Instant,
    event: Event,
}

/// Production scheduler driven by the tokio clock
pub struct TokioScheduler {
    job_tx: mpsc::UnboundedSender<Job>,
}

impl TokioScheduler {
    /// Start the timer task. Fired events go to `event_tx`; the task ends
    /// when `cancel` fires or the conversation stops listening.
    pub fn spawn(event_tx: mpsc::Sender<Command>, cancel: CancellationToken) -> Self {
        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<Job>();

        tokio::spawn(async move {
            loop {
                let job = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    job = job_rx.recv() => match job {
                        Some(job) => job,
                        None => break,
                    },
                };

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep_until(job.deadline) => {}
                }

                if event_tx.send(job.event.into()).await.is_err() {
                    tracing::debug!("Conversation no longer listening, dropping timer");
                    break;
                }
            }
            tracing::debug!("Timer task stopped");
        });

        Self { job_tx }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, event: Event) {
        let job = Job {
            deadline: Instant::now() + delay,
            event,
        };
        if self.job_tx.send(job).is_err() {
            tracing::debug!("Timer task gone, job dropped");
        }
    }
}
