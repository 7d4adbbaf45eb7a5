//! Event pump: feeds a channel of events through a scheduler.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info};

use crate::core::error::SchedulerError;
use crate::core::outcome::DispatchOutcome;
use crate::core::scheduler::Scheduler;

/// Dispatch every event received on `input` and forward each outcome to `output`.
///
/// Runs until `input` disconnects, or until `output` disconnects (the outcome of
/// the event in flight is dropped). Outcomes leave in the order events arrived.
/// Returns the number of events dispatched.
///
/// # Errors
///
/// The first scheduler-level error ends the pump and is returned.
pub fn pump<E, R, S>(
    scheduler: &S,
    input: Receiver<Arc<E>>,
    output: Sender<DispatchOutcome<R>>,
) -> Result<usize, SchedulerError>
where
    S: Scheduler<E, R> + ?Sized,
{
    let mut dispatched = 0_usize;
    for event in input {
        let outcome = scheduler.dispatch(event)?;
        dispatched += 1;
        if output.send(outcome).is_err() {
            debug!(dispatched, "Pump output closed");
            break;
        }
    }
    info!(dispatched, scheduler = scheduler.kind(), "Pump finished");
    Ok(dispatched)
}
