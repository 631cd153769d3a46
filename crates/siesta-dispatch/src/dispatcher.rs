//! Bounded-concurrency reschedule dispatch with per-item failure capture.

use std::{collections::HashMap, sync::Arc};

use siesta_core::{Booking, BookingUid, RescheduleOutcome, Rescheduler};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, error, info};

use crate::DEFAULT_MAX_CONCURRENCY;

/// Configuration for the reschedule dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of reschedule calls in flight at once. Must be >= 1.
    pub max_concurrency: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { max_concurrency: DEFAULT_MAX_CONCURRENCY }
    }
}

/// Aggregate result of a dispatch batch.
///
/// Outcome order follows completion order, which is not deterministic and
/// not meaningful; consumers count failures rather than index positions.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Per-booking outcomes, one entry per dispatched booking.
    pub outcomes: Vec<RescheduleOutcome>,
}

impl DispatchReport {
    /// Number of dispatches attempted.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// The failed outcomes, if any.
    pub fn failures(&self) -> Vec<&RescheduleOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure()).collect()
    }

    /// Number of failed dispatches.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Returns whether every dispatch in the batch succeeded.
    pub fn is_fully_successful(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Dispatches reschedule calls for a batch of bookings.
///
/// One supervised task per booking, gated by a semaphore sized to the
/// configured cap. The batch always runs to completion: individual failures
/// and panics are recorded as failure outcomes and never cancel, skip, or
/// abort the remaining items.
pub struct RescheduleDispatcher {
    rescheduler: Arc<dyn Rescheduler>,
    config: DispatchConfig,
}

impl RescheduleDispatcher {
    /// Creates a dispatcher around the given reschedule operation.
    pub fn new(rescheduler: Arc<dyn Rescheduler>, config: DispatchConfig) -> Self {
        Self { rescheduler, config }
    }

    /// Invokes the reschedule operation once per booking and waits for every
    /// attempt to settle.
    ///
    /// An empty input short-circuits to an empty report without touching the
    /// rescheduler. The returned report carries exactly one outcome per
    /// input booking.
    pub async fn dispatch_all(&self, bookings: Vec<Booking>, reason: &str) -> DispatchReport {
        if bookings.is_empty() {
            debug!("no bookings to reschedule, skipping dispatch");
            return DispatchReport::default();
        }

        info!(
            booking_count = bookings.len(),
            max_concurrency = self.config.max_concurrency,
            "dispatching reschedule batch"
        );

        // A cap below 1 would leave the semaphore permit-starved forever.
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks: JoinSet<RescheduleOutcome> = JoinSet::new();
        let mut uid_by_task: HashMap<tokio::task::Id, BookingUid> = HashMap::new();

        for booking in bookings {
            let semaphore = Arc::clone(&semaphore);
            let rescheduler = Arc::clone(&self.rescheduler);
            let reason = reason.to_string();
            let uid = booking.uid.clone();

            let handle = tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(closed) => {
                        return RescheduleOutcome::failure(
                            booking.uid,
                            format!("dispatch semaphore closed: {closed}"),
                        );
                    },
                };

                debug!(booking_uid = %booking.uid, "rescheduling booking");

                match rescheduler.reschedule(&booking.uid, &reason).await {
                    Ok(()) => RescheduleOutcome::success(booking.uid),
                    Err(e) => {
                        error!(booking_uid = %booking.uid, error = %e, "reschedule call failed");
                        RescheduleOutcome::failure(booking.uid, e.to_string())
                    },
                }
            });

            uid_by_task.insert(handle.id(), uid);
        }

        let mut outcomes = Vec::with_capacity(uid_by_task.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_id, outcome)) => outcomes.push(outcome),
                Err(join_error) => {
                    // A panic in one item must not take down the batch.
                    let uid = uid_by_task
                        .get(&join_error.id())
                        .cloned()
                        .unwrap_or_else(|| BookingUid::new("unknown"));
                    error!(booking_uid = %uid, error = %join_error, "reschedule task panicked");
                    outcomes
                        .push(RescheduleOutcome::failure(uid, format!("task panicked: {join_error}")));
                },
            }
        }

        let report = DispatchReport { outcomes };
        info!(
            attempted = report.attempted(),
            failed = report.failure_count(),
            "reschedule batch settled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use siesta_core::{BookingId, BookingStatus, SiestaError};

    use super::*;

    struct AlwaysOk;

    #[async_trait]
    impl Rescheduler for AlwaysOk {
        async fn reschedule(&self, _uid: &BookingUid, _reason: &str) -> siesta_core::Result<()> {
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Rescheduler for AlwaysFails {
        async fn reschedule(&self, uid: &BookingUid, _reason: &str) -> siesta_core::Result<()> {
            Err(SiestaError::Reschedule(format!("no availability for {uid}")))
        }
    }

    fn booking(uid: &str) -> Booking {
        Booking {
            id: BookingId(1),
            uid: BookingUid::from(uid),
            status: BookingStatus::Accepted,
        }
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let dispatcher = RescheduleDispatcher::new(Arc::new(AlwaysOk), DispatchConfig::default());
        let report = dispatcher.dispatch_all(Vec::new(), "reason").await;

        assert_eq!(report.attempted(), 0);
        assert!(report.is_fully_successful());
    }

    #[tokio::test]
    async fn report_counts_failures() {
        let dispatcher = RescheduleDispatcher::new(Arc::new(AlwaysFails), DispatchConfig::default());
        let report =
            dispatcher.dispatch_all(vec![booking("a"), booking("b")], "reason").await;

        assert_eq!(report.attempted(), 2);
        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.failures().len(), 2);
        assert!(!report.is_fully_successful());
    }

    #[tokio::test]
    async fn zero_cap_is_clamped_rather_than_deadlocking() {
        let dispatcher =
            RescheduleDispatcher::new(Arc::new(AlwaysOk), DispatchConfig { max_concurrency: 0 });
        let report = dispatcher.dispatch_all(vec![booking("a")], "reason").await;

        assert_eq!(report.attempted(), 1);
        assert!(report.is_fully_successful());
    }
}
