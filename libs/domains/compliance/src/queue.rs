//! Background fan-out dispatch.
//!
//! Mutations must finish before their caller hears back; notification
//! delivery must not stretch that latency. The queue sits between them: the
//! sync engine enqueues `(profile, event)` jobs without waiting, and the
//! worker drains them against the fan-out engine. A full queue degrades to a
//! logged drop, never to back-pressure on the mutation path.

use std::sync::Arc;

use domain_notifications::{FanoutEngine, NotificationEvent};
use domain_profiles::Profile;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// One queued fan-out.
#[derive(Debug, Clone)]
pub struct FanoutJob {
    pub profile: Profile,
    pub event: NotificationEvent,
}

/// Producer half handed to the sync engine.
#[derive(Clone)]
pub struct FanoutQueue {
    tx: mpsc::Sender<FanoutJob>,
}

impl FanoutQueue {
    /// Create a bounded queue; returns the producer and the receiver the
    /// worker consumes.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<FanoutJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Enqueue one fan-out job without blocking the caller.
    pub fn enqueue(&self, profile: &Profile, event: NotificationEvent) {
        let job = FanoutJob {
            profile: profile.clone(),
            event,
        };

        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(
                    kind = %job.event.kind,
                    profile_id = %job.profile.id,
                    "Fan-out queue full; dropping event"
                );
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(
                    kind = %job.event.kind,
                    profile_id = %job.profile.id,
                    "Fan-out queue closed; dropping event"
                );
            }
        }
    }
}

/// Consumer half; owns the receiver and the fan-out engine.
pub struct FanoutWorker {
    rx: mpsc::Receiver<FanoutJob>,
    engine: Arc<FanoutEngine>,
}

impl FanoutWorker {
    pub fn new(rx: mpsc::Receiver<FanoutJob>, engine: Arc<FanoutEngine>) -> Self {
        Self { rx, engine }
    }

    /// Drain whatever is queued right now and return how many jobs ran.
    ///
    /// Used by tests and by graceful shutdown to flush the tail of the queue.
    pub async fn process_pending(&mut self) -> usize {
        let mut processed = 0;

        while let Ok(job) = self.rx.try_recv() {
            self.engine.notify(&job.profile, &job.event).await;
            processed += 1;
        }

        if processed > 0 {
            debug!(count = processed, "Drained pending fan-out jobs");
        }

        processed
    }

    /// Run until the shutdown signal flips, then flush the remainder.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Fan-out worker started");

        loop {
            tokio::select! {
                job = self.rx.recv() => {
                    match job {
                        Some(job) => {
                            self.engine.notify(&job.profile, &job.event).await;
                        }
                        None => {
                            debug!("Fan-out queue closed");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let flushed = self.process_pending().await;
        info!(flushed = flushed, "Fan-out worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_accounts::{Account, AccountRepository, InMemoryAccountRepository, Role};
    use domain_notifications::{
        InMemoryGateway, InMemoryNotificationRepository, NotificationKind,
    };
    use domain_profiles::CreateProfile;

    fn profile() -> Profile {
        Profile::new(
            CreateProfile {
                first_name: "Iris".to_string(),
                last_name: "Nkemelu".to_string(),
                email: "iris@example.com".to_string(),
                job_title: None,
                department: None,
                start_date: None,
                contact: Default::default(),
                address: Default::default(),
                emergency_contact: None,
            },
            1200,
            11112222,
        )
    }

    #[tokio::test]
    async fn test_worker_processes_enqueued_jobs() {
        let accounts = InMemoryAccountRepository::new();
        let gateway = InMemoryGateway::new();
        let engine = FanoutEngine::new(
            Arc::new(InMemoryNotificationRepository::new()),
            Arc::new(accounts.clone()),
            Arc::new(gateway.clone()),
        )
        .unwrap();

        accounts
            .create(Account::new(
                "admin@example.com".to_string(),
                None,
                "hash".to_string(),
                Role::Admin,
            ))
            .await
            .unwrap();

        let (queue, rx) = FanoutQueue::bounded(16);
        let mut worker = FanoutWorker::new(rx, Arc::new(engine));

        let profile = profile();
        queue.enqueue(
            &profile,
            NotificationEvent::new(NotificationKind::ProfileCreated, profile.id),
        );
        queue.enqueue(
            &profile,
            NotificationEvent::new(NotificationKind::ProfileUpdated, profile.id),
        );

        let processed = worker.process_pending().await;
        assert_eq!(processed, 2);
        assert_eq!(gateway.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let (queue, _rx) = FanoutQueue::bounded(1);
        let profile = profile();

        queue.enqueue(
            &profile,
            NotificationEvent::new(NotificationKind::ProfileCreated, profile.id),
        );
        // Does not deadlock; the second job is dropped with a warning
        queue.enqueue(
            &profile,
            NotificationEvent::new(NotificationKind::ProfileUpdated, profile.id),
        );
    }
}
