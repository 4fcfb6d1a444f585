// ── Bounded batch runner ──
//
// Runs one operation per address with at most `limit` in flight. A panic
// in one operation is caught and reported for that address only; the
// caller always gets exactly one entry per input address, in input order.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::net::Ipv4Addr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Why a batch entry produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// The operation panicked; carries the panic message.
    Panicked(String),
    /// The operation never completed (runtime shutting down).
    Cancelled,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panicked(msg) => write!(f, "worker panicked: {msg}"),
            Self::Cancelled => f.write_str("worker cancelled"),
        }
    }
}

/// Result for one address of a batch.
#[derive(Debug)]
pub struct BatchEntry<T> {
    pub address: Ipv4Addr,
    pub outcome: Result<T, TaskFailure>,
}

/// Fans an async operation out over a set of addresses.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    limit: usize,
}

impl BatchRunner {
    /// A zero limit is raised to one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `op` once per address and wait for all of them.
    ///
    /// Operations are only created once a permit is free, so at most
    /// `limit` futures exist at a time regardless of batch size.
    pub async fn run<F, Fut, T>(&self, addresses: Vec<Ipv4Addr>, op: F) -> Vec<BatchEntry<T>>
    where
        F: Fn(Ipv4Addr) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let total = addresses.len();
        debug!(total, limit = self.limit, "starting batch");

        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut tasks = JoinSet::new();

        for (index, address) in addresses.iter().copied().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let fut = op(address);
            tasks.spawn(async move {
                let outcome = AssertUnwindSafe(fut)
                    .catch_unwind()
                    .await
                    .map_err(|payload| TaskFailure::Panicked(panic_message(payload.as_ref())));
                drop(permit);
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<Result<T, TaskFailure>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(e) => warn!(error = %e, "batch task aborted"),
            }
        }

        let entries: Vec<BatchEntry<T>> = addresses
            .into_iter()
            .zip(slots)
            .map(|(address, slot)| BatchEntry {
                address,
                outcome: slot.unwrap_or(Err(TaskFailure::Cancelled)),
            })
            .collect();

        let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
        if failed > 0 {
            warn!(failed, total, "batch finished with failed workers");
        }
        entries
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn addresses(n: u8) -> Vec<Ipv4Addr> {
        (1..=n).map(|i| Ipv4Addr::new(10, 0, 0, i)).collect()
    }

    #[tokio::test]
    async fn returns_one_entry_per_address_in_order() {
        let input = addresses(20);
        let entries = BatchRunner::new(4)
            .run(input.clone(), |address| async move {
                // Finish out of order.
                let last = address.octets()[3];
                tokio::time::sleep(Duration::from_millis(u64::from(20 - last))).await;
                last
            })
            .await;

        assert_eq!(entries.len(), 20);
        for (entry, address) in entries.iter().zip(&input) {
            assert_eq!(entry.address, *address);
            assert_eq!(entry.outcome.as_ref().ok(), Some(&address.octets()[3]));
        }
    }

    #[tokio::test]
    async fn never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let entries = BatchRunner::new(3)
            .run(addresses(30), |_| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(entries.len(), 30);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn panic_is_isolated_to_one_entry() {
        let entries = BatchRunner::new(8)
            .run(addresses(5), |address| async move {
                assert!(address.octets()[3] != 3, "probe exploded");
                address.octets()[3]
            })
            .await;

        assert_eq!(entries.len(), 5);
        let failed: Vec<_> = entries.iter().filter(|e| e.outcome.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].address, Ipv4Addr::new(10, 0, 0, 3));
        assert!(
            matches!(&failed[0].outcome, Err(TaskFailure::Panicked(msg)) if msg.contains("probe exploded"))
        );
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let entries = BatchRunner::new(0).run(Vec::new(), |_| async {}).await;
        assert!(entries.is_empty());
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(BatchRunner::new(0).limit(), 1);
    }
}
