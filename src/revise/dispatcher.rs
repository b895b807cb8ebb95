//! Bounded-concurrency fan-out of paragraph revisions.
//!
//! Every unit is submitted to a fixed-size worker pool together with its
//! origin index. Results land in a pre-sized table of write-once slots keyed
//! by that index, so the final table does not depend on completion order.

use super::client::{RevisionBackend, RevisionClient};
use crate::extract::ParagraphUnit;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

pub const DEFAULT_POOL_SIZE: usize = 5;

/// Reported once per completed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Units completed so far, including this one.
    pub completed: usize,
    pub total: usize,
    /// Origin index of the unit that just completed.
    pub index: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Receives progress from worker threads, in completion order.
pub trait ProgressObserver: Sync {
    fn on_unit_complete(&self, progress: Progress);
}

impl<F> ProgressObserver for F
where
    F: Fn(Progress) + Sync,
{
    fn on_unit_complete(&self, progress: Progress) {
        self(progress)
    }
}

/// Observer that ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_unit_complete(&self, _progress: Progress) {}
}

/// Stops new units from being sent once triggered.
///
/// Units already in flight finish normally; units that had not started keep
/// their original text, so the table is still fully populated.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Revised text per unit, in unit index order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevisionTable(Vec<String>);

impl RevisionTable {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for RevisionTable {
    fn from(entries: Vec<String>) -> Self {
        Self(entries)
    }
}

pub struct Dispatcher<'a, B> {
    client: &'a RevisionClient<B>,
    pool_size: usize,
    cancel: Option<CancellationToken>,
}

impl<'a, B: RevisionBackend> Dispatcher<'a, B> {
    /// A dispatcher running at most `pool_size` revisions at once (minimum 1).
    pub fn new(client: &'a RevisionClient<B>, pool_size: usize) -> Self {
        Self {
            client,
            pool_size: pool_size.max(1),
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Revise every unit and block until all of them have completed.
    ///
    /// `units` must carry the indices `0..units.len()`, as produced by
    /// [`extract_paragraphs`](crate::extract::extract_paragraphs). The
    /// returned table has exactly one entry per unit.
    pub fn dispatch(
        &self,
        units: &[ParagraphUnit],
        observer: &dyn ProgressObserver,
    ) -> RevisionTable {
        let total = units.len();
        if total == 0 {
            return RevisionTable::default();
        }

        log::info!(
            "dispatching {} paragraphs to {} workers",
            total,
            self.pool_size
        );

        let slots: Vec<OnceLock<String>> = (0..total).map(|_| OnceLock::new()).collect();
        let completed = AtomicUsize::new(0);

        let run_unit = |unit: &ParagraphUnit| {
            let revised = if self.is_cancelled() {
                log::debug!("paragraph {} skipped after cancellation", unit.index + 1);
                unit.text.clone()
            } else {
                self.client.revise(unit)
            };

            match slots.get(unit.index) {
                Some(slot) => {
                    if slot.set(revised).is_err() {
                        log::error!("paragraph index {} dispatched twice", unit.index);
                    }
                }
                None => log::error!(
                    "paragraph index {} out of range for {} units",
                    unit.index,
                    total
                ),
            }

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            observer.on_unit_complete(Progress {
                completed: done,
                total,
                index: unit.index,
            });
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.pool_size)
            .thread_name(|i| format!("docrev-revise-{i}"))
            .build();

        match pool {
            Ok(pool) => pool.scope(|scope| {
                for unit in units {
                    let run_unit = &run_unit;
                    scope.spawn(move |_| run_unit(unit));
                }
            }),
            Err(e) => {
                log::warn!("failed to start worker pool ({e}), revising sequentially");
                units.iter().for_each(run_unit);
            }
        }

        let entries = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.into_inner().unwrap_or_else(|| {
                    log::error!("paragraph index {index} was never revised, keeping original");
                    units
                        .iter()
                        .find(|u| u.index == index)
                        .map(|u| u.text.clone())
                        .unwrap_or_default()
                })
            })
            .collect();

        RevisionTable(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revise::RevisionError;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    /// Uppercases text after a per-index delay; fails for listed indices.
    struct StubBackend {
        delays_ms: Vec<u64>,
        fail: HashSet<usize>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubBackend {
        fn new(delays_ms: Vec<u64>) -> Self {
            Self {
                delays_ms,
                fail: HashSet::new(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn failing(mut self, indices: &[usize]) -> Self {
            self.fail = indices.iter().copied().collect();
            self
        }
    }

    impl RevisionBackend for StubBackend {
        fn try_revise(&self, unit: &ParagraphUnit) -> Result<String, RevisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = self.delays_ms.get(unit.index).copied().unwrap_or(0);
            thread::sleep(Duration::from_millis(delay));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail.contains(&unit.index) {
                return Err(RevisionError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(unit.text.to_uppercase())
        }
    }

    fn units(n: usize) -> Vec<ParagraphUnit> {
        (0..n)
            .map(|i| ParagraphUnit::new(i, format!("paragraph {i}")))
            .collect()
    }

    #[test]
    fn test_table_is_index_aligned_despite_reverse_completion() {
        // Later units finish first.
        let delays = (0..8).rev().map(|d| d * 10).collect();
        let client = RevisionClient::new(StubBackend::new(delays));
        let units = units(8);

        let table = Dispatcher::new(&client, 5).dispatch(&units, &SilentProgress);

        assert_eq!(table.len(), 8);
        for unit in &units {
            assert_eq!(table.get(unit.index), Some(unit.text.to_uppercase().as_str()));
        }
    }

    #[test]
    fn test_failed_unit_keeps_original_text() {
        let client = RevisionClient::new(StubBackend::new(vec![0; 4]).failing(&[2]));
        let units = units(4);

        let table = Dispatcher::new(&client, 5).dispatch(&units, &SilentProgress);

        assert_eq!(table.get(2), Some("paragraph 2"));
        assert_eq!(table.get(1), Some("PARAGRAPH 1"));
        assert_eq!(table.get(3), Some("PARAGRAPH 3"));
        assert_eq!(client.failure_count(), 1);
    }

    #[test]
    fn test_progress_reported_once_per_unit() {
        let client = RevisionClient::new(StubBackend::new(vec![5, 0, 3, 1, 0, 2]));
        let units = units(6);
        let seen = Mutex::new(Vec::new());
        let observer = |p: Progress| seen.lock().unwrap().push(p);

        Dispatcher::new(&client, 3).dispatch(&units, &observer);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 6);
        assert!(seen.iter().all(|p| p.total == 6));

        let mut completed: Vec<usize> = seen.iter().map(|p| p.completed).collect();
        completed.sort_unstable();
        assert_eq!(completed, (1..=6).collect::<Vec<_>>());

        let indices: HashSet<usize> = seen.iter().map(|p| p.index).collect();
        assert_eq!(indices, (0..6).collect());
    }

    #[test]
    fn test_pool_size_bounds_concurrency() {
        let client = RevisionClient::new(StubBackend::new(vec![20; 10]));
        let units = units(10);

        Dispatcher::new(&client, 2).dispatch(&units, &SilentProgress);

        let backend = client.backend();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 10);
        assert!(backend.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_zero_pool_size_is_clamped() {
        let client = RevisionClient::new(StubBackend::new(vec![]));
        let dispatcher = Dispatcher::new(&client, 0);
        assert_eq!(dispatcher.pool_size(), 1);

        let table = dispatcher.dispatch(&units(3), &SilentProgress);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let client = RevisionClient::new(StubBackend::new(vec![]));
        let table = Dispatcher::new(&client, 5).dispatch(&[], &SilentProgress);
        assert!(table.is_empty());
        assert_eq!(client.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancelled_before_start_keeps_originals() {
        let client = RevisionClient::new(StubBackend::new(vec![0; 4]));
        let token = CancellationToken::new();
        token.cancel();
        let units = units(4);
        let reported = AtomicUsize::new(0);
        let observer = |_p: Progress| {
            reported.fetch_add(1, Ordering::SeqCst);
        };

        let table = Dispatcher::new(&client, 2)
            .with_cancellation(token)
            .dispatch(&units, &observer);

        assert_eq!(client.backend().calls.load(Ordering::SeqCst), 0);
        assert_eq!(table.into_inner(), crate::extract::unit_texts(&units));
        assert_eq!(reported.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_progress_fraction() {
        let p = Progress {
            completed: 1,
            total: 4,
            index: 0,
        };
        assert!((p.fraction() - 0.25).abs() < f64::EPSILON);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn prop_table_matches_units_for_any_completion_order(
            delays in proptest::collection::vec(0u64..8, 1..12),
            pool in 1usize..6,
        ) {
            let n = delays.len();
            let client = RevisionClient::new(StubBackend::new(delays));
            let units = units(n);

            let table = Dispatcher::new(&client, pool).dispatch(&units, &SilentProgress);

            prop_assert_eq!(table.len(), n);
            for unit in &units {
                prop_assert_eq!(table.get(unit.index).unwrap(), unit.text.to_uppercase());
            }
        }
    }
}
