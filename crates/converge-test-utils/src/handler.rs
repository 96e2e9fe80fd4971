//! [`RecordingHandler`] fixture.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use converge_core::{ChangeApplicationError, ChangeFuture, ChangeHandler, Operation, ResourceChange};
use futures::FutureExt;

use crate::cluster::InMemoryCluster;

/// A change handler that records every change it is asked to apply.
///
/// Changes for names registered with [`failing_on`](Self::failing_on)
/// complete with an error; the others are written to the attached
/// [`InMemoryCluster`], if any. Cloning shares the recordings.
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    supported: Vec<Operation>,
    failing: BTreeSet<String>,
    cluster: Option<InMemoryCluster>,
    calls: Arc<AtomicUsize>,
    applied: Arc<Mutex<Vec<ResourceChange>>>,
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHandler {
    /// A handler supporting CREATE, UPDATE and DELETE.
    pub fn new() -> Self {
        Self::supporting(&[Operation::Create, Operation::Update, Operation::Delete])
    }

    pub fn supporting(ops: &[Operation]) -> Self {
        Self {
            supported: ops.to_vec(),
            failing: BTreeSet::new(),
            cluster: None,
            calls: Arc::new(AtomicUsize::new(0)),
            applied: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_cluster(mut self, cluster: InMemoryCluster) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Number of `apply` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every change passed to `apply`, in order.
    pub fn applied(&self) -> Vec<ResourceChange> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn applied_names(&self) -> Vec<String> {
        self.applied().iter().map(|c| c.name().to_string()).collect()
    }
}

impl ChangeHandler for RecordingHandler {
    fn supported_change_types(&self) -> &[Operation] {
        &self.supported
    }

    fn apply(&self, changes: &[ResourceChange]) -> Result<Vec<ChangeFuture>, ChangeApplicationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(changes.iter().cloned());

        Ok(changes
            .iter()
            .map(|change| {
                let outcome = if self.failing.contains(change.name()) {
                    Err(ChangeApplicationError::new(format!(
                        "refusing to {} '{}'",
                        change.op,
                        change.name()
                    )))
                } else {
                    if let Some(cluster) = &self.cluster {
                        cluster.apply(change);
                    }
                    Ok(())
                };
                async move { outcome }.boxed()
            })
            .collect())
    }
}
