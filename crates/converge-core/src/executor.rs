//! Change execution
//!
//! Routes each change to the first handler supporting its operation, hands
//! every handler its whole batch at once, then awaits all completion tokens
//! while isolating failures per change.

use std::sync::Arc;

use futures::future::{BoxFuture, join_all};

use crate::change::{ChangeResult, Operation, ResourceChange};
use crate::context::ReconciliationContext;
use crate::error::ChangeApplicationError;

/// Completion token for one change handed to a handler.
pub type ChangeFuture = BoxFuture<'static, Result<(), ChangeApplicationError>>;

/// Applies batches of changes to a backend.
pub trait ChangeHandler: Send + Sync {
    /// Operations this handler can apply.
    fn supported_change_types(&self) -> &[Operation];

    /// Start applying `changes` and return one completion token per change,
    /// in the same order.
    ///
    /// Must return without waiting for the backend. Returning `Err` fails
    /// every change of the batch.
    fn apply(&self, changes: &[ResourceChange]) -> Result<Vec<ChangeFuture>, ChangeApplicationError>;

    /// Human-readable description of what applying `change` does.
    fn describe(&self, change: &ResourceChange) -> String {
        change.describe()
    }

    fn supports(&self, op: Operation) -> bool {
        self.supported_change_types().contains(&op)
    }
}

/// A change waiting to be applied, with its position in the input.
struct Pending {
    slot: usize,
    description: String,
    change: ResourceChange,
}

/// Executes computed changes through a set of handlers.
#[derive(Clone, Default)]
pub struct ChangeExecutor {
    handlers: Vec<Arc<dyn ChangeHandler>>,
}

impl ChangeExecutor {
    pub fn new(handlers: Vec<Arc<dyn ChangeHandler>>) -> Self {
        Self { handlers }
    }

    pub fn with_handler(mut self, handler: Arc<dyn ChangeHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn handlers(&self) -> &[Arc<dyn ChangeHandler>] {
        &self.handlers
    }

    /// Execute `changes` under `context`.
    ///
    /// Results follow input order. NONE changes are reported `Ok` without
    /// touching a handler. In a dry run every other change is reported
    /// `Changed` and no handler method is called. Changes that no handler
    /// supports, or that the context mode disallows, are left out.
    pub async fn execute(
        &self,
        context: &ReconciliationContext,
        changes: Vec<ResourceChange>,
    ) -> Vec<ChangeResult> {
        let total = changes.len();
        let mut slots: Vec<Option<ChangeResult>> = (0..total).map(|_| None).collect();
        let mut batches: Vec<Vec<Pending>> = (0..self.handlers.len()).map(|_| Vec::new()).collect();

        for (slot, change) in changes.into_iter().enumerate() {
            if change.op.is_none() {
                let description = change.describe();
                slots[slot] = Some(ChangeResult::ok(change, description));
                continue;
            }

            if !context.mode.allows(change.op) {
                tracing::debug!(
                    resource = %change.name(),
                    op = %change.op,
                    mode = %context.mode,
                    "Skipping change not allowed by reconciliation mode"
                );
                continue;
            }

            if context.dry_run {
                let description = change.describe();
                tracing::info!("[dry-run] Would {}", description);
                slots[slot] = Some(ChangeResult::changed(change, description, false));
                continue;
            }

            match self.handlers.iter().position(|h| h.supports(change.op)) {
                Some(index) => {
                    let description = self.handlers[index].describe(&change);
                    batches[index].push(Pending {
                        slot,
                        description,
                        change,
                    });
                }
                None => {
                    tracing::warn!(
                        resource = %change.name(),
                        op = %change.op,
                        "No handler supports change, dropping it"
                    );
                }
            }
        }

        let mut in_flight = Vec::new();
        for (handler, batch) in self.handlers.iter().zip(batches) {
            if batch.is_empty() {
                continue;
            }
            self.dispatch(handler.as_ref(), batch, &mut slots, &mut in_flight);
        }

        let completed = join_all(in_flight.into_iter().map(|(pending, token)| async move {
            let outcome = token.await;
            (pending, outcome)
        }))
        .await;

        for (pending, outcome) in completed {
            let result = match outcome {
                Ok(()) => ChangeResult::changed(pending.change, pending.description, true),
                Err(err) => {
                    tracing::warn!(
                        resource = %pending.change.name(),
                        error = %err,
                        "Failed to apply change"
                    );
                    ChangeResult::failed(pending.change, pending.description, &err)
                }
            };
            slots[pending.slot] = Some(result);
        }

        slots.into_iter().flatten().collect()
    }

    /// Execute on the calling thread, blocking until every change settles.
    pub fn execute_blocking(
        &self,
        context: &ReconciliationContext,
        changes: Vec<ResourceChange>,
    ) -> Vec<ChangeResult> {
        futures::executor::block_on(self.execute(context, changes))
    }

    fn dispatch(
        &self,
        handler: &dyn ChangeHandler,
        batch: Vec<Pending>,
        slots: &mut [Option<ChangeResult>],
        in_flight: &mut Vec<(Pending, ChangeFuture)>,
    ) {
        let changes: Vec<ResourceChange> = batch.iter().map(|p| p.change.clone()).collect();
        tracing::debug!(count = changes.len(), "Dispatching batch to change handler");

        match handler.apply(&changes) {
            Err(err) => {
                tracing::warn!(error = %err, count = batch.len(), "Change handler rejected batch");
                for pending in batch {
                    slots[pending.slot] =
                        Some(ChangeResult::failed(pending.change, pending.description, &err));
                }
            }
            Ok(tokens) => {
                if tokens.len() > batch.len() {
                    tracing::warn!(
                        expected = batch.len(),
                        returned = tokens.len(),
                        "Change handler returned extra completion tokens"
                    );
                }
                let mut tokens = tokens.into_iter();
                for pending in batch {
                    match tokens.next() {
                        Some(token) => in_flight.push((pending, token)),
                        None => {
                            let err = ChangeApplicationError::new(
                                "change handler returned no completion for this change",
                            );
                            slots[pending.slot] =
                                Some(ChangeResult::failed(pending.change, pending.description, &err));
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ChangeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeExecutor")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
