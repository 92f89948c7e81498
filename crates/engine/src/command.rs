//! The command runner: executes an ordered action list against a bound
//! store client and applies the halt policy after every action.
//!
//! One `execute` call is exactly one reconciliation attempt for one
//! resource. The runner never retries, caches, or parallelizes; retry and
//! backoff belong to the external scheduler that re-invokes it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::action::{Action, CreateOptions};
use crate::annotator::{set_controller_reference, Annotator, LAST_APPLIED_ANNOTATION};
use crate::error::{Error, Result};
use crate::result::ExecResult;
use converge_store::{Object, StoreClient};

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Annotation key for the last-applied snapshot.
    pub annotation_key: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            annotation_key: LAST_APPLIED_ANNOTATION.to_string(),
        }
    }
}

/// Per-invocation context carrying the cancellation flag.
///
/// Cancelling makes the next action yield [`Error::Cancelled`] and the
/// runner halt; an in-flight store call reports cancellation through
/// [`converge_store::StoreError::Cancelled`].
#[derive(Clone, Default)]
pub struct ReconcileContext {
    cancelled: Arc<AtomicBool>,
}

impl ReconcileContext {
    /// Create a fresh context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the invocation using this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Executes ordered action lists against a store client.
///
/// Holds no mutable state: concurrent invocations for different resources
/// share only the client handle. Correctness under concurrent writes to the
/// *same* resource is delegated to the store's optimistic concurrency.
pub struct ClientCommand<S> {
    client: Arc<S>,
    annotator: Annotator,
}

impl<S: StoreClient> ClientCommand<S> {
    /// Create a runner with default configuration.
    pub fn new(client: Arc<S>) -> Self {
        Self::with_config(client, CommandConfig::default())
    }

    /// Create a runner with the given configuration.
    pub fn with_config(client: Arc<S>, config: CommandConfig) -> Self {
        Self {
            client,
            annotator: Annotator::new(config.annotation_key),
        }
    }

    /// The annotator stamping this runner's creates.
    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    /// Execute the actions strictly in order.
    ///
    /// After each action: `Error`, `Requeue`, and `RequeueAfter` halt
    /// immediately and become the final result; `Continue` and `NotFound`
    /// proceed. An exhausted list returns `Continue` — the explicit "nothing
    /// needed to change" signal.
    pub async fn execute(&self, ctx: &ReconcileContext, actions: Vec<Action>) -> ExecResult {
        for action in actions {
            let result = self.run_action(ctx, action).await;
            if result.halts() {
                if let Some(ref err) = result.err {
                    warn!(error = %err, "Reconciliation halted with error");
                }
                return result;
            }
        }
        ExecResult::cont()
    }

    fn run_action<'a>(
        &'a self,
        ctx: &'a ReconcileContext,
        action: Action,
    ) -> BoxFuture<'a, ExecResult> {
        Box::pin(async move {
            if ctx.is_cancelled() {
                return ExecResult::error(Error::Cancelled);
            }

            debug!(action = %action.description(), "Executing action");
            match action {
                Action::Get { kind, key } => match self.client.get(&kind, &key).await {
                    Ok(obj) => ExecResult::cont().with_value(obj),
                    Err(err) if err.is_not_found() => ExecResult::not_found(),
                    Err(err) => ExecResult::error(err.into()),
                },

                Action::Create { object, options } => match self.prepare_create(object, options) {
                    Ok(object) => match self.client.create(&object).await {
                        Ok(stored) => ExecResult::requeue().with_value(stored),
                        Err(err) => ExecResult::error(err.into()),
                    },
                    Err(err) => ExecResult::error(err),
                },

                Action::Update { object } => match self.client.update(&object).await {
                    Ok(stored) => ExecResult::requeue().with_value(stored),
                    Err(err) => ExecResult::error(err.into()),
                },

                Action::Delete { object } => match self.client.delete(&object).await {
                    Ok(()) => ExecResult::cont(),
                    Err(err) => ExecResult::error(err.into()),
                },

                Action::Call { decide } => match decide() {
                    Ok(Some(next)) => self.run_action(ctx, next).await,
                    Ok(None) => ExecResult::cont(),
                    Err(err) => ExecResult::error(err),
                },

                Action::StoreResult { slot, inner } => {
                    let result = self.run_action(ctx, *inner).await;
                    slot.set(result.clone());
                    result
                }

                Action::UpdateStatusCondition { object, condition } => {
                    let mut object = object;
                    if !object.status.conditions.set(condition) {
                        debug!(key = %object.key(), "Status condition unchanged, skipping write");
                        return ExecResult::cont();
                    }
                    match self.client.update_status(&object).await {
                        Ok(stored) => ExecResult::requeue().with_value(stored),
                        Err(err) => ExecResult::error(err.into()),
                    }
                }
            }
        })
    }

    fn prepare_create(&self, mut object: Object, options: CreateOptions) -> Result<Object> {
        // Owner first: the snapshot must record the owner reference this
        // same create writes.
        if let Some(owner) = options.owner {
            set_controller_reference(&owner, &mut object)?;
        }
        if options.annotate {
            self.annotator.set_last_applied(&mut object)?;
        }
        Ok(object)
    }
}

/// Builder for [`ClientCommand`].
pub struct ClientCommandBuilder<S> {
    client: Option<Arc<S>>,
    config: CommandConfig,
}

impl<S: StoreClient> ClientCommandBuilder<S> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            client: None,
            config: CommandConfig::default(),
        }
    }

    /// Set the store client.
    #[must_use]
    pub fn with_client(mut self, client: Arc<S>) -> Self {
        self.client = Some(client);
        self
    }

    /// Override the last-applied annotation key.
    #[must_use]
    pub fn annotation_key(mut self, key: impl Into<String>) -> Self {
        self.config.annotation_key = key.into();
        self
    }

    /// Build the runner.
    pub fn build(self) -> Result<ClientCommand<S>> {
        let client = self
            .client
            .ok_or_else(|| Error::config("store client is required"))?;
        if self.config.annotation_key.is_empty() {
            return Err(Error::config("annotation key must not be empty"));
        }
        Ok(ClientCommand::with_config(client, self.config))
    }
}

impl<S: StoreClient> Default for ClientCommandBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
