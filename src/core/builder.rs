use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{
    config::SchedulerConfig,
    pool::DispatchPool,
    scheduler::{Scheduler, Shared},
    sweeper::run_sweeper,
};
use crate::listeners::ListenerRef;

/// Builder for constructing a [`Scheduler`].
pub struct SchedulerBuilder {
    cfg: SchedulerConfig,
    listeners: Vec<ListenerRef>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            listeners: Vec::new(),
        }
    }

    /// Sets the initial lifecycle listeners (registration order is preserved,
    /// duplicates of the same instance are ignored).
    pub fn with_listeners(mut self, listeners: Vec<ListenerRef>) -> Self {
        self.listeners = listeners;
        self
    }

    /// Appends one initial listener.
    pub fn with_listener(mut self, listener: ListenerRef) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Builds the scheduler and starts its background tasks.
    ///
    /// This consumes the builder and initializes:
    /// - the job registry and listener bus
    /// - the admission queue and `thread_pool_size` workers
    /// - the timeout sweeper
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Scheduler {
        let shared = Arc::new(Shared::new(self.cfg));
        for listener in self.listeners {
            shared.listeners.register(listener);
        }

        let runtime_token = CancellationToken::new();
        let pool = DispatchPool::new(shared.cfg.queue_capacity());
        let mut tasks = JoinSet::new();

        let workers = shared.cfg.workers();
        pool.spawn_workers(&mut tasks, workers, &shared, &runtime_token);

        let sweep_every = shared.cfg.sweep_every();
        tasks.spawn(run_sweeper(
            Arc::clone(&shared),
            sweep_every,
            runtime_token.clone(),
        ));

        info!(
            workers,
            queue = pool.capacity(),
            cache = shared.cfg.max_cache_size,
            timeout = ?shared.cfg.timeout(),
            ?sweep_every,
            "scheduler started"
        );
        Scheduler::new_internal(shared, pool, runtime_token, tasks)
    }
}
