use futures::future::{AbortHandle, Abortable};
use leptos::prelude::on_cleanup;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Tracks the asynchronous work started on behalf of a component, so that it can be cancelled as
/// a whole. Cancelled futures never resume, so nothing they would have written lands anywhere.
#[derive(Debug, Clone, Default)]
pub struct TaskScope {
    tasks: Arc<Mutex<Tasks>>,
}

#[derive(Debug, Default)]
struct Tasks {
    next_id: u64,
    running: HashMap<u64, AbortHandle>,
}

fn lock(tasks: &Mutex<Tasks>) -> MutexGuard<'_, Tasks> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels everything still running in this scope once the current reactive owner is
    /// disposed, E.g. when the component creating this scope unmounts.
    pub fn tie_to_owner(&self) {
        let scope = self.clone();
        on_cleanup(move || scope.cancel_all());
    }

    /// Registers `fut` with this scope. Resolves to `None` if the scope was cancelled first.
    pub fn wrap<F: Future>(&self, fut: F) -> impl Future<Output = Option<F::Output>> + use<F> {
        let (handle, registration) = AbortHandle::new_pair();
        let id = {
            let mut tasks = lock(&self.tasks);
            let id = tasks.next_id;
            tasks.next_id += 1;
            tasks.running.insert(id, handle);
            id
        };
        let tasks = Arc::clone(&self.tasks);

        async move {
            let output = Abortable::new(fut, registration).await.ok();
            lock(&tasks).running.remove(&id);
            output
        }
    }

    pub fn cancel_all(&self) {
        let handles = lock(&self.tasks)
            .running
            .drain()
            .map(|(_, handle)| handle)
            .collect::<Vec<_>>();
        for handle in &handles {
            handle.abort();
        }
        if !handles.is_empty() {
            tracing::trace!(cancelled = handles.len(), "Cancelled running tasks");
        }
    }

    /// Number of wrapped futures neither completed nor cancelled.
    pub fn running(&self) -> usize {
        lock(&self.tasks).running.len()
    }
}
