use std::fmt;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;

type CommitHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Callbacks to run once a job's status change has been committed.
#[derive(Default)]
pub struct CommitHooks {
    hooks: Mutex<Vec<CommitHook>>,
}

impl CommitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).push(Box::new(move || Box::pin(hook())));
    }

    /// Run and drain the registered hooks in registration order. Later calls only see newly registered hooks.
    pub async fn run(&self) {
        let hooks = std::mem::take(&mut *self.hooks.lock().unwrap_or_else(PoisonError::into_inner));
        for hook in hooks {
            hook().await;
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CommitHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitHooks").field("pending", &self.len()).finish()
    }
}
