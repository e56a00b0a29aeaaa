use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::state::MutationState;

type Operation<P, T, E> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;
type SuccessHook<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Started,
    Ignored,
}

/// Runs one write operation at a time. The success hook runs before the
/// state flips to `Success`, so anyone awaiting [`settled`](Self::settled)
/// sees its effects.
pub struct Mutation<P, T, E> {
    operation: Operation<P, T, E>,
    on_success: Option<SuccessHook<T>>,
    state: Arc<watch::Sender<MutationState<T, E>>>,
}

impl<P, T, E> Mutation<P, T, E>
where
    P: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + std::fmt::Display + 'static,
{
    pub fn new<F, Fut>(operation: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (state, _) = watch::channel(MutationState::Idle);
        Self {
            operation: Arc::new(move |payload| operation(payload).boxed()),
            on_success: None,
            state: Arc::new(state),
        }
    }

    pub fn on_success<H>(mut self, hook: H) -> Self
    where
        H: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn submit(&self, payload: P) -> Submission {
        let mut started = false;
        self.state.send_if_modified(|state| {
            if state.is_pending() {
                return false;
            }
            *state = MutationState::Pending;
            started = true;
            true
        });
        if !started {
            debug!("mutation already pending, submission ignored");
            return Submission::Ignored;
        }

        let operation = self.operation.clone();
        let on_success = self.on_success.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            match operation(payload).await {
                Ok(output) => {
                    if let Some(hook) = on_success {
                        hook(&output);
                    }
                    state.send_replace(MutationState::Success(output));
                }
                Err(error) => {
                    warn!(error = %error, "mutation failed");
                    state.send_replace(MutationState::Error(error));
                }
            }
        });
        Submission::Started
    }

    pub fn state(&self) -> MutationState<T, E> {
        self.state.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    pub async fn settled(&self) -> MutationState<T, E> {
        let mut receiver = self.state.subscribe();
        if let Ok(state) = receiver.wait_for(|state| !state.is_pending()).await {
            return state.clone();
        }
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::{Mutation, Submission};
    use crate::state::MutationState;

    #[tokio::test(start_paused = true)]
    async fn second_submission_while_pending_is_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mutation = Mutation::new({
            let calls = calls.clone();
            move |payload: u32| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok::<_, String>(payload * 2)
                }
            }
        });

        assert_eq!(mutation.submit(1), Submission::Started);
        assert!(mutation.is_pending());
        assert_eq!(mutation.submit(2), Submission::Ignored);

        assert_eq!(mutation.settled().await, MutationState::Success(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!mutation.is_pending());
    }

    #[tokio::test]
    async fn success_hook_runs_before_success_is_published() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mutation = Mutation::new(|payload: usize| async move { Ok::<_, String>(payload) })
            .on_success({
                let seen = seen.clone();
                move |output: &usize| {
                    seen.store(*output, Ordering::SeqCst);
                }
            });

        mutation.submit(7);
        assert_eq!(mutation.settled().await, MutationState::Success(7));
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn failure_is_surfaced_and_allows_resubmission() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let mutation = Mutation::new({
            let attempts = attempts.clone();
            move |_: ()| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err("bucket name invalid".to_string())
                    } else {
                        Ok(attempt)
                    }
                }
            }
        })
        .on_success({
            let hook_calls = hook_calls.clone();
            move |_: &usize| {
                hook_calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        mutation.submit(());
        let failed = mutation.settled().await;
        assert_eq!(failed.error().map(String::as_str), Some("bucket name invalid"));
        assert_eq!(hook_calls.load(Ordering::SeqCst), 0);

        assert_eq!(mutation.submit(()), Submission::Started);
        assert_eq!(mutation.settled().await, MutationState::Success(1));
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    }
}
