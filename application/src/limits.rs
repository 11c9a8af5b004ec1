//! Injected concurrency limits
//!
//! Two independent gates bound the pipeline: how many questions run
//! end-to-end at once, and how many individual model calls are in flight
//! across the whole process. Both are explicit values handed to the
//! pipeline entry point, never process-wide globals, so tests can run
//! with capacity 1 deterministically.

use crate::ports::model_invoker::{InvokeError, InvokeParams, ModelInvoker};
use async_trait::async_trait;
use foresight_domain::Model;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The pair of concurrency gates
#[derive(Clone)]
pub struct ConcurrencyLimits {
    questions: Arc<Semaphore>,
    model_calls: Arc<Semaphore>,
}

impl ConcurrencyLimits {
    pub fn new(max_questions: usize, max_model_calls: usize) -> Self {
        Self {
            questions: Arc::new(Semaphore::new(max_questions.max(1))),
            model_calls: Arc::new(Semaphore::new(max_model_calls.max(1))),
        }
    }

    /// Acquire a question slot for the duration of one pipeline run
    pub async fn acquire_question(&self) -> OwnedSemaphorePermit {
        match self.questions.clone().acquire_owned().await {
            Ok(permit) => permit,
            // The semaphore is owned by this struct and never closed
            Err(_) => unreachable!("question semaphore closed"),
        }
    }

    /// Acquire a model-call slot; held only for the duration of one call
    pub async fn acquire_model_call(&self) -> OwnedSemaphorePermit {
        match self.model_calls.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("model-call semaphore closed"),
        }
    }
}

impl Default for ConcurrencyLimits {
    /// One question at a time, five model calls in flight
    fn default() -> Self {
        Self::new(1, 5)
    }
}

/// Decorator that holds a model-call permit across each invocation.
///
/// The permit is an RAII guard, so it is released on every exit path,
/// panics included.
pub struct GovernedInvoker {
    inner: Arc<dyn ModelInvoker>,
    limits: ConcurrencyLimits,
}

impl GovernedInvoker {
    pub fn new(inner: Arc<dyn ModelInvoker>, limits: ConcurrencyLimits) -> Self {
        Self { inner, limits }
    }
}

#[async_trait]
impl ModelInvoker for GovernedInvoker {
    async fn invoke(
        &self,
        model: &Model,
        prompt: &str,
        params: &InvokeParams,
    ) -> Result<String, InvokeError> {
        let _permit = self.limits.acquire_model_call().await;
        self.inner.invoke(model, prompt, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Invoker that records how many calls are in flight at once
    struct CountingInvoker {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingInvoker {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelInvoker for CountingInvoker {
        async fn invoke(
            &self,
            _model: &Model,
            _prompt: &str,
            _params: &InvokeParams,
        ) -> Result<String, InvokeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn test_model_call_gate_bounds_concurrency() {
        let counting = Arc::new(CountingInvoker::new());
        let limits = ConcurrencyLimits::new(1, 2);
        let governed = Arc::new(GovernedInvoker::new(counting.clone(), limits));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let invoker = Arc::clone(&governed);
            handles.push(tokio::spawn(async move {
                invoker
                    .invoke(&Model::default(), "p", &InvokeParams::default())
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(counting.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_permit_released_after_failure() {
        struct FailingInvoker;

        #[async_trait]
        impl ModelInvoker for FailingInvoker {
            async fn invoke(
                &self,
                model: &Model,
                _prompt: &str,
                _params: &InvokeParams,
            ) -> Result<String, InvokeError> {
                Err(InvokeError::Provider {
                    model: model.as_str().to_string(),
                    message: "down".to_string(),
                })
            }
        }

        let limits = ConcurrencyLimits::new(1, 1);
        let governed = GovernedInvoker::new(Arc::new(FailingInvoker), limits);
        // With capacity 1, a leaked permit would deadlock the second call
        for _ in 0..3 {
            let result = governed
                .invoke(&Model::default(), "p", &InvokeParams::default())
                .await;
            assert!(result.is_err());
        }
    }
}
