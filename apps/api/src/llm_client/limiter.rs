use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use super::category::ServiceCategory;
use super::LlmError;

/// Per-category admission control for outbound calls.
///
/// One semaphore per category that declares a capacity; categories without
/// one resolve to their `limiter_category` semaphore.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    slots: HashMap<ServiceCategory, Arc<Semaphore>>,
}

impl ConcurrencyLimiter {
    pub fn new() -> Self {
        let slots = ServiceCategory::ALL
            .into_iter()
            .filter_map(|category| {
                category
                    .capacity()
                    .map(|permits| (category, Arc::new(Semaphore::new(permits))))
            })
            .collect();
        Self { slots }
    }

    /// Waits for a slot in `category`, runs `f`, then releases the slot.
    ///
    /// The permit is a guard local to this future, so it is returned on
    /// success, on error and when the future is dropped mid-flight.
    pub async fn with_slot<F, Fut, T>(&self, category: ServiceCategory, f: F) -> Result<T, LlmError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let semaphore = self
            .slots
            .get(&category.limiter_category())
            .ok_or_else(|| {
                LlmError::Configuration(format!("no concurrency limiter for category {category}"))
            })?;

        let _permit = semaphore.acquire().await.map_err(|_| {
            LlmError::Configuration(format!("concurrency limiter for {category} is closed"))
        })?;

        f().await
    }

    #[cfg(test)]
    pub fn available(&self, category: ServiceCategory) -> usize {
        self.slots
            .get(&category.limiter_category())
            .map(|s| s.available_permits())
            .unwrap_or(0)
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn run_instrumented(limiter: &ConcurrencyLimiter, category: ServiceCategory, tasks: usize) -> usize {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..tasks {
            let limiter = limiter.clone();
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                limiter
                    .with_slot(category, || async {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        peak.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn test_chapter_slots_bound_concurrency() {
        let limiter = ConcurrencyLimiter::new();
        let peak = run_instrumented(&limiter, ServiceCategory::Chapter, 4).await;
        assert_eq!(peak, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_article_slot_serializes_calls() {
        let limiter = ConcurrencyLimiter::new();
        let peak = run_instrumented(&limiter, ServiceCategory::Article, 2).await;
        assert_eq!(peak, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extra_task_waits_for_a_release() {
        let limiter = ConcurrencyLimiter::new();
        let started = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = limiter.clone();
            let started = Arc::clone(&started);
            handles.push(tokio::spawn(async move {
                limiter
                    .with_slot(ServiceCategory::Quiz, || async {
                        started.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        Ok(())
                    })
                    .await
            }));
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(started.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(started.load(Ordering::SeqCst), 3);

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_slot_released_on_error() {
        let limiter = ConcurrencyLimiter::new();

        let result: Result<(), LlmError> = limiter
            .with_slot(ServiceCategory::Game, || async {
                Err(LlmError::EmptyContent)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(limiter.available(ServiceCategory::Game), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_released_when_call_is_dropped() {
        let limiter = ConcurrencyLimiter::new();

        let stalled = limiter.with_slot(ServiceCategory::Game, || async {
            std::future::pending::<Result<(), LlmError>>().await
        });
        let outcome = tokio::time::timeout(Duration::from_secs(5), stalled).await;

        assert!(outcome.is_err());
        assert_eq!(limiter.available(ServiceCategory::Game), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_released_when_task_is_aborted() {
        let limiter = ConcurrencyLimiter::new();

        let handle = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter
                    .with_slot(ServiceCategory::Article, || async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(())
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(limiter.available(ServiceCategory::Article), 0);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(limiter.available(ServiceCategory::Article), 1);
    }

    #[tokio::test]
    async fn test_groq_consumes_chapter_slot() {
        let limiter = ConcurrencyLimiter::new();

        limiter
            .with_slot(ServiceCategory::Groq, || async {
                assert_eq!(limiter.available(ServiceCategory::Chapter), 2);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(limiter.available(ServiceCategory::Chapter), 3);
    }
}
