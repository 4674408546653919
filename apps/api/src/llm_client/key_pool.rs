//! Round-robin credential rotation, one pool per service category.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::category::ServiceCategory;
use super::LlmError;

/// Ordered credentials for one category. `next()` hands out the head and
/// moves it to the tail.
#[derive(Debug)]
pub struct KeyPool {
    name: String,
    keys: Mutex<VecDeque<String>>,
}

impl KeyPool {
    pub fn new(name: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            name: name.into(),
            keys: Mutex::new(keys.into_iter().collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next(&self) -> Option<String> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        let key = keys.pop_front()?;
        keys.push_back(key.clone());
        Some(key)
    }
}

/// All category pools, resolved once at startup.
///
/// A Gemini category with no dedicated keys is aliased to the shared pool, so
/// its rotation state is the shared pool's rotation state. `groq` is never
/// aliased: the shared pool holds keys for a different provider.
#[derive(Debug, Clone)]
pub struct KeyPools {
    pools: HashMap<ServiceCategory, Arc<KeyPool>>,
}

impl KeyPools {
    pub fn new(shared: Vec<String>, mut dedicated: HashMap<ServiceCategory, Vec<String>>) -> Self {
        let shared = Arc::new(KeyPool::new("shared", shared));
        let mut pools = HashMap::new();

        for category in ServiceCategory::ALL {
            let keys = dedicated.remove(&category).unwrap_or_default();
            let pool = if !keys.is_empty() || category == ServiceCategory::Groq {
                Arc::new(KeyPool::new(category.as_str(), keys))
            } else {
                Arc::clone(&shared)
            };
            info!(
                category = %category,
                pool = pool.name(),
                keys = pool.len(),
                "Key pool resolved"
            );
            pools.insert(category, pool);
        }

        Self { pools }
    }

    /// Returns the next credential for `category` in round-robin order.
    pub fn acquire(&self, category: ServiceCategory) -> Result<String, LlmError> {
        self.pools
            .get(&category)
            .and_then(|pool| pool.next())
            .ok_or_else(|| {
                LlmError::Configuration(format!(
                    "no credentials configured for category {category}"
                ))
            })
    }

    pub fn has_keys(&self, category: ServiceCategory) -> bool {
        self.pools
            .get(&category)
            .is_some_and(|pool| !pool.is_empty())
    }
}
