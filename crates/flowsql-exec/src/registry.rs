//! Named result sets.
//!
//! A `ResultSetStore` holds typed collections, each a `Registry<T>` mapping a
//! query-chosen name to a value (normally a `PersistedPipeline`). The store is
//! passed explicitly to whoever needs it; there is no global instance.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tracing::info;

use crate::error::{ExecError, Result};

type Entries<T> = Arc<RwLock<HashMap<String, T>>>;

#[derive(Default)]
pub struct ResultSetStore {
    collections: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ResultSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collection `collection_id`, created empty on first use.
    ///
    /// Fails if the collection already exists with a different value type.
    pub fn get<T>(&self, collection_id: &str) -> Result<Registry<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| ExecError::Invalid("result-set store lock poisoned".into()))?;

        let any = collections
            .entry(collection_id.to_string())
            .or_insert_with(|| {
                let fresh: Entries<T> = Arc::new(RwLock::new(HashMap::new()));
                fresh as Arc<dyn Any + Send + Sync>
            })
            .clone();

        let entries = any.downcast::<RwLock<HashMap<String, T>>>().map_err(|_| {
            ExecError::Invalid(format!(
                "result-set collection '{collection_id}' holds a different value type"
            ))
        })?;

        Ok(Registry {
            collection_id: collection_id.to_string(),
            entries,
        })
    }
}

/// Handle to one collection. Clones share the same entries.
pub struct Registry<T> {
    collection_id: String,
    entries: Entries<T>,
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            collection_id: self.collection_id.clone(),
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Registry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub async fn try_find(&self, name: &str) -> Option<T> {
        self.entries.read().await.get(name).cloned()
    }

    /// Run `producer`, then store its value under `name`, replacing any
    /// previous entry. Nothing is stored if the producer fails.
    pub async fn upsert<F, Fut>(&self, name: &str, producer: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let value = producer().await?;
        let replaced = self
            .entries
            .write()
            .await
            .insert(name.to_string(), value)
            .is_some();
        info!(collection = %self.collection_id, name, replaced, "result set upserted");
        Ok(())
    }

    /// Names in this collection, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
