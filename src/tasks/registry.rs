//! Task registry: insertion-ordered name → producer map
//!
//! Registration order matters twice: snapshot keys keep a stable order, and
//! when several tasks fail in one tick, the first error in registration
//! order is the one published.

use super::{TaskFuture, TaskProducer, TaskResult};
use crate::constants::ops::HOST_KEY;
use crate::error::RegistryError;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// Ordered collection of named metric producers
///
/// Names are unique and may not collide with the reserved snapshot key.
/// The registry itself is not synchronized; the scheduler guards it and
/// refuses registration while its tick loop is active.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Vec<(String, TaskProducer)>,
}

impl TaskRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer under `name`
    ///
    /// Rejects duplicate names and the reserved `host` key at registration
    /// time, so a collision never surfaces as a tick-time surprise.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, producer: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        let name = name.into();
        if name == HOST_KEY {
            return Err(RegistryError::ReservedName(name));
        }
        if self.contains(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.tasks
            .push((name, Arc::new(move || producer().boxed())));
        Ok(())
    }

    /// Whether a task with this name exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.iter().any(|(existing, _)| existing == name)
    }

    /// Task names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Start one invocation of every task, in registration order
    ///
    /// Producers are lazy; this collects the futures without driving them.
    pub(crate) fn launch_all(&self) -> Vec<(String, TaskFuture)> {
        self.tasks
            .iter()
            .map(|(name, producer)| (name.clone(), producer()))
            .collect()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_registry() {
        let registry = TaskRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_preserves_order() {
        let mut registry = TaskRegistry::new();
        registry.register("zeta", || async { Ok(json!(1)) }).unwrap();
        registry.register("alpha", || async { Ok(json!(2)) }).unwrap();
        registry.register("mid", || async { Ok(json!(3)) }).unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = TaskRegistry::new();
        registry.register("osload", || async { Ok(json!(0)) }).unwrap();

        let err = registry
            .register("osload", || async { Ok(json!(1)) })
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("osload".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reserved_host_key_rejected() {
        let mut registry = TaskRegistry::new();
        let err = registry
            .register("host", || async { Ok(json!("nope")) })
            .unwrap_err();
        assert_eq!(err, RegistryError::ReservedName("host".to_string()));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_sync_and_async_producers_share_contract() {
        let mut registry = TaskRegistry::new();
        registry
            .register("immediate", || async { Ok(json!("now")) })
            .unwrap();
        registry
            .register("delayed", || async {
                tokio::task::yield_now().await;
                Ok(json!("later"))
            })
            .unwrap();

        for (name, future) in registry.launch_all() {
            let value = future.await.unwrap();
            match name.as_str() {
                "immediate" => assert_eq!(value, json!("now")),
                "delayed" => assert_eq!(value, json!("later")),
                other => panic!("unexpected task {other}"),
            }
        }
    }

    #[tokio::test]
    async fn test_producer_error_propagates() {
        let mut registry = TaskRegistry::new();
        registry
            .register("broken", || async { Err(anyhow::anyhow!("there was an error")) })
            .unwrap();

        let (_, future) = registry.launch_all().into_iter().next().unwrap();
        let err = future.await.unwrap_err();
        assert_eq!(err.to_string(), "there was an error");
    }
}
