//! Named metric-producing tasks
//!
//! A task is a zero-argument unit of work that yields exactly one JSON value
//! or one error per invocation. Synchronous and asynchronous producers share
//! the same boxed-future contract so the scheduler's merge-and-publish logic
//! never special-cases either shape.

mod builtin;
mod registry;

pub use builtin::register_builtin_tasks;
pub use registry::TaskRegistry;

use futures::future::BoxFuture;
use std::sync::Arc;

/// What one task invocation resolves to
pub type TaskResult = anyhow::Result<serde_json::Value>;

/// One in-flight task invocation
pub type TaskFuture = BoxFuture<'static, TaskResult>;

/// A registered producer: call it to get one invocation
pub(crate) type TaskProducer = Arc<dyn Fn() -> TaskFuture + Send + Sync>;
