// src/process/mod.rs

//! Process lifecycle layer.
//!
//! Everything that can be started, signalled, stopped and waited on
//! implements [`Process`]:
//!
//! - [`ManagedProcess`] owns a single OS child process.
//! - [`ProcessGroup`] fans every call out to its members concurrently and
//!   aggregates their results, so groups can be nested.
//! - [`output`] holds the byte sinks children write into and the
//!   line-prefixing decorator.
//! - [`supervisor`] is the per-run background task that owns the child.

pub mod group;
pub mod managed;
pub mod output;
mod supervisor;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::errors::Result;
use crate::types::Signal;

pub use group::ProcessGroup;
pub use managed::ManagedProcess;
pub use output::{OutputSink, PrefixedWriter, line_label};

/// Boxed future returned by [`Process`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Lifecycle contract shared by single processes and groups.
///
/// Methods return boxed futures (rather than `async fn`) so the trait stays
/// object safe: groups hold their members as `Arc<dyn Process>`.
pub trait Process: Send + Sync {
    /// Display name used in logs and output prefixes.
    fn name(&self) -> &str;

    /// Start without waiting for completion.
    fn start(&self) -> BoxFuture<'_, Result<()>>;

    /// Ask the process to terminate, force-killing it once `timeout` expires.
    ///
    /// Dying from the signals `stop` itself sent counts as success; any
    /// other failed exit observed meanwhile is returned as the error.
    fn stop(&self, timeout: Duration) -> BoxFuture<'_, Result<()>>;

    /// Deliver `signal` to the running process.
    fn signal(&self, signal: Signal) -> BoxFuture<'_, Result<()>>;

    /// Suspend until the process has exited.
    fn wait(&self) -> BoxFuture<'_, Result<()>>;

    fn is_running(&self) -> bool;
}
