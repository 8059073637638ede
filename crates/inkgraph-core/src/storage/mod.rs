//! Storage abstraction for persisting projects.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::project::Project;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backend for whole-project snapshots.
///
/// Backends only move JSON text. `save` encodes the project before the
/// returned future runs, so no caller state is borrowed across the await, and
/// `load` decodes whatever the backend hands back, so every backend goes
/// through the same codec.
pub trait Storage: Send + Sync {
    /// Store the snapshot text for `id`, replacing any previous one.
    fn write(&self, id: &str, json: String) -> BoxFuture<'_, StorageResult<()>>;

    /// Fetch the snapshot text for `id`.
    fn read(&self, id: &str) -> BoxFuture<'_, StorageResult<String>>;

    fn save(&self, id: &str, project: &Project) -> BoxFuture<'_, StorageResult<()>> {
        match to_json(project) {
            Ok(json) => self.write(id, json),
            Err(e) => Box::pin(std::future::ready(Err(e))),
        }
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>> {
        let read = self.read(id);
        Box::pin(async move { from_json(&read.await?) })
    }
}

/// Serialize a project to the storage JSON.
pub fn to_json(project: &Project) -> StorageResult<String> {
    serde_json::to_string(project).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parse a project from the storage JSON.
pub fn from_json(json: &str) -> StorageResult<Project> {
    serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Simple blocking executor for tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
