pub mod bootstrap;
pub mod coordinator;
pub mod embedder;
pub mod executor;
pub mod links;
pub mod ranker;
pub mod sources;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use bootstrap::build_coordinator;
pub use coordinator::{RegisteredSource, StreamCoordinator};
pub use executor::{Executor, Lane, TaskHandle, WorkerPool};
pub use sources::{Cursor, IncrementalSource, Page, SingleShotSource, SourceAdapter};
