pub mod aggregator;
pub mod dispatcher;
pub mod job;
pub mod pool;

pub use aggregator::Aggregator;
pub use dispatcher::{Dispatcher, RunReport};
pub use job::{RowFinished, RowJob};
pub use pool::WorkerPool;
