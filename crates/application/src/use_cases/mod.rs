pub mod dispatch;
pub mod lifecycle;

pub use dispatch::WorkerPool;
pub use lifecycle::{LifecycleController, LifecycleState};
