pub mod broker;
pub mod store;

pub use broker::{JobBroker, JobEnvelope, SharedQueue};
pub use store::{FjallQueue, QueueError};
