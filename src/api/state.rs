use std::sync::Arc;

use crate::observability::Metrics;
use crate::queue::{JobBroker, SharedQueue};

#[derive(Clone)]
pub struct AppState {
    pub queue: SharedQueue,
    pub broker: Arc<JobBroker>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(queue: SharedQueue, broker: Arc<JobBroker>, metrics: Arc<Metrics>) -> Self {
        Self {
            queue,
            broker,
            metrics,
        }
    }
}
