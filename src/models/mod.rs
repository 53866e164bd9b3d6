// Domain models

mod container;
mod frame;

pub use container::{ContainerRef, NetCounters};
pub use frame::MetricsFrame;
