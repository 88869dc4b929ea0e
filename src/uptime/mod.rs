pub mod aggregator;
pub mod window;

pub use aggregator::UptimeAggregator;
pub use window::{window_heights, SignatureWindow};
