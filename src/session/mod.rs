pub mod aggregator;

pub use aggregator::SessionAggregator;
