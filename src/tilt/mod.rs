pub mod estimator;

pub use estimator::{balance_ratio, direction_for, estimate};
