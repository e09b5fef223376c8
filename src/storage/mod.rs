// Storage layout, lifecycle, and slicing

pub mod lifecycle;
pub mod slice;
pub mod yale;

pub use yale::{max_size_for, SetResult, YaleStorage, GROWTH_FACTOR};
