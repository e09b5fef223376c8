//! # nyale: diagonal-separated sparse matrix storage
//!
//! A mutable sparse-matrix storage engine in the modified ("new") Yale
//! compressed-row format: the diagonal lives in its own contiguously
//! indexed region, separate from the off-diagonal non-zeros, which are
//! stored in compressed-row order alongside an auxiliary index array.
//!
//! ## Overview
//!
//! The layout trades one extra slot per row for:
//!
//! - **O(1) diagonal access**, which iterative solvers hit constantly
//! - **O(log k) off-diagonal access** per row with k stored entries
//! - **In-place structural mutation** with geometric growth, keeping both
//!   parallel arrays synchronized under insertion
//!
//! On top of the storage sit three algebraic engines, each merging two
//! independently ordered sparse row representations:
//!
//! 1. **Element-wise combine**: two-pointer row merge under an operator
//! 2. **Equality**: the same merge, short-circuiting on first mismatch
//! 3. **Sparse multiply**: a symbolic pattern pass, a numeric
//!    accumulation pass, and a column-sort normalization pass
//!
//! ## Usage
//!
//! Statically typed storage:
//!
//! ```
//! use nyale::YaleStorage;
//!
//! let mut m = YaleStorage::<f64>::new((3, 3)).unwrap();
//! m.set(0, 2, 2.5).unwrap();
//! assert_eq!(m.get(0, 2), 2.5);
//! assert_eq!(m.get(2, 0), 0.0); // absent cells read as zero
//! ```
//!
//! Kind-tagged storage for callers that pick element types at runtime:
//!
//! ```
//! use nyale::{IndexKind, Storage, Value, ValueKind};
//!
//! let mut m = Storage::create(ValueKind::Float64, (3, 3), 2, 0, IndexKind::U8).unwrap();
//! m.set(0, 2, Value::Float64(2.5)).unwrap();
//! assert_eq!(m.get(0, 2), Value::Float64(2.5));
//! ```

pub mod dynamic;
pub mod error;
pub mod kind;
pub mod ops;
pub mod storage;
pub mod utils;

// Re-export primary components
pub use dynamic::{CombineOp, DynYale, Storage};
pub use error::{Result, StorageError};
pub use kind::{CastFrom, IndexKind, IndexValue, Scalar, Value, ValueKind};
pub use ops::{combine, multiply, storages_equal, transpose_copy, EwOp};
pub use storage::{max_size_for, SetResult, YaleStorage, GROWTH_FACTOR};
pub use utils::{from_sprs, to_dense, to_sprs};

/// Version information for the nyale library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
