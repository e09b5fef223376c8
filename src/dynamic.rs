//! Kind-tagged storage for callers that pick element types at runtime
//!
//! The generic core is statically typed over a value kind and an index
//! width. This module wraps it in a sum type, [`Storage`], tagged first by
//! value kind and then by index width, and dispatches each public operation
//! exactly once at this boundary into the generic implementation. Binary
//! operations unify their operands first: value kinds are promoted and the
//! narrower index width is widened, then both sides dispatch through the
//! same arm.

use std::borrow::Cow;

use crate::error::{Result, StorageError};
use crate::kind::{IndexKind, IndexValue, Scalar, Value, ValueKind};
use crate::ops::{self, EwOp};
use crate::storage::yale::{SetResult, YaleStorage};

/// A matrix with its index width chosen at runtime
#[derive(Debug, Clone)]
pub enum DynYale<T> {
    U8(YaleStorage<T, u8>),
    U16(YaleStorage<T, u16>),
    U32(YaleStorage<T, u32>),
    U64(YaleStorage<T, u64>),
}

/// A matrix with both its value kind and index width chosen at runtime
#[derive(Debug, Clone)]
pub enum Storage {
    Int32(DynYale<i32>),
    Int64(DynYale<i64>),
    Float32(DynYale<f32>),
    Float64(DynYale<f64>),
}

/// Element-wise operators accepted by [`Storage::combine`]
///
/// The arithmetic operators dispatch into the element-wise engine; the
/// comparison operators are part of the contract but deliberately
/// unimplemented for this storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CombineOp {
    fn arithmetic(self) -> Option<EwOp> {
        match self {
            CombineOp::Add => Some(EwOp::Add),
            CombineOp::Sub => Some(EwOp::Sub),
            CombineOp::Mul => Some(EwOp::Mul),
            CombineOp::Div => Some(EwOp::Div),
            _ => None,
        }
    }
}

// Evaluate a body once per index-width variant, binding the inner matrix.
macro_rules! with_dyn {
    ($d:expr, $m:ident => $body:expr) => {
        match $d {
            DynYale::U8($m) => $body,
            DynYale::U16($m) => $body,
            DynYale::U32($m) => $body,
            DynYale::U64($m) => $body,
        }
    };
}

// Evaluate a body once per value-kind and index-width variant.
macro_rules! with_storage {
    ($s:expr, $m:ident => $body:expr) => {
        match $s {
            Storage::Int32(d) => with_dyn!(d, $m => $body),
            Storage::Int64(d) => with_dyn!(d, $m => $body),
            Storage::Float32(d) => with_dyn!(d, $m => $body),
            Storage::Float64(d) => with_dyn!(d, $m => $body),
        }
    };
}

// Rebuild the same index-width variant around a transformed matrix.
macro_rules! map_dyn {
    ($d:expr, $m:ident => $body:expr) => {
        match $d {
            DynYale::U8($m) => DynYale::U8($body),
            DynYale::U16($m) => DynYale::U16($body),
            DynYale::U32($m) => DynYale::U32($body),
            DynYale::U64($m) => DynYale::U64($body),
        }
    };
}

// Rebuild the same value-kind and index-width variants around a transformed
// matrix.
macro_rules! map_storage {
    ($s:expr, $m:ident => $body:expr) => {
        match $s {
            Storage::Int32(d) => Storage::Int32(map_dyn!(d, $m => $body)),
            Storage::Int64(d) => Storage::Int64(map_dyn!(d, $m => $body)),
            Storage::Float32(d) => Storage::Float32(map_dyn!(d, $m => $body)),
            Storage::Float64(d) => Storage::Float64(map_dyn!(d, $m => $body)),
        }
    };
}

// Dispatch a pair of unified operands (same value kind, same index width),
// wrapping the resulting matrix back into the shared variant.
macro_rules! with_pair_map {
    ($l:expr, $r:expr, $a:ident, $b:ident => $body:expr) => {
        match ($l, $r) {
            (Storage::Int32(dl), Storage::Int32(dr)) => {
                Storage::Int32(dyn_pair_map!(dl, dr, $a, $b => $body))
            }
            (Storage::Int64(dl), Storage::Int64(dr)) => {
                Storage::Int64(dyn_pair_map!(dl, dr, $a, $b => $body))
            }
            (Storage::Float32(dl), Storage::Float32(dr)) => {
                Storage::Float32(dyn_pair_map!(dl, dr, $a, $b => $body))
            }
            (Storage::Float64(dl), Storage::Float64(dr)) => {
                Storage::Float64(dyn_pair_map!(dl, dr, $a, $b => $body))
            }
            _ => unreachable!("operands must share a value kind after promotion"),
        }
    };
}

macro_rules! dyn_pair_map {
    ($dl:expr, $dr:expr, $a:ident, $b:ident => $body:expr) => {
        match ($dl, $dr) {
            (DynYale::U8($a), DynYale::U8($b)) => DynYale::U8($body),
            (DynYale::U16($a), DynYale::U16($b)) => DynYale::U16($body),
            (DynYale::U32($a), DynYale::U32($b)) => DynYale::U32($body),
            (DynYale::U64($a), DynYale::U64($b)) => DynYale::U64($body),
            _ => unreachable!("operands must share an index width after widening"),
        }
    };
}

// Dispatch a pair of unified operands for a body producing a plain value.
macro_rules! with_pair {
    ($l:expr, $r:expr, $a:ident, $b:ident => $body:expr) => {
        match ($l, $r) {
            (Storage::Int32(dl), Storage::Int32(dr)) => dyn_pair!(dl, dr, $a, $b => $body),
            (Storage::Int64(dl), Storage::Int64(dr)) => dyn_pair!(dl, dr, $a, $b => $body),
            (Storage::Float32(dl), Storage::Float32(dr)) => dyn_pair!(dl, dr, $a, $b => $body),
            (Storage::Float64(dl), Storage::Float64(dr)) => dyn_pair!(dl, dr, $a, $b => $body),
            _ => unreachable!("operands must share a value kind after promotion"),
        }
    };
}

macro_rules! dyn_pair {
    ($dl:expr, $dr:expr, $a:ident, $b:ident => $body:expr) => {
        match ($dl, $dr) {
            (DynYale::U8($a), DynYale::U8($b)) => $body,
            (DynYale::U16($a), DynYale::U16($b)) => $body,
            (DynYale::U32($a), DynYale::U32($b)) => $body,
            (DynYale::U64($a), DynYale::U64($b)) => $body,
            _ => unreachable!("operands must share an index width after widening"),
        }
    };
}

fn new_dyn<T: Scalar>(
    shape: (usize, usize),
    capacity: usize,
    index_kind: IndexKind,
) -> Result<DynYale<T>> {
    Ok(match index_kind {
        IndexKind::U8 => DynYale::U8(YaleStorage::with_capacity(shape, capacity)?),
        IndexKind::U16 => DynYale::U16(YaleStorage::with_capacity(shape, capacity)?),
        IndexKind::U32 => DynYale::U32(YaleStorage::with_capacity(shape, capacity)?),
        IndexKind::U64 => DynYale::U64(YaleStorage::with_capacity(shape, capacity)?),
    })
}

fn triples_dyn<T: Scalar>(
    shape: (usize, usize),
    ia: &[usize],
    ja: &[usize],
    vals: &[T],
    index_kind: IndexKind,
) -> Result<DynYale<T>> {
    Ok(match index_kind {
        IndexKind::U8 => DynYale::U8(YaleStorage::from_triples(shape, ia, ja, vals)?),
        IndexKind::U16 => DynYale::U16(YaleStorage::from_triples(shape, ia, ja, vals)?),
        IndexKind::U32 => DynYale::U32(YaleStorage::from_triples(shape, ia, ja, vals)?),
        IndexKind::U64 => DynYale::U64(YaleStorage::from_triples(shape, ia, ja, vals)?),
    })
}

fn reindex_dyn<T: Scalar>(d: &DynYale<T>, index_kind: IndexKind) -> Result<DynYale<T>> {
    Ok(match index_kind {
        IndexKind::U8 => DynYale::U8(with_dyn!(d, m => m.with_index_kind::<u8>()?)),
        IndexKind::U16 => DynYale::U16(with_dyn!(d, m => m.with_index_kind::<u16>()?)),
        IndexKind::U32 => DynYale::U32(with_dyn!(d, m => m.with_index_kind::<u32>()?)),
        IndexKind::U64 => DynYale::U64(with_dyn!(d, m => m.with_index_kind::<u64>()?)),
    })
}

impl<T: Scalar> DynYale<T> {
    fn index_kind(&self) -> IndexKind {
        match self {
            DynYale::U8(_) => IndexKind::U8,
            DynYale::U16(_) => IndexKind::U16,
            DynYale::U32(_) => IndexKind::U32,
            DynYale::U64(_) => IndexKind::U64,
        }
    }
}

impl Storage {
    /// Creates an empty matrix of the given value kind and shape
    ///
    /// `dim` must be exactly 2. The index width is the narrowest able to
    /// address the shape, widened further if `min_index_kind` asks for it.
    pub fn create(
        value_kind: ValueKind,
        shape: (usize, usize),
        dim: usize,
        initial_capacity: usize,
        min_index_kind: IndexKind,
    ) -> Result<Storage> {
        if dim != 2 {
            return Err(StorageError::UnsupportedDim { dim });
        }

        let ik = IndexKind::for_shape(shape).max(min_index_kind);
        Ok(match value_kind {
            ValueKind::Int32 => Storage::Int32(new_dyn(shape, initial_capacity, ik)?),
            ValueKind::Int64 => Storage::Int64(new_dyn(shape, initial_capacity, ik)?),
            ValueKind::Float32 => Storage::Float32(new_dyn(shape, initial_capacity, ik)?),
            ValueKind::Float64 => Storage::Float64(new_dyn(shape, initial_capacity, ik)?),
        })
    }

    /// Builds a matrix from standard compressed-row triples, converting the
    /// source values to the requested kind
    pub fn build_from_triples<S: Scalar>(
        value_kind: ValueKind,
        shape: (usize, usize),
        ia: &[usize],
        ja: &[usize],
        vals: &[S],
    ) -> Result<Storage> {
        let ik = IndexKind::for_shape(shape);
        Ok(match value_kind {
            ValueKind::Int32 => {
                let vals: Vec<i32> = vals.iter().map(|&v| Scalar::from_value(v.into_value())).collect();
                Storage::Int32(triples_dyn(shape, ia, ja, &vals, ik)?)
            }
            ValueKind::Int64 => {
                let vals: Vec<i64> = vals.iter().map(|&v| Scalar::from_value(v.into_value())).collect();
                Storage::Int64(triples_dyn(shape, ia, ja, &vals, ik)?)
            }
            ValueKind::Float32 => {
                let vals: Vec<f32> = vals.iter().map(|&v| Scalar::from_value(v.into_value())).collect();
                Storage::Float32(triples_dyn(shape, ia, ja, &vals, ik)?)
            }
            ValueKind::Float64 => {
                let vals: Vec<f64> = vals.iter().map(|&v| Scalar::from_value(v.into_value())).collect();
                Storage::Float64(triples_dyn(shape, ia, ja, &vals, ik)?)
            }
        })
    }

    /// The value kind this matrix stores
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Storage::Int32(_) => ValueKind::Int32,
            Storage::Int64(_) => ValueKind::Int64,
            Storage::Float32(_) => ValueKind::Float32,
            Storage::Float64(_) => ValueKind::Float64,
        }
    }

    /// The index width this matrix stores
    pub fn index_kind(&self) -> IndexKind {
        match self {
            Storage::Int32(d) => d.index_kind(),
            Storage::Int64(d) => d.index_kind(),
            Storage::Float32(d) => d.index_kind(),
            Storage::Float64(d) => d.index_kind(),
        }
    }

    /// Matrix shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        with_storage!(self, m => m.shape())
    }

    /// Number of logically used slots
    pub fn size(&self) -> usize {
        with_storage!(self, m => m.size())
    }

    /// Allocated length of the parallel arrays
    pub fn capacity(&self) -> usize {
        with_storage!(self, m => m.capacity())
    }

    /// Count of stored off-diagonal entries
    pub fn ndnz(&self) -> usize {
        with_storage!(self, m => m.ndnz())
    }

    /// Resets the matrix to the empty structure
    pub fn init(&mut self) {
        with_storage!(self, m => m.init())
    }

    /// Reads a cell; absent cells read as the kind's zero
    pub fn get(&self, row: usize, col: usize) -> Value {
        with_storage!(self, m => m.get(row, col).into_value())
    }

    /// Writes a cell, converting the value to this matrix's kind
    pub fn set(&mut self, row: usize, col: usize, value: Value) -> Result<SetResult> {
        with_storage!(self, m => m.set(row, col, Scalar::from_value(value)))
    }

    /// Inserts a contiguous run of off-diagonal entries into one row
    ///
    /// See the statically typed `bulk_insert` for the caller obligations;
    /// values are converted to this matrix's kind first.
    pub fn bulk_insert(
        &mut self,
        row: usize,
        columns: &[usize],
        values: &[Value],
        position: Option<usize>,
    ) -> Result<usize> {
        with_storage!(self, m => {
            let vals: Vec<_> = values.iter().map(|&v| Scalar::from_value(v)).collect();
            m.bulk_insert(row, columns, &vals, position)
        })
    }

    /// Copies this matrix with values converted to another kind
    pub fn cast_copy(&self, value_kind: ValueKind) -> Storage {
        match value_kind {
            ValueKind::Int32 => {
                Storage::Int32(match self {
                    Storage::Int32(d) => map_dyn!(d, m => m.cast_copy::<i32>()),
                    Storage::Int64(d) => map_dyn!(d, m => m.cast_copy::<i32>()),
                    Storage::Float32(d) => map_dyn!(d, m => m.cast_copy::<i32>()),
                    Storage::Float64(d) => map_dyn!(d, m => m.cast_copy::<i32>()),
                })
            }
            ValueKind::Int64 => {
                Storage::Int64(match self {
                    Storage::Int32(d) => map_dyn!(d, m => m.cast_copy::<i64>()),
                    Storage::Int64(d) => map_dyn!(d, m => m.cast_copy::<i64>()),
                    Storage::Float32(d) => map_dyn!(d, m => m.cast_copy::<i64>()),
                    Storage::Float64(d) => map_dyn!(d, m => m.cast_copy::<i64>()),
                })
            }
            ValueKind::Float32 => {
                Storage::Float32(match self {
                    Storage::Int32(d) => map_dyn!(d, m => m.cast_copy::<f32>()),
                    Storage::Int64(d) => map_dyn!(d, m => m.cast_copy::<f32>()),
                    Storage::Float32(d) => map_dyn!(d, m => m.cast_copy::<f32>()),
                    Storage::Float64(d) => map_dyn!(d, m => m.cast_copy::<f32>()),
                })
            }
            ValueKind::Float64 => {
                Storage::Float64(match self {
                    Storage::Int32(d) => map_dyn!(d, m => m.cast_copy::<f64>()),
                    Storage::Int64(d) => map_dyn!(d, m => m.cast_copy::<f64>()),
                    Storage::Float32(d) => map_dyn!(d, m => m.cast_copy::<f64>()),
                    Storage::Float64(d) => map_dyn!(d, m => m.cast_copy::<f64>()),
                })
            }
        }
    }

    /// Copies this matrix with its indices at a different width
    pub fn with_index_kind(&self, index_kind: IndexKind) -> Result<Storage> {
        Ok(match self {
            Storage::Int32(d) => Storage::Int32(reindex_dyn(d, index_kind)?),
            Storage::Int64(d) => Storage::Int64(reindex_dyn(d, index_kind)?),
            Storage::Float32(d) => Storage::Float32(reindex_dyn(d, index_kind)?),
            Storage::Float64(d) => Storage::Float64(reindex_dyn(d, index_kind)?),
        })
    }

    /// Unifies this matrix to the given kinds, borrowing when already there
    fn unify(&self, value_kind: ValueKind, index_kind: IndexKind) -> Result<Cow<'_, Storage>> {
        if self.value_kind() == value_kind && self.index_kind() == index_kind {
            return Ok(Cow::Borrowed(self));
        }

        let cast = if self.value_kind() == value_kind {
            self.clone()
        } else {
            self.cast_copy(value_kind)
        };

        if cast.index_kind() == index_kind {
            Ok(Cow::Owned(cast))
        } else {
            Ok(Cow::Owned(cast.with_index_kind(index_kind)?))
        }
    }

    /// Whether two matrices hold identical cell values
    ///
    /// Kind mismatches are resolved by promotion before comparing, so an
    /// Int32 matrix can equal a Float64 one.
    pub fn equal(left: &Storage, right: &Storage) -> Result<bool> {
        let vk = ValueKind::promote(left.value_kind(), right.value_kind());
        let ik = left.index_kind().max(right.index_kind());
        let l = left.unify(vk, ik)?;
        let r = right.unify(vk, ik)?;

        Ok(with_pair!(l.as_ref(), r.as_ref(), a, b => ops::storages_equal(a, b)))
    }

    /// Combines two matrices element-wise at the given promoted kind
    ///
    /// Comparison operators fail with a not-implemented error.
    pub fn combine(
        op: CombineOp,
        left: &Storage,
        right: &Storage,
        promoted_kind: ValueKind,
    ) -> Result<Storage> {
        let ew = match op.arithmetic() {
            Some(ew) => ew,
            None => {
                return Err(StorageError::NotImplemented(
                    "element-wise comparison for Yale storage",
                ))
            }
        };

        let ik = left.index_kind().max(right.index_kind());
        let l = left.unify(promoted_kind, ik)?;
        let r = right.unify(promoted_kind, ik)?;

        Ok(with_pair_map!(l.as_ref(), r.as_ref(), a, b => ops::combine(ew, a, b)?))
    }

    /// Multiplies two matrices
    ///
    /// Operands are promoted to a common value kind; the result carries the
    /// wider of the two index widths.
    ///
    /// # Panics
    ///
    /// Panics if `result_shape` disagrees with the operand shapes.
    pub fn multiply(
        left: &Storage,
        right: &Storage,
        result_shape: (usize, usize),
    ) -> Result<Storage> {
        assert_eq!(
            result_shape,
            (left.shape().0, right.shape().1),
            "result shape must be (left.rows, right.cols)"
        );

        let vk = ValueKind::promote(left.value_kind(), right.value_kind());
        let ik = left.index_kind().max(right.index_kind());
        let l = left.unify(vk, ik)?;
        let r = right.unify(vk, ik)?;

        Ok(with_pair_map!(l.as_ref(), r.as_ref(), a, b => ops::multiply(a, b)?))
    }

    /// Copies this matrix into its transpose
    pub fn transpose_copy(&self) -> Result<Storage> {
        Ok(map_storage!(self, m => ops::transpose_copy(m)?))
    }

    /// Copies a rectangular window into a fresh matrix
    pub fn extract_slice(
        &self,
        row_offset: usize,
        row_len: usize,
        col_offset: usize,
        col_len: usize,
    ) -> Result<Storage> {
        Ok(map_storage!(self, m => m.extract_slice(row_offset, row_len, col_offset, col_len)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rejects_wrong_dim() {
        let err = Storage::create(ValueKind::Float64, (3, 3), 3, 0, IndexKind::U8).unwrap_err();
        assert_eq!(err, StorageError::UnsupportedDim { dim: 3 });
    }

    #[test]
    fn test_create_picks_index_width() {
        let s = Storage::create(ValueKind::Int32, (3, 3), 2, 0, IndexKind::U8).unwrap();
        assert_eq!(s.index_kind(), IndexKind::U8);

        // a larger shape needs a wider index
        let s = Storage::create(ValueKind::Int32, (100, 100), 2, 0, IndexKind::U8).unwrap();
        assert_eq!(s.index_kind(), IndexKind::U16);

        // the caller can demand a wider index than the shape needs
        let s = Storage::create(ValueKind::Int32, (3, 3), 2, 0, IndexKind::U32).unwrap();
        assert_eq!(s.index_kind(), IndexKind::U32);
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut s = Storage::create(ValueKind::Float64, (3, 3), 2, 0, IndexKind::U8).unwrap();

        s.set(0, 2, Value::Float64(2.5)).unwrap();
        s.set(1, 1, Value::Int32(4)).unwrap(); // converted on the way in

        assert_eq!(s.get(0, 2), Value::Float64(2.5));
        assert_eq!(s.get(1, 1), Value::Float64(4.0));
        assert_eq!(s.get(2, 0), Value::Float64(0.0));
    }

    #[test]
    fn test_equal_across_kinds() {
        let mut a = Storage::create(ValueKind::Int32, (2, 2), 2, 0, IndexKind::U8).unwrap();
        let mut b = Storage::create(ValueKind::Float64, (2, 2), 2, 0, IndexKind::U16).unwrap();

        a.set(0, 1, Value::Int32(3)).unwrap();
        b.set(0, 1, Value::Float64(3.0)).unwrap();

        assert!(Storage::equal(&a, &b).unwrap());

        b.set(1, 0, Value::Float64(1.0)).unwrap();
        assert!(!Storage::equal(&a, &b).unwrap());
    }

    #[test]
    fn test_combine_promotes() {
        let mut a = Storage::create(ValueKind::Int32, (2, 2), 2, 0, IndexKind::U8).unwrap();
        let mut b = Storage::create(ValueKind::Float64, (2, 2), 2, 0, IndexKind::U8).unwrap();
        a.set(0, 1, Value::Int32(3)).unwrap();
        b.set(0, 1, Value::Float64(0.5)).unwrap();

        let promoted = ValueKind::promote(a.value_kind(), b.value_kind());
        let c = Storage::combine(CombineOp::Add, &a, &b, promoted).unwrap();

        assert_eq!(c.value_kind(), ValueKind::Float64);
        assert_eq!(c.get(0, 1), Value::Float64(3.5));
    }

    #[test]
    fn test_comparison_ops_unimplemented() {
        let a = Storage::create(ValueKind::Int32, (2, 2), 2, 0, IndexKind::U8).unwrap();
        let b = Storage::create(ValueKind::Int32, (2, 2), 2, 0, IndexKind::U8).unwrap();

        for op in [CombineOp::Eq, CombineOp::Ne, CombineOp::Lt, CombineOp::Le, CombineOp::Gt, CombineOp::Ge] {
            let err = Storage::combine(op, &a, &b, ValueKind::Int32).unwrap_err();
            assert!(matches!(err, StorageError::NotImplemented(_)));
        }
    }

    #[test]
    fn test_multiply_widens_index_kind() {
        let mut a = Storage::create(ValueKind::Int64, (2, 2), 2, 0, IndexKind::U8).unwrap();
        let mut b = Storage::create(ValueKind::Int64, (2, 2), 2, 0, IndexKind::U32).unwrap();
        a.set(0, 0, Value::Int64(2)).unwrap();
        b.set(0, 1, Value::Int64(3)).unwrap();

        let c = Storage::multiply(&a, &b, (2, 2)).unwrap();
        assert_eq!(c.index_kind(), IndexKind::U32);
        assert_eq!(c.get(0, 1), Value::Int64(6));
    }

    #[test]
    fn test_cast_copy_dynamic() {
        let mut s = Storage::create(ValueKind::Float64, (2, 2), 2, 0, IndexKind::U8).unwrap();
        s.set(0, 1, Value::Float64(2.75)).unwrap();

        let c = s.cast_copy(ValueKind::Int32);
        assert_eq!(c.value_kind(), ValueKind::Int32);
        assert_eq!(c.get(0, 1), Value::Int32(2));
    }

    #[test]
    fn test_build_from_triples_converts_source_kind() {
        let s = Storage::build_from_triples(
            ValueKind::Float32,
            (2, 2),
            &[0, 1, 2],
            &[1, 0],
            &[3i64, 4i64],
        )
        .unwrap();

        assert_eq!(s.value_kind(), ValueKind::Float32);
        assert_eq!(s.get(0, 1), Value::Float32(3.0));
        assert_eq!(s.get(1, 0), Value::Float32(4.0));
    }

    #[test]
    fn test_dynamic_slice() {
        let mut s = Storage::create(ValueKind::Int32, (3, 3), 2, 0, IndexKind::U8).unwrap();
        s.set(1, 2, Value::Int32(9)).unwrap();

        let w = s.extract_slice(1, 2, 1, 2).unwrap();
        assert_eq!(w.shape(), (2, 2));
        assert_eq!(w.get(0, 1), Value::Int32(9));
    }
}
