//! Diagonal-separated ("new Yale") sparse matrix storage
//!
//! The storage keeps two parallel arrays of identical length (the capacity):
//!
//! - `a`, the value array: slots `[0, rows)` hold the diagonal (always
//!   materialized, zero when unset), slot `rows` holds the sentinel zero
//!   returned for every non-stored cell, and slots `(rows, size)` hold the
//!   off-diagonal values in row-major, column-ascending order.
//! - `ija`, the index array: slots `[0, rows]` are row pointers into the
//!   off-diagonal region (`ija[rows]` is the used size), and slots
//!   `(rows, size)` are column indices parallel to the off-diagonal values.
//!
//! Pulling the diagonal out of the compressed region gives O(1) diagonal
//! access; the off-diagonal region behaves like classic CSR with binary
//! search inside each row.

use crate::error::{Result, StorageError};
use crate::kind::{IndexValue, Scalar};

/// Capacity multiplier applied when an insertion outgrows the arrays
pub const GROWTH_FACTOR: f64 = 1.5;

/// Outcome of a cell write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetResult {
    /// An existing slot (or the diagonal) was overwritten
    Replaced,
    /// A new off-diagonal slot was created
    Inserted,
}

/// A sparse matrix in the diagonal-separated Yale format
///
/// The two arrays always have length equal to the capacity; the used prefix
/// is `ija[rows]` slots long. Every storage exclusively owns its arrays;
/// copies, casts, slices, and algebraic results all allocate fresh ones.
#[derive(Debug, Clone)]
pub struct YaleStorage<T, I = usize> {
    /// Matrix shape as (rows, cols); both are at least 1
    pub(crate) shape: (usize, usize),

    /// Count of stored off-diagonal entries (advisory; `size - rows - 1` is
    /// authoritative)
    pub(crate) ndnz: usize,

    /// Value array (length = capacity)
    pub(crate) a: Vec<T>,

    /// Index array: row pointers then column indices (length = capacity)
    pub(crate) ija: Vec<I>,
}

/// Theoretical maximum number of slots a matrix of the given shape can use
///
/// One slot per cell, one sentinel slot, plus one padding slot per row
/// beyond a square shape (rows taller than wide still carry a diagonal slot
/// per row).
pub fn max_size_for(shape: (usize, usize)) -> usize {
    let mut result = shape.0.saturating_mul(shape.1).saturating_add(1);
    if shape.0 > shape.1 {
        result = result.saturating_add(shape.0 - shape.1);
    }
    result
}

impl<T, I> YaleStorage<T, I>
where
    T: Scalar,
    I: IndexValue,
{
    /// Creates an empty matrix of the given shape at the minimum capacity
    pub fn new(shape: (usize, usize)) -> Result<Self> {
        Self::with_capacity(shape, 0)
    }

    /// Creates an empty matrix with a requested initial capacity
    ///
    /// The capacity is clamped between the minimum (`2 * rows + 1`) and the
    /// theoretical maximum for the shape. Fails if the index width `I`
    /// cannot address the layout.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_capacity(shape: (usize, usize), capacity: usize) -> Result<Self> {
        assert!(
            shape.0 >= 1 && shape.1 >= 1,
            "matrix shape must be at least 1x1 (got {}x{})",
            shape.0,
            shape.1
        );

        let max = max_size_for(shape);
        if I::try_from_usize(max).is_none() {
            return Err(StorageError::CapacityExhausted {
                needed: max,
                max: I::MAX_USIZE,
            });
        }

        let min = (shape.0 * 2 + 1).min(max);
        let capacity = capacity.clamp(min, max);

        let mut storage = Self {
            shape,
            ndnz: 0,
            a: vec![T::zero(); capacity],
            ija: vec![I::ZERO; capacity],
        };
        storage.init();
        Ok(storage)
    }

    /// Resets the matrix to the empty structure
    ///
    /// All row pointers are set to `rows + 1` and the diagonal and sentinel
    /// slots are zeroed. Capacity is unchanged.
    pub fn init(&mut self) {
        let n = self.rows() + 1;
        let start = I::from_usize(n);
        for slot in self.ija.iter_mut().take(n) {
            *slot = start;
        }
        for slot in self.a.iter_mut().take(n) {
            *slot = T::zero();
        }
        self.ndnz = 0;
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.shape.0
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.shape.1
    }

    /// Matrix shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Count of stored off-diagonal entries
    pub fn ndnz(&self) -> usize {
        self.ndnz
    }

    /// Number of logically used slots (`ija[rows]`)
    pub fn size(&self) -> usize {
        self.ija[self.rows()].to_usize()
    }

    /// Allocated length of the parallel arrays
    pub fn capacity(&self) -> usize {
        self.a.len()
    }

    /// Theoretical maximum size for this matrix's shape
    pub fn max_size(&self) -> usize {
        max_size_for(self.shape)
    }

    /// Off-diagonal range of row `i` as `(start, end)` offsets into the
    /// arrays
    pub(crate) fn row_range(&self, i: usize) -> (usize, usize) {
        (self.ija[i].to_usize(), self.ija[i + 1].to_usize())
    }

    /// Grows or trims both arrays to exactly `capacity` slots
    pub(crate) fn resize_capacity(&mut self, capacity: usize) {
        self.a.resize(capacity, T::zero());
        self.ija.resize(capacity, I::ZERO);
    }

    // ------------------------------------------------------------------
    // Index search
    // ------------------------------------------------------------------

    /// Binary search for `key` among the column indices in `ija[lo..hi)`
    ///
    /// Returns the position of the match, or `None` if the key is absent.
    pub(crate) fn exact_search(&self, lo: usize, hi: usize, key: usize) -> Option<usize> {
        let (mut lo, mut hi) = (lo, hi);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mid_j = self.ija[mid].to_usize();
            if mid_j == key {
                return Some(mid);
            } else if mid_j < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        None
    }

    /// Binary search for the insertion point of `key` in `ija[lo..hi)`
    ///
    /// Returns `(position, found)`. When the key is absent, `position` is
    /// the offset where it must be inserted to keep the row ascending; for
    /// an empty interval that is `lo` itself.
    pub(crate) fn insert_search(&self, lo: usize, hi: usize, key: usize) -> (usize, bool) {
        let (mut lo, mut hi) = (lo, hi);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mid_j = self.ija[mid].to_usize();
            if mid_j == key {
                return (mid, true);
            } else if mid_j < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        (lo, false)
    }

    // ------------------------------------------------------------------
    // Structural insertion
    // ------------------------------------------------------------------

    /// Inserts contiguous slots for the given column keys at offset `pos`
    ///
    /// `pos` must lie in the off-diagonal region, i.e. past the diagonal
    /// slots. When `values` is `None` only the structure is written and the
    /// new value slots are zeroed. Callers are responsible for bumping the
    /// row pointers of later rows afterwards
    /// ([`Self::increment_ia_after`]).
    pub(crate) fn vector_insert(
        &mut self,
        pos: usize,
        columns: &[usize],
        values: Option<&[T]>,
    ) -> Result<()> {
        if pos < self.rows() {
            return Err(StorageError::IndexOutOfRange {
                index: pos,
                len: self.rows(),
            });
        }

        let n = columns.len();
        let size = self.size();

        if size + n > self.capacity() {
            self.insert_resize(size, pos, n)?;
        } else {
            // Shift the tail right by n, walking backwards so nothing is
            // overwritten before it is moved.
            for idx in (pos..size).rev() {
                self.ija[idx + n] = self.ija[idx];
                self.a[idx + n] = self.a[idx];
            }
        }

        for (k, &col) in columns.iter().enumerate() {
            self.ija[pos + k] = I::from_usize(col);
            self.a[pos + k] = match values {
                Some(vals) => vals[k],
                None => T::zero(),
            };
        }

        Ok(())
    }

    /// Reallocates both arrays in preparation for an insertion of `n` slots
    /// at `pos`, leaving the gap open
    fn insert_resize(&mut self, current_size: usize, pos: usize, n: usize) -> Result<()> {
        let max = self.max_size();
        let mut new_capacity = (self.capacity() as f64 * GROWTH_FACTOR) as usize;

        if new_capacity > max {
            new_capacity = max;
            if current_size + n > max {
                return Err(StorageError::CapacityExhausted {
                    needed: current_size + n,
                    max,
                });
            }
        }
        if new_capacity < current_size + n {
            new_capacity = current_size + n;
        }

        let mut new_a = vec![T::zero(); new_capacity];
        let mut new_ija = vec![I::ZERO; new_capacity];

        new_a[..pos].copy_from_slice(&self.a[..pos]);
        new_ija[..pos].copy_from_slice(&self.ija[..pos]);

        new_a[pos + n..current_size + n].copy_from_slice(&self.a[pos..current_size]);
        new_ija[pos + n..current_size + n].copy_from_slice(&self.ija[pos..current_size]);

        self.a = new_a;
        self.ija = new_ija;
        Ok(())
    }

    /// Adds `n` to every row pointer after row `i`
    ///
    /// Mandatory after every structural insertion into row `i`: later rows'
    /// ranges are only correct once their start offsets account for the new
    /// slots.
    pub(crate) fn increment_ia_after(&mut self, i: usize, n: usize) {
        let rows = self.rows();
        for idx in (i + 1)..=rows {
            let bumped = self.ija[idx].to_usize() + n;
            self.ija[idx] = I::from_usize(bumped);
        }
    }

    // ------------------------------------------------------------------
    // Cell access
    // ------------------------------------------------------------------

    /// Writes a cell, creating an off-diagonal slot when needed
    ///
    /// Diagonal writes always overwrite in place. Off-diagonal writes
    /// either replace an existing slot or insert a new one, bumping the row
    /// pointers of every later row.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the matrix shape.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<SetResult> {
        assert!(
            row < self.rows() && col < self.cols(),
            "cell ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.rows(),
            self.cols()
        );

        if row == col {
            self.a[row] = value;
            return Ok(SetResult::Replaced);
        }

        let (lo, hi) = self.row_range(row);

        if lo == hi {
            // empty row
            self.vector_insert(lo, &[col], Some(&[value]))?;
            self.increment_ia_after(row, 1);
            self.ndnz += 1;
            return Ok(SetResult::Inserted);
        }

        let (pos, found) = self.insert_search(lo, hi, col);
        if found {
            self.a[pos] = value;
            return Ok(SetResult::Replaced);
        }

        self.vector_insert(pos, &[col], Some(&[value]))?;
        self.increment_ia_after(row, 1);
        self.ndnz += 1;
        Ok(SetResult::Inserted)
    }

    /// Borrows the slot holding a cell's value
    ///
    /// The diagonal is addressed directly; off-diagonal cells are found by
    /// binary search. A cell with no stored slot borrows the sentinel zero.
    /// Never mutates structure and never fails.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the matrix shape.
    pub fn ref_value(&self, row: usize, col: usize) -> &T {
        assert!(
            row < self.rows() && col < self.cols(),
            "cell ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.rows(),
            self.cols()
        );

        if row == col {
            return &self.a[row];
        }

        let (lo, hi) = self.row_range(row);
        if lo == hi {
            return &self.a[self.rows()];
        }

        match self.exact_search(lo, hi, col) {
            Some(pos) => &self.a[pos],
            None => &self.a[self.rows()],
        }
    }

    /// Reads a cell by copy; absent cells read as zero
    pub fn get(&self, row: usize, col: usize) -> T {
        *self.ref_value(row, col)
    }

    /// Inserts a contiguous run of off-diagonal entries into one row
    ///
    /// The columns must be ascending, disjoint from the entries already
    /// stored for the row, and never the diagonal; values must not be the
    /// default zero. None of this is checked: the point of this entry is
    /// to make bulk construction as fast as possible, so violations produce
    /// undefined (but memory-safe) structure.
    ///
    /// `position` is the absolute offset to insert at, defaulting to the
    /// start of the row. Returns the offset just past the inserted run,
    /// which is the position for a subsequent contiguous insertion.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range or the arrays differ in length.
    pub fn bulk_insert(
        &mut self,
        row: usize,
        columns: &[usize],
        values: &[T],
        position: Option<usize>,
    ) -> Result<usize> {
        assert!(row < self.rows(), "row {} out of bounds", row);
        assert_eq!(
            columns.len(),
            values.len(),
            "lengths must match between column array ({}) and value array ({})",
            columns.len(),
            values.len()
        );

        let pos = match position {
            Some(p) => p,
            None => self.ija[row].to_usize(),
        };

        self.vector_insert(pos, columns, Some(values))?;
        self.increment_ia_after(row, columns.len());
        self.ndnz += columns.len();
        Ok(pos + columns.len())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// The diagonal region of the value array (one slot per row)
    pub fn diagonal(&self) -> &[T] {
        &self.a[..self.rows()]
    }

    /// The row-pointer prefix of the index array (`rows + 1` entries)
    pub fn row_pointers(&self) -> &[I] {
        &self.ija[..=self.rows()]
    }

    /// The stored off-diagonal column indices, row-major
    pub fn col_indices(&self) -> &[I] {
        &self.ija[self.rows() + 1..self.size()]
    }

    /// The stored off-diagonal values, parallel to [`Self::col_indices`]
    pub fn off_diagonal_values(&self) -> &[T] {
        &self.a[self.rows() + 1..self.size()]
    }

    /// Range-checked read of one index-array slot
    pub fn index_at(&self, idx: usize) -> Result<usize> {
        if idx >= self.size() {
            return Err(StorageError::IndexOutOfRange {
                index: idx,
                len: self.size(),
            });
        }
        Ok(self.ija[idx].to_usize())
    }

    /// Range-checked read of one value-array slot
    pub fn value_at(&self, idx: usize) -> Result<T> {
        if idx >= self.size() {
            return Err(StorageError::IndexOutOfRange {
                index: idx,
                len: self.size(),
            });
        }
        Ok(self.a[idx])
    }

    /// The off-diagonal contents of row `i` as `(column, value)` pairs
    pub fn nd_row(&self, i: usize) -> Result<Vec<(usize, T)>> {
        if i >= self.rows() {
            return Err(StorageError::IndexOutOfRange {
                index: i,
                len: self.rows(),
            });
        }
        let (lo, hi) = self.row_range(i);
        Ok((lo..hi)
            .map(|p| (self.ija[p].to_usize(), self.a[p]))
            .collect())
    }

    /// Iterates over every stored entry as `(row, col, value)`
    ///
    /// Diagonal entries come first (whether zero or not, they are always
    /// materialized), followed by the off-diagonal entries row by row.
    pub fn iter_stored(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let diag_len = self.rows().min(self.cols());
        let diag = (0..diag_len).map(move |k| (k, k, self.a[k]));

        let off = (0..self.rows()).flat_map(move |i| {
            let (lo, hi) = self.row_range(i);
            (lo..hi).map(move |p| (i, self.ija[p].to_usize(), self.a[p]))
        });

        diag.chain(off)
    }

    /// Row `i`'s entries including the materialized diagonal slot
    ///
    /// Yields `(column, value)` with the diagonal first (when row `i` has
    /// one), then the stored off-diagonal entries in ascending column
    /// order. Used by the multiply engine, where the diagonal participates
    /// structurally regardless of its value.
    pub(crate) fn row_entries_with_diagonal(
        &self,
        i: usize,
    ) -> impl Iterator<Item = (usize, T)> + '_ {
        let diag = (i < self.cols()).then(|| (i, self.a[i]));
        let (lo, hi) = self.row_range(i);
        diag.into_iter().chain(
            self.ija[lo..hi]
                .iter()
                .zip(&self.a[lo..hi])
                .map(|(&j, &v)| (j.to_usize(), v)),
        )
    }
}
