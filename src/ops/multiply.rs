//! Sparse x sparse multiplication and transposition
//!
//! Multiplication runs in two phases over the diagonal-separated layout:
//!
//! 1. **Symbolic**: for each output row, union the reachable column sets
//!    (`{k : A[i,k] stored} x {j : B[k,j] stored}`) with a marker array to
//!    discover the non-zero pattern and size every row before any numeric
//!    work. Diagonal slots are structurally present on both operands, so
//!    they always participate.
//! 2. **Numeric**: walk the same structure accumulating
//!    `sum_k A[i,k] * B[k,j]` into a dense per-row workspace, then scatter
//!    into the pre-sized slots in discovery order.
//!
//! Discovery order is not column order, so a final normalization pass sorts
//! each row's column/value pairs; every other engine relies on rows being
//! ascending.

use crate::error::Result;
use crate::kind::{IndexValue, Scalar};
use crate::storage::yale::YaleStorage;
use crate::utils::exclusive_scan;

/// Symbolic phase: sizes every output row and writes the row pointers
///
/// Returns the number of off-diagonal entries the product will hold. The
/// destination arrays are resized to exactly fit before returning, so the
/// numeric phase never reallocates.
fn symbolic<T, I>(
    left: &YaleStorage<T, I>,
    right: &YaleStorage<T, I>,
    dest: &mut YaleStorage<T, I>,
) -> usize
where
    T: Scalar,
    I: IndexValue,
{
    let rows = dest.rows();
    let cols = dest.cols();

    // mask[j] == i marks column j as already discovered for output row i
    let mut mask = vec![usize::MAX; cols];
    let mut lengths = vec![0usize; rows];

    for (i, length) in lengths.iter_mut().enumerate() {
        for (k, _) in left.row_entries_with_diagonal(i) {
            for (j, _) in right.row_entries_with_diagonal(k) {
                if mask[j] != i {
                    mask[j] = i;
                    if j != i {
                        // the diagonal has its own slot; only off-diagonal
                        // columns consume row space
                        *length += 1;
                    }
                }
            }
        }
    }

    let ndnz: usize = lengths.iter().sum();
    dest.resize_capacity(rows + ndnz + 1);

    let mut cursor = rows + 1;
    for (i, &length) in lengths.iter().enumerate() {
        dest.ija[i] = I::from_usize(cursor);
        cursor += length;
    }
    dest.ija[rows] = I::from_usize(cursor);

    ndnz
}

/// Numeric phase: accumulates values into the structure laid out by the
/// symbolic phase
fn numeric<T, I>(left: &YaleStorage<T, I>, right: &YaleStorage<T, I>, dest: &mut YaleStorage<T, I>)
where
    T: Scalar,
    I: IndexValue,
{
    let rows = dest.rows();
    let cols = dest.cols();

    // Dense per-row accumulator: values, occupancy flags, and the touched
    // columns in discovery order.
    let mut values = vec![T::zero(); cols];
    let mut occupied = vec![false; cols];
    let mut touched: Vec<usize> = Vec::new();

    for i in 0..rows {
        for (k, a_ik) in left.row_entries_with_diagonal(i) {
            for (j, b_kj) in right.row_entries_with_diagonal(k) {
                let product = a_ik * b_kj;
                if occupied[j] {
                    values[j] += product;
                } else {
                    occupied[j] = true;
                    touched.push(j);
                    values[j] = product;
                }
            }
        }

        // Scatter the row: the diagonal goes to its dedicated slot, the
        // rest fill the pre-sized range in discovery order.
        let (mut cursor, row_end) = dest.row_range(i);
        for &j in &touched {
            if j == i {
                dest.a[i] = values[j];
            } else {
                dest.ija[cursor] = I::from_usize(j);
                dest.a[cursor] = values[j];
                cursor += 1;
            }
            occupied[j] = false;
        }
        debug_assert_eq!(cursor, row_end, "numeric fill diverged from symbolic count");
        touched.clear();
    }
}

/// Normalization pass: restores ascending column order within every row
fn sort_row_columns<T, I>(dest: &mut YaleStorage<T, I>)
where
    T: Scalar,
    I: IndexValue,
{
    for i in 0..dest.rows() {
        let (lo, hi) = dest.row_range(i);
        if hi - lo <= 1 {
            continue;
        }

        let mut entries: Vec<(usize, T)> = (lo..hi)
            .map(|p| (dest.ija[p].to_usize(), dest.a[p]))
            .collect();
        entries.sort_unstable_by_key(|&(j, _)| j);

        for (p, (j, v)) in (lo..hi).zip(entries) {
            dest.ija[p] = I::from_usize(j);
            dest.a[p] = v;
        }
    }
}

/// Multiplies two matrices into a fresh storage of shape
/// `(left.rows, right.cols)`
///
/// # Panics
///
/// Panics if `left.cols != right.rows`.
pub fn multiply<T, I>(
    left: &YaleStorage<T, I>,
    right: &YaleStorage<T, I>,
) -> Result<YaleStorage<T, I>>
where
    T: Scalar,
    I: IndexValue,
{
    assert_eq!(
        left.cols(),
        right.rows(),
        "matrix dimensions must be compatible for multiplication"
    );

    let shape = (left.rows(), right.cols());

    // Seed with a generous estimate; the symbolic phase replaces it with
    // the exact requirement.
    let seed = left.capacity() + right.capacity();
    let mut dest = YaleStorage::with_capacity(shape, seed)?;

    let ndnz = symbolic(left, right, &mut dest);
    numeric(left, right, &mut dest);
    sort_row_columns(&mut dest);

    dest.ndnz = ndnz;
    Ok(dest)
}

/// Copies a matrix into its transpose
///
/// Scattering the rows in order means each target row receives its entries
/// with ascending column indices, so no normalization pass is needed.
pub fn transpose_copy<T, I>(source: &YaleStorage<T, I>) -> Result<YaleStorage<T, I>>
where
    T: Scalar,
    I: IndexValue,
{
    let (rows, cols) = source.shape();

    // Count stored off-diagonal entries per target row (= source column).
    let mut counts = vec![0usize; cols];
    let mut ndnz = 0;
    for i in 0..rows {
        let (lo, hi) = source.row_range(i);
        for p in lo..hi {
            counts[source.ija[p].to_usize()] += 1;
            ndnz += 1;
        }
    }

    let mut dest = YaleStorage::with_capacity((cols, rows), cols + ndnz + 1)?;

    // Row pointers by prefix sum over the counts.
    for (j, offset) in exclusive_scan(&counts).into_iter().enumerate() {
        dest.ija[j] = I::from_usize(cols + 1 + offset);
    }

    // The diagonal transposes onto itself.
    let diag_len = rows.min(cols);
    dest.a[..diag_len].copy_from_slice(&source.a[..diag_len]);

    // Scatter, advancing a per-target-row write cursor.
    let mut write: Vec<usize> = (0..cols).map(|j| dest.ija[j].to_usize()).collect();
    for i in 0..rows {
        let (lo, hi) = source.row_range(i);
        for p in lo..hi {
            let j = source.ija[p].to_usize();
            dest.ija[write[j]] = I::from_usize(i);
            dest.a[write[j]] = source.a[p];
            write[j] += 1;
        }
    }

    dest.ndnz = ndnz;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_cells(shape: (usize, usize), cells: &[(usize, usize, i64)]) -> YaleStorage<i64> {
        let mut m = YaleStorage::new(shape).unwrap();
        for &(i, j, v) in cells {
            m.set(i, j, v).unwrap();
        }
        m
    }

    fn identity(n: usize) -> YaleStorage<i64> {
        let mut m = YaleStorage::new((n, n)).unwrap();
        for i in 0..n {
            m.set(i, i, 1).unwrap();
        }
        m
    }

    #[test]
    fn test_small_dense_product() {
        // A = [1 2; 0 3], B = [4 5; 6 7] => C = [16 19; 18 21]
        let a = from_cells((2, 2), &[(0, 0, 1), (0, 1, 2), (1, 1, 3)]);
        let b = from_cells((2, 2), &[(0, 0, 4), (0, 1, 5), (1, 0, 6), (1, 1, 7)]);

        let c = multiply(&a, &b).unwrap();

        assert_eq!(c.get(0, 0), 16);
        assert_eq!(c.get(0, 1), 19);
        assert_eq!(c.get(1, 0), 18);
        assert_eq!(c.get(1, 1), 21);
    }

    #[test]
    fn test_identity_multiplication() {
        let m = from_cells((3, 3), &[(0, 2, 5), (1, 0, 3), (2, 1, 7), (1, 1, 2)]);
        let c = multiply(&identity(3), &m).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(c.get(i, j), m.get(i, j), "mismatch at ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_rows_sorted_after_normalization() {
        let a = from_cells((3, 4), &[(0, 1, 1), (0, 3, 2), (1, 0, 3), (2, 2, 4)]);
        let b = from_cells((4, 3), &[(0, 2, 1), (1, 0, 5), (2, 1, 2), (3, 0, 7), (3, 1, 1)]);

        let c = multiply(&a, &b).unwrap();
        assert_eq!(c.shape(), (3, 3));

        for i in 0..3 {
            let row = c.nd_row(i).unwrap();
            for pair in row.windows(2) {
                assert!(pair[0].0 < pair[1].0, "row {} not strictly ascending", i);
            }
        }
    }

    #[test]
    fn test_rectangular_product_values() {
        // verify against a dense computation
        let a = from_cells((2, 3), &[(0, 0, 2), (0, 2, 1), (1, 1, 3)]);
        let b = from_cells((3, 2), &[(0, 1, 4), (1, 0, 5), (2, 0, 6), (2, 1, 7)]);

        let c = multiply(&a, &b).unwrap();
        assert_eq!(c.shape(), (2, 2));

        let mut dense = [[0i64; 2]; 2];
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..3 {
                    dense[i][j] += a.get(i, k) * b.get(k, j);
                }
            }
        }
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(c.get(i, j), dense[i][j], "mismatch at ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_fill_in_accumulation() {
        // both paths k=0 and k=2 contribute to C[0,1]
        let a = from_cells((1, 3), &[(0, 0, 2), (0, 2, 3)]);
        let b = from_cells((3, 2), &[(0, 1, 5), (2, 1, 7)]);

        let c = multiply(&a, &b).unwrap();
        assert_eq!(c.get(0, 1), 2 * 5 + 3 * 7);
    }

    #[test]
    fn test_transpose_copy() {
        let m = from_cells((2, 3), &[(0, 0, 1), (0, 2, 2), (1, 0, 3), (1, 1, 4)]);
        let t = transpose_copy(&m).unwrap();

        assert_eq!(t.shape(), (3, 2));
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(t.get(j, i), m.get(i, j), "mismatch at ({}, {})", j, i);
            }
        }
        assert_eq!(t.ndnz(), m.ndnz());
    }

    #[test]
    fn test_transpose_involution() {
        let m = from_cells((3, 3), &[(0, 1, 1), (1, 2, 2), (2, 0, 3), (2, 2, 4)]);
        let tt = transpose_copy(&transpose_copy(&m).unwrap()).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(tt.get(i, j), m.get(i, j));
            }
        }
    }

    #[test]
    fn test_transpose_rows_ascending() {
        let m = from_cells((3, 2), &[(0, 1, 1), (1, 0, 2), (2, 0, 3), (2, 1, 4)]);
        let t = transpose_copy(&m).unwrap();

        for i in 0..2 {
            let row = t.nd_row(i).unwrap();
            for pair in row.windows(2) {
                assert!(pair[0].0 < pair[1].0);
            }
        }
    }
}
