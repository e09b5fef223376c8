//! Utilities for converting between our matrix format and external libraries
//!
//! The bridge speaks standard compressed-row triples (`IA`/`JA`/`VAL`, with
//! the diagonal *not* separated) in both directions. The `sprs` and
//! `ndarray` conversions are thin layers over the triple form.

use ndarray::Array2;
use num_traits::Num;
use sprs::CsMat;

use crate::error::{Result, StorageError};
use crate::kind::{IndexValue, Scalar};
use crate::storage::yale::YaleStorage;

impl<T, I> YaleStorage<T, I>
where
    T: Scalar,
    I: IndexValue,
{
    /// Builds a matrix from standard compressed-row triples
    ///
    /// `ia` holds `rows + 1` row pointers into `ja`/`vals`, whose entries
    /// must be in ascending column order within each row (this function
    /// does not sort). Diagonal entries are routed to the diagonal region;
    /// everything else lands in the off-diagonal region in input order.
    /// Diagonal cells absent from the input stay zero.
    ///
    /// # Panics
    ///
    /// Panics if the arrays are inconsistent:
    /// - `ia.len()` must be `rows + 1`
    /// - `ja.len()` must equal `vals.len()` and `ia[rows]`
    /// - every column index must be within bounds
    pub fn from_triples(
        shape: (usize, usize),
        ia: &[usize],
        ja: &[usize],
        vals: &[T],
    ) -> Result<YaleStorage<T, I>> {
        let (rows, cols) = shape;
        assert_eq!(ia.len(), rows + 1, "ia.len() must be rows + 1");
        assert_eq!(ja.len(), vals.len(), "ja.len() must equal vals.len()");
        assert_eq!(ia[rows], ja.len(), "ia[rows] must equal ja.len()");
        for &col in ja {
            assert!(col < cols, "Column index {} out of bounds (cols = {})", col, cols);
        }

        // Walk the input once to count off-diagonal non-zeros.
        let mut ndnz = 0;
        for i in 0..rows {
            for p in ia[i]..ia[i + 1] {
                if ja[p] != i {
                    ndnz += 1;
                }
            }
        }

        // Allocate exactly what the count says; an impossible request means
        // the input was malformed (duplicate columns within a row).
        let request = rows + ndnz + 1;
        let max = crate::storage::max_size_for(shape);
        if request > max {
            return Err(StorageError::InternalConsistency(format!(
                "triple conversion requested {} slots but the shape allows at most {}",
                request, max
            )));
        }
        if I::try_from_usize(max).is_none() {
            return Err(StorageError::CapacityExhausted {
                needed: max,
                max: I::MAX_USIZE,
            });
        }

        let mut s = YaleStorage {
            shape,
            ndnz: 0,
            a: vec![T::zero(); request],
            ija: vec![I::ZERO; request],
        };
        s.init();

        // Second walk splits the diagonal out while copying.
        let mut cursor = rows + 1;
        for i in 0..rows {
            s.ija[i] = I::from_usize(cursor);
            for p in ia[i]..ia[i + 1] {
                if ja[p] == i {
                    s.a[i] = vals[p];
                } else {
                    s.ija[cursor] = I::from_usize(ja[p]);
                    s.a[cursor] = vals[p];
                    cursor += 1;
                }
            }
        }
        s.ija[rows] = I::from_usize(cursor);
        s.ndnz = ndnz;

        Ok(s)
    }

    /// Converts this matrix back to standard compressed-row triples
    ///
    /// The diagonal is merged into its column position within each row;
    /// zero diagonal slots are treated as absent, so a round trip through
    /// [`Self::from_triples`] is lossless.
    pub fn to_triples(&self) -> (Vec<usize>, Vec<usize>, Vec<T>) {
        let rows = self.rows();
        let mut ia = Vec::with_capacity(rows + 1);
        let mut ja = Vec::new();
        let mut vals = Vec::new();

        ia.push(0);
        for i in 0..rows {
            let mut diag_pending = i < self.cols() && self.a[i] != T::zero();

            let (lo, hi) = self.row_range(i);
            for p in lo..hi {
                let j = self.ija[p].to_usize();
                if diag_pending && j > i {
                    ja.push(i);
                    vals.push(self.a[i]);
                    diag_pending = false;
                }
                ja.push(j);
                vals.push(self.a[p]);
            }
            if diag_pending {
                ja.push(i);
                vals.push(self.a[i]);
            }

            ia.push(ja.len());
        }

        (ia, ja, vals)
    }
}

/// Converts our storage format to sprs CsMat format
pub fn to_sprs<T, I>(matrix: &YaleStorage<T, I>) -> CsMat<T>
where
    T: Scalar + Num + Default,
    I: IndexValue,
{
    let (ia, ja, vals) = matrix.to_triples();
    CsMat::new(matrix.shape(), ia, ja, vals)
}

/// Converts a sprs CsMat to our storage format
pub fn from_sprs<T, I>(matrix: CsMat<T>) -> Result<YaleStorage<T, I>>
where
    T: Scalar + Num + Default,
    I: IndexValue,
{
    // Ensure matrix is in CSR format
    let matrix = if matrix.is_csr() {
        matrix
    } else {
        matrix.to_csr()
    };

    let shape = matrix.shape();
    let (indptr, indices, data) = matrix.into_raw_storage();

    YaleStorage::from_triples(shape, &indptr, &indices, &data)
}

/// Exports the matrix as a dense 2D array
///
/// Useful for verification and debugging; every non-stored cell reads as
/// zero, exactly like `get`.
pub fn to_dense<T, I>(matrix: &YaleStorage<T, I>) -> Array2<T>
where
    T: Scalar,
    I: IndexValue,
{
    let mut dense = Array2::zeros(matrix.shape());
    for (i, j, v) in matrix.iter_stored() {
        dense[[i, j]] = v;
    }
    dense
}
