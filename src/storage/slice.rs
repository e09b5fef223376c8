//! Rectangular sub-region extraction
//!
//! A slice is an independently owned copy of an axis-aligned window,
//! re-indexed to local coordinates. Extraction runs in two passes: a
//! counting pass sizes the destination exactly, then a filling pass copies
//! the cells. The two passes must agree: a fill that outruns the count is
//! an internal consistency violation, not something to recover from.

use crate::error::{Result, StorageError};
use crate::kind::{IndexValue, Scalar};
use crate::storage::yale::YaleStorage;

impl<T, I> YaleStorage<T, I>
where
    T: Scalar,
    I: IndexValue,
{
    /// Looks up the window-local cell `(k, l)` in this matrix
    ///
    /// Presence is structural for off-diagonal cells (an explicitly stored
    /// zero is still present) and value-based for the diagonal, which is
    /// always materialized. Uses a linear scan of the row range; the window
    /// copy visits every column anyway.
    fn slice_source_value(&self, k: usize, l: usize) -> Option<T> {
        if k == l {
            if self.a[k] != T::zero() {
                return Some(self.a[k]);
            }
            return None;
        }

        let (lo, hi) = self.row_range(k);
        for p in lo..hi {
            if self.ija[p].to_usize() == l {
                return Some(self.a[p]);
            }
        }
        None
    }

    /// Copies the `row_len` x `col_len` window at `(row_offset, col_offset)`
    /// into a fresh storage
    ///
    /// Cells absent from the source stay absent (read as zero) in the
    /// slice. Fails with a range error when the window does not lie fully
    /// inside the matrix.
    pub fn extract_slice(
        &self,
        row_offset: usize,
        row_len: usize,
        col_offset: usize,
        col_len: usize,
    ) -> Result<YaleStorage<T, I>> {
        if row_len == 0 || row_offset + row_len > self.rows() {
            return Err(StorageError::IndexOutOfRange {
                index: row_offset + row_len,
                len: self.rows(),
            });
        }
        if col_len == 0 || col_offset + col_len > self.cols() {
            return Err(StorageError::IndexOutOfRange {
                index: col_offset + col_len,
                len: self.cols(),
            });
        }

        // Counting pass: how many off-diagonal slots will the slice need?
        let mut ndnz = 0;
        for i in 0..row_len {
            let k = i + row_offset;
            for j in 0..col_len {
                if i == j {
                    continue; // lands on the destination diagonal
                }
                if self.slice_source_value(k, j + col_offset).is_some() {
                    ndnz += 1;
                }
            }
        }

        let request = row_len + ndnz + 1;
        let mut dst = YaleStorage::with_capacity((row_len, col_len), request)?;
        if dst.capacity() < request {
            return Err(StorageError::InternalConsistency(format!(
                "slice copy requested {} slots but only {} were allocatable",
                request,
                dst.capacity()
            )));
        }

        // Filling pass: copy cells, building row pointers as we go.
        let mut cursor = row_len + 1;
        for i in 0..row_len {
            dst.ija[i] = I::from_usize(cursor);
            let k = i + row_offset;

            for j in 0..col_len {
                let val = match self.slice_source_value(k, j + col_offset) {
                    Some(v) => v,
                    None => continue,
                };

                if i == j {
                    dst.a[i] = val;
                } else {
                    if cursor >= dst.capacity() {
                        return Err(StorageError::InternalConsistency(format!(
                            "slice fill pass found more entries than the counting \
                             pass at row {} (capacity {})",
                            i,
                            dst.capacity()
                        )));
                    }
                    dst.ija[cursor] = I::from_usize(j);
                    dst.a[cursor] = val;
                    cursor += 1;
                }
            }
        }
        dst.ija[row_len] = I::from_usize(cursor);
        dst.ndnz = ndnz;

        Ok(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_4x4() -> YaleStorage<i64> {
        // [1 2 0 0]
        // [0 3 4 0]
        // [5 0 6 0]
        // [0 7 0 8]
        let mut m = YaleStorage::<i64>::new((4, 4)).unwrap();
        m.set(0, 0, 1).unwrap();
        m.set(0, 1, 2).unwrap();
        m.set(1, 1, 3).unwrap();
        m.set(1, 2, 4).unwrap();
        m.set(2, 0, 5).unwrap();
        m.set(2, 2, 6).unwrap();
        m.set(3, 1, 7).unwrap();
        m.set(3, 3, 8).unwrap();
        m
    }

    #[test]
    fn test_window_cells_map_to_local_coordinates() {
        let m = sample_4x4();
        let s = m.extract_slice(1, 2, 1, 2).unwrap();

        assert_eq!(s.shape(), (2, 2));
        assert_eq!(s.get(0, 0), m.get(1, 1));
        assert_eq!(s.get(0, 1), m.get(1, 2));
        assert_eq!(s.get(1, 0), m.get(2, 1));
        assert_eq!(s.get(1, 1), m.get(2, 2));
    }

    #[test]
    fn test_absent_cells_stay_absent() {
        let m = sample_4x4();
        let s = m.extract_slice(1, 2, 1, 2).unwrap();

        // source (2, 1) is absent; local (1, 0) reads zero with no slot
        assert_eq!(s.get(1, 0), 0);
        assert_eq!(s.ndnz(), 1); // only (0, 1) <- source (1, 2)
    }

    #[test]
    fn test_source_diagonal_lands_off_diagonal() {
        let m = sample_4x4();
        // window rows 1..3, cols 0..2: source diagonal (1,1)=3 becomes
        // local (0,1), off the slice's diagonal
        let s = m.extract_slice(1, 2, 0, 2).unwrap();

        assert_eq!(s.get(0, 1), 3);
        assert_eq!(s.get(0, 0), 0); // source (1, 0) absent
        assert_eq!(s.get(1, 0), 5);
        assert_eq!(s.get(1, 1), 0); // source (2, 1) absent
    }

    #[test]
    fn test_full_window_copies_everything() {
        let m = sample_4x4();
        let s = m.extract_slice(0, 4, 0, 4).unwrap();

        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(s.get(i, j), m.get(i, j));
            }
        }
        assert_eq!(s.ndnz(), m.ndnz());
    }

    #[test]
    fn test_window_out_of_bounds() {
        let m = sample_4x4();
        assert!(matches!(
            m.extract_slice(2, 3, 0, 2),
            Err(StorageError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            m.extract_slice(0, 2, 3, 2),
            Err(StorageError::IndexOutOfRange { .. })
        ));
        assert!(m.extract_slice(0, 0, 0, 2).is_err());
    }

    #[test]
    fn test_single_cell_window() {
        let m = sample_4x4();
        let s = m.extract_slice(2, 1, 0, 1).unwrap();

        assert_eq!(s.shape(), (1, 1));
        assert_eq!(s.get(0, 0), 5);
    }
}
