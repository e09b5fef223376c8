//! Tests for the triple bridge and external-format conversions

use nyale::{from_sprs, storages_equal, to_dense, to_sprs, YaleStorage};

#[test]
fn test_triple_round_trip_reproduces_cells() {
    // [0 7 0 8]
    // [9 0 0 0]
    // [0 0 5 6]
    let ia = vec![0, 2, 3, 5];
    let ja = vec![1, 3, 0, 2, 3];
    let vals = vec![7.0f64, 8.0, 9.0, 5.0, 6.0];

    let m: YaleStorage<f64> = YaleStorage::from_triples((3, 4), &ia, &ja, &vals).unwrap();

    let expected = [
        [0.0, 7.0, 0.0, 8.0],
        [9.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 5.0, 6.0],
    ];
    for i in 0..3 {
        for j in 0..4 {
            assert_eq!(m.get(i, j), expected[i][j], "cell ({}, {})", i, j);
        }
    }

    // diagonal cells absent from the triples default to zero
    assert_eq!(m.get(0, 0), 0.0);
    assert_eq!(m.get(1, 1), 0.0);
    // (2, 2) was present in the triples and is a diagonal cell
    assert_eq!(m.get(2, 2), 5.0);

    // and converting back yields the identical triples
    let (ia2, ja2, vals2) = m.to_triples();
    assert_eq!(ia2, ia);
    assert_eq!(ja2, ja);
    assert_eq!(vals2, vals);
}

#[test]
fn test_triples_from_mutated_matrix() {
    let mut m = YaleStorage::<i64>::new((3, 3)).unwrap();
    m.set(2, 2, 9).unwrap();
    m.set(0, 1, 4).unwrap();
    m.set(2, 0, 5).unwrap();

    let (ia, ja, vals) = m.to_triples();
    assert_eq!(ia, vec![0, 1, 1, 3]);
    assert_eq!(ja, vec![1, 0, 2]);
    assert_eq!(vals, vec![4, 5, 9]);

    let back: YaleStorage<i64> = YaleStorage::from_triples((3, 3), &ia, &ja, &vals).unwrap();
    assert!(storages_equal(&back, &m));
}

#[test]
fn test_sprs_round_trip() {
    let mut m = YaleStorage::<f64>::new((4, 4)).unwrap();
    m.set(0, 0, 1.5).unwrap();
    m.set(0, 3, 2.5).unwrap();
    m.set(2, 1, 3.5).unwrap();
    m.set(3, 3, 4.5).unwrap();

    let cs = to_sprs(&m);
    assert_eq!(cs.rows(), 4);
    assert_eq!(cs.cols(), 4);

    let back: YaleStorage<f64> = from_sprs(cs).unwrap();
    assert!(storages_equal(&back, &m));
}

#[test]
fn test_sprs_csc_input_is_converted() {
    let mut m = YaleStorage::<f64>::new((3, 3)).unwrap();
    m.set(0, 2, 2.0).unwrap();
    m.set(1, 0, 3.0).unwrap();

    let csc = to_sprs(&m).to_csc();
    let back: YaleStorage<f64> = from_sprs(csc).unwrap();
    assert!(storages_equal(&back, &m));
}

#[test]
fn test_dense_export() {
    let mut m = YaleStorage::<i32>::new((2, 4)).unwrap();
    m.set(0, 0, 1).unwrap();
    m.set(0, 3, 2).unwrap();
    m.set(1, 1, 3).unwrap();

    let dense = to_dense(&m);
    assert_eq!(dense.shape(), &[2, 4]);

    for i in 0..2 {
        for j in 0..4 {
            assert_eq!(dense[[i, j]], m.get(i, j));
        }
    }
}

#[test]
fn test_cast_copy_between_kinds() {
    let mut m = YaleStorage::<f64>::new((3, 3)).unwrap();
    m.set(0, 1, 2.75).unwrap();
    m.set(1, 1, -1.25).unwrap();
    m.set(2, 0, 4.0).unwrap();

    let ints: YaleStorage<i64> = m.cast_copy();
    assert_eq!(ints.get(0, 1), 2);
    assert_eq!(ints.get(1, 1), -1);
    assert_eq!(ints.get(2, 0), 4);

    let floats: YaleStorage<f32> = ints.cast_copy();
    assert_eq!(floats.get(0, 1), 2.0);
    assert_eq!(floats.get(2, 0), 4.0);
}
