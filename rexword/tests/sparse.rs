use rexword::SparseSet;

#[test]
fn insert_keeps_insertion_order() {
    let mut set = SparseSet::new(16);
    assert!(set.is_empty());
    assert!(set.insert(9));
    assert!(set.insert(3));
    assert!(set.insert(12));
    assert!(!set.insert(3));
    assert_eq!(set.as_slice(), &[9, 3, 12]);
    assert_eq!(set.len(), 3);
    assert_eq!(set.capacity(), 16);
}

#[test]
fn contains_reports_membership() {
    let mut set = SparseSet::new(4);
    set.insert(0);
    set.insert(3);
    assert!(set.contains(0));
    assert!(set.contains(3));
    assert!(!set.contains(1));
    assert!(!set.contains(4), "values outside the universe are never members");
}

#[test]
fn clear_empties_without_forgetting_capacity() {
    let mut set = SparseSet::new(8);
    for value in [1, 4, 6] {
        set.insert(value);
    }
    set.clear();
    assert!(set.is_empty());
    assert_eq!(set.capacity(), 8);
    assert!(!set.contains(4));

    assert!(set.insert(6));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![6]);
    assert!(!set.contains(1));
}

#[test]
#[should_panic(expected = "out of range")]
fn insert_outside_universe_panics() {
    let mut set = SparseSet::new(2);
    set.insert(2);
}

#[test]
fn debug_lists_values() {
    let mut set = SparseSet::new(10);
    set.insert(7);
    set.insert(2);
    assert_eq!(format!("{:?}", set), "{7, 2}");
}
