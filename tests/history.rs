use hudmon::metrics::history::{HistoryStore, MIN_HISTORY_LEN};

#[test]
fn resize_then_values_returns_the_newest_tail() {
    for pushes in 0..20usize {
        for start in MIN_HISTORY_LEN..12 {
            for k in MIN_HISTORY_LEN..16 {
                let mut store = HistoryStore::new(start);
                for v in 0..pushes {
                    store.push("s", v as f64);
                }
                let before = store.values("s");
                assert_eq!(before.len(), pushes.min(start));

                store.resize(k);
                let after = store.values("s");
                let keep = before.len().min(k);
                assert_eq!(after, before[before.len() - keep..].to_vec());
            }
        }
    }
}

#[test]
fn series_created_after_resize_use_the_new_capacity() {
    let mut store = HistoryStore::new(10);
    store.resize(5);
    for v in 0..9 {
        store.push("late", v as f64);
    }
    assert_eq!(store.values("late"), vec![4.0, 5.0, 6.0, 7.0, 8.0]);
}
