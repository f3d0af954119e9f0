use kernel_sync::SyncOnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn empty_until_set() {
    let cell = SyncOnceCell::<u32>::new();
    assert!(cell.get().is_none());
    assert!(!cell.is_initialized());

    assert_eq!(cell.set(5), Ok(&5));
    assert!(cell.is_initialized());
    assert_eq!(cell.get(), Some(&5));
}

#[test]
fn second_set_hands_value_back() {
    let cell = SyncOnceCell::new();
    cell.set(String::from("first")).unwrap();

    let rejected = cell.set(String::from("second"));
    assert_eq!(rejected, Err(String::from("second")));
    assert_eq!(cell.get().map(String::as_str), Some("first"));
}

#[test]
fn racing_setters_have_one_winner() {
    let threads = 8;
    let cell = Arc::new(SyncOnceCell::new());
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let cell = Arc::clone(&cell);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                cell.set(i).is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert!(cell.get().is_some_and(|v| *v < threads));
}

#[test]
fn drops_published_value() {
    let drops = Arc::new(AtomicUsize::new(0));

    struct Counted(Arc<AtomicUsize>);
    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    {
        let cell = SyncOnceCell::new();
        assert!(cell.set(Counted(Arc::clone(&drops))).is_ok());
    }
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}
