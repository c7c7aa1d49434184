//! Integration tests for the `owned_ptr` package.
//!
//! These exercise the pointer types together through the public API only, focusing on the
//! destruction guarantees: exactly once, never early, never late.

use std::sync::Mutex;
use std::thread;

use owned_ptr::{Error, SharedPtr, UniquePtr, WeakPtr};
use testing::{DropTracker, Tracked, with_watchdog};

#[test]
fn unique_into_shared() {
    let tracker = DropTracker::new();

    let unique = UniquePtr::new(tracker.track(5));
    let shared: SharedPtr<Tracked<i32>> = SharedPtr::from(unique.into_box().unwrap());

    assert_eq!(shared.use_count(), 1);
    assert_eq!(**shared, 5);

    drop(shared);
    assert_eq!(tracker.drop_count(), 1);
}

#[test]
fn use_count_follows_live_copies() {
    let tracker = DropTracker::new();

    for n in 1..=16 {
        let first = SharedPtr::new(tracker.track(n));
        let mut copies = vec![first];

        while copies.len() < n {
            copies.push(copies[0].clone());
        }

        for copy in &copies {
            assert_eq!(copy.use_count(), n);
        }

        let last = copies.pop().unwrap();
        drop(copies);
        assert_eq!(last.use_count(), 1);

        let drops_before = tracker.drop_count();
        drop(last);
        assert_eq!(tracker.drop_count(), drops_before + 1);
    }
}

#[test]
fn weak_lock_tracks_owner_lifetime() {
    let owner = SharedPtr::new("value".to_string());
    let observers: Vec<WeakPtr<String>> = (0..4).map(|_| owner.downgrade()).collect();

    for observer in &observers {
        assert!(!observer.expired());
        assert_eq!(observer.lock().get_ref().map(String::as_str), Ok("value"));
    }

    drop(owner);

    for observer in &observers {
        assert!(observer.expired());
        assert_eq!(observer.use_count(), 0);
        assert!(matches!(
            observer.lock().get_ref(),
            Err(Error::NullDereference { .. })
        ));
    }
}

#[test]
fn moved_pointers_do_not_double_free() {
    let tracker = DropTracker::new();

    let mut unique_source = UniquePtr::new(tracker.track(1));
    let unique_destination = unique_source.take();

    let mut shared_source = SharedPtr::new(tracker.track(2));
    let shared_destination = shared_source.take();

    assert!(unique_source.is_null());
    assert!(shared_source.is_null());
    assert_eq!(shared_source.use_count(), 0);

    drop(unique_source);
    drop(shared_source);
    assert_eq!(tracker.drop_count(), 0);

    drop(unique_destination);
    drop(shared_destination);
    assert_eq!(tracker.drop_count(), 2);
}

#[cfg_attr(miri, ignore)]
#[test]
fn weak_observers_across_threads() {
    with_watchdog(|| {
        let tracker = DropTracker::new();
        let owner = SharedPtr::new(Mutex::new(tracker.track(Vec::<usize>::new())));
        let observer = owner.downgrade();

        thread::scope(|s| {
            for id in 0..8 {
                let observer = observer.clone();
                s.spawn(move || {
                    let locked = observer.lock();
                    locked.get_ref().unwrap().lock().unwrap().push(id);
                });
            }
        });

        let mut ids = owner.lock().unwrap().value().clone();
        ids.sort_unstable();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());

        drop(owner);
        assert!(observer.expired());
        assert_eq!(tracker.drop_count(), 1);
    });
}
