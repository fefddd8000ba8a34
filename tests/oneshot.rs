#![cfg(feature = "loom")]

use lite_thread::oneshot::{channel, AlreadyCommitted};
use loom::thread;

#[test]
fn loom_oneshot_commit_then_wait() {
    loom::model(|| {
        let (committer, waiter) = channel::<usize>();

        thread::spawn(move || {
            committer.set(1).unwrap();
        });

        assert_eq!(waiter.wait(), Some(1));
    });
}

#[test]
fn loom_oneshot_commit_empty() {
    loom::model(|| {
        let (committer, waiter) = channel::<usize>();

        thread::spawn(move || {
            committer.set_empty().unwrap();
        });

        assert_eq!(waiter.wait(), None);
    });
}

#[test]
fn loom_oneshot_racing_commits() {
    loom::model(|| {
        let (committer, waiter) = channel::<usize>();
        let other = committer.clone();

        let racer = thread::spawn(move || other.set(2).is_ok());
        let mine = committer.set(1).is_ok();
        let theirs = racer.join().unwrap();

        // Exactly one commit wins and the waiter sees the winner.
        assert!(mine ^ theirs);
        let expected = if mine { 1 } else { 2 };
        assert_eq!(waiter.wait(), Some(expected));
        assert_eq!(committer.set(3), Err(AlreadyCommitted));
    });
}

#[test]
fn loom_oneshot_two_waiters() {
    loom::model(|| {
        let (committer, waiter) = channel::<usize>();
        let second = waiter.clone();

        let observer = thread::spawn(move || second.wait());

        committer.set(7).unwrap();

        assert_eq!(waiter.wait(), Some(7));
        assert_eq!(observer.join().unwrap(), Some(7));
    });
}

#[test]
fn loom_oneshot_try_wait_never_commits() {
    loom::model(|| {
        let (committer, waiter) = channel::<usize>();

        let producer = thread::spawn(move || {
            committer.set(5).unwrap();
        });

        // Either pending or the committed value, nothing in between.
        if let Ok(value) = waiter.try_wait() {
            assert_eq!(value, Some(5));
        }

        producer.join().unwrap();
        assert_eq!(waiter.try_wait(), Ok(Some(5)));
    });
}
