use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;

use super::Debouncer;
use super::TimerHandle;

#[tokio::test(start_paused = true)]
async fn it_fires_once_after_the_delay() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<&str>();
    let _handle = TimerHandle::after(Duration::from_millis(300), tx, "refresh");

    time::sleep(Duration::from_millis(299)).await;
    assert!(rx.try_recv().is_err());

    time::sleep(Duration::from_millis(2)).await;
    assert_eq!(rx.recv().await, Some("refresh"));

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_never_fires_once_dropped() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<&str>();
    let handle = TimerHandle::after(Duration::from_secs(2), tx, "expire");
    drop(handle);

    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(rx.recv().await, None);

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_ticks_until_cancelled() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
    let handle = TimerHandle::every(Duration::from_secs(1), tx, |n| return n);

    assert_eq!(rx.recv().await, Some(1));
    assert_eq!(rx.recv().await, Some(2));
    assert_eq!(rx.recv().await, Some(3));

    handle.cancel();
    assert!(handle.is_cancelled());
    time::sleep(Duration::from_secs(3)).await;
    assert_eq!(rx.recv().await, None);

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_collapses_triggers_into_one_event() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
    let mut debouncer = Debouncer::new(Duration::from_millis(500));
    assert!(!debouncer.is_immediate());

    debouncer.trigger(&tx, 1);
    time::sleep(Duration::from_millis(400)).await;
    debouncer.trigger(&tx, 2);
    time::sleep(Duration::from_millis(400)).await;
    assert!(rx.try_recv().is_err());
    assert!(debouncer.is_pending());

    assert_eq!(rx.recv().await, Some(2));
    debouncer.fired();
    assert!(!debouncer.is_pending());

    drop(tx);
    assert_eq!(rx.recv().await, None);

    return Ok(());
}

#[test]
fn it_treats_zero_as_immediate() {
    assert!(Debouncer::new(Duration::ZERO).is_immediate());
}
