//! Trailing-edge debouncer.
//!
//! Fires a callback at most once per `delay` of input inactivity, with the
//! most recent value. The handle can cancel or flush the pending value;
//! dropping it cancels.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

enum Signal<T> {
    Call(T),
    Cancel,
    Flush,
}

/// Handle to a running debouncer.
///
/// The timer runs on a tokio task, so [`Debouncer::new`] must be called from
/// within a tokio runtime.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<Signal<T>>,
    delay: Duration,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(delay: Duration, mut callback: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Signal<T>>();

        tokio::spawn(async move {
            let mut pending: Option<T> = None;
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    signal = rx.recv() => match signal {
                        Some(Signal::Call(value)) => {
                            pending = Some(value);
                            sleep.as_mut().reset(Instant::now() + delay);
                        }
                        Some(Signal::Cancel) => pending = None,
                        Some(Signal::Flush) => {
                            if let Some(value) = pending.take() {
                                callback(value);
                            }
                        }
                        // Handle dropped
                        None => break,
                    },
                    () = &mut sleep, if pending.is_some() => {
                        if let Some(value) = pending.take() {
                            callback(value);
                        }
                    }
                }
            }
        });

        Self { tx, delay }
    }

    /// Replace the pending value and restart the inactivity timer.
    pub fn call(&self, value: T) {
        let _ = self.tx.send(Signal::Call(value));
    }

    /// Drop the pending value without firing.
    pub fn cancel(&self) {
        let _ = self.tx.send(Signal::Cancel);
    }

    /// Fire the pending value now, if any.
    pub fn flush(&self) {
        let _ = self.tx.send(Signal::Flush);
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::sleep;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl FnMut(u32) + Send + 'static) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        (fired, move |v| sink.lock().unwrap().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_with_latest_value() {
        let (fired, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(300), callback);

        debouncer.call(1);
        sleep(Duration::from_millis(100)).await;
        debouncer.call(2);
        sleep(Duration::from_millis(100)).await;
        debouncer.call(3);

        sleep(Duration::from_millis(299)).await;
        assert!(fired.lock().unwrap().is_empty());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(*fired.lock().unwrap(), vec![3]);

        // Nothing further without new input.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(*fired.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (fired, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50), callback);

        debouncer.call(1);
        sleep(Duration::from_millis(100)).await;
        debouncer.call(2);
        sleep(Duration::from_millis(100)).await;

        assert_eq!(*fired.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending() {
        let (fired, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50), callback);

        debouncer.call(1);
        debouncer.cancel();
        sleep(Duration::from_millis(200)).await;
        assert!(fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_fires_immediately() {
        let (fired, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_secs(60), callback);

        debouncer.call(7);
        debouncer.flush();
        sleep(Duration::from_millis(1)).await;
        assert_eq!(*fired.lock().unwrap(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (fired, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50), callback);

        debouncer.call(1);
        drop(debouncer);
        sleep(Duration::from_millis(200)).await;
        assert!(fired.lock().unwrap().is_empty());
    }
}
