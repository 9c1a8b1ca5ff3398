//! Trailing-edge debouncer for search input.
//!
//! Values pushed in quick succession collapse into the last one, delivered
//! once the input has been quiet for the configured window.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawns the timer task; every settled value is passed to `on_settled`.
    /// The task ends when the debouncer is dropped, flushing a pending value.
    pub fn spawn<F>(delay: Duration, mut on_settled: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        tokio::spawn(async move {
            let mut pending: Option<T> = None;
            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Some(value) => {
                            pending = Some(value);
                            sleep.as_mut().reset(Instant::now() + delay);
                        }
                        None => {
                            if let Some(value) = pending.take() {
                                on_settled(value);
                            }
                            break;
                        }
                    },
                    () = &mut sleep, if pending.is_some() => {
                        if let Some(value) = pending.take() {
                            on_settled(value);
                        }
                    }
                }
            }
        });
        Self { tx }
    }

    pub fn push(&self, value: T) {
        if self.tx.send(value).is_err() {
            tracing::warn!("debounce task has stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl FnMut(String) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v| sink.lock().unwrap().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_value() {
        let (seen, sink) = recorder();
        let debouncer = Debouncer::spawn(Duration::from_millis(300), sink);
        for term in ["b", "be", "ber", "bert", "bert "] {
            debouncer.push(term.to_string());
            time::sleep(Duration::from_millis(20)).await;
        }
        time::sleep(Duration::from_millis(250)).await;
        assert!(seen.lock().unwrap().is_empty());
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["bert ".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_edits_each_settle() {
        let (seen, sink) = recorder();
        let debouncer = Debouncer::spawn(Duration::from_millis(300), sink);
        debouncer.push("a".to_string());
        time::sleep(Duration::from_millis(400)).await;
        debouncer.push("ab".to_string());
        time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string(), "ab".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_debouncer_emits_nothing() {
        let (seen, sink) = recorder();
        let _debouncer = Debouncer::spawn(Duration::from_millis(300), sink);
        time::sleep(Duration::from_secs(5)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
