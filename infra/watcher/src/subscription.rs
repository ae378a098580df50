use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::trace;

/// Changed paths under one watched tree.
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    rx: mpsc::UnboundedReceiver<PathBuf>,
}

impl Subscription {
    pub(crate) const fn new(name: &'static str, rx: mpsc::UnboundedReceiver<PathBuf>) -> Self {
        Self { name, rx }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Waits for the next stable batch of changes.
    ///
    /// The batch opens with the first change and closes once `window` passes
    /// without another one (trailing debounce). Changes that queued up while
    /// the caller was busy open the next batch immediately. Paths are sorted
    /// and deduplicated. Returns `None` once the watcher is gone and nothing
    /// is pending.
    pub async fn next_batch(&mut self, window: Duration) -> Option<Vec<PathBuf>> {
        let first = self.rx.recv().await?;
        let mut batch = vec![first];

        while let Ok(Some(path)) = timeout(window, self.rx.recv()).await {
            batch.push(path);
        }

        batch.sort();
        batch.dedup();
        trace!(subscription = self.name, changed = batch.len(), "Batch settled");
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::{Instant, sleep};

    const WINDOW: Duration = Duration::from_millis(200);

    fn channel() -> (mpsc::UnboundedSender<PathBuf>, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Subscription::new("test", rx))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_into_one_sorted_batch() {
        let (tx, mut sub) = channel();
        tx.send("b.scss".into()).unwrap();
        tx.send("a.scss".into()).unwrap();
        tx.send("b.scss".into()).unwrap();

        let started = Instant::now();
        let batch = sub.next_batch(WINDOW).await.unwrap();
        assert_eq!(batch, vec![PathBuf::from("a.scss"), PathBuf::from("b.scss")]);
        assert_eq!(started.elapsed(), WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_is_trailing() {
        let (tx, mut sub) = channel();
        let producer = tokio::spawn(async move {
            for i in 0..3 {
                tx.send(PathBuf::from(format!("{i}.js"))).unwrap();
                sleep(Duration::from_millis(150)).await;
            }
            sleep(Duration::from_millis(500)).await;
            tx.send("late.js".into()).unwrap();
        });

        let started = Instant::now();
        let first = sub.next_batch(WINDOW).await.unwrap();
        assert_eq!(first.len(), 3);
        // Last change at 300ms plus a quiet window.
        assert_eq!(started.elapsed(), Duration::from_millis(500));

        let second = sub.next_batch(WINDOW).await.unwrap();
        assert_eq!(second, vec![PathBuf::from("late.js")]);
        producer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_flushes_then_ends() {
        let (tx, mut sub) = channel();
        tx.send("x.html".into()).unwrap();
        drop(tx);

        assert_eq!(sub.next_batch(WINDOW).await, Some(vec![PathBuf::from("x.html")]));
        assert_eq!(sub.next_batch(WINDOW).await, None);
    }
}
