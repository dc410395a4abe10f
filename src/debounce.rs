//! Trailing-edge debounce for free-text search input.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Collapses a burst of keystrokes into one commit of the burst's final value.
///
/// Each keystroke cancels the pending timer and starts a new one. Commits are
/// tagged with the keystroke generation that scheduled them, and anything
/// older than the latest keystroke is discarded on receipt.
pub struct Debouncer {
  quiet_period: Duration,
  generation: u64,
  pending: Option<JoinHandle<()>>,
  tx: mpsc::UnboundedSender<(u64, String)>,
  rx: mpsc::UnboundedReceiver<(u64, String)>,
}

impl Debouncer {
  pub fn new(quiet_period: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      quiet_period,
      generation: 0,
      pending: None,
      tx,
      rx,
    }
  }

  pub fn quiet_period(&self) -> Duration {
    self.quiet_period
  }

  /// Record a keystroke. Must be called from within a tokio runtime.
  pub fn on_input(&mut self, text: &str) {
    self.abort_pending();
    self.generation += 1;

    let generation = self.generation;
    let quiet_period = self.quiet_period;
    let text = text.trim().to_string();
    let tx = self.tx.clone();

    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(quiet_period).await;
      // Receiver lives as long as the debouncer
      let _ = tx.send((generation, text));
    }));
  }

  /// Drop the pending commit, if any.
  pub fn cancel(&mut self) {
    self.abort_pending();
    self.generation += 1;
  }

  /// Whether a commit is scheduled and not yet taken.
  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// Take the commit if the quiet period has elapsed. For tick-driven callers.
  pub fn try_commit(&mut self) -> Option<String> {
    while let Ok((generation, text)) = self.rx.try_recv() {
      if generation == self.generation {
        self.pending = None;
        return Some(text);
      }
    }
    None
  }

  /// Wait for the next commit. Pends forever if no input arrives.
  pub async fn next_commit(&mut self) -> Option<String> {
    while let Some((generation, text)) = self.rx.recv().await {
      if generation == self.generation {
        self.pending = None;
        return Some(text);
      }
    }
    None
  }

  fn abort_pending(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }
}

impl Default for Debouncer {
  fn default() -> Self {
    Self::new(DEFAULT_QUIET_PERIOD)
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) {
    self.abort_pending();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::time::{sleep, Instant};

  #[tokio::test(start_paused = true)]
  async fn test_burst_commits_once_after_last_keystroke() {
    let mut debouncer = Debouncer::new(Duration::from_millis(500));
    let started = Instant::now();

    debouncer.on_input("p");
    sleep(Duration::from_millis(100)).await;
    debouncer.on_input("ph");
    sleep(Duration::from_millis(100)).await;
    debouncer.on_input("pho");
    sleep(Duration::from_millis(500)).await;
    debouncer.on_input("phone ");

    let committed = debouncer.next_commit().await;
    let elapsed = started.elapsed();

    assert_eq!(committed.as_deref(), Some("phone"));
    assert!(elapsed >= Duration::from_millis(1200));
    assert!(elapsed < Duration::from_millis(1250));
    assert_eq!(debouncer.try_commit(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_try_commit_waits_for_quiet_period() {
    let mut debouncer = Debouncer::new(Duration::from_millis(500));

    debouncer.on_input("  laptop  ");
    sleep(Duration::from_millis(499)).await;
    assert_eq!(debouncer.try_commit(), None);
    assert!(debouncer.is_pending());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(debouncer.try_commit().as_deref(), Some("laptop"));
    assert!(!debouncer.is_pending());
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancel_drops_pending_commit() {
    let mut debouncer = Debouncer::new(Duration::from_millis(500));

    debouncer.on_input("shoes");
    debouncer.cancel();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(debouncer.try_commit(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_separate_bursts_commit_separately() {
    let mut debouncer = Debouncer::new(Duration::from_millis(500));

    debouncer.on_input("a");
    sleep(Duration::from_millis(600)).await;
    assert_eq!(debouncer.try_commit().as_deref(), Some("a"));

    debouncer.on_input("ab");
    sleep(Duration::from_millis(600)).await;
    assert_eq!(debouncer.try_commit().as_deref(), Some("ab"));
  }
}
