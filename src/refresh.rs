//! Dependent-view refresh signaling
//!
//! After a successful sign-out or profile write, views that read identity
//! or profile data server-side must re-resolve. The presentation layer
//! owns how a refresh actually happens; this crate only raises the signal.

use tokio::sync::watch;

/// Collaborator notified when dependent views must re-read their data
pub trait ViewRefresher: Send + Sync {
    /// Request a re-read of identity-dependent views
    fn refresh(&self);
}

/// Generation-counter refresher backed by a watch channel
///
/// Each refresh bumps the generation; views hold a [`watch::Receiver`]
/// and re-read whenever the generation changes.
pub struct RefreshSignal {
    generation: watch::Sender<u64>,
}

impl RefreshSignal {
    #[must_use]
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    /// Subscribe to refresh generations
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Current refresh generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRefresher for RefreshSignal {
    fn refresh(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_bumps_the_generation() {
        let signal = RefreshSignal::new();
        assert_eq!(signal.generation(), 0);

        signal.refresh();
        signal.refresh();
        assert_eq!(signal.generation(), 2);
    }

    #[tokio::test]
    async fn watchers_observe_refreshes() {
        let signal = RefreshSignal::new();
        let mut watcher = signal.watch();

        signal.refresh();
        watcher.changed().await.unwrap();
        assert_eq!(*watcher.borrow(), 1);
    }
}
