//! Observable state container

use tokio::sync::watch;

/// A named piece of shared state with change notification
///
/// Writes always succeed, whether or not anyone is subscribed.
#[derive(Debug)]
pub struct Store<T> {
    name: String,
    state: watch::Sender<T>,
}

impl<T> Store<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            name: name.into(),
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current state
    pub fn get_state(&self) -> T {
        self.state.borrow().clone()
    }

    /// Read part of the state without cloning all of it
    pub fn select<U>(&self, selector: impl FnOnce(&T) -> U) -> U {
        selector(&self.state.borrow())
    }

    /// Replace the state, returning the previous value
    pub fn set_state(&self, value: T) -> T {
        self.state.send_replace(value)
    }

    /// Modify the state in place and notify subscribers
    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.state.send_modify(modify);
    }

    /// Receiver that observes every subsequent change
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }
}
