use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub path: String,
    pub history: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    state: Arc<watch::Sender<NavigationState>>,
}

impl Navigator {
    pub fn new(initial: impl Into<String>) -> Self {
        let (state, _) = watch::channel(NavigationState {
            path: initial.into(),
            history: Vec::new(),
        });
        Self {
            state: Arc::new(state),
        }
    }

    pub fn navigate(&self, path: impl Into<String>) {
        let path = path.into();
        info!(path = %path, "navigating");
        self.state.send_modify(|state| {
            let previous = std::mem::replace(&mut state.path, path);
            state.history.push(previous);
        });
    }

    pub fn back(&self) -> Option<String> {
        let mut moved = None;
        self.state.send_if_modified(|state| match state.history.pop() {
            Some(previous) => {
                state.path = previous.clone();
                moved = Some(previous);
                true
            }
            None => false,
        });
        moved
    }

    pub fn current(&self) -> String {
        self.state.borrow().path.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.state.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::Navigator;

    #[test]
    fn navigate_records_history_and_back_restores_it() {
        let navigator = Navigator::new("/location/create/in-memory");
        let mut receiver = navigator.subscribe();

        navigator.navigate("/location");
        assert_eq!(navigator.current(), "/location");
        assert!(receiver.has_changed().expect("open"));
        let _ = receiver.borrow_and_update();

        assert_eq!(navigator.back().as_deref(), Some("/location/create/in-memory"));
        assert_eq!(navigator.back(), None);
        assert_eq!(navigator.current(), "/location/create/in-memory");
    }
}
