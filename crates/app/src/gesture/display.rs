//! Display-sink boundary.
//!
//! The pipeline and lifecycle controller talk to the user exclusively through
//! [`DisplaySink`]; the provided [`StatusBoard`] logs every update and keeps a
//! snapshot the status server can serve.

use std::sync::Mutex;

use serde::Serialize;
use tracing::info;

use crate::gesture::lifecycle::CameraState;
use crate::gesture::smoother::WAITING_LABEL;

/// Lobby vs active presentation, mirrored by the status endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Lobby,
    Active,
}

/// Sink for user-visible output: status strings in lobby/error states and
/// the smoothed label while recognition is active.
pub trait DisplaySink: Send + Sync {
    fn set_state(&self, state: CameraState);
    fn set_layout(&self, layout: Layout);
    fn show_status(&self, message: &str);
    fn clear_status(&self);
    fn show_label(&self, label: &str);
}

/// Point-in-time view of everything the display sink has been told.
#[derive(Clone, Debug, Serialize)]
pub struct StatusSnapshot {
    pub state: CameraState,
    pub layout: Layout,
    pub status: Option<String>,
    pub label: String,
}

/// Default sink: prints updates and retains a snapshot for `/status`.
pub struct StatusBoard {
    inner: Mutex<StatusSnapshot>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StatusSnapshot {
                state: CameraState::Requesting,
                layout: Layout::Lobby,
                status: None,
                label: WAITING_LABEL.to_string(),
            }),
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut StatusSnapshot)) {
        if let Ok(mut guard) = self.inner.lock() {
            apply(&mut guard);
        }
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for StatusBoard {
    fn set_state(&self, state: CameraState) {
        self.update(|snapshot| snapshot.state = state);
    }

    fn set_layout(&self, layout: Layout) {
        self.update(|snapshot| snapshot.layout = layout);
    }

    fn show_status(&self, message: &str) {
        info!("status: {message}");
        println!("{message}");
        self.update(|snapshot| snapshot.status = Some(message.to_string()));
    }

    fn clear_status(&self) {
        self.update(|snapshot| snapshot.status = None);
    }

    fn show_label(&self, label: &str) {
        info!("label: {label}");
        println!("> {label}");
        self.update(|snapshot| snapshot.label = label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_lobby_with_waiting_sentinel() {
        let board = StatusBoard::new();
        let snapshot = board.snapshot();
        assert_eq!(snapshot.state, CameraState::Requesting);
        assert_eq!(snapshot.layout, Layout::Lobby);
        assert_eq!(snapshot.label, WAITING_LABEL);
        assert!(snapshot.status.is_none());
    }

    #[test]
    fn updates_are_visible_in_snapshots() {
        let board = StatusBoard::new();
        board.set_state(CameraState::Active);
        board.set_layout(Layout::Active);
        board.show_status("hello");
        board.show_label("open palm");

        let snapshot = board.snapshot();
        assert_eq!(snapshot.state, CameraState::Active);
        assert_eq!(snapshot.layout, Layout::Active);
        assert_eq!(snapshot.status.as_deref(), Some("hello"));
        assert_eq!(snapshot.label, "open palm");

        board.clear_status();
        assert!(board.snapshot().status.is_none());
    }
}
