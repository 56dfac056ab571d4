use serde::{Deserialize, Serialize};

/// Environment signals delivered by the host adapter.
///
/// The adapter translating host callbacks (tab/window/idle/audio observers)
/// into these messages lives outside this crate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Signal {
    /// The resource in view changed; `url` is `None` when nothing trackable
    /// is in view.
    #[serde(rename = "view_changed")]
    ViewChanged { url: Option<String> },

    /// Window focus changed. On focus gain the host supplies the locator
    /// currently in view so the tracker can re-evaluate its target.
    #[serde(rename = "focus_changed")]
    FocusChanged {
        focused: bool,
        #[serde(default)]
        active_url: Option<String>,
    },

    #[serde(rename = "idle_changed")]
    IdleChanged { state: IdleState },

    #[serde(rename = "audible_changed")]
    AudibleChanged { audible: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

/// Status response for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStatus {
    pub domain: Option<String>,
    pub is_tracking: bool,
    pub is_idle: bool,
    pub is_audible: bool,
    pub is_window_focused: bool,
    pub tracking_start: Option<i64>,
}
