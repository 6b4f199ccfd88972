//! Host page messaging
//!
//! The game runs inside an iframe. It reports collected toys and finished
//! turns to the parent page, and the parent pushes the authoritative turn
//! budget back. Messages are JSON objects tagged by `type`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::GameEvent;

#[derive(Debug, Error)]
pub enum HostMessageError {
    #[error("host message is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("host message could not be read: {0}")]
    Unreadable(String),
}

/// Messages the parent page sends us
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Overwrite the remaining turn budget
    TurnsUpdated { turns: i32 },
    /// Any other message type; ignored
    #[serde(other)]
    Unknown,
}

impl HostMessage {
    pub fn parse(json: &str) -> Result<Self, HostMessageError> {
        let message: HostMessage = serde_json::from_str(json)?;
        if message == HostMessage::Unknown {
            log::debug!("Ignoring host message: {}", json);
        }
        Ok(message)
    }

    /// Read the `data` of a browser `message` event, which may arrive as a
    /// JSON string or as a structured-clone object
    #[cfg(target_arch = "wasm32")]
    pub fn from_js(data: &wasm_bindgen::JsValue) -> Result<Self, HostMessageError> {
        let json = match data.as_string() {
            Some(text) => text,
            None => js_sys::JSON::stringify(data)
                .map_err(|e| HostMessageError::Unreadable(format!("{:?}", e)))?
                .into(),
        };
        Self::parse(&json)
    }
}

/// Wire form of an outbound event
pub fn encode_event(event: &GameEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Post an event to the parent page. Without a parent this is a no-op;
/// failures are logged, never propagated.
#[cfg(target_arch = "wasm32")]
pub fn post_to_parent(event: &GameEvent) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let parent = match window.parent() {
        Ok(Some(parent)) => parent,
        _ => return,
    };
    // A top-level page is its own parent
    if js_sys::Object::is(&parent, &window) {
        log::debug!("No host page, dropping {:?}", event);
        return;
    }

    let json = match encode_event(event) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to encode {:?}: {}", event, e);
            return;
        }
    };
    let message = match js_sys::JSON::parse(&json) {
        Ok(message) => message,
        Err(e) => {
            log::error!("Failed to build host message: {:?}", e);
            return;
        }
    };
    if let Err(e) = parent.post_message(&message, "*") {
        log::warn!("Failed to notify host page: {:?}", e);
    }
}

/// Native builds have no host page
#[cfg(not(target_arch = "wasm32"))]
pub fn post_to_parent(event: &GameEvent) {
    log::debug!("Host event: {:?}", event);
}
