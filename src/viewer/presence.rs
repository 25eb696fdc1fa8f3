use tracing::info;

/// Receives a two-line "what am I looking at" summary on every focus change.
pub trait PresenceHook: Send {
    fn update_presence(&self, top: &str, bottom: &str);
}

/// Reports presence to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresence;

impl PresenceHook for LogPresence {
    fn update_presence(&self, top: &str, bottom: &str) {
        info!(target: "presence", "{} | {}", top, bottom);
    }
}
