use thiserror::Error;

/// Failures surfaced by status and command requests. The display text of each variant is what
/// ends up in a notification.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("{0:#}")]
    Transport(anyhow::Error),
    /// Non-2xx reply; the device's body text is shown verbatim.
    #[error("{body}")]
    Rejected { status: u16, body: String },
    #[error("malformed device response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl PanelError {
    pub fn is_transport(&self) -> bool {
        matches!(self, PanelError::Transport(_))
    }
}
