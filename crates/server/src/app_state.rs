use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::player::SequencePlayer;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) player: Arc<Mutex<SequencePlayer>>,
    /// Wakes the playback loop so a new sequence starts without waiting out the old delay.
    pub(crate) restart: Arc<Notify>,
}

impl AppState {
    pub(crate) fn new(player: SequencePlayer) -> Self {
        Self {
            player: Arc::new(Mutex::new(player)),
            restart: Arc::new(Notify::new()),
        }
    }
}
