use std::{sync::Arc, time::Duration};

use shared::{
    domain::{SequenceCatalog, SequenceId, Speed},
    protocol::{DeviceStatus, RpcCommand, RpcRequest},
};
use tokio::{
    runtime::Handle,
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{interval_at, sleep, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

pub mod error;
pub mod host_page;
pub mod transport;
pub mod types;

pub use error::PanelError;
pub use transport::{DeviceApi, DeviceReply, HttpDeviceApi};
pub use types::{
    Notification, NotificationId, NotificationList, PanelOptions, PanelSnapshot, Selection,
};

use types::{PanelState, RenderTicket};

/// Shown in place of the status when the device cannot be reached.
pub const LOST_CONNECTION: &str = "Lost connection...";
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);
pub const PROGRESS_TICK: Duration = Duration::from_millis(100);
pub const PROGRESS_STEP: u8 = 5;
pub const PROGRESS_MAX: u8 = 100;
pub const CONTROLS_REENABLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    DisplayChanged(String),
    ProgressChanged(u8),
    ControlsChanged { enabled: bool },
    NotificationAdded(Notification),
    NotificationRemoved(NotificationId),
}

/// `"<sequence name> | <speed label>"` for a status, blank fragments for unknown ids or speeds.
pub fn render(catalog: &SequenceCatalog, status: &DeviceStatus) -> String {
    status.display_text(catalog)
}

fn decode_status(body: &str) -> Result<DeviceStatus, PanelError> {
    Ok(serde_json::from_str(body)?)
}

/// Status poller and command client behind the control panel.
///
/// One poll task runs `fetch → settle → animate → fetch` for as long as the controller is
/// started. Commands run independently of it; whichever status-producing request was issued
/// last wins the display.
pub struct PanelController {
    api: Arc<dyn DeviceApi>,
    inner: Mutex<PanelState>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<PanelEvent>,
}

impl PanelController {
    pub fn new(api: Arc<dyn DeviceApi>, catalog: SequenceCatalog) -> Arc<Self> {
        Self::with_options(api, catalog, PanelOptions::default())
    }

    pub fn with_options(
        api: Arc<dyn DeviceApi>,
        catalog: SequenceCatalog,
        options: PanelOptions,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            api,
            inner: Mutex::new(PanelState::new(catalog, options)),
            poll_task: Mutex::new(None),
            events,
        })
    }

    /// Builds a controller from the raw embedded sequence list. A malformed list leaves the
    /// catalog empty.
    pub fn from_embedded_catalog(
        api: Arc<dyn DeviceApi>,
        raw_catalog: &str,
        options: PanelOptions,
    ) -> Arc<Self> {
        Self::with_options(api, SequenceCatalog::from_embedded(raw_catalog), options)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PanelEvent) {
        let _ = self.events.send(event);
    }

    pub async fn catalog(&self) -> SequenceCatalog {
        self.inner.lock().await.catalog.clone()
    }

    /// Options for the sequence selector, in catalog order.
    pub async fn sequence_choices(&self) -> Vec<(SequenceId, String)> {
        let inner = self.inner.lock().await;
        inner
            .catalog
            .iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect()
    }

    pub fn speed_choices() -> [Speed; 3] {
        Speed::ALL
    }

    pub async fn snapshot(&self) -> PanelSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn render(&self, status: &DeviceStatus) -> String {
        render(&self.inner.lock().await.catalog, status)
    }

    /// Starts the poll loop with an immediate status fetch. Returns `false` when it is
    /// already running.
    pub async fn start(self: &Arc<Self>) -> bool {
        let mut poll_task = self.poll_task.lock().await;
        if poll_task.as_ref().is_some_and(|task| !task.is_finished()) {
            return false;
        }

        let controller = Arc::clone(self);
        *poll_task = Some(tokio::spawn(async move {
            controller.poll_loop().await;
        }));
        info!("status polling started");
        true
    }

    pub async fn stop(&self) {
        if let Some(task) = self.poll_task.lock().await.take() {
            task.abort();
            info!("status polling stopped");
        }
    }

    async fn poll_loop(&self) {
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            debug!(cycle, "fetching device status");
            let _ = self.fetch_status().await;
            self.refresh_cycle().await;
        }
    }

    /// Fetches and renders the device status.
    ///
    /// Transport failures render [`LOST_CONNECTION`] and are only logged; malformed bodies
    /// become a notification and leave the display untouched.
    pub async fn fetch_status(&self) -> Result<DeviceStatus, PanelError> {
        let ticket = self.inner.lock().await.issue_ticket();

        let reply = match self.api.get_status().await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(error = %format!("{error:#}"), "status request failed");
                self.render_text(ticket, LOST_CONNECTION.to_string()).await;
                return Err(PanelError::Transport(error));
            }
        };

        match decode_status(&reply.body) {
            Ok(status) => {
                self.render_status(ticket, &status).await;
                Ok(status)
            }
            Err(error) => {
                self.notify(error.to_string()).await;
                Err(error)
            }
        }
    }

    /// Waits for the settle delay, then animates progress from 0 to 100 and returns once it
    /// is full. The tick timer lives only for the duration of one call.
    pub async fn refresh_cycle(&self) {
        sleep(SETTLE_DELAY).await;
        self.set_progress(0).await;

        let mut ticker = interval_at(Instant::now() + PROGRESS_TICK, PROGRESS_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.advance_progress().await >= PROGRESS_MAX {
                break;
            }
        }
    }

    async fn set_progress(&self, value: u8) {
        let value = value.min(PROGRESS_MAX);
        self.inner.lock().await.progress = value;
        self.emit(PanelEvent::ProgressChanged(value));
    }

    async fn advance_progress(&self) -> u8 {
        let value = {
            let mut inner = self.inner.lock().await;
            inner.progress = inner.progress.saturating_add(PROGRESS_STEP).min(PROGRESS_MAX);
            inner.progress
        };
        self.emit(PanelEvent::ProgressChanged(value));
        value
    }

    /// Sends `command` with the given selection.
    ///
    /// Controls stay disabled while the request is in flight and are released
    /// [`CONTROLS_REENABLE_DELAY`] after it completes, whatever the outcome. Every failure is
    /// also surfaced as a notification.
    pub async fn apply_command(
        self: &Arc<Self>,
        command: RpcCommand,
        selection: Selection,
    ) -> Result<DeviceStatus, PanelError> {
        let hold = self.hold_controls().await;
        self.apply_command_held(hold, command, selection).await
    }

    /// Like [`apply_command`](Self::apply_command), but runs under a hold the caller already
    /// took, e.g. from [`try_hold_controls`](Self::try_hold_controls).
    pub async fn apply_command_held(
        self: &Arc<Self>,
        hold: ControlHold,
        command: RpcCommand,
        selection: Selection,
    ) -> Result<DeviceStatus, PanelError> {
        let ticket = self.inner.lock().await.issue_ticket();

        let request = RpcRequest {
            command,
            sequence_id: selection.sequence_id,
            speed: selection.speed,
        };
        info!(
            command = command.as_str(),
            sequence_id = request.sequence_id.0,
            speed = request.speed,
            "sending device command"
        );

        let outcome = self.dispatch(ticket, &request).await;
        if let Err(error) = &outcome {
            warn!(command = command.as_str(), %error, "device command failed");
            self.notify(error.to_string()).await;
        }

        drop(hold);
        outcome
    }

    pub async fn set_sequence(
        self: &Arc<Self>,
        selection: Selection,
    ) -> Result<DeviceStatus, PanelError> {
        self.apply_command(RpcCommand::SetSequence, selection).await
    }

    pub async fn set_default(
        self: &Arc<Self>,
        selection: Selection,
    ) -> Result<DeviceStatus, PanelError> {
        self.apply_command(RpcCommand::SetDefault, selection).await
    }

    async fn dispatch(
        &self,
        ticket: RenderTicket,
        request: &RpcRequest,
    ) -> Result<DeviceStatus, PanelError> {
        let reply = self
            .api
            .post_rpc(request)
            .await
            .map_err(PanelError::Transport)?;
        if !reply.is_success() {
            return Err(PanelError::Rejected {
                status: reply.status,
                body: reply.body,
            });
        }

        let status = decode_status(&reply.body)?;
        match request.command {
            RpcCommand::SetSequence => self.render_status(ticket, &status).await,
            RpcCommand::SetDefault => {
                let text = self.render(&status).await;
                self.notify(format!("Default Sequence set to: {text}")).await;
            }
        }
        Ok(status)
    }

    /// Disables the controls until the returned hold is dropped.
    pub async fn hold_controls(self: &Arc<Self>) -> ControlHold {
        let mut inner = self.inner.lock().await;
        self.add_hold(&mut inner)
    }

    /// Takes a hold only if no command is in flight or settling.
    pub async fn try_hold_controls(self: &Arc<Self>) -> Option<ControlHold> {
        let mut inner = self.inner.lock().await;
        if inner.control_holds > 0 {
            return None;
        }
        Some(self.add_hold(&mut inner))
    }

    fn add_hold(self: &Arc<Self>, inner: &mut PanelState) -> ControlHold {
        inner.control_holds += 1;
        if inner.control_holds == 1 {
            self.emit(PanelEvent::ControlsChanged { enabled: false });
        }
        ControlHold {
            controller: Arc::clone(self),
        }
    }

    fn schedule_controls_release(self: &Arc<Self>) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("control hold dropped outside a runtime; controls stay disabled");
            return;
        };
        let controller = Arc::clone(self);
        runtime.spawn(async move {
            sleep(CONTROLS_REENABLE_DELAY).await;
            controller.release_controls().await;
        });
    }

    async fn release_controls(&self) {
        let mut inner = self.inner.lock().await;
        inner.control_holds = inner.control_holds.saturating_sub(1);
        if inner.control_holds == 0 {
            self.emit(PanelEvent::ControlsChanged { enabled: true });
        }
    }

    async fn render_status(&self, ticket: RenderTicket, status: &DeviceStatus) {
        let text = self.render(status).await;
        self.render_text(ticket, text).await;
    }

    async fn render_text(&self, ticket: RenderTicket, text: String) {
        let applied = self.inner.lock().await.render_if_fresh(ticket, text.clone());
        if applied {
            self.emit(PanelEvent::DisplayChanged(text));
        } else {
            debug!(ticket = ticket.0, "dropping stale status render");
        }
    }

    pub async fn notify(&self, message: impl Into<String>) -> Notification {
        let (notification, evicted) = self.inner.lock().await.notifications.push(message);
        if let Some(evicted) = evicted {
            debug!(id = evicted.id.0, "evicting oldest notification");
            self.emit(PanelEvent::NotificationRemoved(evicted.id));
        }
        self.emit(PanelEvent::NotificationAdded(notification.clone()));
        notification
    }

    pub async fn dismiss_notification(&self, id: NotificationId) -> bool {
        let removed = self.inner.lock().await.notifications.dismiss(id).is_some();
        if removed {
            self.emit(PanelEvent::NotificationRemoved(id));
        }
        removed
    }
}

/// One outstanding reason for the controls to be disabled. Dropping it, whether the command
/// finished or was cancelled, re-enables the controls [`CONTROLS_REENABLE_DELAY`] later once
/// no other hold remains.
#[must_use = "controls are released when the hold is dropped"]
pub struct ControlHold {
    controller: Arc<PanelController>,
}

impl Drop for ControlHold {
    fn drop(&mut self) {
        self.controller.schedule_controls_release();
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
