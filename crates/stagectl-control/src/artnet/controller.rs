use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use stagectl_core::DmxCommand;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::packet::PortAddress;
use super::state::DmxState;
use super::{ArtNetConfig, DmxSender, LightingController, UdpArtNetSender};
use crate::error::{ControlError, Result};

/// Coalescing Art-Net controller
pub struct ArtNetController<S: DmxSender = UdpArtNetSender> {
    sender: Arc<S>,
    state: Arc<Mutex<DmxState>>,
    config: ArtNetConfig,
    /// Armed by set calls, `None` once stopped
    signal: Mutex<Option<mpsc::Sender<()>>>,
    /// Taken by `start`
    pending: Mutex<Option<mpsc::Receiver<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ArtNetController<UdpArtNetSender> {
    /// Open an Art-Net socket on the configured or discovered interface
    pub fn connect(config: ArtNetConfig) -> Result<Self> {
        let sender = UdpArtNetSender::new(&config)?;
        Ok(Self::with_sender(Arc::new(sender), config))
    }
}

impl<S: DmxSender> ArtNetController<S> {
    pub fn with_sender(sender: Arc<S>, config: ArtNetConfig) -> Self {
        // capacity 1: a pending signal already covers every later update
        let (tx, rx) = mpsc::channel(1);
        Self {
            sender,
            state: Arc::new(Mutex::new(DmxState::new())),
            config,
            signal: Mutex::new(Some(tx)),
            pending: Mutex::new(Some(rx)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn sender(&self) -> &Arc<S> {
        &self.sender
    }

    /// Current value of a channel
    pub fn channel(&self, universe: u16, channel: u16) -> Option<u8> {
        self.state.lock().get(universe, channel)
    }

    fn trigger_send(&self) {
        let signal = self.signal.lock();
        let Some(tx) = signal.as_ref() else {
            return;
        };
        match tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => debug!("Art-Net send loop is gone"),
        }
    }
}

impl<S: DmxSender> LightingController for ArtNetController<S> {
    fn start(&self) -> Result<()> {
        let handle = Handle::try_current()
            .map_err(|e| ControlError::DmxError(format!("no async runtime: {}", e)))?;

        let Some(receiver) = self.pending.lock().take() else {
            if self.signal.lock().is_some() {
                debug!("Art-Net controller already running");
                return Ok(());
            }
            return Err(ControlError::DmxError(
                "controller has been stopped".to_string(),
            ));
        };

        let mut tasks = self.tasks.lock();
        tasks.push(handle.spawn(send_loop(
            self.sender.clone(),
            self.state.clone(),
            receiver,
        )));
        tasks.push(handle.spawn(diagnostics_loop(
            self.sender.clone(),
            Duration::from_secs(self.config.diagnostics_interval_secs.max(1)),
        )));
        if self.config.discovery {
            tasks.push(handle.spawn(discovery_loop(
                self.sender.clone(),
                Duration::from_secs(self.config.poll_interval_secs.max(1)),
            )));
        }

        info!("Art-Net controller started");
        Ok(())
    }

    fn stop(&self) {
        // dropping the signal lets the send loop drain, close the sender and exit
        let was_running = self.signal.lock().take().is_some();
        if self.pending.lock().take().is_some() {
            // never started, there is no send loop to close it
            self.sender.close();
        }

        let mut tasks = self.tasks.lock();
        // the send loop is first and finishes on its own
        for task in tasks.drain(..).skip(1) {
            task.abort();
        }

        if was_running {
            info!("Art-Net controller stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.pending.lock().is_none() && self.signal.lock().is_some()
    }

    fn set_channel(&self, value: DmxCommand) {
        self.set_channels(std::slice::from_ref(&value));
    }

    fn set_channels(&self, values: &[DmxCommand]) {
        if values.is_empty() {
            return;
        }
        let mut accepted = false;
        {
            let mut state = self.state.lock();
            for value in values {
                if state.set(value.universe, value.channel, value.value) {
                    accepted = true;
                } else {
                    warn!(
                        "Ignoring DMX channel {} of universe {}: out of range",
                        value.channel, value.universe
                    );
                }
            }
        }
        if accepted {
            self.trigger_send();
        }
    }
}

impl<S: DmxSender> Drop for ArtNetController<S> {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

async fn send_loop<S: DmxSender>(
    sender: Arc<S>,
    state: Arc<Mutex<DmxState>>,
    mut signal: mpsc::Receiver<()>,
) {
    while signal.recv().await.is_some() {
        let snapshot = state.lock().snapshot();
        debug!("Sending DMX values for {} universes", snapshot.len());

        let mut sends = JoinSet::new();
        for (universe, data) in snapshot {
            let sender = sender.clone();
            sends.spawn_blocking(move || {
                let result = sender.send_dmx(PortAddress::from_universe(universe), &data);
                (universe, result)
            });
        }

        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((universe, Err(e))) => {
                    warn!("Failed to send DMX for universe {}: {}", universe, e)
                }
                Err(e) => warn!("DMX send task failed: {}", e),
            }
        }
    }
    sender.close();
    debug!("Art-Net send loop finished");
}

async fn diagnostics_loop<S: DmxSender>(sender: Arc<S>, period: Duration) {
    // first report after one full period
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let nodes = sender.nodes();
        let names: Vec<String> = nodes.iter().map(ToString::to_string).collect();
        debug!(
            "Currently {} Art-Net nodes are registered: {:?}",
            nodes.len(),
            names
        );
    }
}

async fn discovery_loop<S: DmxSender>(sender: Arc<S>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let sender = sender.clone();
        match tokio::task::spawn_blocking(move || sender.discover()).await {
            Ok(Ok(0)) => {}
            Ok(Ok(found)) => debug!("Art-Net poll found {} new nodes", found),
            Ok(Err(e)) => warn!("Art-Net poll failed: {}", e),
            Err(e) => warn!("Art-Net poll task failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSender {
        sends: Mutex<Vec<(PortAddress, u8)>>,
        closed: Mutex<usize>,
    }

    impl DmxSender for CountingSender {
        fn send_dmx(&self, port: PortAddress, data: &[u8; 512]) -> Result<()> {
            self.sends.lock().push((port, data[0]));
            Ok(())
        }

        fn close(&self) {
            *self.closed.lock() += 1;
        }
    }

    #[test]
    fn test_start_requires_runtime() {
        let controller =
            ArtNetController::with_sender(Arc::new(CountingSender::default()), ArtNetConfig::default());
        assert!(controller.start().is_err());
        // still startable later
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_stopped_controller_cannot_restart() {
        let controller =
            ArtNetController::with_sender(Arc::new(CountingSender::default()), ArtNetConfig::default());
        controller.start().unwrap();
        assert!(controller.is_running());
        controller.start().unwrap();

        controller.stop();
        assert!(!controller.is_running());
        assert!(controller.start().is_err());
    }

    #[test]
    fn test_stop_before_start_closes_sender() {
        let sender = Arc::new(CountingSender::default());
        let controller = ArtNetController::with_sender(sender.clone(), ArtNetConfig::default());

        controller.stop();
        controller.stop();
        assert_eq!(*sender.closed.lock(), 1);
    }
}
