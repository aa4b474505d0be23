//! Art-Net controller behaviour against a recording sender

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use stagectl_control::artnet::PortAddress;
use stagectl_control::{ArtNetConfig, ArtNetController, DmxSender, LightingController};
use stagectl_core::{DmxCommand, DMX_CHANNELS};

#[derive(Default)]
struct RecordingSender {
    sends: Mutex<Vec<(PortAddress, [u8; DMX_CHANNELS])>>,
    /// Sends seen when `close` was called, one entry per call
    closed_after: Mutex<Vec<usize>>,
}

impl RecordingSender {
    fn sends(&self) -> Vec<(PortAddress, [u8; DMX_CHANNELS])> {
        self.sends.lock().clone()
    }
}

impl DmxSender for RecordingSender {
    fn send_dmx(
        &self,
        port: PortAddress,
        data: &[u8; DMX_CHANNELS],
    ) -> stagectl_control::Result<()> {
        self.sends.lock().push((port, *data));
        Ok(())
    }

    fn close(&self) {
        let sent = self.sends.lock().len();
        self.closed_after.lock().push(sent);
    }
}

fn config() -> ArtNetConfig {
    ArtNetConfig {
        discovery: false,
        ..Default::default()
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_updates_before_start_collapse_into_one_send() {
    let sender = Arc::new(RecordingSender::default());
    let controller = ArtNetController::with_sender(sender.clone(), config());

    for value in 0..100u8 {
        controller.set_channel(DmxCommand::new(0, 7, value));
    }
    assert!(sender.sends().is_empty());

    controller.start().unwrap();
    settle().await;

    let sends = sender.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].0, PortAddress::from_universe(0));
    assert_eq!(sends[0].1[7], 99);
    assert_eq!(controller.channel(0, 7), Some(99));

    controller.stop();
}

#[tokio::test]
async fn test_every_universe_is_sent() {
    let sender = Arc::new(RecordingSender::default());
    let controller = ArtNetController::with_sender(sender.clone(), config());
    controller.start().unwrap();

    controller.set_channels(&[
        DmxCommand::new(0, 0, 10),
        DmxCommand::new(1, 511, 20),
        DmxCommand::new(0x0105, 3, 30),
    ]);
    settle().await;

    let mut sends = sender.sends();
    sends.sort_by_key(|(port, _)| *port);
    assert_eq!(sends.len(), 3);

    assert_eq!(sends[0].0.to_universe(), 0);
    assert_eq!(sends[0].1[0], 10);
    assert_eq!(sends[1].0.to_universe(), 1);
    assert_eq!(sends[1].1[511], 20);
    assert_eq!(sends[2].0, PortAddress { net: 0x01, sub_uni: 0x05 });
    assert_eq!(sends[2].1[3], 30);

    controller.stop();
}

#[tokio::test]
async fn test_later_sends_carry_full_state() {
    let sender = Arc::new(RecordingSender::default());
    let controller = ArtNetController::with_sender(sender.clone(), config());
    controller.start().unwrap();

    controller.set_channel(DmxCommand::new(2, 1, 50));
    settle().await;
    controller.set_channel(DmxCommand::new(2, 2, 60));
    settle().await;

    let sends = sender.sends();
    assert_eq!(sends.len(), 2);
    let last = &sends[1].1;
    assert_eq!((last[1], last[2]), (50, 60));

    controller.stop();
}

#[tokio::test]
async fn test_out_of_range_channel_is_ignored() {
    let sender = Arc::new(RecordingSender::default());
    let controller = ArtNetController::with_sender(sender.clone(), config());
    controller.start().unwrap();

    controller.set_channel(DmxCommand::new(0, 512, 1));
    settle().await;

    assert_eq!(controller.channel(0, 512), None);
    assert_eq!(controller.channel(0, 0), None);
    assert!(sender.sends().is_empty());

    controller.stop();
}

#[tokio::test]
async fn test_no_sends_after_stop() {
    let sender = Arc::new(RecordingSender::default());
    let controller = ArtNetController::with_sender(sender.clone(), config());
    controller.start().unwrap();

    controller.set_channel(DmxCommand::new(0, 1, 1));
    settle().await;
    let before = sender.sends().len();

    controller.stop();
    controller.set_channel(DmxCommand::new(0, 1, 2));
    settle().await;

    assert_eq!(sender.sends().len(), before);
    assert!(!controller.is_running());
}

#[tokio::test]
async fn test_stop_flushes_queued_update_then_closes_sender() {
    let sender = Arc::new(RecordingSender::default());
    let controller = ArtNetController::with_sender(sender.clone(), config());

    // signalled before start, still pending when stop is called
    controller.set_channel(DmxCommand::new(0, 5, 42));
    controller.start().unwrap();
    controller.stop();
    settle().await;

    let sends = sender.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].1[5], 42);
    assert_eq!(*sender.closed_after.lock(), vec![1]);
}
