// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use std::time::Duration;

use mqtt_codec::{Frame, PingRequestPacket};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

/// A cloneable handle the outbound pipeline uses to reset the ticker on
/// every frame it sends, without owning the ticker's lifetime.
#[derive(Clone)]
pub struct TickerHandle {
    reset_tx: mpsc::UnboundedSender<()>,
}

impl TickerHandle {
    /// Restart the keep-alive interval from now, without emitting.
    pub fn reset(&self) {
        // The ticker task may already have exited; a failed send just
        // means there is nothing left to reset.
        let _ = self.reset_tx.send(());
    }
}

/// Emits a PINGREQ onto `frame_tx` every `keep_alive` seconds of outbound
/// idleness. A `keep_alive` of zero disables the ticker entirely.
#[derive(Debug)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
    reset_tx: mpsc::UnboundedSender<()>,
}

impl Ticker {
    #[must_use]
    pub fn spawn(keep_alive: u16, frame_tx: mpsc::Sender<Frame>) -> Self {
        let (reset_tx, mut reset_rx) = mpsc::unbounded_channel();

        if keep_alive == 0 {
            return Self {
                handle: None,
                reset_tx,
            };
        }

        let period = Duration::from_secs(u64::from(keep_alive));
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        log::info!("ticker: keep-alive elapsed, sending PINGREQ");
                        if frame_tx.send(Frame::PingRequest(PingRequestPacket::new())).await.is_err() {
                            break;
                        }
                    }
                    reset = reset_rx.recv() => {
                        match reset {
                            Some(()) => {
                                interval = time::interval(period);
                                interval.tick().await;
                            }
                            None => break,
                        }
                    }
                }
            }
        });

        Self {
            handle: Some(handle),
            reset_tx,
        }
    }

    #[must_use]
    pub fn handle(&self) -> TickerHandle {
        TickerHandle {
            reset_tx: self.reset_tx.clone(),
        }
    }

    /// Stop the ticker permanently. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
