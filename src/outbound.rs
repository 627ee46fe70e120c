// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use std::sync::Arc;

use mqtt_codec::Frame;
use tokio::sync::mpsc;

use crate::identifier::IdentifierTable;
use crate::session::StopSignal;
use crate::ticker::TickerHandle;
use crate::transport::TransportTx;

/// Drains the frame queue onto the transport, in enqueue order. Grounded
/// on `async_client.rs`'s `start()` loop, split out into its own task the
/// way `server_context.rs` spawns one task per connection.
///
/// A transport write failure is terminal for the whole session, not just
/// this task: it sets `stop` exactly as `inbound::run` does on its own
/// termination, so `Session` can fail future `send`/`send_receive` calls
/// instead of queueing into a pipeline that will never drain again.
pub async fn run(
    mut frame_rx: mpsc::Receiver<Frame>,
    mut transport: TransportTx,
    in_flight: Arc<IdentifierTable<Frame>>,
    ticker: TickerHandle,
    stop: StopSignal,
) {
    while let Some(frame) = frame_rx.recv().await {
        if let Frame::Publish(ref publish) = frame {
            if let Some(id) = publish.packet_id() {
                in_flight.update(id, frame.clone());
            }
        }

        log::info!("outbound: sending {:?}", frame.packet_type());
        if let Err(err) = transport.send(&frame).await {
            log::error!("outbound: transport write failed: {err}");
            stop.set();
            return;
        }

        ticker.reset();
    }

    log::info!("outbound: frame queue closed, pipeline stopping");
    stop.set();
}
