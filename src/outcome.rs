// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use mqtt_codec::QoS;

/// The per-exchange result a `send_receive` caller is resumed with.
///
/// Named `Outcome` rather than `Result` to avoid clashing with
/// `std::result::Result`; cancellation is represented separately as
/// `Err(Error { kind: ErrorKind::Cancelled, .. })`, not as a variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// PUBACK, PUBCOMP or UNSUBACK: acknowledgement with no payload.
    Empty,

    /// SUBACK: one granted (or refused) QoS per requested topic filter,
    /// in request order.
    QoS(Vec<QoS>),
}
