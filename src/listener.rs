// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::io;

use tokio::sync::mpsc::{error::TrySendError, Sender};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cancel::CancelHandle;
use crate::keys::RawKeyEvent;

pub mod terminal;

/// A source of raw key presses.
///
/// Drivers run on a blocking thread and push events into `keys_tx` until `cancel` is
/// cancelled or the receiver goes away. A driver must never block on the receiver.
pub trait Driver: Send + Sync + 'static {
    fn monitor_keys(
        &self,
        keys_tx: Sender<RawKeyEvent>,
        cancel: CancelHandle,
    ) -> JoinHandle<Result<(), io::Error>>;
}

/// Whether a driver should keep delivering events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Hands an event to the dispatcher without waiting. When the queue is full the event is
/// dropped. Returns [Flow::Stop] once the dispatcher has gone away.
pub fn forward(keys_tx: &Sender<RawKeyEvent>, event: RawKeyEvent) -> Flow {
    match keys_tx.try_send(event) {
        Ok(()) => Flow::Continue,
        Err(TrySendError::Full(event)) => {
            debug!(event = ?event, "Key queue full, dropping event");
            Flow::Continue
        }
        Err(TrySendError::Closed(_)) => Flow::Stop,
    }
}

#[cfg(test)]
mod test {
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn test_forward_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(2);
        assert_eq!(forward(&tx, RawKeyEvent::Char('a')), Flow::Continue);
        assert_eq!(forward(&tx, RawKeyEvent::Char('b')), Flow::Continue);
        assert_eq!(forward(&tx, RawKeyEvent::Char('c')), Flow::Continue);

        assert_eq!(rx.try_recv().unwrap(), RawKeyEvent::Char('a'));
        assert_eq!(rx.try_recv().unwrap(), RawKeyEvent::Char('b'));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_forward_stops_when_closed() {
        let (tx, rx) = mpsc::channel(2);
        drop(rx);
        assert_eq!(forward(&tx, RawKeyEvent::Char('a')), Flow::Stop);
    }
}
