//! One-shot rendezvous slots.
//!
//! A submission gets a [`ResponseSlot`]; the registry keeps the matching
//! [`Responder`]. Delivery is synchronous in both directions: the caller waits
//! in [`ResponseSlot::recv`] until a value arrives, and the worker waits in
//! [`Responder::deliver`] until the caller has actually taken it.

use crate::{Error, Result};
use parking_lot::Mutex;
use tokio::sync::oneshot;

struct Delivery<T> {
    value: T,
    taken: oneshot::Sender<()>,
}

/// Producer half of a slot. Write-once.
///
/// Shared through the registry (behind an `Arc`), so the sender lives in a
/// mutex and is taken by the first delivery.
pub struct Responder<T> {
    tx: Mutex<Option<oneshot::Sender<Delivery<T>>>>,
}

/// Consumer half of a slot. Read-once.
pub struct ResponseSlot<T> {
    rx: oneshot::Receiver<Delivery<T>>,
}

impl<T> ResponseSlot<T> {
    /// Creates a connected producer/consumer pair.
    pub fn channel() -> (Responder<T>, ResponseSlot<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Responder {
                tx: Mutex::new(Some(tx)),
            },
            ResponseSlot { rx },
        )
    }

    /// Waits for the single value and releases the worker that delivered it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Abandoned`] if the [`Responder`] was dropped without
    /// delivering, e.g. its registry entry was overwritten by a key collision
    /// or the dispatcher shut down.
    pub async fn recv(self) -> Result<T> {
        let Delivery { value, taken } = self.rx.await.map_err(|_| Error::Abandoned)?;
        // The worker may have been cancelled mid hand-off; the value is ours
        // either way.
        let _ = taken.send(());
        Ok(value)
    }
}

impl<T> Responder<T> {
    /// Hands `value` to the caller and waits until it has been received.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyDelivered`] if this slot was already used.
    /// - [`Error::SlotClosed`] if the caller dropped its [`ResponseSlot`]
    ///   before taking the value.
    pub async fn deliver(&self, value: T) -> Result<()> {
        let tx = self.tx.lock().take().ok_or(Error::AlreadyDelivered)?;
        let (taken_tx, taken_rx) = oneshot::channel();

        tx.send(Delivery {
            value,
            taken: taken_tx,
        })
        .map_err(|_| Error::SlotClosed)?;

        taken_rx.await.map_err(|_| Error::SlotClosed)
    }

    /// Whether a delivery has been attempted on this slot.
    pub fn is_delivered(&self) -> bool {
        self.tx.lock().is_none()
    }

    /// Whether the caller has dropped its [`ResponseSlot`].
    pub fn is_closed(&self) -> bool {
        self.tx.lock().as_ref().is_none_or(|tx| tx.is_closed())
    }
}

impl<T> core::fmt::Debug for Responder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Responder")
            .field("delivered", &self.is_delivered())
            .finish()
    }
}

impl<T> core::fmt::Debug for ResponseSlot<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResponseSlot").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    #[tokio::test]
    async fn delivers_exactly_once() {
        let (responder, slot) = ResponseSlot::channel();
        let responder = Arc::new(responder);

        let worker = {
            let responder = Arc::clone(&responder);
            tokio::spawn(async move { responder.deliver("0".to_string()).await })
        };

        assert_eq!(slot.recv().await.unwrap(), "0");
        worker.await.unwrap().unwrap();

        assert!(responder.is_delivered());
        assert_eq!(
            responder.deliver("1".to_string()).await,
            Err(Error::AlreadyDelivered)
        );
    }

    #[tokio::test]
    async fn delivery_waits_for_the_caller() {
        let (responder, slot) = ResponseSlot::<u32>::channel();
        let done = Arc::new(AtomicBool::new(false));

        let worker = {
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                let res = responder.deliver(7).await;
                done.store(true, Ordering::SeqCst);
                res
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!done.load(Ordering::SeqCst), "deliver returned before recv");

        assert_eq!(slot.recv().await.unwrap(), 7);
        worker.await.unwrap().unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn dropped_slot_fails_delivery() {
        let (responder, slot) = ResponseSlot::<u32>::channel();
        drop(slot);

        assert!(responder.is_closed());
        assert_eq!(responder.deliver(1).await, Err(Error::SlotClosed));
    }

    #[tokio::test]
    async fn dropped_responder_abandons_slot() {
        let (responder, slot) = ResponseSlot::<u32>::channel();
        drop(responder);

        assert_eq!(slot.recv().await, Err(Error::Abandoned));
    }
}
