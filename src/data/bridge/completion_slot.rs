use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::InAppPurchaseError;

/// Single-slot bridge between a backend callback and an awaiting caller.
///
/// Both backends report completion through a callback registered once at
/// connection time, with no per-call correlation id, so the next callback
/// invocation must be routed to the currently pending caller. Each slot
/// holds at most one outstanding operation of its kind: `begin` stores a
/// fresh oneshot sender and hands the receiver to the caller, and the
/// backend callback resolves it exactly once through `complete` or `fail`.
///
/// Resolving an already-resolved or absent slot is a no-op — backends may
/// invoke completion callbacks more than once, or after the caller stopped
/// waiting.
pub(crate) struct CompletionSlot<T> {
    kind: &'static str,
    sender: Mutex<Option<oneshot::Sender<Result<T, InAppPurchaseError>>>>,
}

impl<T> CompletionSlot<T> {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            sender: Mutex::new(None),
        }
    }

    /// Occupies the slot and returns the receiver the caller awaits. Fails
    /// with `DeveloperError` if an operation of this kind is still
    /// outstanding.
    pub(crate) fn begin(
        &self,
    ) -> Result<oneshot::Receiver<Result<T, InAppPurchaseError>>, InAppPurchaseError> {
        let mut slot = self.sender.lock().unwrap();
        if slot.is_some() {
            return Err(InAppPurchaseError::developer(format!(
                "Another {} operation is in progress",
                self.kind
            )));
        }
        let (tx, rx) = oneshot::channel();
        *slot = Some(tx);
        Ok(rx)
    }

    /// Resolves the pending operation, clearing the slot.
    pub(crate) fn complete(&self, value: T) {
        match self.sender.lock().unwrap().take() {
            Some(tx) => {
                // The caller may have dropped the receiver; nothing to do.
                let _ = tx.send(Ok(value));
            }
            None => debug!(kind = self.kind, "completion for empty slot ignored"),
        }
    }

    /// Rejects the pending operation, clearing the slot.
    pub(crate) fn fail(&self, error: InAppPurchaseError) {
        match self.sender.lock().unwrap().take() {
            Some(tx) => {
                let _ = tx.send(Err(error));
            }
            None => debug!(kind = self.kind, %error, "failure for empty slot ignored"),
        }
    }

    /// Clears the slot without a value. The awaiting receiver observes a
    /// recv error and maps it to a session-level error.
    pub(crate) fn cancel(&self) {
        if self.sender.lock().unwrap().take().is_some() {
            debug!(kind = self.kind, "pending operation cancelled");
        }
    }

    /// Whether an operation of this kind is still outstanding.
    pub(crate) fn is_pending(&self) -> bool {
        self.sender.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PurchaseError;

    #[tokio::test]
    async fn begin_then_complete_resolves_receiver() {
        let slot = CompletionSlot::new("purchase");
        let rx = slot.begin().unwrap();
        slot.complete(7u32);
        assert_eq!(rx.await.unwrap().unwrap(), 7);
        assert!(!slot.is_pending());
    }

    #[tokio::test]
    async fn begin_then_fail_rejects_receiver() {
        let slot: CompletionSlot<u32> = CompletionSlot::new("purchase");
        let rx = slot.begin().unwrap();
        slot.fail(InAppPurchaseError::new(
            PurchaseError::AlreadyOwned,
            "Item already owned",
        ));
        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.error, PurchaseError::AlreadyOwned);
    }

    #[test]
    fn second_begin_is_rejected_while_pending() {
        let slot: CompletionSlot<u32> = CompletionSlot::new("purchase");
        let _rx = slot.begin().unwrap();
        let err = slot.begin().unwrap_err();
        assert_eq!(err.error, PurchaseError::DeveloperError);
    }

    #[tokio::test]
    async fn slot_is_reusable_after_completion() {
        let slot = CompletionSlot::new("purchase");
        let rx = slot.begin().unwrap();
        slot.complete(1u32);
        rx.await.unwrap().unwrap();

        let rx = slot.begin().unwrap();
        slot.complete(2u32);
        assert_eq!(rx.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn complete_and_fail_are_idempotent() {
        let slot = CompletionSlot::new("purchase");

        // Never created: no-op.
        slot.complete(1u32);
        slot.fail(InAppPurchaseError::unknown("late callback"));

        // Already resolved: second resolution is ignored.
        let rx = slot.begin().unwrap();
        slot.complete(2u32);
        slot.complete(3u32);
        slot.fail(InAppPurchaseError::unknown("duplicate callback"));
        assert_eq!(rx.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn cancel_clears_slot_and_wakes_receiver() {
        let slot: CompletionSlot<u32> = CompletionSlot::new("connection");
        let rx = slot.begin().unwrap();
        slot.cancel();
        assert!(rx.await.is_err());
        assert!(!slot.is_pending());

        // A new operation may begin after cancellation.
        assert!(slot.begin().is_ok());
    }

    #[test]
    fn complete_with_dropped_receiver_is_a_no_op() {
        let slot = CompletionSlot::new("purchase");
        let rx = slot.begin().unwrap();
        drop(rx);
        slot.complete(9u32);
        assert!(!slot.is_pending());
    }
}
