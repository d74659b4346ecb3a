//! # Checkout Session
//!
//! The one cart this terminal is ringing up, plus what it needs to remember
//! between requests.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   POST /api/sales/{id}/continue ──► ResumeSlot.stash(payload)           │
//! │                                              │                          │
//! │   POST /api/cart/resume ◄────────────────────┘ take() (slot emptied)   │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   session.cart seeded, session.resumed = Some(sale)                     │
//! │          │                                                              │
//! │   POST /api/checkout                                                   │
//! │          ├── resumed? ──► update that sale in place                    │
//! │          └── otherwise ─► insert a new sale                            │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   cart cleared, resumed = None, last_sale = Some(detail)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Poisoned locks are recovered with `PoisonError::into_inner`.

use std::sync::{Arc, Mutex, PoisonError};

use minimarket_core::{Cart, ContinueSalePayload, ResumedSale, SaleDetail};

#[derive(Debug, Default)]
pub struct CheckoutSession {
    pub cart: Cart,
    /// Set while the cart is a continued sale.
    pub resumed: Option<ResumedSale>,
    /// Receipt of the most recent checkout, for reprint and repeat.
    pub last_sale: Option<SaleDetail>,
}

impl CheckoutSession {
    /// Empties the cart and forgets any resumed sale.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.resumed = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<CheckoutSession>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with read access to the session.
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CheckoutSession) -> R,
    {
        let session = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    /// Runs `f` with write access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// state.session.with_session_mut(|s| s.cart.add_item(&product))?;
    /// ```
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CheckoutSession) -> R,
    {
        let mut session = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }
}

/// Single-slot handoff between "continue this sale" and the cart.
#[derive(Debug, Clone, Default)]
pub struct ResumeSlot {
    inner: Arc<Mutex<Option<ContinueSalePayload>>>,
}

impl ResumeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a payload, replacing any previous one.
    pub fn stash(&self, payload: ContinueSalePayload) {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(payload);
    }

    /// Takes the payload out; a second call returns `None`.
    pub fn take(&self) -> Option<ContinueSalePayload> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Takes the payload only if it was stashed for `sale_id`.
    pub fn take_if(&self, sale_id: &str) -> Option<ContinueSalePayload> {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|p| p.sale_id == sale_id) {
            slot.take()
        } else {
            None
        }
    }

    pub fn peek_sale_id(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.sale_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimarket_core::PaymentMethod;

    fn payload(sale_id: &str) -> ContinueSalePayload {
        ContinueSalePayload {
            sale_id: sale_id.to_string(),
            lines: vec![],
            payment_method: PaymentMethod::Cash,
        }
    }

    #[test]
    fn test_slot_is_consumed_once() {
        let slot = ResumeSlot::new();
        slot.stash(payload("s-1"));

        assert_eq!(slot.peek_sale_id().as_deref(), Some("s-1"));
        assert_eq!(slot.take().map(|p| p.sale_id).as_deref(), Some("s-1"));
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_stash_replaces() {
        let slot = ResumeSlot::new();
        slot.stash(payload("s-1"));
        slot.stash(payload("s-2"));

        assert_eq!(slot.take().map(|p| p.sale_id).as_deref(), Some("s-2"));
    }

    #[test]
    fn test_take_if_only_matches_its_sale() {
        let slot = ResumeSlot::new();
        slot.stash(payload("s-2"));

        assert!(slot.take_if("s-1").is_none());
        assert_eq!(slot.peek_sale_id().as_deref(), Some("s-2"));

        assert_eq!(slot.take_if("s-2").map(|p| p.sale_id).as_deref(), Some("s-2"));
        assert!(slot.peek_sale_id().is_none());
        assert!(slot.take_if("s-2").is_none());
    }

    #[test]
    fn test_reset_forgets_resumed_sale() {
        let state = SessionState::new();
        state.with_session_mut(|s| {
            s.resumed = Some(ResumedSale {
                sale_id: "s-1".to_string(),
                payment_method: PaymentMethod::Card,
            });
            s.reset();
        });

        assert!(state.with_session(|s| s.resumed.is_none() && s.cart.is_empty()));
    }
}
