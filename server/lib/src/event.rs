//! The parsed rename request and the cancellation token that rides with it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::controls::Control;
use crate::dn::{Dn, Rdn};
use crate::identity::Identity;

/// Cooperative cancellation state, shared between the worker running the
/// operation, the front end that may request cancellation, and the backend
/// which may observe it mid-commit. Requesting is one-way - the flag is
/// never cleared.
#[derive(Debug, Default)]
pub struct CancelToken {
    requested: AtomicBool,
    message: Mutex<Option<String>>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn request_cancel(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn request_cancel_with_message(&self, message: &str) {
        let mut guard = self
            .message
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        *guard = Some(message.to_string());
        drop(guard);
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    pub fn message(&self) -> Option<String> {
        self.message
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

/// A Modify-DN request after front end decoding. `new_rdn` of `None` (or a
/// raw new-superior that failed to decode) marks a request the front end
/// could not fully parse; the core records the failure and does not run
/// post-operation plugins for it.
#[derive(Debug, Clone)]
pub struct ModifyDnEvent {
    pub ident: Identity,
    pub entry_dn: Dn,
    pub new_rdn: Option<Rdn>,
    pub new_superior: Option<Dn>,
    pub raw_new_superior_present: bool,
    pub delete_old_rdn: bool,
    pub request_controls: Vec<Control>,
}

impl ModifyDnEvent {
    pub fn new(ident: Identity, entry_dn: Dn, new_rdn: Rdn, delete_old_rdn: bool) -> Self {
        ModifyDnEvent {
            ident,
            entry_dn,
            new_rdn: Some(new_rdn),
            new_superior: None,
            raw_new_superior_present: false,
            delete_old_rdn,
            request_controls: Vec::new(),
        }
    }

    pub fn new_internal(entry_dn: Dn, new_rdn: Rdn, delete_old_rdn: bool) -> Self {
        ModifyDnEvent::new(Identity::internal(), entry_dn, new_rdn, delete_old_rdn)
    }

    pub fn with_new_superior(mut self, new_superior: Dn) -> Self {
        self.new_superior = Some(new_superior);
        self.raw_new_superior_present = true;
        self
    }

    pub fn with_controls(mut self, controls: Vec<Control>) -> Self {
        self.request_controls = controls;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_latches() {
        let t = CancelToken::new();
        assert!(!t.is_requested());
        assert!(t.message().is_none());
        t.request_cancel_with_message("client asked politely");
        assert!(t.is_requested());
        assert_eq!(t.message().as_deref(), Some("client asked politely"));
    }
}
