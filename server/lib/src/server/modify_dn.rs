//! The Modify-DN write path: move an entry to a new name within one local
//! backend. One call to [`DirectoryServer::process_modify_dn`] runs the
//! whole pipeline - DN resolution, the two-DN write lock, conflict
//! resolution, the request control pipeline, the access decision, the RDN
//! rewrite with its schema gates, plugin hooks, the writability gates and
//! the backend commit - and always leaves the response state
//! (result code, message, matched DN, response controls) on the operation.
//!
//! Control flow uses an explicit [`OperationOutcome`] tag instead of
//! exceptions: every phase either continues, aborts to the cleanup block
//! with the result already recorded, or ends the operation outright for
//! cancellation and terminated connections.

use std::sync::Arc;
use std::time::Duration;

use crate::be::Backend;
use crate::controls::{self, Control, ReadEntryRequestControl, ReadEntryResponseControl};
use crate::dn::{Dn, Rdn};
use crate::entry::{Attribute, Entry};
use crate::error::{DirectoryError, RenameEntryError};
use crate::event::{CancelToken, ModifyDnEvent};
use crate::identity::Identity;
use crate::locking::DnLockPair;
use crate::modify::{Modification, ModificationType, ModifyList};
use crate::plugins::{PluginDirective, Plugins};
use crate::prelude::*;
use crate::server::DirectoryServer;
use crate::utils::duration_from_epoch_now;

/// Where the state machine goes after a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationOutcome {
    /// The phase completed; keep going.
    Continue,
    /// The result is recorded; skip to cleanup, then the post phases.
    Abort,
    /// Cancellation was observed at a checkpoint; cleanup and stop.
    Cancelled,
    /// A plugin reported the client connection gone; cleanup and stop.
    ConnectionTerminated,
}

/// Per-request state of one Modify-DN operation: the parsed request plus
/// everything the pipeline accumulates on the way to a response.
pub struct ModifyDnOperation {
    op_id: Uuid,
    ident: Identity,
    entry_dn: Dn,
    new_rdn: Option<Rdn>,
    new_superior: Option<Dn>,
    raw_new_superior_present: bool,
    delete_old_rdn: bool,
    request_controls: Vec<Control>,

    current_entry: Option<Entry>,
    new_entry: Option<Entry>,
    modifications: ModifyList,
    result_code: Option<ResultCode>,
    error_message: String,
    matched_dn: Option<Dn>,
    response_controls: Vec<ResponseControl>,
    cancel: Arc<CancelToken>,
    cancel_result: Option<CancelResult>,
    proxied_authorization_dn: Option<Dn>,
    authorization_entry: Option<Entry>,
    noop: bool,
    skip_post_operation: bool,
    pre_read_request: Option<ReadEntryRequestControl>,
    post_read_request: Option<ReadEntryRequestControl>,
    processing_stop_time: Option<Duration>,
}

impl ModifyDnOperation {
    pub fn from_event(event: ModifyDnEvent) -> Self {
        ModifyDnOperation {
            op_id: Uuid::new_v4(),
            ident: event.ident,
            entry_dn: event.entry_dn,
            new_rdn: event.new_rdn,
            new_superior: event.new_superior,
            raw_new_superior_present: event.raw_new_superior_present,
            delete_old_rdn: event.delete_old_rdn,
            request_controls: event.request_controls,
            current_entry: None,
            new_entry: None,
            modifications: ModifyList::new(),
            result_code: None,
            error_message: String::new(),
            matched_dn: None,
            response_controls: Vec::new(),
            cancel: Arc::new(CancelToken::new()),
            cancel_result: None,
            proxied_authorization_dn: None,
            authorization_entry: None,
            noop: false,
            skip_post_operation: false,
            pre_read_request: None,
            post_read_request: None,
            processing_stop_time: None,
        }
    }

    pub fn op_id(&self) -> Uuid {
        self.op_id
    }

    pub fn ident(&self) -> &Identity {
        &self.ident
    }

    pub fn entry_dn(&self) -> &Dn {
        &self.entry_dn
    }

    pub fn new_rdn(&self) -> Option<&Rdn> {
        self.new_rdn.as_ref()
    }

    pub fn new_superior(&self) -> Option<&Dn> {
        self.new_superior.as_ref()
    }

    pub fn raw_new_superior_present(&self) -> bool {
        self.raw_new_superior_present
    }

    pub fn delete_old_rdn(&self) -> bool {
        self.delete_old_rdn
    }

    /// The request controls, with decoded forms substituted in place so
    /// later extension points observe typed objects.
    pub fn request_controls(&self) -> &[Control] {
        &self.request_controls
    }

    pub(crate) fn request_controls_mut(&mut self) -> &mut Vec<Control> {
        &mut self.request_controls
    }

    /// The entry before the rename. Not available until the fetch phase has
    /// run.
    pub fn current_entry(&self) -> Option<&Entry> {
        self.current_entry.as_ref()
    }

    pub(crate) fn set_current_entry(&mut self, e: Entry) {
        self.current_entry = Some(e);
    }

    /// The entry as it will appear after the rename. Not available until the
    /// candidate construction phase has run.
    pub fn new_entry(&self) -> Option<&Entry> {
        self.new_entry.as_ref()
    }

    pub(crate) fn set_new_entry(&mut self, e: Entry) {
        self.new_entry = Some(e);
    }

    /// The net attribute modifications implied so far, in application order.
    pub fn modifications(&self) -> &ModifyList {
        &self.modifications
    }

    /// Append a modification. Pre-operation plugins use this; anything they
    /// add is applied to the candidate entry and re-gated through schema.
    pub fn add_modification(&mut self, m: Modification) {
        self.modifications.push(m)
    }

    pub(crate) fn candidate_and_mods_mut(&mut self) -> (Option<&mut Entry>, &mut ModifyList) {
        (self.new_entry.as_mut(), &mut self.modifications)
    }

    pub fn result_code(&self) -> Option<ResultCode> {
        self.result_code
    }

    pub fn set_result_code(&mut self, rc: ResultCode) {
        self.result_code = Some(rc);
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn append_error_message(&mut self, message: &str) {
        if message.is_empty() {
            return;
        }
        if !self.error_message.is_empty() {
            self.error_message.push_str("; ");
        }
        self.error_message.push_str(message);
    }

    pub fn matched_dn(&self) -> Option<&Dn> {
        self.matched_dn.as_ref()
    }

    pub(crate) fn set_matched_dn(&mut self, dn: Dn) {
        self.matched_dn = Some(dn);
    }

    pub fn response_controls(&self) -> &[ResponseControl] {
        &self.response_controls
    }

    pub(crate) fn add_response_control(&mut self, c: ResponseControl) {
        self.response_controls.push(c)
    }

    /// The shared cancellation token. A front end clones this to request
    /// cancellation while the operation runs on its worker.
    pub fn cancel_token(&self) -> Arc<CancelToken> {
        self.cancel.clone()
    }

    pub(crate) fn cancel_token_ref(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn cancel_result(&self) -> Option<CancelResult> {
        self.cancel_result
    }

    pub(crate) fn set_cancel_result(&mut self, r: CancelResult) {
        self.cancel_result = Some(r);
    }

    pub fn proxied_authorization_dn(&self) -> Option<&Dn> {
        self.proxied_authorization_dn.as_ref()
    }

    pub(crate) fn set_proxied_authorization_dn(&mut self, dn: Dn) {
        self.proxied_authorization_dn = Some(dn);
    }

    pub fn authorization_entry(&self) -> Option<&Entry> {
        self.authorization_entry.as_ref()
    }

    pub(crate) fn set_authorization_entry(&mut self, e: Option<Entry>) {
        self.authorization_entry = e;
    }

    pub fn is_noop(&self) -> bool {
        self.noop
    }

    pub(crate) fn set_noop(&mut self, noop: bool) {
        self.noop = noop;
    }

    pub fn skip_post_operation(&self) -> bool {
        self.skip_post_operation
    }

    pub(crate) fn set_skip_post_operation(&mut self, skip: bool) {
        self.skip_post_operation = skip;
    }

    pub(crate) fn set_pre_read_request(&mut self, r: ReadEntryRequestControl) {
        self.pre_read_request = Some(r);
    }

    pub(crate) fn pre_read_request(&self) -> Option<&ReadEntryRequestControl> {
        self.pre_read_request.as_ref()
    }

    pub(crate) fn set_post_read_request(&mut self, r: ReadEntryRequestControl) {
        self.post_read_request = Some(r);
    }

    pub(crate) fn post_read_request(&self) -> Option<&ReadEntryRequestControl> {
        self.post_read_request.as_ref()
    }

    pub fn processing_stop_time(&self) -> Option<Duration> {
        self.processing_stop_time
    }

    /// Copy the response fields of an error onto this operation.
    pub fn set_response_data(&mut self, error: &DirectoryError) {
        self.result_code = Some(error.result_code);
        let message = error.message.clone();
        self.append_error_message(&message);
        if let Some(matched) = &error.matched_dn {
            self.matched_dn = Some(matched.clone());
        }
    }

    /// Record an observed cancellation. Once the cancel result has latched
    /// to `TooLate` this is a no-op - cancellation is no longer observable
    /// on the result.
    pub(crate) fn indicate_cancelled(&mut self) {
        if self.cancel_result == Some(CancelResult::TooLate) {
            return;
        }
        self.cancel_result = Some(CancelResult::Canceled);
        self.result_code = Some(ResultCode::Canceled);
        let message = self
            .cancel
            .message()
            .unwrap_or_else(|| "processing was terminated by a cancel request".to_string());
        self.append_error_message(&message);
        self.processing_stop_time = Some(duration_from_epoch_now());
    }
}

impl DirectoryServer {
    /// Route a rename request to its backend and process it. The returned
    /// operation carries the full response state.
    #[instrument(level = "debug", name = "modify_dn", skip_all, fields(ident = %event.ident, entry_dn = %event.entry_dn))]
    pub fn modify_dn(&self, event: ModifyDnEvent) -> ModifyDnOperation {
        if !event.ident.is_internal() {
            security_info!(ident = %event.ident, "modify DN initiator");
        }
        let mut op = ModifyDnOperation::from_event(event);
        match self.backend_for_dn(op.entry_dn()) {
            Some(backend) => self.process_modify_dn(&mut op, &backend),
            None => {
                op.set_result_code(ResultCode::NoSuchObject);
                let message =
                    format!("no backend is registered to hold the entry {}", op.entry_dn());
                op.append_error_message(&message);
            }
        }
        op
    }

    /// Process a Modify-DN operation against a local backend. Runs phases
    /// one to twenty in order; every exit path releases the two DN locks
    /// exactly once and stamps the response state on `op`.
    ///
    /// A failing synchronization provider post-operation hook inside the
    /// cleanup block replaces the response data - including a success - and
    /// stops dispatch to the remaining providers.
    #[instrument(level = "debug", name = "modify_dn::process", skip_all, fields(op_id = %op.op_id(), entry_dn = %op.entry_dn()))]
    pub fn process_modify_dn(&self, op: &mut ModifyDnOperation, backend: &Arc<dyn Backend>) {
        op.set_skip_post_operation(false);

        if self.cancel_if_requested(op) {
            return;
        }

        let outcome = self.modify_dn_processing(op, backend);
        match outcome {
            OperationOutcome::Cancelled | OperationOutcome::ConnectionTerminated => return,
            OperationOutcome::Continue | OperationOutcome::Abort => {}
        }

        // From here the operation's fate is sealed.
        op.set_cancel_result(CancelResult::TooLate);

        if op.ident().is_synchronization() {
            if op.result_code() == Some(ResultCode::Success) {
                Plugins::run_post_synchronization_modify_dn(&self.plugins().snapshot(), op);
            }
        } else if !op.skip_post_operation() {
            let directive = Plugins::run_post_operation_modify_dn(&self.plugins().snapshot(), op);
            if directive == PluginDirective::ConnectionTerminated {
                op.set_result_code(ResultCode::Canceled);
                op.append_error_message(
                    "the client connection was terminated by a post-operation plugin",
                );
                return;
            }
        }

        if op.result_code() == Some(ResultCode::Success) {
            let listeners = self.change_listeners().snapshot();
            if let (Some(old_entry), Some(new_entry)) = (op.current_entry(), op.new_entry()) {
                Plugins::run_change_notification(&listeners, op, old_entry, new_entry);
            }
        }
    }

    /// Phases 1-3 plus the cleanup block. The locked phases run inside the
    /// scope of the DN lock pair; the providers' post-operation hooks run
    /// after both locks are released, on every path that acquired them.
    fn modify_dn_processing(
        &self,
        op: &mut ModifyDnOperation,
        backend: &Arc<dyn Backend>,
    ) -> OperationOutcome {
        // The front end records its own result for a request it failed to
        // decode; the core only has to stop without post-op processing.
        let Some(new_rdn) = op.new_rdn().cloned() else {
            op.set_skip_post_operation(true);
            if op.result_code().is_none() {
                op.set_result_code(ResultCode::ProtocolError);
                let message = format!("the new RDN for {} could not be decoded", op.entry_dn());
                op.append_error_message(&message);
            }
            return OperationOutcome::Abort;
        };
        if op.raw_new_superior_present() && op.new_superior().is_none() {
            op.set_skip_post_operation(true);
            if op.result_code().is_none() {
                op.set_result_code(ResultCode::ProtocolError);
                let message =
                    format!("the new superior for {} could not be decoded", op.entry_dn());
                op.append_error_message(&message);
            }
            return OperationOutcome::Abort;
        }

        // Phase 1: resolve the parent and the new DN.
        let parent_dn = match op.new_superior().cloned() {
            Some(superior) => superior,
            None => self.parent_in_suffix(op.entry_dn()).unwrap_or_default(),
        };
        if parent_dn.is_null() {
            op.set_result_code(ResultCode::UnwillingToPerform);
            let message = format!(
                "the entry {} cannot be renamed because it does not have a parent",
                op.entry_dn()
            );
            op.append_error_message(&message);
            return OperationOutcome::Abort;
        }
        let new_dn = parent_dn.concat(new_rdn);

        // Phase 2: the new DN must land in this same backend.
        let Some(new_backend) = self.backend_for_dn(&new_dn) else {
            op.set_result_code(ResultCode::NoSuchObject);
            let message = format!(
                "no backend is registered to hold the new entry {new_dn} for {}",
                op.entry_dn()
            );
            op.append_error_message(&message);
            return OperationOutcome::Abort;
        };
        if new_backend.backend_id() != backend.backend_id() {
            op.set_result_code(ResultCode::UnwillingToPerform);
            let message = format!(
                "the entry {} cannot be renamed to {new_dn} because moves between backends are not supported",
                op.entry_dn()
            );
            op.append_error_message(&message);
            return OperationOutcome::Abort;
        }

        if self.cancel_if_requested(op) {
            return OperationOutcome::Cancelled;
        }

        // Phase 3: the write lock pair, current DN first.
        let Some(entry_lock) = self
            .lock_manager()
            .try_write_retries(op.entry_dn(), DN_LOCK_ATTEMPTS)
        else {
            op.set_result_code(self.server_error_result_code());
            let message = format!("failed to acquire a write lock on {}", op.entry_dn());
            op.append_error_message(&message);
            op.set_skip_post_operation(true);
            return OperationOutcome::Abort;
        };
        let Some(new_lock) = self
            .lock_manager()
            .try_write_retries(&new_dn, DN_LOCK_ATTEMPTS)
        else {
            drop(entry_lock);
            op.set_result_code(self.server_error_result_code());
            let message = format!(
                "failed to acquire a write lock on the new DN {new_dn} while renaming {}",
                op.entry_dn()
            );
            op.append_error_message(&message);
            op.set_skip_post_operation(true);
            return OperationOutcome::Abort;
        };
        let lock_pair = DnLockPair::new(entry_lock, new_lock);

        let outcome = self.modify_dn_locked(op, backend, &new_dn);

        // Cleanup. Locks go first, then every provider gets its
        // post-operation hook whatever the outcome was.
        drop(lock_pair);
        for provider in self.sync_providers().snapshot() {
            if let Err(e) = provider.do_post_operation(op) {
                admin_error!(
                    op_id = %op.op_id(),
                    provider = provider.id(),
                    err = %e,
                    "synchronization provider post-operation failed"
                );
                op.set_response_data(&e);
                break;
            }
        }

        outcome
    }

    /// Phases 4-17, run while both DN locks are held.
    fn modify_dn_locked(
        &self,
        op: &mut ModifyDnOperation,
        backend: &Arc<dyn Backend>,
        new_dn: &Dn,
    ) -> OperationOutcome {
        if self.cancel_if_requested(op) {
            return OperationOutcome::Cancelled;
        }

        // Phase 4: fetch the current entry, or derive the matched DN.
        match backend.get_entry(op.entry_dn()) {
            Ok(Some(entry)) => op.set_current_entry(entry),
            Ok(None) => {
                let mut ancestor = self.parent_in_suffix(op.entry_dn());
                while let Some(dn) = ancestor {
                    match self.entry_exists(&dn) {
                        Ok(true) => {
                            op.set_matched_dn(dn);
                            break;
                        }
                        Ok(false) => ancestor = self.parent_in_suffix(&dn),
                        Err(_) => break,
                    }
                }
                op.set_result_code(ResultCode::NoSuchObject);
                let message = format!("the entry {} does not exist", op.entry_dn());
                op.append_error_message(&message);
                return OperationOutcome::Abort;
            }
            Err(e) => {
                op.set_response_data(&e);
                return OperationOutcome::Abort;
            }
        }

        // Phase 5: synchronization conflict resolution. A provider that
        // stops processing has stamped the result itself.
        for provider in self.sync_providers().snapshot() {
            match provider.handle_conflict_resolution(op) {
                Ok(result) if !result.continues() => return OperationOutcome::Abort,
                Ok(_) => {}
                Err(e) => {
                    admin_error!(
                        op_id = %op.op_id(),
                        provider = provider.id(),
                        err = %e,
                        "synchronization conflict resolution failed"
                    );
                    op.set_response_data(&e);
                    return OperationOutcome::Abort;
                }
            }
        }

        // Phase 6: the request control pipeline.
        if let Err(e) = self.handle_request_controls(op, backend) {
            op.set_response_data(&e);
            return OperationOutcome::Abort;
        }

        // Phase 7: the access decision.
        if !self.access_handler().is_allowed(op) {
            security_access!(
                op_id = %op.op_id(),
                ident = %op.ident(),
                "modify DN denied by access control"
            );
            op.set_result_code(ResultCode::InsufficientAccessRights);
            let message = format!(
                "you do not have sufficient access rights to rename {}",
                op.entry_dn()
            );
            op.append_error_message(&message);
            op.set_skip_post_operation(true);
            return OperationOutcome::Abort;
        }

        // Phase 8: build the candidate entry.
        let Some(current) = op.current_entry().cloned() else {
            op.set_result_code(self.server_error_result_code());
            op.append_error_message("the current entry vanished during processing");
            return OperationOutcome::Abort;
        };
        let mut candidate = current;
        candidate.set_dn(new_dn.clone());
        op.set_new_entry(candidate);

        // Phase 9: the RDN rewrite and its schema gate.
        if let Err(e) = self.apply_rdn_changes(op, new_dn) {
            op.set_response_data(&e);
            return OperationOutcome::Abort;
        }

        if self.cancel_if_requested(op) {
            return OperationOutcome::Cancelled;
        }

        // Phase 10: pre-operation plugins, for non-synchronization
        // operations only. Anything they append past this count is applied
        // in phase 11.
        let mod_count = op.modifications().len();
        if !op.ident().is_synchronization() {
            match Plugins::run_pre_operation_modify_dn(&self.plugins().snapshot(), op) {
                PluginDirective::Continue => {}
                PluginDirective::ConnectionTerminated => {
                    op.set_result_code(ResultCode::Canceled);
                    op.append_error_message(
                        "the client connection was terminated by a pre-operation plugin",
                    );
                    return OperationOutcome::ConnectionTerminated;
                }
                PluginDirective::SendResponseImmediately => {
                    op.set_skip_post_operation(true);
                    return OperationOutcome::Abort;
                }
                PluginDirective::SkipCoreProcessing => {
                    op.set_skip_post_operation(false);
                    return OperationOutcome::Abort;
                }
            }
        }

        // Phase 11: apply what the plugins appended.
        if op.modifications().len() > mod_count {
            if let Err(e) = self.apply_pre_op_modifications(op, mod_count) {
                op.set_response_data(&e);
                return OperationOutcome::Abort;
            }
        }

        if self.cancel_if_requested(op) {
            return OperationOutcome::Cancelled;
        }

        // Phase 12: writability gates. Private backends are exempt.
        if !backend.is_private_backend() {
            if let Some(message) = self.writability_rejection(
                self.writability_mode(),
                op,
                "the server is in read-only mode",
            ) {
                op.set_result_code(ResultCode::UnwillingToPerform);
                op.append_error_message(&message);
                return OperationOutcome::Abort;
            }
            if let Some(message) = self.writability_rejection(
                backend.writability_mode(),
                op,
                "the backend holding the entry is in read-only mode",
            ) {
                op.set_result_code(ResultCode::UnwillingToPerform);
                op.append_error_message(&message);
                return OperationOutcome::Abort;
            }
        }

        if op.is_noop() {
            // Phase 13: every check ran, the write is skipped.
            op.append_error_message("the no-op control was present, the rename was not applied");
            op.set_result_code(ResultCode::NoOperation);
        } else {
            // Phase 14: last word from the synchronization providers.
            for provider in self.sync_providers().snapshot() {
                match provider.do_pre_operation(op) {
                    Ok(result) if !result.continues() => return OperationOutcome::Abort,
                    Ok(_) => {}
                    Err(e) => {
                        admin_error!(
                            op_id = %op.op_id(),
                            provider = provider.id(),
                            err = %e,
                            "synchronization provider pre-operation failed"
                        );
                        op.set_response_data(&e);
                        return OperationOutcome::Abort;
                    }
                }
            }

            // Phase 15: the commit.
            let rename_result = {
                let Some(new_entry) = op.new_entry() else {
                    op.set_result_code(self.server_error_result_code());
                    op.append_error_message("the candidate entry vanished during processing");
                    return OperationOutcome::Abort;
                };
                backend.rename_entry(op.entry_dn(), new_entry, op.cancel_token_ref())
            };
            match rename_result {
                Ok(()) => {}
                Err(RenameEntryError::Directory(e)) => {
                    op.set_response_data(&e);
                    return OperationOutcome::Abort;
                }
                Err(RenameEntryError::Cancelled(c)) => {
                    op.set_cancel_result(c.cancel_result);
                    op.set_result_code(c.cancel_result.result_code());
                    op.append_error_message(&c.message);
                    return OperationOutcome::Abort;
                }
            }
        }

        // Phase 16: attach the read-entry response controls.
        self.process_read_entry_controls(op);

        // Phase 17.
        if !op.is_noop() {
            op.set_result_code(ResultCode::Success);
            if op.ident().is_internal() {
                trace!(op_id = %op.op_id(), "modify DN operation success");
            } else {
                admin_info!(op_id = %op.op_id(), "modify DN operation success");
            }
        }

        OperationOutcome::Continue
    }

    fn writability_rejection(
        &self,
        mode: WritabilityMode,
        op: &ModifyDnOperation,
        reason: &str,
    ) -> Option<String> {
        match mode {
            WritabilityMode::Enabled => None,
            WritabilityMode::Disabled => Some(format!(
                "{reason}, the entry {} cannot be renamed",
                op.entry_dn()
            )),
            WritabilityMode::InternalOnly => {
                if op.ident().is_internal() || op.ident().is_synchronization() {
                    None
                } else {
                    Some(format!(
                        "{reason}, the entry {} cannot be renamed",
                        op.entry_dn()
                    ))
                }
            }
        }
    }

    /// Phase 6 worker: authorize and apply each request control in client
    /// order. Errors propagate as the operation's response.
    fn handle_request_controls(
        &self,
        op: &mut ModifyDnOperation,
        backend: &Arc<dyn Backend>,
    ) -> Result<(), DirectoryError> {
        let request_controls = std::mem::take(op.request_controls_mut());
        let result = self.handle_request_controls_inner(op, backend, &request_controls);
        *op.request_controls_mut() = request_controls;
        result
    }

    fn handle_request_controls_inner(
        &self,
        op: &mut ModifyDnOperation,
        backend: &Arc<dyn Backend>,
        request_controls: &[Control],
    ) -> Result<(), DirectoryError> {
        let access = self.access_handler();
        for control in request_controls {
            let entry_dn = op.entry_dn().clone();
            if !access.is_control_allowed(&entry_dn, op, control) {
                op.set_skip_post_operation(true);
                return Err(DirectoryError::new(
                    ResultCode::InsufficientAccessRights,
                    format!(
                        "the request control {} is not allowed for this operation",
                        control.oid()
                    ),
                ));
            }

            match control {
                Control::Assertion(assertion) => {
                    let Some(current) = op.current_entry() else {
                        return Err(DirectoryError::new(
                            self.server_error_result_code(),
                            "no current entry to evaluate the assertion against".to_string(),
                        ));
                    };
                    match assertion.filter.matches_entry(current) {
                        Ok(true) => {}
                        Ok(false) => {
                            return Err(DirectoryError::new(
                                ResultCode::AssertionFailed,
                                format!(
                                    "the assertion filter did not match the entry {entry_dn}"
                                ),
                            ))
                        }
                        Err(e) => {
                            return Err(DirectoryError::new(
                                ResultCode::ProtocolError,
                                format!(
                                    "the assertion filter for {entry_dn} could not be processed: {}",
                                    e.message
                                ),
                            ))
                        }
                    }
                }
                Control::NoOp { .. } => op.set_noop(true),
                Control::PreRead(request) => op.set_pre_read_request(request.clone()),
                Control::PostRead(request) => op.set_post_read_request(request.clone()),
                Control::ProxiedAuthV1(proxy) | Control::ProxiedAuthV2(proxy) => {
                    if !op.ident().has_privilege(Privilege::ProxiedAuth) {
                        return Err(DirectoryError::new(
                            ResultCode::AuthorizationDenied,
                            "the proxied authorization control requires the proxied-auth privilege"
                                .to_string(),
                        ));
                    }
                    let authz_dn = proxy
                        .authorization_entry
                        .as_ref()
                        .map(|e| e.dn().clone())
                        .unwrap_or_else(Dn::null);
                    security_access!(
                        op_id = %op.op_id(),
                        ident = %op.ident(),
                        authz = %authz_dn,
                        "proxied authorization accepted"
                    );
                    op.set_authorization_entry(proxy.authorization_entry.clone());
                    op.set_proxied_authorization_dn(authz_dn);
                }
                Control::Unknown(unknown) => {
                    if unknown.oid == OID_LDAP_NOOP_OPENLDAP_ASSIGNED {
                        // The no-op control carries no value, the raw form
                        // is acceptable.
                        op.set_noop(true);
                    } else if controls::is_recognized_oid(&unknown.oid) {
                        return Err(DirectoryError::new(
                            ResultCode::ProtocolError,
                            format!("unable to decode the {} request control", unknown.oid),
                        ));
                    } else if unknown.critical {
                        if !backend.supports_control(&unknown.oid) {
                            return Err(DirectoryError::new(
                                ResultCode::UnavailableCriticalExtension,
                                format!(
                                    "the critical control {} is not supported for entry {entry_dn}",
                                    unknown.oid
                                ),
                            ));
                        }
                    } else {
                        request_trace!(
                            oid = unknown.oid.as_str(),
                            "ignoring unrecognized non-critical request control"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Phase 9 worker: derive the attribute changes implied by the new RDN,
    /// then gate the candidate through schema.
    fn apply_rdn_changes(
        &self,
        op: &mut ModifyDnOperation,
        new_dn: &Dn,
    ) -> Result<(), DirectoryError> {
        let entry_dn = op.entry_dn().clone();
        let current_rdn = op.entry_dn().rdn().cloned();
        let Some(new_rdn) = new_dn.rdn().cloned() else {
            return Err(DirectoryError::new(
                self.server_error_result_code(),
                format!("the new DN {new_dn} has no RDN"),
            ));
        };
        let delete_old_rdn = op.delete_old_rdn();
        let unrestricted = op.ident().is_internal() || op.ident().is_synchronization();
        let gate_schema = self.check_schema() && !op.ident().is_synchronization();

        let (candidate, mods) = op.candidate_and_mods_mut();
        let Some(new_entry) = candidate else {
            return Err(DirectoryError::new(
                self.server_error_result_code(),
                "no candidate entry to rewrite".to_string(),
            ));
        };

        if delete_old_rdn {
            if let Some(current_rdn) = &current_rdn {
                for ava in current_rdn.avas() {
                    let atype = self.schema().attribute_type(ava.attr());
                    if atype.no_user_modification && !unrestricted {
                        return Err(DirectoryError::new(
                            ResultCode::UnwillingToPerform,
                            format!(
                                "the old RDN attribute {} of {entry_dn} may not be modified by users",
                                ava.name()
                            ),
                        ));
                    }
                    let a = Attribute::single(ava.name(), ava.value());
                    let mut missing_values = Vec::new();
                    new_entry.remove_attribute(&a, &mut missing_values);
                    // A value that was already absent - shared with the new
                    // RDN, say - is not a net modification.
                    if missing_values.is_empty() {
                        mods.push(Modification::new(ModificationType::Delete, a));
                    }
                }
            }
        }

        for ava in new_rdn.avas() {
            let atype = self.schema().attribute_type(ava.attr());
            let a = Attribute::single(ava.name(), ava.value());
            let mut duplicate_values = Vec::new();
            new_entry.add_attribute(a.clone(), &mut duplicate_values);
            if duplicate_values.is_empty() {
                if atype.no_user_modification {
                    if !unrestricted {
                        return Err(DirectoryError::new(
                            ResultCode::UnwillingToPerform,
                            format!(
                                "the new RDN attribute {} for {entry_dn} may not be modified by users",
                                ava.name()
                            ),
                        ));
                    }
                } else {
                    mods.push(Modification::new(ModificationType::Add, a));
                }
            }
        }

        if gate_schema {
            if let Err(reason) = self.schema().validate_entry(new_entry) {
                return Err(DirectoryError::new(
                    ResultCode::ObjectclassViolation,
                    format!("the renamed entry {entry_dn} would violate the server schema: {reason}"),
                ));
            }
            for ava in new_rdn.avas() {
                let atype = self.schema().attribute_type(ava.attr());
                if atype.obsolete {
                    return Err(DirectoryError::new(
                        ResultCode::UnwillingToPerform,
                        format!(
                            "the new RDN for {entry_dn} references the obsolete attribute type {}",
                            atype.name_or_oid()
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Phase 11 worker: apply the modifications plugins appended, starting
    /// at `start_pos`, then re-gate the candidate through schema.
    fn apply_pre_op_modifications(
        &self,
        op: &mut ModifyDnOperation,
        start_pos: usize,
    ) -> Result<(), DirectoryError> {
        let entry_dn = op.entry_dn().clone();
        let gate_schema = self.check_schema() && !op.ident().is_synchronization();

        let (candidate, mods) = op.candidate_and_mods_mut();
        let Some(new_entry) = candidate else {
            return Err(DirectoryError::new(
                self.server_error_result_code(),
                "no candidate entry to modify".to_string(),
            ));
        };

        for m in &mods.as_slice()[start_pos..] {
            match m.mtype {
                ModificationType::Add => {
                    // Duplicates from plugins are tolerated, not errors.
                    let mut duplicate_values = Vec::new();
                    new_entry.add_attribute(m.attribute.clone(), &mut duplicate_values);
                }
                ModificationType::Delete => {
                    let mut missing_values = Vec::new();
                    new_entry.remove_attribute(&m.attribute, &mut missing_values);
                }
                ModificationType::Replace => {
                    new_entry.remove_by_description(m.attribute.description());
                    if !m.attribute.is_empty() {
                        let mut duplicate_values = Vec::new();
                        new_entry.add_attribute(m.attribute.clone(), &mut duplicate_values);
                    }
                }
                ModificationType::Increment => {
                    let Some(existing) = new_entry.get_attribute(m.attribute.description()) else {
                        return Err(DirectoryError::new(
                            ResultCode::NoSuchAttribute,
                            format!(
                                "cannot increment {} on {entry_dn}: no such attribute",
                                m.attribute.name()
                            ),
                        ));
                    };
                    if existing.values().len() > 1 {
                        return Err(DirectoryError::new(
                            ResultCode::ConstraintViolation,
                            format!(
                                "cannot increment {} on {entry_dn}: the attribute has multiple values",
                                m.attribute.name()
                            ),
                        ));
                    }
                    let Some(current_value) = existing.values().first() else {
                        return Err(DirectoryError::new(
                            ResultCode::NoSuchAttribute,
                            format!(
                                "cannot increment {} on {entry_dn}: the attribute has no value",
                                m.attribute.name()
                            ),
                        ));
                    };
                    let current: i64 = current_value.trim().parse().map_err(|_| {
                        DirectoryError::new(
                            ResultCode::ConstraintViolation,
                            format!(
                                "cannot increment {} on {entry_dn}: the current value is not a decimal integer",
                                m.attribute.name()
                            ),
                        )
                    })?;

                    let amounts = m.attribute.values();
                    if amounts.is_empty() {
                        return Err(DirectoryError::new(
                            ResultCode::ConstraintViolation,
                            format!(
                                "cannot increment {} on {entry_dn}: no increment amount provided",
                                m.attribute.name()
                            ),
                        ));
                    }
                    if amounts.len() > 1 {
                        return Err(DirectoryError::new(
                            ResultCode::ConstraintViolation,
                            format!(
                                "cannot increment {} on {entry_dn}: multiple increment amounts provided",
                                m.attribute.name()
                            ),
                        ));
                    }
                    let amount: i64 = amounts[0].trim().parse().map_err(|_| {
                        DirectoryError::new(
                            ResultCode::ConstraintViolation,
                            format!(
                                "cannot increment {} on {entry_dn}: the increment amount is not a decimal integer",
                                m.attribute.name()
                            ),
                        )
                    })?;

                    let sum = current.wrapping_add(amount);
                    new_entry.put_attribute(Attribute::new(
                        m.attribute.name(),
                        vec![sum.to_string()],
                    ));
                }
            }
        }

        if gate_schema {
            if let Err(reason) = self.schema().validate_entry(new_entry) {
                return Err(DirectoryError::new(
                    ResultCode::ObjectclassViolation,
                    format!(
                        "the entry {entry_dn} would violate the server schema after pre-operation modifications: {reason}"
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Phase 16 worker: attach the pre-read and post-read response controls.
    fn process_read_entry_controls(&self, op: &mut ModifyDnOperation) {
        if let Some(request) = op.pre_read_request().cloned() {
            if let Some(current) = op.current_entry() {
                let image = controls::filter_read_entry(current, self.schema(), &request);
                op.add_response_control(ResponseControl::PreRead(ReadEntryResponseControl {
                    critical: request.critical,
                    entry: image,
                }));
            }
        }
        if let Some(request) = op.post_read_request().cloned() {
            if let Some(new_entry) = op.new_entry() {
                let image = controls::filter_read_entry(new_entry, self.schema(), &request);
                op.add_response_control(ResponseControl::PostRead(ReadEntryResponseControl {
                    critical: request.critical,
                    entry: image,
                }));
            }
        }
    }

    /// A cancellation checkpoint. When a cancel request is pending, stamp
    /// the cancellation on the operation and record the stop time.
    fn cancel_if_requested(&self, op: &mut ModifyDnOperation) -> bool {
        if !op.cancel_token_ref().is_requested() {
            return false;
        }
        op.indicate_cancelled();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::prelude::*;
    use crate::testkit::{test_server, test_server_with_config, MemBackend};

    fn dn(s: &str) -> Dn {
        s.parse().expect("invalid dn")
    }

    fn rdn(s: &str) -> Rdn {
        s.parse().expect("invalid rdn")
    }

    fn alice_entry() -> Entry {
        entry_init!(
            "cn=alice,ou=people,dc=ex,dc=com",
            (ATTR_OBJECTCLASS, "top", "person"),
            ("cn", "alice"),
            ("sn", "a")
        )
    }

    fn people_entry() -> Entry {
        entry_init!(
            "ou=people,dc=ex,dc=com",
            (ATTR_OBJECTCLASS, "top", "organizationalunit"),
            ("ou", "people")
        )
    }

    fn user_backend() -> Arc<MemBackend> {
        Arc::new(
            MemBackend::new("userRoot", &["dc=ex,dc=com"])
                .with_entry(people_entry())
                .with_entry(alice_entry()),
        )
    }

    fn rename_alice_event() -> ModifyDnEvent {
        ModifyDnEvent::new(
            Identity::bound(dn("cn=admin,dc=ex,dc=com")),
            dn("cn=alice,ou=people,dc=ex,dc=com"),
            rdn("cn=allie"),
            true,
        )
    }

    #[derive(Default)]
    struct RecordingPlugin {
        pre: AtomicUsize,
        post: AtomicUsize,
        post_sync: AtomicUsize,
    }

    impl ModifyDnPlugin for RecordingPlugin {
        fn id(&self) -> &'static str {
            "recorder"
        }

        fn pre_operation_modify_dn(&self, _op: &mut ModifyDnOperation) -> PluginDirective {
            self.pre.fetch_add(1, Ordering::SeqCst);
            PluginDirective::Continue
        }

        fn post_operation_modify_dn(&self, _op: &mut ModifyDnOperation) -> PluginDirective {
            self.post.fetch_add(1, Ordering::SeqCst);
            PluginDirective::Continue
        }

        fn post_synchronization_modify_dn(&self, _op: &ModifyDnOperation) {
            self.post_sync.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct DirectivePlugin(PluginDirective);

    impl ModifyDnPlugin for DirectivePlugin {
        fn id(&self) -> &'static str {
            "directive"
        }

        fn pre_operation_modify_dn(&self, _op: &mut ModifyDnOperation) -> PluginDirective {
            self.0
        }
    }

    struct CancelRequestingPlugin;

    impl ModifyDnPlugin for CancelRequestingPlugin {
        fn id(&self) -> &'static str {
            "cancel-requester"
        }

        fn pre_operation_modify_dn(&self, op: &mut ModifyDnOperation) -> PluginDirective {
            op.cancel_token().request_cancel();
            PluginDirective::Continue
        }
    }

    struct DescriptionStamper;

    impl ModifyDnPlugin for DescriptionStamper {
        fn id(&self) -> &'static str {
            "description-stamper"
        }

        fn pre_operation_modify_dn(&self, op: &mut ModifyDnOperation) -> PluginDirective {
            op.add_modification(m_add(Attribute::single(ATTR_DESCRIPTION, "renamed")));
            PluginDirective::Continue
        }
    }

    struct UidNumberIncrementer;

    impl ModifyDnPlugin for UidNumberIncrementer {
        fn id(&self) -> &'static str {
            "uidnumber-incrementer"
        }

        fn pre_operation_modify_dn(&self, op: &mut ModifyDnOperation) -> PluginDirective {
            op.add_modification(m_increment(Attribute::single("uidnumber", "10")));
            PluginDirective::Continue
        }
    }

    #[derive(Default)]
    struct RecordingSyncProvider {
        conflict: AtomicUsize,
        pre: AtomicUsize,
        post: AtomicUsize,
    }

    impl SynchronizationProvider for RecordingSyncProvider {
        fn id(&self) -> &'static str {
            "recording-sync"
        }

        fn handle_conflict_resolution(
            &self,
            _op: &mut ModifyDnOperation,
        ) -> Result<SynchronizationProviderResult, DirectoryError> {
            self.conflict.fetch_add(1, Ordering::SeqCst);
            Ok(SynchronizationProviderResult::continue_processing())
        }

        fn do_pre_operation(
            &self,
            _op: &mut ModifyDnOperation,
        ) -> Result<SynchronizationProviderResult, DirectoryError> {
            self.pre.fetch_add(1, Ordering::SeqCst);
            Ok(SynchronizationProviderResult::continue_processing())
        }

        fn do_post_operation(&self, _op: &mut ModifyDnOperation) -> Result<(), DirectoryError> {
            self.post.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ConflictStopper;

    impl SynchronizationProvider for ConflictStopper {
        fn id(&self) -> &'static str {
            "conflict-stopper"
        }

        fn handle_conflict_resolution(
            &self,
            op: &mut ModifyDnOperation,
        ) -> Result<SynchronizationProviderResult, DirectoryError> {
            op.set_result_code(ResultCode::Other);
            op.append_error_message("the replica resolved this rename differently");
            Ok(SynchronizationProviderResult::stop_processing())
        }
    }

    struct FailingPostSync;

    impl SynchronizationProvider for FailingPostSync {
        fn id(&self) -> &'static str {
            "failing-post-sync"
        }

        fn do_post_operation(&self, _op: &mut ModifyDnOperation) -> Result<(), DirectoryError> {
            Err(DirectoryError::new(
                ResultCode::Other,
                "replication lag".to_string(),
            ))
        }
    }

    struct CancelDuringPreOpSync;

    impl SynchronizationProvider for CancelDuringPreOpSync {
        fn id(&self) -> &'static str {
            "cancel-during-pre-op"
        }

        fn do_pre_operation(
            &self,
            op: &mut ModifyDnOperation,
        ) -> Result<SynchronizationProviderResult, DirectoryError> {
            op.cancel_token().request_cancel();
            Ok(SynchronizationProviderResult::continue_processing())
        }
    }

    struct RecordingListener {
        fail: bool,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl RecordingListener {
        fn new(fail: bool) -> Self {
            RecordingListener {
                fail,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChangeNotificationListener for RecordingListener {
        fn id(&self) -> &'static str {
            "recording-listener"
        }

        fn handle_modify_dn_operation(
            &self,
            _op: &ModifyDnOperation,
            old_entry: &Entry,
            new_entry: &Entry,
        ) -> Result<(), DirectoryError> {
            if self.fail {
                return Err(DirectoryError::new(
                    ResultCode::Other,
                    "listener exploded".to_string(),
                ));
            }
            self.seen
                .lock()
                .unwrap()
                .push((old_entry.dn().to_string(), new_entry.dn().to_string()));
            Ok(())
        }
    }

    struct DenyControlAccess;

    impl AccessControlHandler for DenyControlAccess {
        fn is_allowed(&self, _op: &ModifyDnOperation) -> bool {
            true
        }

        fn is_control_allowed(
            &self,
            _dn: &Dn,
            _op: &ModifyDnOperation,
            _control: &Control,
        ) -> bool {
            false
        }
    }

    struct DenyOperationAccess;

    impl AccessControlHandler for DenyOperationAccess {
        fn is_allowed(&self, _op: &ModifyDnOperation) -> bool {
            false
        }

        fn is_control_allowed(
            &self,
            _dn: &Dn,
            _op: &ModifyDnOperation,
            _control: &Control,
        ) -> bool {
            true
        }
    }

    #[test]
    fn test_simple_rename_delete_old_rdn() {
        sketching::test_init();
        let be = user_backend();
        let server = test_server(be.clone());

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        assert_eq!(be.rename_count(), 1);
        assert!(be.get(&dn("cn=alice,ou=people,dc=ex,dc=com")).is_none());
        let renamed = be
            .get(&dn("cn=allie,ou=people,dc=ex,dc=com"))
            .expect("renamed entry");
        assert!(renamed.has_attribute_value("cn", "allie"));
        assert!(!renamed.has_attribute_value("cn", "alice"));
        assert!(renamed.has_attribute_value("sn", "a"));

        // The net delta, in application order.
        let mods = op.modifications().as_slice();
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[0].mtype, ModificationType::Delete);
        assert!(mods[0].attribute.contains_value("alice"));
        assert_eq!(mods[1].mtype, ModificationType::Add);
        assert!(mods[1].attribute.contains_value("allie"));

        // Both DN locks must be free again.
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=alice,ou=people,dc=ex,dc=com"))
            .is_some());
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=allie,ou=people,dc=ex,dc=com"))
            .is_some());
    }

    #[test]
    fn test_rename_keeps_old_rdn_values_when_not_deleting() {
        let be = user_backend();
        let server = test_server(be.clone());
        let mut event = rename_alice_event();
        event.delete_old_rdn = false;

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        let renamed = be
            .get(&dn("cn=allie,ou=people,dc=ex,dc=com"))
            .expect("renamed entry");
        assert!(renamed.has_attribute_value("cn", "alice"));
        assert!(renamed.has_attribute_value("cn", "allie"));
        let mods = op.modifications().as_slice();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].mtype, ModificationType::Add);
    }

    #[test]
    fn test_new_rdn_value_already_present_records_no_add() {
        let be = Arc::new(
            MemBackend::new("userRoot", &["dc=ex,dc=com"])
                .with_entry(people_entry())
                .with_entry(entry_init!(
                    "cn=alice,ou=people,dc=ex,dc=com",
                    (ATTR_OBJECTCLASS, "top", "person"),
                    ("cn", "alice", "allie"),
                    ("sn", "a")
                )),
        );
        let server = test_server(be.clone());

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        let mods = op.modifications().as_slice();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].mtype, ModificationType::Delete);
    }

    #[test]
    fn test_rename_into_different_backend_is_rejected() {
        let be = user_backend();
        let other = Arc::new(MemBackend::new("otherRoot", &["dc=other,dc=com"]));
        let server = test_server(be.clone());
        server.register_backend(other.clone());

        let event = rename_alice_event().with_new_superior(dn("ou=other,dc=other,dc=com"));
        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::UnwillingToPerform));
        assert_eq!(be.rename_count(), 0);
        assert_eq!(other.rename_count(), 0);
    }

    #[test]
    fn test_assertion_control_matching() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = rename_alice_event().with_controls(vec![Control::Assertion(
            AssertionRequestControl {
                critical: true,
                filter: f_eq("cn", "alice"),
            },
        )]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        assert_eq!(be.rename_count(), 1);
    }

    #[test]
    fn test_assertion_control_failure() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = rename_alice_event().with_controls(vec![Control::Assertion(
            AssertionRequestControl {
                critical: true,
                filter: f_eq("cn", "carol"),
            },
        )]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::AssertionFailed));
        assert_eq!(be.rename_count(), 0);
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=alice,ou=people,dc=ex,dc=com"))
            .is_some());
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=allie,ou=people,dc=ex,dc=com"))
            .is_some());
    }

    #[test]
    fn test_no_op_control_skips_the_write() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = rename_alice_event().with_controls(vec![
            Control::NoOp { critical: false },
            Control::PostRead(ReadEntryRequestControl::all()),
        ]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::NoOperation));
        assert_eq!(be.rename_count(), 0);
        assert!(be.get(&dn("cn=alice,ou=people,dc=ex,dc=com")).is_some());
        // The post-read still reflects the entry the rename would have made.
        let post = op
            .response_controls()
            .iter()
            .find_map(|c| match c {
                ResponseControl::PostRead(r) => Some(r),
                _ => None,
            })
            .expect("post-read response control");
        assert_eq!(post.entry.dn(), &dn("cn=allie,ou=people,dc=ex,dc=com"));
        assert!(post.entry.has_attribute_value("cn", "allie"));
    }

    #[test]
    fn test_cancellation_before_commit() {
        let be = user_backend();
        let server = test_server(be.clone());
        let recorder = Arc::new(RecordingPlugin::default());
        server.plugins().register(Arc::new(CancelRequestingPlugin));
        server.plugins().register(recorder.clone());

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Canceled));
        assert_eq!(op.cancel_result(), Some(CancelResult::Canceled));
        assert!(op.processing_stop_time().is_some());
        assert_eq!(be.rename_count(), 0);
        // Post-operation plugins must not run after a cancellation.
        assert_eq!(recorder.post.load(Ordering::SeqCst), 0);
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=alice,ou=people,dc=ex,dc=com"))
            .is_some());
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=allie,ou=people,dc=ex,dc=com"))
            .is_some());
    }

    #[test]
    fn test_obsolete_new_rdn_attribute_rejected() {
        let be = user_backend();
        let mut schema = Schema::core();
        let mut legacy = SchemaAttribute::user("x-legacy-name", true);
        legacy.oid = Some("1.3.6.1.4.1.99999.1.1".to_string());
        legacy.obsolete = true;
        schema.upsert_attribute(legacy);
        let server = DirectoryServer::new(ServerConfig::default(), schema);
        server.register_backend(be.clone());

        let event = ModifyDnEvent::new(
            Identity::bound(dn("cn=admin,dc=ex,dc=com")),
            dn("cn=alice,ou=people,dc=ex,dc=com"),
            rdn("x-legacy-name=allie"),
            false,
        );
        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::UnwillingToPerform));
        assert!(op.error_message().contains("1.3.6.1.4.1.99999.1.1"));
        assert_eq!(be.rename_count(), 0);
        assert!(server
            .lock_manager()
            .try_write(&dn("x-legacy-name=allie,ou=people,dc=ex,dc=com"))
            .is_some());
    }

    #[test]
    fn test_missing_entry_reports_matched_dn() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = ModifyDnEvent::new(
            Identity::bound(dn("cn=admin,dc=ex,dc=com")),
            dn("cn=ghost,ou=people,dc=ex,dc=com"),
            rdn("cn=spirit"),
            true,
        );

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::NoSuchObject));
        assert_eq!(op.matched_dn(), Some(&dn("ou=people,dc=ex,dc=com")));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_suffix_root_cannot_be_renamed() {
        let be = Arc::new(MemBackend::new("userRoot", &["dc=ex,dc=com"]).with_entry(
            entry_init!("dc=ex,dc=com", (ATTR_OBJECTCLASS, "top", "domain"), ("dc", "ex")),
        ));
        let server = test_server(be.clone());

        let event = ModifyDnEvent::new(
            Identity::bound(dn("cn=admin,dc=ex,dc=com")),
            dn("dc=ex,dc=com"),
            rdn("dc=why"),
            true,
        );
        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::UnwillingToPerform));
        assert!(op.error_message().contains("parent"));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_server_writability_internal_only() {
        let be = user_backend();
        let config = ServerConfig {
            writability_mode: WritabilityMode::InternalOnly,
            ..ServerConfig::default()
        };
        let server = test_server_with_config(config, be.clone());

        let op = server.modify_dn(rename_alice_event());
        assert_eq!(op.result_code(), Some(ResultCode::UnwillingToPerform));
        assert_eq!(be.rename_count(), 0);

        let op = server.modify_dn(ModifyDnEvent::new_internal(
            dn("cn=alice,ou=people,dc=ex,dc=com"),
            rdn("cn=allie"),
            true,
        ));
        assert_eq!(op.result_code(), Some(ResultCode::Success));
        assert_eq!(be.rename_count(), 1);
    }

    #[test]
    fn test_backend_writability_disabled_blocks_internal_too() {
        let be = user_backend();
        be.set_writability(WritabilityMode::Disabled);
        let server = test_server(be.clone());

        let op = server.modify_dn(ModifyDnEvent::new_internal(
            dn("cn=alice,ou=people,dc=ex,dc=com"),
            rdn("cn=allie"),
            true,
        ));

        assert_eq!(op.result_code(), Some(ResultCode::UnwillingToPerform));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_private_backend_bypasses_writability() {
        let be = Arc::new(MemBackend::new_private("adminRoot", &["cn=config"]).with_entry(
            entry_init!("cn=task,cn=config", (ATTR_OBJECTCLASS, "top", "device"), ("cn", "task")),
        ));
        be.set_writability(WritabilityMode::Disabled);
        let config = ServerConfig {
            writability_mode: WritabilityMode::Disabled,
            ..ServerConfig::default()
        };
        let server = test_server_with_config(config, be.clone());

        let event = ModifyDnEvent::new(
            Identity::bound(dn("cn=admin,cn=config")),
            dn("cn=task,cn=config"),
            rdn("cn=job"),
            true,
        );
        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        assert_eq!(be.rename_count(), 1);
    }

    #[test]
    fn test_pre_read_response_control() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = rename_alice_event()
            .with_controls(vec![Control::PreRead(ReadEntryRequestControl::all())]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        let pre = op
            .response_controls()
            .iter()
            .find_map(|c| match c {
                ResponseControl::PreRead(r) => Some(r),
                _ => None,
            })
            .expect("pre-read response control");
        assert_eq!(pre.entry.dn(), &dn("cn=alice,ou=people,dc=ex,dc=com"));
        assert!(pre.entry.has_attribute_value("cn", "alice"));
        // Only the requested read control comes back.
        assert_eq!(op.response_controls().len(), 1);
    }

    #[test]
    fn test_no_read_controls_requested_none_returned() {
        let be = user_backend();
        let server = test_server(be.clone());
        let op = server.modify_dn(rename_alice_event());
        assert_eq!(op.result_code(), Some(ResultCode::Success));
        assert!(op.response_controls().is_empty());
    }

    #[test]
    fn test_control_access_denied_skips_post_op() {
        let be = user_backend();
        let server = test_server(be.clone());
        server.set_access_handler(Arc::new(DenyControlAccess));
        let recorder = Arc::new(RecordingPlugin::default());
        server.plugins().register(recorder.clone());

        let event = rename_alice_event().with_controls(vec![Control::NoOp { critical: false }]);
        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::InsufficientAccessRights));
        assert!(op.error_message().contains(OID_LDAP_NOOP_OPENLDAP_ASSIGNED));
        assert!(op.skip_post_operation());
        assert_eq!(recorder.post.load(Ordering::SeqCst), 0);
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_operation_access_denied_skips_post_op() {
        let be = user_backend();
        let server = test_server(be.clone());
        server.set_access_handler(Arc::new(DenyOperationAccess));
        let recorder = Arc::new(RecordingPlugin::default());
        server.plugins().register(recorder.clone());

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::InsufficientAccessRights));
        assert_eq!(recorder.post.load(Ordering::SeqCst), 0);
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_proxied_auth_requires_privilege() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = rename_alice_event().with_controls(vec![Control::ProxiedAuthV2(
            ProxiedAuthControl {
                critical: true,
                authorization_entry: None,
            },
        )]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::AuthorizationDenied));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_proxied_auth_sets_authorization_identity() {
        let be = user_backend();
        let server = test_server(be.clone());
        let authz = entry_init!(
            "uid=svc,ou=people,dc=ex,dc=com",
            (ATTR_OBJECTCLASS, "top", "inetorgperson"),
            ("cn", "svc"),
            ("sn", "svc"),
            ("uid", "svc")
        );
        let ident = Identity::bound_with_privileges(
            dn("cn=proxy,dc=ex,dc=com"),
            [Privilege::ProxiedAuth],
        );
        let event = ModifyDnEvent::new(
            ident,
            dn("cn=alice,ou=people,dc=ex,dc=com"),
            rdn("cn=allie"),
            true,
        )
        .with_controls(vec![Control::ProxiedAuthV2(ProxiedAuthControl {
            critical: true,
            authorization_entry: Some(authz),
        })]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        assert_eq!(
            op.proxied_authorization_dn(),
            Some(&dn("uid=svc,ou=people,dc=ex,dc=com"))
        );
        assert!(op.authorization_entry().is_some());
    }

    #[test]
    fn test_proxied_auth_anonymous_maps_to_null_dn() {
        let be = user_backend();
        let server = test_server(be.clone());
        let ident = Identity::bound_with_privileges(
            dn("cn=proxy,dc=ex,dc=com"),
            [Privilege::ProxiedAuth],
        );
        let event = ModifyDnEvent::new(
            ident,
            dn("cn=alice,ou=people,dc=ex,dc=com"),
            rdn("cn=allie"),
            true,
        )
        .with_controls(vec![Control::ProxiedAuthV1(ProxiedAuthControl {
            critical: false,
            authorization_entry: None,
        })]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        assert_eq!(op.proxied_authorization_dn(), Some(&Dn::null()));
    }

    #[test]
    fn test_unknown_critical_control_unsupported() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = rename_alice_event().with_controls(vec![Control::Unknown(UnknownControl {
            oid: "1.2.3.4".to_string(),
            critical: true,
            payload: Vec::new(),
        })]);

        let op = server.modify_dn(event);

        assert_eq!(
            op.result_code(),
            Some(ResultCode::UnavailableCriticalExtension)
        );
        assert!(op.error_message().contains("1.2.3.4"));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_unknown_critical_control_supported_by_backend() {
        let be = user_backend();
        be.add_supported_control("1.2.3.4");
        let server = test_server(be.clone());
        let event = rename_alice_event().with_controls(vec![Control::Unknown(UnknownControl {
            oid: "1.2.3.4".to_string(),
            critical: true,
            payload: Vec::new(),
        })]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
    }

    #[test]
    fn test_unknown_noncritical_control_ignored() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = rename_alice_event().with_controls(vec![Control::Unknown(UnknownControl {
            oid: "1.2.3.4".to_string(),
            critical: false,
            payload: Vec::new(),
        })]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
    }

    #[test]
    fn test_recognized_oid_without_typed_decode_is_protocol_error() {
        let be = user_backend();
        let server = test_server(be.clone());
        let event = rename_alice_event().with_controls(vec![Control::Unknown(UnknownControl {
            oid: OID_LDAP_ASSERTION.to_string(),
            critical: true,
            payload: vec![0x30, 0x00],
        })]);

        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::ProtocolError));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_pre_op_plugin_modifications_applied() {
        let be = user_backend();
        let server = test_server(be.clone());
        server.plugins().register(Arc::new(DescriptionStamper));

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        let renamed = be
            .get(&dn("cn=allie,ou=people,dc=ex,dc=com"))
            .expect("renamed entry");
        assert!(renamed.has_attribute_value(ATTR_DESCRIPTION, "renamed"));
        assert_eq!(op.modifications().len(), 3);
    }

    #[test]
    fn test_pre_op_increment_applied() {
        let be = Arc::new(
            MemBackend::new("userRoot", &["dc=ex,dc=com"])
                .with_entry(people_entry())
                .with_entry(entry_init!(
                    "cn=alice,ou=people,dc=ex,dc=com",
                    (ATTR_OBJECTCLASS, "top", "person"),
                    ("cn", "alice"),
                    ("sn", "a"),
                    ("uidnumber", "100")
                )),
        );
        let server = test_server(be.clone());
        server.plugins().register(Arc::new(UidNumberIncrementer));

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        let renamed = be
            .get(&dn("cn=allie,ou=people,dc=ex,dc=com"))
            .expect("renamed entry");
        assert!(renamed.has_attribute_value("uidnumber", "110"));
    }

    #[test]
    fn test_pre_op_increment_missing_attribute() {
        let be = user_backend();
        let server = test_server(be.clone());
        server.plugins().register(Arc::new(UidNumberIncrementer));

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::NoSuchAttribute));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_pre_op_increment_multivalued_attribute_rejected() {
        let be = Arc::new(
            MemBackend::new("userRoot", &["dc=ex,dc=com"])
                .with_entry(people_entry())
                .with_entry(entry_init!(
                    "cn=alice,ou=people,dc=ex,dc=com",
                    (ATTR_OBJECTCLASS, "top", "person"),
                    ("cn", "alice"),
                    ("sn", "a"),
                    ("mail", "1", "2")
                )),
        );
        let server = test_server(be.clone());
        struct MailIncrementer;
        impl ModifyDnPlugin for MailIncrementer {
            fn id(&self) -> &'static str {
                "mail-incrementer"
            }
            fn pre_operation_modify_dn(&self, op: &mut ModifyDnOperation) -> PluginDirective {
                op.add_modification(m_increment(Attribute::single("mail", "1")));
                PluginDirective::Continue
            }
        }
        server.plugins().register(Arc::new(MailIncrementer));

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::ConstraintViolation));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_pre_op_skip_core_processing_still_runs_post_op() {
        let be = user_backend();
        let server = test_server(be.clone());
        let recorder = Arc::new(RecordingPlugin::default());
        server
            .plugins()
            .register(Arc::new(DirectivePlugin(PluginDirective::SkipCoreProcessing)));
        server.plugins().register(recorder.clone());

        let op = server.modify_dn(rename_alice_event());

        // The plugin owns the response here; the core records nothing.
        assert_eq!(op.result_code(), None);
        assert_eq!(be.rename_count(), 0);
        assert_eq!(recorder.post.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pre_op_send_response_immediately_skips_post_op() {
        let be = user_backend();
        let server = test_server(be.clone());
        let recorder = Arc::new(RecordingPlugin::default());
        server.plugins().register(Arc::new(DirectivePlugin(
            PluginDirective::SendResponseImmediately,
        )));
        server.plugins().register(recorder.clone());

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(be.rename_count(), 0);
        assert_eq!(recorder.post.load(Ordering::SeqCst), 0);
        assert!(op.skip_post_operation());
    }

    #[test]
    fn test_pre_op_connection_terminated() {
        let be = user_backend();
        let server = test_server(be.clone());
        let recorder = Arc::new(RecordingPlugin::default());
        let sync_recorder = Arc::new(RecordingSyncProvider::default());
        server.plugins().register(Arc::new(DirectivePlugin(
            PluginDirective::ConnectionTerminated,
        )));
        server.plugins().register(recorder.clone());
        server.sync_providers().register(sync_recorder.clone());

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Canceled));
        assert_eq!(be.rename_count(), 0);
        assert_eq!(recorder.post.load(Ordering::SeqCst), 0);
        // The cleanup block still ran its provider hooks.
        assert_eq!(sync_recorder.post.load(Ordering::SeqCst), 1);
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=alice,ou=people,dc=ex,dc=com"))
            .is_some());
    }

    #[test]
    fn test_sync_conflict_resolution_stops_without_core_error() {
        let be = user_backend();
        let server = test_server(be.clone());
        let sync_recorder = Arc::new(RecordingSyncProvider::default());
        server.sync_providers().register(Arc::new(ConflictStopper));
        server.sync_providers().register(sync_recorder.clone());

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Other));
        assert!(op.error_message().contains("replica"));
        assert_eq!(be.rename_count(), 0);
        // The stop ended the conflict walk before the second provider.
        assert_eq!(sync_recorder.conflict.load(Ordering::SeqCst), 0);
        // Cleanup still dispatched post-operation to every provider.
        assert_eq!(sync_recorder.post.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sync_post_operation_error_overwrites_success() {
        let be = user_backend();
        let server = test_server(be.clone());
        let sync_recorder = Arc::new(RecordingSyncProvider::default());
        server.sync_providers().register(Arc::new(FailingPostSync));
        server.sync_providers().register(sync_recorder.clone());

        let op = server.modify_dn(rename_alice_event());

        // The rename was durable, but the post-operation failure replaced
        // the response and stopped dispatch to later providers.
        assert_eq!(be.rename_count(), 1);
        assert_eq!(op.result_code(), Some(ResultCode::Other));
        assert!(op.error_message().contains("replication lag"));
        assert_eq!(sync_recorder.post.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_synchronization_operation_runs_post_sync_plugins() {
        let be = user_backend();
        let server = test_server(be.clone());
        let recorder = Arc::new(RecordingPlugin::default());
        server.plugins().register(recorder.clone());

        let event = ModifyDnEvent::new(
            Identity::synchronization(),
            dn("cn=alice,ou=people,dc=ex,dc=com"),
            rdn("cn=allie"),
            true,
        );
        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::Success));
        assert_eq!(recorder.pre.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.post.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.post_sync.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_change_listeners_notified_on_success() {
        let be = user_backend();
        let server = test_server(be.clone());
        let failing = Arc::new(RecordingListener::new(true));
        let recording = Arc::new(RecordingListener::new(false));
        server.change_listeners().register(failing.clone());
        server.change_listeners().register(recording.clone());

        let op = server.modify_dn(rename_alice_event());

        // A listener error is logged and suppressed, later listeners and
        // the result are unaffected.
        assert_eq!(op.result_code(), Some(ResultCode::Success));
        let seen = recording.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[(
                "cn=alice,ou=people,dc=ex,dc=com".to_string(),
                "cn=allie,ou=people,dc=ex,dc=com".to_string()
            )]
        );
    }

    #[test]
    fn test_change_listeners_not_notified_on_failure() {
        let be = user_backend();
        let server = test_server(be.clone());
        let recording = Arc::new(RecordingListener::new(false));
        server.change_listeners().register(recording.clone());

        let event = rename_alice_event().with_controls(vec![Control::Assertion(
            AssertionRequestControl {
                critical: true,
                filter: f_eq("cn", "carol"),
            },
        )]);
        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::AssertionFailed));
        assert!(recording.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_backend_rename_failure_sets_response_data() {
        let be = user_backend();
        be.fail_next_rename_with(DirectoryError::new(
            ResultCode::Busy,
            "backend busy".to_string(),
        ));
        let server = test_server(be.clone());

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Busy));
        assert!(op.error_message().contains("backend busy"));
        assert!(be.get(&dn("cn=alice,ou=people,dc=ex,dc=com")).is_some());
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=alice,ou=people,dc=ex,dc=com"))
            .is_some());
    }

    #[test]
    fn test_cancellation_during_commit_latches_too_late() {
        let be = user_backend();
        let server = test_server(be.clone());
        server
            .sync_providers()
            .register(Arc::new(CancelDuringPreOpSync));

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Canceled));
        // The cleanup block latches the cancel state: cancellation can no
        // longer be observed on the result.
        assert_eq!(op.cancel_result(), Some(CancelResult::TooLate));
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_undecodable_new_rdn_aborts_without_post_op() {
        let be = user_backend();
        let server = test_server(be.clone());
        let recorder = Arc::new(RecordingPlugin::default());
        server.plugins().register(recorder.clone());

        let mut event = rename_alice_event();
        event.new_rdn = None;
        let op = server.modify_dn(event);

        assert_eq!(op.result_code(), Some(ResultCode::ProtocolError));
        assert!(op.skip_post_operation());
        assert_eq!(recorder.post.load(Ordering::SeqCst), 0);
        assert_eq!(be.rename_count(), 0);
    }

    #[test]
    fn test_unacquirable_new_dn_lock_fails_and_releases_entry_lock() {
        let be = user_backend();
        let server = test_server(be.clone());
        let external = server
            .lock_manager()
            .try_write(&dn("cn=allie,ou=people,dc=ex,dc=com"))
            .expect("external lock");

        let op = server.modify_dn(rename_alice_event());

        assert_eq!(op.result_code(), Some(ResultCode::Other));
        assert!(op.skip_post_operation());
        assert_eq!(be.rename_count(), 0);
        // The first lock must not leak.
        assert!(server
            .lock_manager()
            .try_write(&dn("cn=alice,ou=people,dc=ex,dc=com"))
            .is_some());
        drop(external);
    }

    #[test]
    fn test_disjoint_renames_commute() {
        let seed = || {
            Arc::new(
                MemBackend::new("userRoot", &["dc=ex,dc=com"])
                    .with_entry(people_entry())
                    .with_entry(entry_init!(
                        "cn=a,ou=people,dc=ex,dc=com",
                        (ATTR_OBJECTCLASS, "top", "person"),
                        ("cn", "a"),
                        ("sn", "x")
                    ))
                    .with_entry(entry_init!(
                        "cn=b,ou=people,dc=ex,dc=com",
                        (ATTR_OBJECTCLASS, "top", "person"),
                        ("cn", "b"),
                        ("sn", "y")
                    )),
            )
        };
        let event_a = || {
            ModifyDnEvent::new_internal(dn("cn=a,ou=people,dc=ex,dc=com"), rdn("cn=a2"), true)
        };
        let event_b = || {
            ModifyDnEvent::new_internal(dn("cn=b,ou=people,dc=ex,dc=com"), rdn("cn=b2"), true)
        };

        // Serial reference execution.
        let serial_be = seed();
        let serial_server = test_server(serial_be.clone());
        assert_eq!(
            serial_server.modify_dn(event_a()).result_code(),
            Some(ResultCode::Success)
        );
        assert_eq!(
            serial_server.modify_dn(event_b()).result_code(),
            Some(ResultCode::Success)
        );
        let expected = serial_be.dns();

        // Concurrent execution on disjoint DN pairs.
        let be = seed();
        let server = test_server(be.clone());
        std::thread::scope(|scope| {
            let sa = &server;
            let sb = &server;
            let ha = scope.spawn(move || sa.modify_dn(event_a()).result_code());
            let hb = scope.spawn(move || sb.modify_dn(event_b()).result_code());
            assert_eq!(ha.join().expect("join a"), Some(ResultCode::Success));
            assert_eq!(hb.join().expect("join b"), Some(ResultCode::Success));
        });

        assert_eq!(be.dns(), expected);
    }
}
