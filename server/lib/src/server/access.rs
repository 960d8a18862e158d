//! The access control decision point. Evaluation of the actual policy - ACI
//! parsing, effective rights - lives outside this core; the write path asks
//! two questions and honours the answers.

use crate::controls::Control;
use crate::dn::Dn;
use crate::server::modify_dn::ModifyDnOperation;

pub trait AccessControlHandler: Send + Sync {
    /// May this operation rename its target entry?
    fn is_allowed(&self, op: &ModifyDnOperation) -> bool;

    /// May this operation use the given request control?
    fn is_control_allowed(&self, dn: &Dn, op: &ModifyDnOperation, control: &Control) -> bool;
}

/// The default handler: policy enforcement disabled.
pub struct AllowAllAccessHandler;

impl AccessControlHandler for AllowAllAccessHandler {
    fn is_allowed(&self, _op: &ModifyDnOperation) -> bool {
        true
    }

    fn is_control_allowed(&self, _dn: &Dn, _op: &ModifyDnOperation, _control: &Control) -> bool {
        true
    }
}
