//! Role lifecycle operations
//!
//! Every operation takes the acting role first and checks its rights on the
//! role screen's own controller resource before touching anything.

use crate::constants::{Capability, ADMIN_LABEL, ALL, ROLE_CONTROLLER};
use crate::csrf::{delete_intent, CsrfTokens};
use crate::error::{Result, RolegateError};
use crate::form::RoleForm;
use crate::model::{Permission, Role, StatusKind};
use crate::read::{get_role, list_roles};
use crate::registry::ControllerRegistry;
use crate::rights::check_rights;
use crate::sync::synchronize;
use crate::tx::Tx;

/// Result of a create or edit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Nothing submitted: the synchronized role, for display. Not persisted.
    Form(Role),
    /// Submission rejected. The role keeps its bound fields and synchronized
    /// permissions for redisplay; nothing was persisted.
    Invalid { role: Role, errors: Vec<String> },
    /// Submission persisted
    Saved(Role),
}

impl FormOutcome {
    pub fn role(&self) -> &Role {
        match self {
            FormOutcome::Form(r) | FormOutcome::Saved(r) => r,
            FormOutcome::Invalid { role, .. } => role,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, FormOutcome::Saved(_))
    }
}

fn role_not_found(id: u64) -> RolegateError {
    RolegateError::NotFound(format!("role {}", id))
}

/// All roles. Requires `View`.
pub fn list(actor: u64) -> Result<Vec<Role>> {
    check_rights(actor, ROLE_CONTROLLER, Capability::View)?;
    list_roles()
}

/// One role by id. Requires `View`.
pub fn show(actor: u64, id: u64) -> Result<Role> {
    check_rights(actor, ROLE_CONTROLLER, Capability::View)?;
    get_role(id)?.ok_or_else(|| role_not_found(id))
}

/// New role from an optional submission. Requires `Create`.
pub fn create(actor: u64, registry: &ControllerRegistry, submission: Option<&RoleForm>) -> Result<FormOutcome> {
    check_rights(actor, ROLE_CONTROLLER, Capability::Create)?;
    let mut tx = Tx::begin()?;
    let role = Role::draft(tx.alloc_id()?);
    submit(tx, role, registry, submission)
}

/// Edit a role from an optional submission, backfilling newly registered
/// controllers. Requires `Edit`.
pub fn edit(actor: u64, registry: &ControllerRegistry, id: u64, submission: Option<&RoleForm>) -> Result<FormOutcome> {
    check_rights(actor, ROLE_CONTROLLER, Capability::Edit)?;
    let mut tx = Tx::begin()?;
    let role = tx.role(id)?.ok_or_else(|| role_not_found(id))?;
    submit(tx, role, registry, submission)
}

/// Bind, synchronize, validate and persist. Dropping `tx` without commit
/// discards every staged row.
fn submit(mut tx: Tx, mut role: Role, registry: &ControllerRegistry, submission: Option<&RoleForm>) -> Result<FormOutcome> {
    if let Some(form) = submission {
        form.bind(&mut role);
    }
    synchronize(&mut tx, &mut role, registry)?;

    let Some(form) = submission else {
        return Ok(FormOutcome::Form(role));
    };
    let mut errors = form.errors();
    if role.is_admin() && !role.attrs.active {
        errors.push(format!("active: the {} role cannot be deactivated", ADMIN_LABEL));
        errors.sort();
    }
    if !errors.is_empty() {
        return Ok(FormOutcome::Invalid { role, errors });
    }
    match tx.put_role(&role) {
        Ok(()) => {}
        Err(RolegateError::AlreadyExists(_)) => {
            let errors = vec![format!("label: '{}' is already in use", role.label())];
            return Ok(FormOutcome::Invalid { role, errors });
        }
        Err(e) => return Err(e),
    }
    tx.commit()?;
    tracing::info!(id = role.id, label = role.label(), permissions = role.permissions.len(), "role saved");
    Ok(FormOutcome::Saved(role))
}

/// Delete a role and its permissions when `token` matches the role's delete
/// token. A mismatch deletes nothing and is not an error. The `admin` role
/// is refused with `Validation`. Requires `Delete`.
pub fn delete(actor: u64, csrf: &CsrfTokens, id: u64, token: &str) -> Result<bool> {
    check_rights(actor, ROLE_CONTROLLER, Capability::Delete)?;
    let mut tx = Tx::begin()?;
    let role = tx.role(id)?.ok_or_else(|| role_not_found(id))?;
    if !csrf.verify(&delete_intent(id), token) {
        tracing::warn!(id, actor, "role delete rejected: invalid csrf token");
        return Ok(false);
    }
    if role.is_admin() {
        return Err(RolegateError::Validation(format!("the {} role cannot be deleted", ADMIN_LABEL)));
    }
    let deleted = tx.delete_role(id)?;
    tx.commit()?;
    tracing::info!(id, actor, "role deleted");
    Ok(deleted)
}

/// Replace the access mask a role holds on one controller. Bits outside
/// `ALL` are dropped. The `admin` role always holds `ALL` and is refused
/// with `Validation`. Requires `Edit`.
pub fn set_access(actor: u64, id: u64, controller: &str, access: u64) -> Result<Permission> {
    check_rights(actor, ROLE_CONTROLLER, Capability::Edit)?;
    let mut tx = Tx::begin()?;
    let role = tx.role(id)?.ok_or_else(|| role_not_found(id))?;
    if role.is_admin() {
        return Err(RolegateError::Validation(format!("access of the {} role cannot be changed", ADMIN_LABEL)));
    }
    let controller_id = tx
        .find_id(StatusKind::Controller, controller)?
        .ok_or_else(|| RolegateError::NotFound(format!("controller {}", controller)))?;
    if !tx.set_access(id, controller_id, access & ALL)? {
        return Err(RolegateError::NotFound(format!("permission of role {} on {}", id, controller)));
    }
    let permission = tx
        .permission(id, controller_id)?
        .ok_or_else(|| RolegateError::Corrupted(format!("permission {}/{} vanished", id, controller_id)))?;
    tx.commit()?;
    tracing::info!(id, controller, access = permission.access, "permission access updated");
    Ok(permission)
}
