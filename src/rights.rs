//! Capability checks for the acting role

use crate::constants::{Capability, NONE};
use crate::db::{label_key, read};
use crate::error::{err, Result, RolegateError};
use crate::model::{Status, StatusKind};
use crate::read::load_status;

/// Effective access of `role` on the named controller. Unknown or inactive
/// roles and unknown controllers get no access.
pub fn effective_access(role: u64, controller: &str) -> Result<u64> {
    read(|d, tx| {
        match load_status(d, tx, role)? {
            Some(Status::Role(r)) if r.attrs.active => {}
            _ => return Ok(NONE),
        }
        match d.labels.get(tx, &label_key(StatusKind::Controller, controller)).map_err(err)? {
            Some(c) => Ok(d.perms.get(tx, role, c)?.unwrap_or(NONE)),
            None => Ok(NONE),
        }
    })
}

/// Does `role` hold `required` on the named controller?
#[inline]
pub fn has_rights(role: u64, controller: &str, required: Capability) -> Result<bool> {
    Ok(required.granted_by(effective_access(role, controller)?))
}

/// Fail with `Forbidden` unless `role` holds `required` on the named controller
pub fn check_rights(role: u64, controller: &str, required: Capability) -> Result<()> {
    if has_rights(role, controller, required)? {
        Ok(())
    } else {
        tracing::debug!(role, controller, %required, "access denied");
        Err(RolegateError::Forbidden {
            role,
            controller: controller.to_string(),
            required: required.to_string(),
        })
    }
}
