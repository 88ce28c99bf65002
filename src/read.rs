//! Read operations (no permission checks, direct LMDB access)

use heed::RoTxn;

use crate::constants::DEFAULT_USER_ROLE;
use crate::db::{key, label_key, read, Dbs};
use crate::error::{err, Result, RolegateError};
use crate::model::{ControllerResource, Permission, Role, Status, StatusKind, StatusRow};

fn decode(id: u64, json: &str) -> Result<StatusRow> {
    serde_json::from_str(json).map_err(|e| RolegateError::Corrupted(format!("status {}: {}", id, e)))
}

pub(crate) fn load_status(d: &Dbs, tx: &RoTxn, id: u64) -> Result<Option<Status>> {
    match d.statuses.get(tx, &id).map_err(err)? {
        Some(json) => Ok(Some(Status::from_row(id, decode(id, json)?))),
        None => Ok(None),
    }
}

pub(crate) fn load_permission(d: &Dbs, tx: &RoTxn, role: u64, controller: u64) -> Result<Option<Permission>> {
    let Some(access) = d.perms.get(tx, role, controller)? else {
        return Ok(None);
    };
    let id = d.perm_ids
        .get(tx, &key(role, controller))
        .map_err(err)?
        .ok_or_else(|| RolegateError::Corrupted(format!("permission {}/{} has no id", role, controller)))?;
    let controller_label = match load_status(d, tx, controller)? {
        Some(Status::Controller(c)) => c.attrs.label,
        _ => return Err(RolegateError::Corrupted(format!("permission {}/{} points at no controller", role, controller))),
    };
    Ok(Some(Permission { id, role, controller, controller_label, access }))
}

/// Permissions of a role, ordered by permission id (creation order)
pub(crate) fn load_permissions(d: &Dbs, tx: &RoTxn, role: u64) -> Result<Vec<Permission>> {
    let mut r = Vec::new();
    for (controller, _) in d.perms.list_fwd(tx, role)? {
        if let Some(p) = load_permission(d, tx, role, controller)? {
            r.push(p);
        }
    }
    r.sort_by_key(|p| p.id);
    Ok(r)
}

pub(crate) fn load_role(d: &Dbs, tx: &RoTxn, id: u64) -> Result<Option<Role>> {
    match load_status(d, tx, id)? {
        Some(Status::Role(mut role)) => {
            role.permissions = load_permissions(d, tx, id)?;
            Ok(Some(role))
        }
        _ => Ok(None),
    }
}

fn find_id(d: &Dbs, tx: &RoTxn, kind: StatusKind, label: &str) -> Result<Option<u64>> {
    d.labels.get(tx, &label_key(kind, label)).map_err(err)
}

fn scan(d: &Dbs, tx: &RoTxn) -> Result<Vec<Status>> {
    let mut r = Vec::new();
    for item in d.statuses.iter(tx).map_err(err)? {
        let (id, json) = item.map_err(err)?;
        r.push(Status::from_row(id, decode(id, json)?));
    }
    Ok(r)
}

/// Get a status of either kind
pub fn get_status(id: u64) -> Result<Option<Status>> {
    read(|d, tx| load_status(d, tx, id))
}

/// Get a role with its permissions. `None` for unknown ids and controller ids.
pub fn get_role(id: u64) -> Result<Option<Role>> {
    read(|d, tx| load_role(d, tx, id))
}

/// Find a role by label
pub fn find_role(label: &str) -> Result<Option<Role>> {
    read(|d, tx| match find_id(d, tx, StatusKind::Role, label)? {
        Some(id) => load_role(d, tx, id),
        None => Ok(None),
    })
}

/// Find a controller resource by label
pub fn find_controller(label: &str) -> Result<Option<ControllerResource>> {
    read(|d, tx| match find_id(d, tx, StatusKind::Controller, label)? {
        Some(id) => match load_status(d, tx, id)? {
            Some(Status::Controller(c)) => Ok(Some(c)),
            _ => Ok(None),
        },
        None => Ok(None),
    })
}

/// The role given to actors with no explicit role
pub fn find_default_user_role() -> Result<Option<Role>> {
    find_role(DEFAULT_USER_ROLE)
}

/// All roles with their permissions, by id
pub fn list_roles() -> Result<Vec<Role>> {
    read(|d, tx| {
        let mut r = Vec::new();
        for status in scan(d, tx)? {
            if let Status::Role(mut role) = status {
                role.permissions = load_permissions(d, tx, role.id)?;
                r.push(role);
            }
        }
        Ok(r)
    })
}

/// Roles filtered by their active flag
pub fn list_roles_by_active(active: bool) -> Result<Vec<Role>> {
    Ok(list_roles()?.into_iter().filter(|r| r.attrs.active == active).collect())
}

/// All controller resources, by id
pub fn list_controllers() -> Result<Vec<ControllerResource>> {
    read(|d, tx| {
        Ok(scan(d, tx)?
            .into_iter()
            .filter_map(|s| match s {
                Status::Controller(c) => Some(c),
                Status::Role(_) => None,
            })
            .collect())
    })
}

/// Access mask a role holds on a controller (0 when there is no permission row)
pub fn get_access(role: u64, controller: &str) -> Result<u64> {
    read(|d, tx| match find_id(d, tx, StatusKind::Controller, controller)? {
        Some(c) => Ok(d.perms.get(tx, role, c)?.unwrap_or(0)),
        None => Ok(0),
    })
}

/// Roles holding a permission row on a controller: (role, access)
pub fn list_for_controller(controller: u64) -> Result<Vec<(u64, u64)>> {
    read(|d, tx| d.perms.list_rev(tx, controller))
}
