//! Transaction wrapper for staged writes
//!
//! Every workflow stages its rows in one `Tx`. Nothing is visible to readers
//! until `commit`; dropping a `Tx` aborts it.

use heed::RwTxn;

use crate::db::{dbs, env, key, label_key, Dbs};
use crate::error::{err, Result, RolegateError};
use crate::model::{Attrs, ControllerResource, Permission, Role, Status, StatusKind, StatusRow};
use crate::read::{load_permission, load_role, load_status};

/// Transaction wrapper for staged writes
pub struct Tx {
    txn: Option<RwTxn<'static>>,
    dbs: &'static Dbs,
}

impl Tx {
    /// Open a write transaction
    #[inline]
    pub fn begin() -> Result<Self> {
        Ok(Tx {
            txn: Some(env()?.write_txn().map_err(err)?),
            dbs: dbs()?,
        })
    }

    #[inline]
    pub(crate) fn tx(&mut self) -> &mut RwTxn<'static> {
        // Only `commit` takes the transaction, and it consumes `self`.
        self.txn.as_mut().expect("transaction already committed")
    }

    #[inline]
    pub(crate) fn dbs(&self) -> &'static Dbs {
        self.dbs
    }

    /// Commit every staged write
    #[inline]
    pub fn commit(mut self) -> Result<()> {
        match self.txn.take() {
            Some(txn) => txn.commit().map_err(err),
            None => Ok(()),
        }
    }

    /// Allocate the next record id (shared by statuses and permissions)
    pub fn alloc_id(&mut self) -> Result<u64> {
        let d = self.dbs;
        let id = d.meta
            .get(self.tx(), "next_id")
            .map_err(err)?
            .and_then(|s| s.parse().ok())
            .unwrap_or(1u64);
        d.meta.put(self.tx(), "next_id", &(id + 1).to_string()).map_err(err)?;
        Ok(id)
    }

    /// Is the named meta flag set?
    pub fn flag(&mut self, name: &str) -> Result<bool> {
        let d = self.dbs;
        Ok(d.meta.get(self.tx(), name).map_err(err)?.is_some())
    }

    pub fn set_flag(&mut self, name: &str) -> Result<()> {
        let d = self.dbs;
        d.meta.put(self.tx(), name, "1").map_err(err)
    }

    /// Load a status of either kind
    pub fn status(&mut self, id: u64) -> Result<Option<Status>> {
        let d = self.dbs;
        load_status(d, self.tx(), id)
    }

    /// Load a role with its permissions; `None` if missing or not a role
    pub fn role(&mut self, id: u64) -> Result<Option<Role>> {
        let d = self.dbs;
        load_role(d, self.tx(), id)
    }

    /// Find a status id by kind and label
    pub fn find_id(&mut self, kind: StatusKind, label: &str) -> Result<Option<u64>> {
        let d = self.dbs;
        d.labels.get(self.tx(), &label_key(kind, label)).map_err(err)
    }

    /// Write a status row, keeping the (kind, label) index unique.
    /// Fails with `AlreadyExists` when another status of the same kind owns the label.
    pub fn put_status(&mut self, id: u64, kind: StatusKind, attrs: &Attrs) -> Result<()> {
        let d = self.dbs;
        if let Some(owner) = self.find_id(kind, &attrs.label)? {
            if owner != id {
                return Err(RolegateError::AlreadyExists(format!("label '{}'", attrs.label)));
            }
        }
        if let Some(old) = self.status(id)? {
            if old.kind() != kind {
                return Err(RolegateError::Corrupted(format!("status {} changed kind", id)));
            }
            if old.attrs().label != attrs.label {
                d.labels.delete(self.tx(), &label_key(kind, &old.attrs().label)).map_err(err)?;
            }
        }
        let row = StatusRow { kind, attrs: attrs.clone() };
        let json = serde_json::to_string(&row).map_err(err)?;
        d.statuses.put(self.tx(), &id, &json).map_err(err)?;
        d.labels.put(self.tx(), &label_key(kind, &attrs.label), &id).map_err(err)
    }

    /// Persist a role's own row (permissions are written separately)
    pub fn put_role(&mut self, role: &Role) -> Result<()> {
        self.put_status(role.id, StatusKind::Role, &role.attrs)
    }

    /// Create a controller resource with default display attributes
    pub fn insert_controller(&mut self, label: &str) -> Result<ControllerResource> {
        let id = self.alloc_id()?;
        let controller = ControllerResource { id, attrs: Attrs::new(label) };
        self.put_status(id, StatusKind::Controller, &controller.attrs)?;
        Ok(controller)
    }

    /// Permission for a (role, controller) pair
    pub fn permission(&mut self, role: u64, controller: u64) -> Result<Option<Permission>> {
        let d = self.dbs;
        load_permission(d, self.tx(), role, controller)
    }

    /// Write a permission row; the (role, controller) key keeps it unique
    pub fn put_permission(&mut self, p: &Permission) -> Result<()> {
        let d = self.dbs;
        d.perms.put(self.tx(), p.role, p.controller, p.access)?;
        d.perm_ids.put(self.tx(), &key(p.role, p.controller), &p.id).map_err(err)
    }

    /// Replace the access mask of an existing permission.
    /// Returns false when the pair has no permission row.
    pub fn set_access(&mut self, role: u64, controller: u64, access: u64) -> Result<bool> {
        let d = self.dbs;
        if d.perms.get(self.tx(), role, controller)?.is_none() {
            return Ok(false);
        }
        d.perms.put(self.tx(), role, controller, access)?;
        Ok(true)
    }

    /// Delete a role, its label index entry and all its permissions.
    /// Controller resources are left untouched.
    pub fn delete_role(&mut self, id: u64) -> Result<bool> {
        let d = self.dbs;
        let role = match self.status(id)? {
            Some(Status::Role(role)) => role,
            _ => return Ok(false),
        };
        for (controller, _) in d.perms.list_fwd(self.tx(), id)? {
            d.perms.del(self.tx(), id, controller)?;
            d.perm_ids.delete(self.tx(), &key(id, controller)).map_err(err)?;
        }
        d.labels.delete(self.tx(), &label_key(StatusKind::Role, role.label())).map_err(err)?;
        d.statuses.delete(self.tx(), &id).map_err(err)
    }
}

/// Run multiple operations in a single transaction
#[inline]
pub fn transact<T, F: FnOnce(&mut Tx) -> Result<T>>(f: F) -> Result<T> {
    let mut tx = Tx::begin()?;
    let r = f(&mut tx)?;
    tx.commit()?;
    Ok(r)
}
