//! Bootstrap and system initialization

use crate::constants::{ADMIN_LABEL, DEFAULT_USER_ROLE};
use crate::db::read;
use crate::error::{err, Result, RolegateError};
use crate::model::{Role, StatusKind};
use crate::registry::ControllerRegistry;
use crate::sync::synchronize;
use crate::tx::{transact, Tx};

/// Roles created by `bootstrap`
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub admin: Role,
    pub user: Role,
}

/// Meta key set once `bootstrap` has committed
const BOOTSTRAPPED: &str = "bootstrapped";

/// Check if bootstrapped. Renaming or deleting `admin` afterwards does not
/// reset this, so a restart never seeds a second admin.
pub fn is_bootstrapped() -> Result<bool> {
    read(|d, tx| Ok(d.meta.get(tx, BOOTSTRAPPED).map_err(err)?.is_some()))
}

fn seed(tx: &mut Tx, label: &str, registry: &ControllerRegistry) -> Result<Role> {
    let mut role = Role::draft(tx.alloc_id()?);
    role.attrs.label = label.to_string();
    synchronize(tx, &mut role, registry)?;
    tx.put_role(&role)?;
    Ok(role)
}

/// Create the `admin` role (full access on every registered controller) and
/// the `ROLE_USER` default role (no access).
pub fn bootstrap(registry: &ControllerRegistry) -> Result<Bootstrap> {
    let b = transact(|tx| {
        if tx.flag(BOOTSTRAPPED)? || tx.find_id(StatusKind::Role, ADMIN_LABEL)?.is_some() {
            return Err(RolegateError::AlreadyBootstrapped);
        }
        let admin = seed(tx, ADMIN_LABEL, registry)?;
        let user = match tx.find_id(StatusKind::Role, DEFAULT_USER_ROLE)? {
            Some(id) => {
                let mut user = tx.role(id)?.ok_or_else(|| RolegateError::Corrupted(format!("role {}", id)))?;
                synchronize(tx, &mut user, registry)?;
                user
            }
            None => seed(tx, DEFAULT_USER_ROLE, registry)?,
        };
        tx.set_flag(BOOTSTRAPPED)?;
        Ok(Bootstrap { admin, user })
    })?;
    tracing::info!(admin = b.admin.id, user = b.user.id, controllers = registry.len(), "bootstrapped");
    Ok(b)
}
