//! Role synchronization against the controller registry

use crate::constants::ALL;
use crate::error::Result;
use crate::model::{Permission, Role};
use crate::registry::ControllerRegistry;
use crate::tx::Tx;

/// Give `role` exactly one permission per registered controller.
///
/// Missing controllers and permissions are created (no access) in `tx`;
/// existing permissions keep their access, except on the `admin` role where
/// every permission is forced to `ALL`. Each permission is written and
/// attached to `role` in registry order. Returns the number of permissions
/// created.
pub fn synchronize(tx: &mut Tx, role: &mut Role, registry: &ControllerRegistry) -> Result<usize> {
    let admin = role.is_admin();
    let mut created = 0;
    for name in registry.iter() {
        let controller = ControllerRegistry::resolve(tx, name)?;
        let mut permission = match tx.permission(role.id, controller.id)? {
            Some(p) => p,
            None => {
                created += 1;
                Permission::new(tx.alloc_id()?, role, &controller)
            }
        };
        if admin {
            permission.access = ALL;
        }
        tx.put_permission(&permission)?;
        role.attach(permission);
    }
    tracing::debug!(role = role.id, created, admin, "role synchronized");
    Ok(created)
}
