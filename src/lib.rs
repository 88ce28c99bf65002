//! Rolegate - role administration over a synchronized role/controller access matrix
//!
//! Roles and controller resources are two kinds of one status record. Every
//! role holds exactly one permission (an access bitmask) per registered
//! controller; the `admin` role always holds all of them.

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod csrf;
pub mod db;
pub mod error;
pub mod form;
pub mod model;
pub mod read;
pub mod registry;
pub mod rights;
pub mod roles;
pub mod sync;
pub mod tx;

#[cfg(feature = "server")]
pub mod server;

pub use bootstrap::{bootstrap, is_bootstrapped, Bootstrap};
pub use config::Settings;
pub use constants::*;
pub use csrf::{delete_intent, CsrfTokens};
pub use db::{clear_all, init, test_lock};
pub use error::{RolegateError, Result};
pub use form::RoleForm;
pub use model::{Attrs, ControllerResource, Permission, Role, Status, StatusKind};
pub use read::{
    find_controller, find_default_user_role, find_role, get_access, get_role, get_status,
    list_controllers, list_for_controller, list_roles, list_roles_by_active,
};
pub use registry::ControllerRegistry;
pub use rights::{check_rights, effective_access, has_rights};
pub use roles::FormOutcome;
pub use sync::synchronize;
pub use tx::{transact, Tx};
