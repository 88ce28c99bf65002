//! Access bits, capabilities and reserved labels

use serde::{Deserialize, Serialize};

// Access bit constants
pub const NONE: u64 = 0;
pub const VIEW: u64 = 1;
pub const CREATE: u64 = 1 << 1;
pub const EDIT: u64 = 1 << 2;
pub const DELETE: u64 = 1 << 3;
pub const ALL: u64 = VIEW | CREATE | EDIT | DELETE;

// Reserved labels
pub const ADMIN_LABEL: &str = "admin";
pub const DEFAULT_USER_ROLE: &str = "ROLE_USER";

/// Controller resource guarding the role screen itself
pub const ROLE_CONTROLLER: &str = "RoleController";

// Display defaults
pub const DEFAULT_COLOR: &str = "000000";
pub const ICON_PREFIXES: &[&str] = &["bi", "fa"];

// Hex digits accepted for a colour
pub const MIN_COLOR_LEN: usize = 3;
pub const MAX_COLOR_LEN: usize = 8;

/// A single operation a permission can grant. `All` satisfies every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    View,
    Create,
    Edit,
    Delete,
    All,
}

impl Capability {
    pub const fn bits(self) -> u64 {
        match self {
            Capability::View => VIEW,
            Capability::Create => CREATE,
            Capability::Edit => EDIT,
            Capability::Delete => DELETE,
            Capability::All => ALL,
        }
    }

    /// Does `access` grant this capability?
    #[inline]
    pub const fn granted_by(self, access: u64) -> bool {
        access & self.bits() == self.bits()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Capability::View => "view",
            Capability::Create => "create",
            Capability::Edit => "edit",
            Capability::Delete => "delete",
            Capability::All => "all",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// Access name mappings
const ACCESS: &[(&str, u64)] = &[
    ("view", VIEW),
    ("create", CREATE),
    ("edit", EDIT),
    ("delete", DELETE),
];

/// Convert an access mask to a list of access names
pub fn access_to_names(mask: u64) -> Vec<&'static str> {
    ACCESS
        .iter()
        .filter(|(_, b)| mask & b == *b)
        .map(|(n, _)| *n)
        .collect()
}

/// Convert a list of access names to a mask. `all` expands to every bit,
/// unknown names are ignored.
pub fn names_to_access(names: &[&str]) -> u64 {
    names
        .iter()
        .filter_map(|n| match n.trim() {
            "all" => Some(ALL),
            n => ACCESS.iter().find(|(k, _)| *k == n).map(|(_, v)| *v),
        })
        .fold(NONE, |a, b| a | b)
}
