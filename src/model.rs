//! Status records: roles, controller resources and the permissions joining them
//!
//! Both kinds of status share one table and one set of display attributes.
//! In memory they are distinct types, so a permission can only ever be built
//! from a role on one side and a controller resource on the other.

use serde::{Deserialize, Serialize};

use crate::constants::{Capability, ADMIN_LABEL, DEFAULT_COLOR, ICON_PREFIXES, NONE};

/// Discriminant stored with every status row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Role,
    Controller,
}

impl StatusKind {
    /// Leading byte of label index keys
    #[inline]
    pub(crate) const fn tag(self) -> u8 {
        match self {
            StatusKind::Role => 1,
            StatusKind::Controller => 2,
        }
    }
}

/// Display attributes common to both status kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attrs {
    pub label: String,
    pub color: String,
    pub icon: String,
    pub active: bool,
}

impl Attrs {
    pub fn new(label: impl Into<String>) -> Self {
        Attrs {
            label: label.into(),
            color: DEFAULT_COLOR.to_string(),
            icon: String::new(),
            active: true,
        }
    }

    /// Colour as a CSS hex value
    pub fn full_color(&self) -> String {
        format!("#{}", self.color)
    }

    /// Icon markup for the known icon font prefixes, empty otherwise
    pub fn full_icon(&self) -> String {
        ICON_PREFIXES
            .iter()
            .find(|p| self.icon.starts_with(*p))
            .map(|p| format!("<i class='{} {}'> </i>", p, self.icon))
            .unwrap_or_default()
    }
}

impl Default for Attrs {
    fn default() -> Self {
        Attrs::new("")
    }
}

/// Stored form of a status: kind + attributes, keyed by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StatusRow {
    pub kind: StatusKind,
    #[serde(flatten)]
    pub attrs: Attrs,
}

/// Access grant linking one role to one controller resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: u64,
    pub role: u64,
    pub controller: u64,
    pub controller_label: String,
    pub access: u64,
}

impl Permission {
    /// New permission with no access
    pub fn new(id: u64, role: &Role, controller: &ControllerResource) -> Self {
        Permission {
            id,
            role: role.id,
            controller: controller.id,
            controller_label: controller.attrs.label.clone(),
            access: NONE,
        }
    }

    #[inline]
    pub fn grants(&self, cap: Capability) -> bool {
        cap.granted_by(self.access)
    }
}

/// A named actor class that participates in capability checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    #[serde(flatten)]
    pub attrs: Attrs,
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Fresh role with default attributes and no permissions
    pub fn draft(id: u64) -> Self {
        Role { id, attrs: Attrs::default(), permissions: Vec::new() }
    }

    pub fn label(&self) -> &str {
        &self.attrs.label
    }

    pub fn is_admin(&self) -> bool {
        self.attrs.label == ADMIN_LABEL
    }

    /// Attach a permission. An entry for the same controller is replaced,
    /// so attaching twice never duplicates.
    pub fn attach(&mut self, permission: Permission) {
        debug_assert_eq!(permission.role, self.id);
        match self.permissions.iter_mut().find(|p| p.controller == permission.controller) {
            Some(existing) => *existing = permission,
            None => self.permissions.push(permission),
        }
    }

    /// Permission held on a controller resource, by controller id
    pub fn permission(&self, controller: u64) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.controller == controller)
    }
}

/// A named protectable resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerResource {
    pub id: u64,
    #[serde(flatten)]
    pub attrs: Attrs,
}

/// Either kind of status record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Role(Role),
    Controller(ControllerResource),
}

impl Status {
    pub(crate) fn from_row(id: u64, row: StatusRow) -> Self {
        match row.kind {
            StatusKind::Role => Status::Role(Role { id, attrs: row.attrs, permissions: Vec::new() }),
            StatusKind::Controller => Status::Controller(ControllerResource { id, attrs: row.attrs }),
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Status::Role(r) => r.id,
            Status::Controller(c) => c.id,
        }
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            Status::Role(_) => StatusKind::Role,
            Status::Controller(_) => StatusKind::Controller,
        }
    }

    pub fn attrs(&self) -> &Attrs {
        match self {
            Status::Role(r) => &r.attrs,
            Status::Controller(c) => &c.attrs,
        }
    }
}
