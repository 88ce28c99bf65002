//! Controller-resource registry: the configured, ordered set of protectable names

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ControllerResource, Status, StatusKind};
use crate::tx::Tx;

/// Ordered controller names. Blank names and repeats are dropped, first
/// occurrence wins, so iteration order is the configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ControllerRegistry {
    names: Vec<String>,
}

impl ControllerRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut r = ControllerRegistry { names: Vec::new() };
        for name in names {
            let name: String = name.into();
            let name = name.trim();
            if !name.is_empty() && !r.contains(name) {
                r.names.push(name.to_string());
            }
        }
        r
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Existing controller resource for `name`, or a new one with default
    /// display attributes. Idempotent: keyed on (controller kind, label).
    pub fn resolve(tx: &mut Tx, name: &str) -> Result<ControllerResource> {
        if let Some(id) = tx.find_id(StatusKind::Controller, name)? {
            if let Some(Status::Controller(c)) = tx.status(id)? {
                return Ok(c);
            }
        }
        let c = tx.insert_controller(name)?;
        tracing::debug!(id = c.id, name, "controller resource created");
        Ok(c)
    }
}

impl From<Vec<String>> for ControllerRegistry {
    fn from(names: Vec<String>) -> Self {
        ControllerRegistry::new(names)
    }
}

impl From<ControllerRegistry> for Vec<String> {
    fn from(r: ControllerRegistry) -> Self {
        r.names
    }
}
