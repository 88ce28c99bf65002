//! Role form binding and validation

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::constants::{DEFAULT_COLOR, MAX_COLOR_LEN, MIN_COLOR_LEN};
use crate::model::Role;

/// Fields a user may submit for a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RoleForm {
    #[validate(length(min = 1, max = 50, message = "label must be between 1 and 50 characters"))]
    pub label: String,

    #[serde(default = "default_color")]
    #[validate(custom(function = "validate_color"))]
    pub color: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "icon must be at most 100 characters"))]
    pub icon: String,

    /// Checkbox semantics: absent means unchecked
    #[serde(default, deserialize_with = "checkbox")]
    pub active: bool,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    let hex = color.len() >= MIN_COLOR_LEN
        && color.len() <= MAX_COLOR_LEN
        && color.chars().all(|c| c.is_ascii_hexdigit());
    if hex {
        Ok(())
    } else {
        let mut e = ValidationError::new("color");
        e.message = Some(format!("color must be {}-{} hex digits", MIN_COLOR_LEN, MAX_COLOR_LEN).into());
        Err(e)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Checkbox {
    Flag(bool),
    Text(String),
}

fn checkbox<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Option::<Checkbox>::deserialize(d)? {
        None => false,
        Some(Checkbox::Flag(b)) => b,
        Some(Checkbox::Text(s)) => !matches!(s.trim(), "" | "0" | "false" | "off"),
    })
}

impl RoleForm {
    /// Form pre-filled from a role's current attributes
    pub fn from_role(role: &Role) -> Self {
        RoleForm {
            label: role.attrs.label.clone(),
            color: role.attrs.color.clone(),
            icon: role.attrs.icon.clone(),
            active: role.attrs.active,
        }
    }

    /// Copy the submitted fields onto a role
    pub fn bind(&self, role: &mut Role) {
        role.attrs.label = self.label.trim().to_string();
        role.attrs.color = self.color.trim().trim_start_matches('#').to_string();
        role.attrs.icon = self.icon.trim().to_string();
        role.attrs.active = self.active;
    }

    /// Field errors as "field: message" lines; empty when the form is valid
    pub fn errors(&self) -> Vec<String> {
        let mut bound = Role::draft(0);
        self.bind(&mut bound);
        match RoleForm::from_role(&bound).validate() {
            Ok(()) => Vec::new(),
            Err(e) => format_errors(&e),
        }
    }
}

fn format_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut r: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for '{}'", field));
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    r.sort();
    r
}
