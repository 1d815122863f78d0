//! Parsing of join/leave request bodies.

use serde_json::Value;

use crate::error::HubError;

/// The `(parent, user)` pair named by a join/leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipRequest {
    pub parent_id: u64,
    pub user_id: u64,
}

impl MembershipRequest {
    /// Read `parent_field` and `userId` from a JSON body.
    ///
    /// Ids may be JSON integers or numeric strings. The parent field is
    /// checked first.
    pub fn from_json(body: &Value, parent_field: &str) -> Result<Self, HubError> {
        if !body.is_object() {
            return Err(HubError::Validation(
                "request body must be a JSON object".into(),
            ));
        }

        Ok(Self {
            parent_id: id_field(body, parent_field)?,
            user_id: id_field(body, "userId")?,
        })
    }
}

/// Read one required integer id from a JSON object.
pub fn id_field(body: &Value, field: &str) -> Result<u64, HubError> {
    let invalid = || HubError::Validation(format!("{} must be an integer id", field));

    match body.get(field) {
        None | Some(Value::Null) => Err(HubError::Validation(format!("{} is required", field))),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(HubError::Validation(format!("{} is required", field)))
        }
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
