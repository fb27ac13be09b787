//! The structured result returned by every mutating operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorKind;

/// What a caller gets back from a mutation: never a fault, always something
/// to branch on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
  pub message: String,
  pub success: bool,
  /// Identifier of the created record, on success.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:      Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:   Option<ErrorKind>,
}

impl Outcome {
  pub fn success(message: impl Into<String>, id: Uuid) -> Self {
    Self {
      message: message.into(),
      success: true,
      id:      Some(id),
      error:   None,
    }
  }

  pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      success: false,
      id:      None,
      error:   Some(kind),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn failure_serialises_kind_and_omits_id() {
    let outcome = Outcome::failure(ErrorKind::Conflict, "already registered");
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "message": "already registered",
        "success": false,
        "error": "conflict"
      })
    );
  }

  #[test]
  fn success_carries_id() {
    let id = Uuid::new_v4();
    let json = serde_json::to_value(Outcome::success("ok", id)).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["id"], id.to_string());
    assert!(json.get("error").is_none());
  }
}
