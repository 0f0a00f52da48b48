//! Connect API resource types (JSON:API documents).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Resource type name for beta testers.
pub const BETA_TESTERS: &str = "betaTesters";

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Parsed JSON document.
    Json(Value),
    /// 2xx with an empty body, typically `204 No Content`.
    NoContent,
}

impl ApiResponse {
    pub fn is_no_content(&self) -> bool {
        matches!(self, ApiResponse::NoContent)
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::NoContent => None,
        }
    }
}

/// Top-level JSON:API document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document<T> {
    #[serde(default)]
    pub data: T,
}

/// A beta tester resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetaTester {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: BetaTesterAttributes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BetaTesterAttributes {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub invite_url: Option<String>,
}

/// Profile fields for a tester about to be created.
#[derive(Debug, Clone)]
pub struct NewBetaTester {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewBetaTester {
    /// A tester with generic placeholder names.
    pub fn placeholder(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: "Test".into(),
            last_name: "User".into(),
        }
    }

    pub fn to_document(&self) -> Value {
        json!({
            "data": {
                "type": BETA_TESTERS,
                "attributes": {
                    "email": self.email,
                    "firstName": self.first_name,
                    "lastName": self.last_name,
                }
            }
        })
    }
}

/// Relationship linkage body adding testers to a group.
pub fn tester_linkage(tester_ids: &[&str]) -> Value {
    let data: Vec<Value> = tester_ids
        .iter()
        .map(|id| json!({ "type": BETA_TESTERS, "id": id }))
        .collect();
    json!({ "data": data })
}
