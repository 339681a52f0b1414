//! OpenFGA HTTP API request and response bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TupleKey;
use crate::condition::ConditionContext;

#[derive(Debug, Serialize)]
pub(super) struct TupleKeys<'a> {
    pub tuple_keys: &'a [TupleKey],
}

#[derive(Debug, Serialize)]
pub(super) struct WriteBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writes: Option<TupleKeys<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletes: Option<TupleKeys<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_model_id: Option<&'a str>,
}

/// Tuple key without a condition, as used by check and delete.
#[derive(Debug, Serialize)]
pub(super) struct CheckTupleKey<'a> {
    pub user: &'a str,
    pub relation: &'a str,
    pub object: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckBody<'a> {
    pub tuple_key: CheckTupleKey<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a ConditionContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_model_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CheckResponse {
    #[serde(default)]
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct BatchCheckItem<'a> {
    pub tuple_key: CheckTupleKey<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a ConditionContext>,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub(super) struct BatchCheckBody<'a> {
    pub checks: Vec<BatchCheckItem<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_model_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BatchCheckResponse {
    #[serde(default)]
    pub result: HashMap<String, BatchCheckSingleResult>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BatchCheckSingleResult {
    #[serde(default)]
    pub allowed: bool,
    #[serde(default)]
    pub error: Option<Value>,
}

impl BatchCheckSingleResult {
    /// The error message, if the engine reported one for this item.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        if error.is_null() {
            return None;
        }
        Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
        )
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ListObjectsBody<'a> {
    #[serde(rename = "type")]
    pub object_type: &'a str,
    pub relation: &'a str,
    pub user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_model_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListObjectsResponse {
    #[serde(default)]
    pub objects: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReadTupleKey<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReadBody<'a> {
    pub tuple_key: ReadTupleKey<'a>,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReadTuple {
    pub key: TupleKey,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReadResponse {
    #[serde(default)]
    pub tuples: Vec<ReadTuple>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct FgaObject<'a> {
    #[serde(rename = "type")]
    pub object_type: &'a str,
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct UserTypeFilter<'a> {
    #[serde(rename = "type")]
    pub user_type: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct ListUsersBody<'a> {
    pub object: FgaObject<'a>,
    pub relation: &'a str,
    pub user_filters: Vec<UserTypeFilter<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_model_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListUsersResponse {
    #[serde(default)]
    pub users: Vec<ListedUser>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwnedObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListedUserset {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
    pub relation: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListedWildcard {
    #[serde(rename = "type")]
    pub object_type: String,
}

/// One entry of a ListUsers response. Exactly one field is set.
#[derive(Debug, Deserialize)]
pub(super) struct ListedUser {
    #[serde(default)]
    pub object: Option<OwnedObject>,
    #[serde(default)]
    pub userset: Option<ListedUserset>,
    #[serde(default)]
    pub wildcard: Option<ListedWildcard>,
}

impl ListedUser {
    /// Qualified reference for the listed user.
    pub fn reference(&self) -> Option<String> {
        if let Some(object) = &self.object {
            return Some(format!("{}:{}", object.object_type, object.id));
        }
        if let Some(userset) = &self.userset {
            return Some(format!(
                "{}:{}#{}",
                userset.object_type, userset.id, userset.relation
            ));
        }
        self.wildcard
            .as_ref()
            .map(|wildcard| format!("{}:*", wildcard.object_type))
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreateStoreBody<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateStoreResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct WriteModelResponse {
    pub authorization_model_id: String,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_body_omits_empty_sections() {
        let writes = [TupleKey::new("form:224", "editor", "user:alice")];
        let body = WriteBody {
            writes: Some(TupleKeys {
                tuple_keys: &writes,
            }),
            deletes: None,
            authorization_model_id: None,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "writes": { "tuple_keys": [
                    { "user": "user:alice", "relation": "editor", "object": "form:224" }
                ] }
            })
        );
    }

    #[test]
    fn test_batch_item_error_message() {
        let parsed: BatchCheckResponse = serde_json::from_value(json!({
            "result": {
                "0": { "allowed": true },
                "1": { "error": { "input_error": "validation_error", "message": "relation 'nope' not found" } },
                "2": { "allowed": false, "error": null }
            }
        }))
        .unwrap();

        assert_eq!(parsed.result["0"].error_message(), None);
        assert!(parsed.result["0"].allowed);
        assert_eq!(
            parsed.result["1"].error_message().as_deref(),
            Some("relation 'nope' not found")
        );
        assert_eq!(parsed.result["2"].error_message(), None);
    }

    #[test]
    fn test_listed_user_references() {
        let parsed: ListUsersResponse = serde_json::from_value(json!({
            "users": [
                { "object": { "type": "user", "id": "alice" } },
                { "userset": { "type": "group", "id": "managers", "relation": "member" } },
                { "wildcard": { "type": "user" } }
            ]
        }))
        .unwrap();

        let refs: Vec<_> = parsed.users.iter().filter_map(ListedUser::reference).collect();
        assert_eq!(refs, vec!["user:alice", "group:managers#member", "user:*"]);
    }

    #[test]
    fn test_read_response_decodes_conditions() {
        let parsed: ReadResponse = serde_json::from_value(json!({
            "tuples": [{
                "key": {
                    "user": "team:acme",
                    "relation": "free_trial",
                    "object": "subscription:sub_5678",
                    "condition": { "name": "active_trial", "context": { "trial_duration_init": "864000s" } }
                },
                "timestamp": "2026-01-01T00:00:00Z"
            }],
            "continuation_token": ""
        }))
        .unwrap();

        let key = &parsed.tuples[0].key;
        assert_eq!(key.object, "subscription:sub_5678");
        assert_eq!(key.condition.as_ref().map(|c| c.name.as_str()), Some("active_trial"));
        assert_eq!(parsed.continuation_token.as_deref(), Some(""));
    }
}
