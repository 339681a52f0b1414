//! [`AuthorizationEngine`] over the OpenFGA HTTP API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::wire::{
    ApiErrorBody, BatchCheckBody, BatchCheckItem, BatchCheckResponse, CheckBody, CheckResponse,
    CheckTupleKey, CreateStoreBody, CreateStoreResponse, FgaObject, ListObjectsBody,
    ListObjectsResponse, ListUsersBody, ListUsersResponse, ListedUser, ReadBody, ReadResponse,
    ReadTupleKey, TupleKeys, UserTypeFilter, WriteBody, WriteModelResponse,
};
use super::{AuthorizationEngine, CheckItem, ReadFilter, TupleKey, WriteRequest, WriteResponse};
use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};

/// Maximum number of checks the engine accepts in one batch-check request.
pub const MAX_BATCH_SIZE: usize = 50;

/// Page size requested when following read pagination.
const READ_PAGE_SIZE: u32 = 100;

/// HTTP client for one OpenFGA store.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: Client,
    api_url: String,
    store_id: Option<String>,
    authorization_model_id: Option<String>,
    api_token: Option<String>,
}

impl HttpEngine {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            store_id: None,
            authorization_model_id: None,
            api_token: None,
        }
    }

    /// Builds an engine from the `engine` configuration section.
    pub fn from_config(settings: &EngineSettings) -> Self {
        Self {
            store_id: settings.store_id.clone(),
            authorization_model_id: settings.authorization_model_id.clone(),
            api_token: settings.api_token.clone(),
            ..Self::new(&settings.api_url)
        }
    }

    /// Uses an existing client, e.g. one shared with the rest of the process.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    pub fn with_authorization_model(mut self, model_id: impl Into<String>) -> Self {
        self.authorization_model_id = Some(model_id.into());
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    pub fn authorization_model_id(&self) -> Option<&str> {
        self.authorization_model_id.as_deref()
    }

    /// Creates a store and targets it for all further requests.
    pub async fn create_store(&mut self, name: &str) -> EngineResult<String> {
        let url = format!("{}/stores", self.api_url);
        let created: CreateStoreResponse = self.post(&url, &CreateStoreBody { name }).await?;
        debug!(store_id = %created.id, name, "Created store");
        self.store_id = Some(created.id.clone());
        Ok(created.id)
    }

    /// Uploads an authorization model (OpenFGA JSON) and targets it.
    pub async fn write_authorization_model(&mut self, model: &Value) -> EngineResult<String> {
        let url = self.store_url("authorization-models")?;
        let written: WriteModelResponse = self.post(&url, model).await?;
        debug!(
            authorization_model_id = %written.authorization_model_id,
            "Wrote authorization model"
        );
        self.authorization_model_id = Some(written.authorization_model_id.clone());
        Ok(written.authorization_model_id)
    }

    /// Deletes the targeted store.
    pub async fn delete_store(&self) -> EngineResult<()> {
        let store_id = self.store_id.as_deref().ok_or(EngineError::MissingStore)?;
        let url = format!("{}/stores/{}", self.api_url, store_id);
        self.send(self.client.delete(&url)).await?;
        debug!(store_id, "Deleted store");
        Ok(())
    }

    fn store_url(&self, operation: &str) -> EngineResult<String> {
        let store_id = self.store_id.as_deref().ok_or(EngineError::MissingStore)?;
        Ok(format!("{}/stores/{}/{}", self.api_url, store_id, operation))
    }

    async fn send(&self, request: RequestBuilder) -> EngineResult<Response> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
        Err(EngineError::Api {
            status: status.as_u16(),
            code: if body.code.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                body.code
            },
            message: if body.message.is_empty() { text } else { body.message },
        })
    }

    async fn post<B, T>(&self, url: &str, body: &B) -> EngineResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.client.post(url).json(body)).await?;
        Ok(response.json().await?)
    }

    async fn post_write(&self, writes: &[TupleKey], deletes: &[TupleKey]) -> EngineResult<()> {
        let url = self.store_url("write")?;
        let deletes: Vec<TupleKey> = deletes
            .iter()
            .map(|key| key.clone().with_condition(None))
            .collect();
        let body = WriteBody {
            writes: (!writes.is_empty()).then_some(TupleKeys { tuple_keys: writes }),
            deletes: (!deletes.is_empty()).then_some(TupleKeys {
                tuple_keys: &deletes,
            }),
            authorization_model_id: self.authorization_model_id.as_deref(),
        };
        let _: Value = self.post(&url, &body).await?;
        Ok(())
    }

    async fn batch_chunk(&self, offset: usize, items: &[CheckItem]) -> EngineResult<Vec<bool>> {
        let url = self.store_url("batch-check")?;
        let body = BatchCheckBody {
            checks: items
                .iter()
                .enumerate()
                .map(|(i, item)| BatchCheckItem {
                    tuple_key: check_tuple_key(item),
                    context: item.context.as_ref(),
                    correlation_id: (offset + i).to_string(),
                })
                .collect(),
            authorization_model_id: self.authorization_model_id.as_deref(),
        };
        let response: BatchCheckResponse = self.post(&url, &body).await?;

        (offset..offset + items.len())
            .map(|index| {
                let result = response
                    .result
                    .get(&index.to_string())
                    .ok_or(EngineError::MissingBatchResult { index })?;
                match result.error_message() {
                    Some(message) => Err(EngineError::BatchItem { index, message }),
                    None => Ok(result.allowed),
                }
            })
            .collect()
    }
}

#[async_trait]
impl AuthorizationEngine for HttpEngine {
    async fn write(&self, request: WriteRequest) -> EngineResult<WriteResponse> {
        debug!(
            store_id = ?self.store_id,
            writes = request.writes.len(),
            deletes = request.deletes.len(),
            transactional = request.transactional,
            "write"
        );

        if request.transactional {
            self.post_write(&request.writes, &request.deletes).await?;
        } else {
            for key in &request.writes {
                self.post_write(std::slice::from_ref(key), &[]).await?;
            }
            for key in &request.deletes {
                self.post_write(&[], std::slice::from_ref(key)).await?;
            }
        }

        Ok(WriteResponse {
            written: request.writes,
            deleted: request.deletes,
        })
    }

    async fn check(&self, item: CheckItem) -> EngineResult<bool> {
        debug!(store_id = ?self.store_id, tuple = %item.tuple_key(), "check");
        let url = self.store_url("check")?;
        let body = CheckBody {
            tuple_key: check_tuple_key(&item),
            context: item.context.as_ref(),
            authorization_model_id: self.authorization_model_id.as_deref(),
        };
        let response: CheckResponse = self.post(&url, &body).await?;
        Ok(response.allowed)
    }

    async fn batch_check(&self, items: Vec<CheckItem>) -> EngineResult<Vec<bool>> {
        debug!(store_id = ?self.store_id, checks = items.len(), "batch_check");
        let mut allowed = Vec::with_capacity(items.len());
        for (chunk_index, chunk) in items.chunks(MAX_BATCH_SIZE).enumerate() {
            let results = self
                .batch_chunk(chunk_index * MAX_BATCH_SIZE, chunk)
                .await?;
            allowed.extend(results);
        }
        Ok(allowed)
    }

    async fn list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> EngineResult<Vec<String>> {
        debug!(store_id = ?self.store_id, user, relation, object_type, "list_objects");
        let url = self.store_url("list-objects")?;
        let body = ListObjectsBody {
            object_type,
            relation,
            user,
            authorization_model_id: self.authorization_model_id.as_deref(),
        };
        let response: ListObjectsResponse = self.post(&url, &body).await?;
        Ok(response.objects)
    }

    async fn read(&self, filter: ReadFilter) -> EngineResult<Vec<TupleKey>> {
        debug!(store_id = ?self.store_id, user = ?filter.user, object = ?filter.object, "read");
        let url = self.store_url("read")?;
        let mut tuples = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let body = ReadBody {
                tuple_key: ReadTupleKey {
                    user: filter.user.as_deref(),
                    object: filter.object.as_deref(),
                },
                page_size: READ_PAGE_SIZE,
                continuation_token: continuation.as_deref(),
            };
            let page: ReadResponse = self.post(&url, &body).await?;
            tuples.extend(page.tuples.into_iter().map(|tuple| tuple.key));

            match page.continuation_token {
                Some(token) if !token.is_empty() => continuation = Some(token),
                _ => break,
            }
        }

        Ok(tuples)
    }

    async fn list_users(
        &self,
        object: &str,
        relation: &str,
        user_type: &str,
    ) -> EngineResult<Vec<String>> {
        debug!(store_id = ?self.store_id, object, relation, user_type, "list_users");
        let url = self.store_url("list-users")?;
        let (object_type, id) = split_reference(object)?;
        let body = ListUsersBody {
            object: FgaObject { object_type, id },
            relation,
            user_filters: vec![UserTypeFilter { user_type }],
            authorization_model_id: self.authorization_model_id.as_deref(),
        };
        let response: ListUsersResponse = self.post(&url, &body).await?;
        Ok(response
            .users
            .iter()
            .filter_map(ListedUser::reference)
            .collect())
    }
}

fn check_tuple_key(item: &CheckItem) -> CheckTupleKey<'_> {
    CheckTupleKey {
        user: &item.user,
        relation: &item.relation,
        object: &item.object,
    }
}

/// Splits a qualified `type:id` reference.
fn split_reference(reference: &str) -> EngineResult<(&str, &str)> {
    match reference.split_once(':') {
        Some((object_type, id)) if !object_type.is_empty() && !id.is_empty() => {
            Ok((object_type, id))
        }
        _ => Err(EngineError::InvalidRequest {
            message: format!("expected a qualified type:id reference, got '{reference}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_copies_settings() {
        let settings = EngineSettings {
            api_url: "http://fga.internal:8080/".to_string(),
            store_id: Some("store-1".to_string()),
            authorization_model_id: Some("model-1".to_string()),
            api_token: Some("secret".to_string()),
        };
        let engine = HttpEngine::from_config(&settings);

        assert_eq!(engine.api_url(), "http://fga.internal:8080");
        assert_eq!(engine.store_id(), Some("store-1"));
        assert_eq!(engine.authorization_model_id(), Some("model-1"));
    }

    #[test]
    fn test_store_url_requires_store() {
        let engine = HttpEngine::new("http://localhost:8080");
        assert!(matches!(
            engine.store_url("check"),
            Err(EngineError::MissingStore)
        ));

        let engine = engine.with_store("01HVMMBCMGZNT3SED4Z17ECXCA");
        assert_eq!(
            engine.store_url("check").unwrap(),
            "http://localhost:8080/stores/01HVMMBCMGZNT3SED4Z17ECXCA/check"
        );
    }

    #[test]
    fn test_split_reference() {
        assert_eq!(split_reference("form:224").unwrap(), ("form", "224"));
        assert_eq!(
            split_reference("crm_company:acme:eu").unwrap(),
            ("crm_company", "acme:eu")
        );
        assert!(matches!(
            split_reference("form"),
            Err(EngineError::InvalidRequest { .. })
        ));
        assert!(split_reference("form:").is_err());
    }

    #[tokio::test]
    async fn test_operations_without_store_fail_before_sending() {
        let engine = HttpEngine::new("http://127.0.0.1:9");

        let err = engine
            .check(CheckItem::new("form:1", "edit", "user:alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingStore));

        let err = engine.delete_store().await.unwrap_err();
        assert!(matches!(err, EngineError::MissingStore));
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        let engine = HttpEngine::new("http://127.0.0.1:9");
        assert_eq!(engine.batch_check(Vec::new()).await.unwrap(), Vec::<bool>::new());
    }
}
