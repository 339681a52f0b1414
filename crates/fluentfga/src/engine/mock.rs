//! In-memory engine for builder unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AuthorizationEngine, CheckItem, ReadFilter, TupleKey, WriteRequest, WriteResponse};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Default)]
pub(crate) struct MockEngine {
    allowed: Mutex<HashSet<(String, String, String)>>,
    stored: Mutex<Vec<TupleKey>>,
    fail: Mutex<bool>,
    pub writes: Mutex<Vec<WriteRequest>>,
    pub checks: Mutex<Vec<CheckItem>>,
    pub batches: Mutex<Vec<Vec<CheckItem>>>,
    pub queries: Mutex<Vec<String>>,
}

impl MockEngine {
    pub fn allow(&self, object: &str, relation: &str, user: &str) {
        self.allowed.lock().unwrap().insert((
            object.to_string(),
            relation.to_string(),
            user.to_string(),
        ));
    }

    pub fn store(&self, key: TupleKey) {
        self.stored.lock().unwrap().push(key);
    }

    pub fn fail_requests(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn check_failure(&self) -> EngineResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(EngineError::Api {
                status: 400,
                code: "validation_error".to_string(),
                message: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    fn is_allowed(&self, item: &CheckItem) -> bool {
        self.allowed.lock().unwrap().contains(&(
            item.object.clone(),
            item.relation.clone(),
            item.user.clone(),
        ))
    }
}

#[async_trait]
impl AuthorizationEngine for MockEngine {
    async fn write(&self, request: WriteRequest) -> EngineResult<WriteResponse> {
        self.writes.lock().unwrap().push(request.clone());
        self.check_failure()?;
        Ok(WriteResponse {
            written: request.writes,
            deleted: request.deletes,
        })
    }

    async fn check(&self, item: CheckItem) -> EngineResult<bool> {
        self.checks.lock().unwrap().push(item.clone());
        self.check_failure()?;
        Ok(self.is_allowed(&item))
    }

    async fn batch_check(&self, items: Vec<CheckItem>) -> EngineResult<Vec<bool>> {
        self.batches.lock().unwrap().push(items.clone());
        self.check_failure()?;
        Ok(items.iter().map(|item| self.is_allowed(item)).collect())
    }

    async fn list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> EngineResult<Vec<String>> {
        self.queries
            .lock()
            .unwrap()
            .push(format!("list_objects {user} {relation} {object_type}"));
        self.check_failure()?;
        let prefix = format!("{object_type}:");
        Ok(self
            .allowed
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, r, u)| u == user && r == relation && o.starts_with(&prefix))
            .map(|(o, _, _)| o.clone())
            .collect())
    }

    async fn read(&self, filter: ReadFilter) -> EngineResult<Vec<TupleKey>> {
        self.queries
            .lock()
            .unwrap()
            .push(format!("read {:?} {:?}", filter.user, filter.object));
        self.check_failure()?;
        Ok(self
            .stored
            .lock()
            .unwrap()
            .iter()
            .filter(|key| filter.user.as_ref().map_or(true, |user| &key.user == user))
            .filter(|key| {
                filter.object.as_ref().map_or(true, |object| {
                    if object.ends_with(':') {
                        key.object.starts_with(object.as_str())
                    } else {
                        &key.object == object
                    }
                })
            })
            .cloned()
            .collect())
    }

    async fn list_users(
        &self,
        object: &str,
        relation: &str,
        user_type: &str,
    ) -> EngineResult<Vec<String>> {
        self.queries
            .lock()
            .unwrap()
            .push(format!("list_users {object} {relation} {user_type}"));
        self.check_failure()?;
        let prefix = format!("{user_type}:");
        Ok(self
            .allowed
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, r, u)| o == object && r == relation && u.starts_with(&prefix))
            .map(|(_, _, u)| u.clone())
            .collect())
    }
}
