use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use fluentfga::{
    AuthorizationEngine, CheckItem, EngineError, EngineResult, ReadFilter, TupleKey,
    WriteRequest, WriteResponse,
};

/// One request seen by a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Write(WriteRequest),
    Check(CheckItem),
    BatchCheck(Vec<CheckItem>),
    ListObjects {
        user: String,
        relation: String,
        object_type: String,
    },
    Read(ReadFilter),
    ListUsers {
        object: String,
        relation: String,
        user_type: String,
    },
}

#[derive(Debug, Default)]
struct State {
    requests: Vec<Recorded>,
    allowed: HashSet<(String, String, String)>,
    stored: Vec<TupleKey>,
    fail_next: Option<(u16, String)>,
    hang: bool,
}

/// In-memory engine that records every request.
///
/// Checks answer from a table of allowed `(object, relation, user)` triples;
/// writes update a tuple store that `read` serves. A request can be made to
/// fail once, or every request can be made to hang until cancelled.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    state: Mutex<State>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, object: &str, relation: &str, user: &str) -> &Self {
        self.lock().allowed.insert((
            object.to_string(),
            relation.to_string(),
            user.to_string(),
        ));
        self
    }

    /// Makes the next request fail with an engine API error.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.lock().fail_next = Some((status, message.to_string()));
    }

    /// Makes every following request wait forever.
    pub fn hang(&self) {
        self.lock().hang = true;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Tuples currently stored through `write`.
    pub fn stored(&self) -> Vec<TupleKey> {
        self.lock().stored.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the request, then applies the scripted failure or hang.
    async fn begin(&self, request: Recorded) -> EngineResult<()> {
        let (failure, hang) = {
            let mut state = self.lock();
            state.requests.push(request);
            (state.fail_next.take(), state.hang)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        match failure {
            Some((status, message)) => Err(EngineError::Api {
                status,
                code: "scripted".to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    fn is_allowed(&self, item: &CheckItem) -> bool {
        self.lock().allowed.contains(&(
            item.object.clone(),
            item.relation.clone(),
            item.user.clone(),
        ))
    }
}

#[async_trait]
impl AuthorizationEngine for RecordingEngine {
    async fn write(&self, request: WriteRequest) -> EngineResult<WriteResponse> {
        self.begin(Recorded::Write(request.clone())).await?;

        let mut state = self.lock();
        for key in &request.deletes {
            state.stored.retain(|stored| !stored.same_relationship(key));
        }
        state.stored.extend(request.writes.iter().cloned());
        Ok(WriteResponse {
            written: request.writes,
            deleted: request.deletes,
        })
    }

    async fn check(&self, item: CheckItem) -> EngineResult<bool> {
        self.begin(Recorded::Check(item.clone())).await?;
        Ok(self.is_allowed(&item))
    }

    async fn batch_check(&self, items: Vec<CheckItem>) -> EngineResult<Vec<bool>> {
        self.begin(Recorded::BatchCheck(items.clone())).await?;
        Ok(items.iter().map(|item| self.is_allowed(item)).collect())
    }

    async fn list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> EngineResult<Vec<String>> {
        self.begin(Recorded::ListObjects {
            user: user.to_string(),
            relation: relation.to_string(),
            object_type: object_type.to_string(),
        })
        .await?;

        let prefix = format!("{object_type}:");
        let mut objects: Vec<String> = self
            .lock()
            .allowed
            .iter()
            .filter(|(o, r, u)| u == user && r == relation && o.starts_with(&prefix))
            .map(|(o, _, _)| o.clone())
            .collect();
        objects.sort();
        Ok(objects)
    }

    async fn read(&self, filter: ReadFilter) -> EngineResult<Vec<TupleKey>> {
        self.begin(Recorded::Read(filter.clone())).await?;

        let object_matches = |key: &TupleKey| match filter.object.as_deref() {
            None => true,
            Some(prefix) if prefix.ends_with(':') => key.object.starts_with(prefix),
            Some(object) => key.object == object,
        };
        Ok(self
            .lock()
            .stored
            .iter()
            .filter(|key| filter.user.as_deref().map_or(true, |user| key.user == user))
            .filter(|key| object_matches(*key))
            .cloned()
            .collect())
    }

    async fn list_users(
        &self,
        object: &str,
        relation: &str,
        user_type: &str,
    ) -> EngineResult<Vec<String>> {
        self.begin(Recorded::ListUsers {
            object: object.to_string(),
            relation: relation.to_string(),
            user_type: user_type.to_string(),
        })
        .await?;

        let prefix = format!("{user_type}:");
        let mut users: Vec<String> = self
            .lock()
            .allowed
            .iter()
            .filter(|(o, r, u)| o == object && r == relation && u.starts_with(&prefix))
            .map(|(_, _, u)| u.clone())
            .collect();
        users.sort();
        Ok(users)
    }
}
