use std::time::Duration;

use anyhow::Context;
use fluentfga::HttpEngine;
use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

/// The fixture model in OpenFGA JSON form.
pub const FIXTURE_MODEL: &str = include_str!("../fga-model.json");

/// Base URL of the OpenFGA server used by live tests.
pub fn openfga_url() -> String {
    std::env::var("OPENFGA_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// A random identifier so concurrent live tests never share tuples.
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// A store provisioned with the fixture model.
#[derive(Debug, Clone)]
pub struct LiveStore {
    pub api_url: String,
    pub store_id: String,
    pub authorization_model_id: String,
}

impl LiveStore {
    /// Creates a fresh store and uploads the fixture model.
    pub async fn provision(api_url: &str) -> anyhow::Result<Self> {
        let model: serde_json::Value =
            serde_json::from_str(FIXTURE_MODEL).context("parsing fixture model")?;

        let mut engine = HttpEngine::new(api_url).with_client(client()?);
        let store_id = engine
            .create_store(&format!("fluentfga-tests-{}", Uuid::new_v4()))
            .await
            .context("creating store")?;
        let authorization_model_id = engine
            .write_authorization_model(&model)
            .await
            .context("writing authorization model")?;
        info!(%store_id, %authorization_model_id, "Provisioned live store");

        Ok(Self {
            api_url: api_url.to_string(),
            store_id,
            authorization_model_id,
        })
    }

    /// An engine targeting this store.
    ///
    /// Each call builds its own client, so engines never outlive the test
    /// runtime that created them.
    pub fn engine(&self) -> anyhow::Result<HttpEngine> {
        Ok(HttpEngine::new(&self.api_url)
            .with_client(client()?)
            .with_store(&self.store_id)
            .with_authorization_model(&self.authorization_model_id))
    }
}

fn client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("building HTTP client")
}

static SHARED_STORE: OnceCell<LiveStore> = OnceCell::const_new();

/// The store shared by all live tests in this process.
///
/// Provisioning runs once even when many tests start at the same time;
/// later callers wait for it and then reuse the cached store.
pub async fn shared_store() -> anyhow::Result<&'static LiveStore> {
    SHARED_STORE
        .get_or_try_init(|| async { LiveStore::provision(&openfga_url()).await })
        .await
}
