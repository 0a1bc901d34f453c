use anyhow::Result;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document as BsonDocument},
    options::{FindOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::errors::AppError;
use crate::models::document::Document;
use crate::models::portfolio::PortfolioProject;
use crate::models::proposal::JobProposal;
use crate::models::tracking::ProposalTracking;
use crate::pagination::Pagination;

/// MongoDB handle shared through `AppState`. Cloning is cheap.
#[derive(Clone)]
pub struct Db {
    client: Client,
    db: Database,
}

impl Db {
    /// Connects to MongoDB. The driver connects lazily, so this only fails on
    /// a malformed URI.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        info!("Connecting to MongoDB...");
        let client = Client::with_uri_str(uri).await?;
        info!(database = %database, "MongoDB client initialized");
        Ok(Self::from_client(client, database))
    }

    pub fn from_client(client: Client, database: &str) -> Self {
        let db = client.database(database);
        Self { client, db }
    }

    pub async fn initialize_indexes(&self) -> Result<()> {
        info!("Creating MongoDB indexes");

        create_index(&self.documents(), doc! { "user_id": 1 }, "user_lookup").await?;
        create_index(
            &self.job_proposals(),
            doc! { "user_id": 1, "created_at": -1 },
            "user_recent",
        )
        .await?;
        create_index(
            &self.portfolio_projects(),
            doc! { "user_id": 1, "created_at": -1 },
            "user_recent",
        )
        .await?;
        create_index(
            &self.portfolio_projects(),
            doc! { "user_id": 1, "project_type": 1, "is_featured": 1 },
            "user_filters",
        )
        .await?;
        create_index(
            &self.proposal_tracking(),
            doc! { "user_id": 1, "created_at": -1 },
            "user_recent",
        )
        .await?;
        create_index(
            &self.proposal_tracking(),
            doc! { "proposal_id": 1 },
            "proposal_lookup",
        )
        .await?;

        info!("MongoDB indexes ready");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn documents(&self) -> Collection<Document> {
        self.db.collection("documents")
    }

    pub fn job_proposals(&self) -> Collection<JobProposal> {
        self.db.collection("job_proposals")
    }

    pub fn portfolio_projects(&self) -> Collection<PortfolioProject> {
        self.db.collection("portfolio_projects")
    }

    pub fn proposal_tracking(&self) -> Collection<ProposalTracking> {
        self.db.collection("proposal_tracking")
    }
}

/// Runs `filter` newest-first and returns one page plus the page math.
pub async fn find_page<T>(
    collection: &Collection<T>,
    filter: BsonDocument,
    page: u64,
    page_size: u64,
) -> Result<(Vec<T>, Pagination), AppError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let total = collection.count_documents(filter.clone(), None).await?;
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .skip(Pagination::skip(page, page_size))
        .limit(page_size as i64)
        .build();
    let items: Vec<T> = collection.find(filter, options).await?.try_collect().await?;
    Ok((items, Pagination::new(total, page, page_size)))
}

/// Runs `filter` newest-first and returns every match.
pub async fn find_all<T>(collection: &Collection<T>, filter: BsonDocument) -> Result<Vec<T>, AppError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
    Ok(collection.find(filter, options).await?.try_collect().await?)
}

async fn create_index<T>(collection: &Collection<T>, keys: BsonDocument, name: &str) -> Result<()>
where
    T: Send + Sync,
{
    let index = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build();

    collection.create_index(index, None).await.map_err(|e| {
        tracing::error!(
            "Failed to create index {} on {}: {}",
            name,
            collection.name(),
            e
        );
        e
    })?;
    info!("Created index {}.{}", collection.name(), name);
    Ok(())
}
