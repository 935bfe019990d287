//! Thin clients for the external services behind the tools.

pub mod embedding;
pub mod exec;
pub mod qdrant;
pub mod vector_store;
pub mod workflow;

pub use embedding::{Embedder, OpenAiEmbedder};
pub use exec::{ExecClient, ExecOutput};
pub use qdrant::QdrantStore;
pub use vector_store::{
    CollectionInfo, KnowledgePayload, Point, ScoredPoint, VectorStore, normalize_collection_name,
};
pub use workflow::{ExecutionFilter, ExecutionSummary, WorkflowClient, WorkflowSummary};
