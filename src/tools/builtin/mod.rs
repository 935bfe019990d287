//! Built-in tools exposed by the server.

mod exec;
pub mod knowledge;
mod status;
pub mod troubleshoot;
mod workflow;

pub use exec::{ExecCommandTool, ListDirectoryTool, ReadFileTool, WriteFileTool};
pub use knowledge::{
    AddKnowledgeTool, CollectionStatsTool, CreateCollectionTool, DeleteCollectionTool,
    DeleteKnowledgeTool, KnowledgeBase, KnowledgeMatch, ListCollectionsTool, SearchKnowledgeTool,
    search_internal,
};
pub use status::TestConnectionTool;
pub use troubleshoot::TroubleshootTool;
pub use workflow::{
    ActivateWorkflowTool, CreateWorkflowTool, DeleteWorkflowTool, ExecuteWorkflowTool,
    GetExecutionTool, GetWorkflowTool, ListExecutionsTool, ListWorkflowsTool, UpdateWorkflowTool,
    WorkflowConnectionTool,
};
