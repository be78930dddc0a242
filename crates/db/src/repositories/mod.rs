pub mod workflow_repo;

pub use workflow_repo::WorkflowRepo;
