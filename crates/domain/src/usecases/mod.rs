//! Application use cases / business logic

pub mod changes;
pub mod publish;
pub mod verify;

pub use changes::{
    parse_porcelain, ChangeDetector, ChangeError, ChangeSet, ContentDirectory, ContentLayout,
    StaleEntry,
};
pub use publish::{PublishWorkflow, WorkflowConfig, WorkflowError};
pub use verify::{compare, RemoteVerifier, VerifyError};
