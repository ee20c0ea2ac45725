// DRB node deployment wizard, wallet balance probes, and job progress polling.

pub mod api_client;
pub mod backend;
pub mod balance;
pub mod cache;
pub mod controller;
pub mod credentials;
pub mod fields;
pub mod job;
pub mod poller;
pub mod state;
pub mod step_graph;
pub mod submitter;
pub mod validation;

// Re-export primary types for convenient access.
pub use api_client::ConsoleApiClient;
pub use backend::{
    BackendError, DeploymentBackend, JobStatusSource, LeaderDeploymentRequest,
    RegularDeploymentRequest, ResourceRef, SubmitAck,
};
pub use balance::{BalanceOracle, WalletProbe};
pub use cache::{CachedList, QueryCache};
pub use controller::{SubmitOutcome, WizardController};
pub use credentials::{AwsCredential, CredentialKind, CredentialStore, RegionLister};
pub use fields::{FieldUpdate, NetworkMode, Variant, WizardFields};
pub use job::{
    Clock, DeploymentJob, JobOutcome, JobStatus, ManualClock, SystemClock, TaskProgress,
    format_elapsed,
};
pub use poller::{PollCallbacks, PollPolicy, Subscription, TaskPoller};
pub use state::{WizardPhase, WizardState};
pub use step_graph::{Direction, Step};
pub use submitter::{DeploymentSubmitter, JobHandle, SubmissionError};
pub use validation::FieldError;
