//! user-provider: keeps users in a user-store converged with declared resources.
//!
//! Each managed resource is driven through Connect → Observe → Create/Update
//! (or Delete for resources marked for deletion) by the [`Controller`], which
//! requeues converged resources and backs off failed ones.

pub mod cancel;
pub mod clients;
pub mod config;
pub mod connector;
pub mod controller;
pub mod error;
pub mod external;
pub mod reconciler;
pub mod resource;
pub mod scheduler;

pub use cancel::{CancelHandle, CancelToken};
pub use config::{ConfigError, CredentialsSource, Manifest, ProviderConfig, ProviderSettings};
pub use connector::{Connector, ServiceConnector};
pub use controller::Controller;
pub use error::{ConnectError, ErrorKind, Operation, ReconcileError, ServiceError, StatusCode};
pub use reconciler::{Action, ReconcileOutcome, Reconciler, ReconcilerOptions, UserReconciler};
pub use resource::{ManagedResource, UserResource, UserSpec};
pub use scheduler::{Backoff, Requeue, WorkQueue};
