//! Fault-tolerant supervision (spec §4.4): rate-limited Restart/Resume/
//! Stop/Escalate decisions over a registered set of children, plus an
//! optional proactive health-check extension point.

pub mod backoff;
pub mod error;
pub mod health_monitor;
pub mod node;
pub mod types;

pub use backoff::RestartBackoff;
pub use error::SupervisorError;
pub use health_monitor::{spawn_health_monitor, HealthCheck, HealthStatus};
pub use node::{FailureHook, Supervisor};
pub use types::{ChildId, RestartPolicy, SupervisionDecision, SupervisionStrategy};
