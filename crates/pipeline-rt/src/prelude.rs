//! Convenient imports for building on the actor runtime.
//!
//! ```
//! use pipeline_rt::prelude::*;
//! ```

pub use crate::actor::{Actor, ActorContext, ActorError, ActorFactory, ActorRef, ActorRefError, Props, SupervisionConfig};
pub use crate::dispatcher::{Dispatcher, Task};
pub use crate::supervisor::{
    spawn_health_monitor, ChildId, FailureHook, HealthCheck, HealthStatus, RestartBackoff, RestartPolicy,
    Supervisor, SupervisionDecision, SupervisionStrategy, SupervisorError,
};
pub use crate::system::{ActorSystem, SystemConfig, SystemError};
