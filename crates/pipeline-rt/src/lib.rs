//! # pipeline-rt — the actor runtime (spec §4.2, §4.3, §4.4).
//!
//! A path-addressed, supervised actor runtime built directly on `tokio`
//! tasks rather than a dedicated scheduler: each spawned actor owns a
//! bounded [`pipeline_core::Mailbox`] and a single-threaded receive loop,
//! but the actual work of each `receive` call is handed off to a shared
//! [`dispatcher::Dispatcher`] worker pool so CPU-bound actors don't each
//! need their own OS thread.
//!
//! # Module organization
//!
//! - [`actor`] — the `Actor` trait, `ActorContext`, `ActorRef`, `Props`.
//! - [`dispatcher`] — the shared task worker pool.
//! - [`supervisor`] — restart accounting and the four-way supervision decision.
//! - [`system`] — `ActorSystem`: the spawn/stop/lookup/watch registry tying
//!   the above together.
//!
//! # Example
//!
//! ```
//! use pipeline_rt::prelude::*;
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Actor for Echo {
//!     async fn receive(&mut self, ctx: &ActorContext, message: pipeline_core::Message) -> Result<(), ActorError> {
//!         if matches!(message.kind, pipeline_core::MessageKind::Command(_)) {
//!             let _ = ctx.reply(pipeline_core::Message::command("pong"));
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let system = ActorSystem::new(SystemConfig::default());
//! system.start().await;
//!
//! let props = Props::new("echo", Arc::new(|| Box::new(Echo) as Box<dyn Actor>));
//! let echo = system.spawn(props, None).unwrap();
//!
//! let reply = echo.ask(pipeline_core::MessageKind::Command("ping".to_string()), None, None).await.unwrap();
//! assert!(matches!(reply.kind, pipeline_core::MessageKind::Command(ref c) if c == "pong"));
//!
//! system.shutdown().await.unwrap();
//! # });
//! ```

pub mod actor;
pub mod dispatcher;
pub mod prelude;
pub mod supervisor;
pub mod system;

pub use actor::{Actor, ActorContext, ActorError, ActorFactory, ActorRef, ActorRefError, Props, SupervisionConfig};
pub use dispatcher::{Dispatcher, Task};
pub use supervisor::{
    spawn_health_monitor, ChildId, FailureHook, HealthCheck, HealthStatus, RestartBackoff, RestartPolicy,
    Supervisor, SupervisorError, SupervisionDecision, SupervisionStrategy,
};
pub use system::{ActorSystem, SystemConfig, SystemError};
