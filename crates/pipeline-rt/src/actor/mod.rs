//! Actor trait, context, references, and spawn parameters (spec §4.3).
//!
//! - [`traits`] — the `Actor` trait itself.
//! - [`context`] — `ActorContext`, handed to every `Actor` call.
//! - [`actor_ref`] — `ActorRef`, a cloneable handle used for Tell/Ask.
//! - [`props`] — `Props`, spawn-time configuration.
//! - [`error`] — `ActorError`.

pub mod actor_ref;
pub mod context;
pub mod error;
pub mod props;
pub mod traits;

pub use actor_ref::{ActorRef, ActorRefError};
pub use context::ActorContext;
pub use error::ActorError;
pub use props::{ActorFactory, Props, SupervisionConfig};
pub use traits::Actor;
