//! Builds one of the three topologies the runner recognizes from a
//! validated [`RunnerConfig`] (spec §4.8).

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::actors::{SinkActor, SourceActor, StageActor};
use crate::config::{ActorDefinition, DedupStorageKind, RunnerConfig};
use crate::error::RunnerError;
use crate::registry::ComponentRegistry;
use pipeline_contracts::Stage;
use pipeline_realtime::dedup::{Dedup, DedupError, RemoteStore};
use pipeline_realtime::{InMemoryDedup, RealtimeConfig, RealtimeProcessor};
use pipeline_rt::actor::Actor;
use pipeline_rt::system::ActorSystem;
use pipeline_rt::{Props, SupervisionConfig, SystemConfig};
use pipeline_stream::StreamProcessor;

/// The instantiated pipeline, whichever topology `type` selected (spec
/// §4.8).
pub enum Topology {
    /// A flat map of source/transform/sink actors wired by declared
    /// outputs; no supervisory hierarchy beyond the actor system root.
    Flat(Arc<ActorSystem>),
    /// A hierarchical actor tree, recursively built from `root`.
    Actor(Arc<ActorSystem>),
    /// The single-processor stream topology (spec §4.5).
    Stream(Arc<StreamProcessor>),
}

/// Builds the topology `config.type` selects. `registry` supplies every
/// `Source`/`Stage`/`Sink` constructor the configuration's `type` tags
/// reference.
pub async fn build(config: &RunnerConfig, registry: &ComponentRegistry) -> Result<Topology, RunnerError> {
    match config.topology {
        crate::config::TopologyKind::Flat => build_flat(config, registry).await.map(Topology::Flat),
        crate::config::TopologyKind::Actor => build_actor(config, registry).await.map(Topology::Actor),
        crate::config::TopologyKind::Stream => build_stream(config, registry).await.map(Topology::Stream),
    }
}

fn system_config_from(config: &RunnerConfig) -> SystemConfig {
    SystemConfig {
        worker_threads: config.actor_system.dispatcher.parallelism,
        default_mailbox_capacity: config.actor_system.mailbox.capacity,
        default_mailbox_policy: config.actor_system.mailbox.overflow_strategy.into(),
        ..SystemConfig::default()
    }
}

async fn build_flat(config: &RunnerConfig, registry: &ComponentRegistry) -> Result<Arc<ActorSystem>, RunnerError> {
    let system = ActorSystem::new(system_config_from(config));
    system.start().await;

    for sink in &config.flat.sinks {
        spawn_sink(&system, registry, sink)?;
    }
    for transform in &config.flat.transforms {
        spawn_stage(&system, registry, transform)?;
    }
    for source in &config.flat.sources {
        spawn_source(&system, registry, source)?;
    }

    Ok(system)
}

async fn build_actor(config: &RunnerConfig, registry: &ComponentRegistry) -> Result<Arc<ActorSystem>, RunnerError> {
    let system = ActorSystem::new(system_config_from(config));
    system.start().await;

    let root = config
        .root
        .as_ref()
        .ok_or_else(|| RunnerError::Configuration("actor topology requires `root`".to_string()))?;
    spawn_actor_tree(&system, registry, root, None)?;

    Ok(system)
}

/// Recursively spawns `definition` under `parent`, resolving its `type`
/// against each of the registry's three buckets in turn (spec §4.8: a
/// node's role — source, transform, or sink — isn't declared
/// separately, so the first bucket that recognizes the type tag wins).
fn spawn_actor_tree(
    system: &Arc<ActorSystem>,
    registry: &ComponentRegistry,
    definition: &ActorDefinition,
    parent: Option<pipeline_core::ActorPath>,
) -> Result<(), RunnerError> {
    let actor_ref = build_and_spawn(system, registry, definition, parent)?;

    if let Some(supervision) = &definition.supervision {
        system.configure_supervisor(actor_ref.path(), SupervisionConfig::from(supervision));
    }

    for child in &definition.children {
        spawn_actor_tree(system, registry, child, Some(actor_ref.path().clone()))?;
    }
    Ok(())
}

fn build_and_spawn(
    system: &Arc<ActorSystem>,
    registry: &ComponentRegistry,
    definition: &ActorDefinition,
    parent: Option<pipeline_core::ActorPath>,
) -> Result<pipeline_rt::ActorRef, RunnerError> {
    if registry
        .build_source(&definition.type_name, &definition.name, &definition.config)
        .is_ok()
    {
        return spawn_source_node(system, registry, definition, parent);
    }
    if registry
        .build_stage(&definition.type_name, &definition.name, &definition.config)
        .is_ok()
    {
        return spawn_stage_node(system, registry, definition, parent);
    }
    if registry
        .build_sink(&definition.type_name, &definition.name, &definition.config)
        .is_ok()
    {
        return spawn_sink_node(system, registry, definition, parent);
    }
    Err(RunnerError::UnknownComponentType {
        kind: "actor",
        type_name: definition.type_name.clone(),
    })
}

fn spawn_source_node(
    system: &Arc<ActorSystem>,
    registry: &ComponentRegistry,
    definition: &ActorDefinition,
    parent: Option<pipeline_core::ActorPath>,
) -> Result<pipeline_rt::ActorRef, RunnerError> {
    // Validate once up front so a bad config is reported at spawn time
    // rather than surfacing only when the supervisor first restarts it.
    registry.build_source(&definition.type_name, &definition.name, &definition.config)?;

    let registry = registry.clone();
    let type_name = definition.type_name.clone();
    let name = definition.name.clone();
    let config = definition.config.clone();
    let outputs = definition.outputs.clone();
    let factory: Arc<dyn Fn() -> Box<dyn Actor> + Send + Sync> = Arc::new(move || {
        let source = registry
            .build_source(&type_name, &name, &config)
            .unwrap_or_else(|error| unreachable!("source {name:?} built once at spawn time, failed on rebuild: {error}"));
        Box::new(SourceActor::new(source, outputs.clone())) as Box<dyn Actor>
    });
    spawn_with(system, definition, parent, factory)
}

fn spawn_stage_node(
    system: &Arc<ActorSystem>,
    registry: &ComponentRegistry,
    definition: &ActorDefinition,
    parent: Option<pipeline_core::ActorPath>,
) -> Result<pipeline_rt::ActorRef, RunnerError> {
    registry.build_stage(&definition.type_name, &definition.name, &definition.config)?;

    let registry = registry.clone();
    let type_name = definition.type_name.clone();
    let name = definition.name.clone();
    let config = definition.config.clone();
    let outputs = definition.outputs.clone();
    let factory: Arc<dyn Fn() -> Box<dyn Actor> + Send + Sync> = Arc::new(move || {
        let stage = registry
            .build_stage(&type_name, &name, &config)
            .unwrap_or_else(|error| unreachable!("stage {name:?} built once at spawn time, failed on rebuild: {error}"));
        Box::new(StageActor::new(stage, outputs.clone())) as Box<dyn Actor>
    });
    spawn_with(system, definition, parent, factory)
}

fn spawn_sink_node(
    system: &Arc<ActorSystem>,
    registry: &ComponentRegistry,
    definition: &ActorDefinition,
    parent: Option<pipeline_core::ActorPath>,
) -> Result<pipeline_rt::ActorRef, RunnerError> {
    registry.build_sink(&definition.type_name, &definition.name, &definition.config)?;

    let registry = registry.clone();
    let type_name = definition.type_name.clone();
    let name = definition.name.clone();
    let config = definition.config.clone();
    let factory: Arc<dyn Fn() -> Box<dyn Actor> + Send + Sync> = Arc::new(move || {
        let sink = registry
            .build_sink(&type_name, &name, &config)
            .unwrap_or_else(|error| unreachable!("sink {name:?} built once at spawn time, failed on rebuild: {error}"));
        Box::new(SinkActor::new(sink)) as Box<dyn Actor>
    });
    spawn_with(system, definition, parent, factory)
}

/// Spawns `definition` using `factory`, which the runtime calls again on
/// every supervised restart (spec §8 S5) — rebuilding the component from
/// the registry each time rather than handing over a single owned
/// instance, so a restarted node behaves like a freshly started one.
fn spawn_with(
    system: &Arc<ActorSystem>,
    definition: &ActorDefinition,
    parent: Option<pipeline_core::ActorPath>,
    factory: Arc<dyn Fn() -> Box<dyn Actor> + Send + Sync>,
) -> Result<pipeline_rt::ActorRef, RunnerError> {
    let props = Props::new(definition.name.clone(), factory).with_outputs(definition.outputs.clone());
    system
        .spawn(props, parent)
        .map_err(|error| RunnerError::Other(error.into()))
}

fn spawn_source(system: &Arc<ActorSystem>, registry: &ComponentRegistry, definition: &ActorDefinition) -> Result<(), RunnerError> {
    spawn_source_node(system, registry, definition, None).map(|_| ())
}

fn spawn_stage(system: &Arc<ActorSystem>, registry: &ComponentRegistry, definition: &ActorDefinition) -> Result<(), RunnerError> {
    spawn_stage_node(system, registry, definition, None).map(|_| ())
}

fn spawn_sink(system: &Arc<ActorSystem>, registry: &ComponentRegistry, definition: &ActorDefinition) -> Result<(), RunnerError> {
    spawn_sink_node(system, registry, definition, None).map(|_| ())
}

async fn build_stream(config: &RunnerConfig, registry: &ComponentRegistry) -> Result<Arc<StreamProcessor>, RunnerError> {
    let source_def = config
        .stream
        .as_ref()
        .ok_or_else(|| RunnerError::Configuration("stream topology requires `stream`".to_string()))?;
    let sink_def = config
        .stream_sink
        .as_ref()
        .ok_or_else(|| RunnerError::Configuration("stream topology requires `stream_sink`".to_string()))?;

    let source = registry.build_source(&source_def.type_name, &source_def.name, &source_def.config)?;
    let sink = registry.build_sink(&sink_def.type_name, &sink_def.name, &sink_def.config)?;
    let stages = config
        .stream_transforms
        .iter()
        .map(|definition| registry.build_stage(&definition.type_name, &definition.name, &definition.config))
        .collect::<Result<Vec<Box<dyn Stage>>, RunnerError>>()?;

    let realtime = match &config.realtime {
        Some(section) => Some(Arc::new(build_realtime_processor(section)?)),
        None => None,
    };

    Ok(Arc::new(StreamProcessor::with_options(
        source,
        stages,
        sink,
        pipeline_stream::DEFAULT_CHANNEL_CAPACITY,
        realtime,
    )))
}

fn build_realtime_processor(section: &crate::config::RealtimeSection) -> Result<RealtimeProcessor, RunnerError> {
    let ttl = section.ttl().map_err(RunnerError::Configuration)?;
    let dedup: Arc<dyn Dedup> = match section.dedup_storage {
        DedupStorageKind::Memory => Arc::new(InMemoryDedup::new(ttl)),
        DedupStorageKind::Remote => {
            return Err(RunnerError::Configuration(
                "dedup_storage = \"remote\" requires a remote store wired in by the caller; \
                 none is registered by default (spec §1: per-backend I/O glue is out of scope)"
                    .to_string(),
            ));
        }
    };
    Ok(RealtimeProcessor::new(
        dedup,
        RealtimeConfig {
            id_field: section.id_field.clone(),
            event_type_field: section.event_type_field.clone(),
            entity_id_field: section.entity_id_field.clone(),
        },
    ))
}

/// A [`Dedup`] adapter over an externally supplied [`RemoteStore`] trait
/// object, mirroring `pipeline_realtime::dedup::RemoteDedup`'s logic
/// (which is generic over a sized `S: RemoteStore` and so can't hold a
/// `dyn RemoteStore` directly).
pub struct RemoteDedupAdapter {
    store: Arc<dyn RemoteStore>,
    ttl: Duration,
}

impl RemoteDedupAdapter {
    pub fn new(store: Arc<dyn RemoteStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }
}

const EVENT_KEY_PREFIX: &str = "dedup:event:";
const ENTITY_KEY_PREFIX: &str = "dedup:entity:";

#[async_trait]
impl Dedup for RemoteDedupAdapter {
    async fn is_duplicate(&self, event_id: &str) -> bool {
        match self.store.get(&format!("{EVENT_KEY_PREFIX}{event_id}")).await {
            Ok(value) => value.is_some(),
            Err(error) => {
                tracing::warn!(%error, event_id, "remote dedup lookup failed; treating as not a duplicate");
                false
            }
        }
    }

    async fn mark_processed(&self, event_id: &str) -> Result<(), DedupError> {
        self.store
            .set(&format!("{EVENT_KEY_PREFIX}{event_id}"), "1", Some(self.ttl))
            .await
            .map_err(DedupError::from)
    }

    async fn entity_exists(&self, entity_id: &str) -> bool {
        match self.store.get(&format!("{ENTITY_KEY_PREFIX}{entity_id}")).await {
            Ok(value) => value.is_some(),
            Err(error) => {
                tracing::warn!(%error, entity_id, "remote dedup lookup failed; treating entity as absent");
                false
            }
        }
    }

    async fn set_entity_exists(&self, entity_id: &str) -> Result<(), DedupError> {
        self.store
            .set(&format!("{ENTITY_KEY_PREFIX}{entity_id}"), "1", None)
            .await
            .map_err(DedupError::from)
    }

    async fn delete_entity(&self, entity_id: &str) -> Result<(), DedupError> {
        self.store
            .delete(&format!("{ENTITY_KEY_PREFIX}{entity_id}"))
            .await
            .map_err(DedupError::from)
    }

    async fn close(&self) {}
}
