//! Construction of sources, stages, and sinks from opaque per-component
//! configuration (spec §6: `config` is opaque to the core).
//!
//! The real per-backend connectors (Kafka/SQL/ES/S3) are explicitly out
//! of scope (spec §1); this registry is the seam a caller plugs them
//! into, keyed by the `type` tag in an [`crate::config::ActorDefinition`].
//! The stage types bundled with `pipeline-stages` are registered by
//! default since they need no external backend; [`demo`](crate::demo)'s
//! source and sink are registered under `demo-interval`/`console` so a
//! configuration can be exercised with no adapters at all.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use crate::demo::{ConsoleSink, IntervalSource};
use crate::error::RunnerError;
use pipeline_contracts::{Sink, Source, Stage};
use pipeline_stages::{
    AggregateFn, AggregateStage, EnrichStage, FilterStage, PassthroughStage, RemapStage, SampleStage,
};

/// Builds a [`Source`] from a component's name and opaque `config`.
pub type SourceFactory = Arc<dyn Fn(&str, &Value) -> Result<Box<dyn Source>, anyhow::Error> + Send + Sync>;
/// Builds a [`Stage`] from a component's name and opaque `config`.
pub type StageFactory = Arc<dyn Fn(&str, &Value) -> Result<Box<dyn Stage>, anyhow::Error> + Send + Sync>;
/// Builds a [`Sink`] from a component's name and opaque `config`.
pub type SinkFactory = Arc<dyn Fn(&str, &Value) -> Result<Box<dyn Sink>, anyhow::Error> + Send + Sync>;

/// A type-tag-keyed table of component factories.
///
/// Cloning is cheap: every factory is held behind an `Arc`, so a registry
/// handed to several topology builders shares its registrations rather
/// than duplicating them.
#[derive(Clone)]
pub struct ComponentRegistry {
    sources: HashMap<String, SourceFactory>,
    stages: HashMap<String, StageFactory>,
    sinks: HashMap<String, SinkFactory>,
}

impl ComponentRegistry {
    /// An empty registry with none of the bundled demo or stage types
    /// registered.
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
            stages: HashMap::new(),
            sinks: HashMap::new(),
        }
    }

    /// A registry pre-populated with the demo source/sink and every
    /// backend-free stage `pipeline-stages` ships.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_source("demo-interval", demo_interval_factory());
        registry.register_sink("console", console_factory());
        registry.register_stage("passthrough", passthrough_factory());
        registry.register_stage("filter", filter_factory());
        registry.register_stage("remap", remap_factory());
        registry.register_stage("enrich", enrich_factory());
        registry.register_stage("sample", sample_factory());
        registry.register_stage("aggregate", aggregate_factory());
        registry
    }

    pub fn register_source(&mut self, type_name: impl Into<String>, factory: SourceFactory) {
        self.sources.insert(type_name.into(), factory);
    }

    pub fn register_stage(&mut self, type_name: impl Into<String>, factory: StageFactory) {
        self.stages.insert(type_name.into(), factory);
    }

    pub fn register_sink(&mut self, type_name: impl Into<String>, factory: SinkFactory) {
        self.sinks.insert(type_name.into(), factory);
    }

    pub fn build_source(&self, type_name: &str, name: &str, config: &Value) -> Result<Box<dyn Source>, RunnerError> {
        let factory = self
            .sources
            .get(type_name)
            .ok_or_else(|| RunnerError::UnknownComponentType {
                kind: "source",
                type_name: type_name.to_string(),
            })?;
        factory(name, config).map_err(|source| RunnerError::ComponentBuild {
            kind: "source",
            name: name.to_string(),
            source,
        })
    }

    pub fn build_stage(&self, type_name: &str, name: &str, config: &Value) -> Result<Box<dyn Stage>, RunnerError> {
        let factory = self
            .stages
            .get(type_name)
            .ok_or_else(|| RunnerError::UnknownComponentType {
                kind: "stage",
                type_name: type_name.to_string(),
            })?;
        factory(name, config).map_err(|source| RunnerError::ComponentBuild {
            kind: "stage",
            name: name.to_string(),
            source,
        })
    }

    pub fn build_sink(&self, type_name: &str, name: &str, config: &Value) -> Result<Box<dyn Sink>, RunnerError> {
        let factory = self
            .sinks
            .get(type_name)
            .ok_or_else(|| RunnerError::UnknownComponentType {
                kind: "sink",
                type_name: type_name.to_string(),
            })?;
        factory(name, config).map_err(|source| RunnerError::ComponentBuild {
            kind: "sink",
            name: name.to_string(),
            source,
        })
    }
}

fn demo_interval_factory() -> SourceFactory {
    Arc::new(|name, config| {
        let period_ms = config.get("period_ms").and_then(Value::as_u64).unwrap_or(1000);
        Ok(Box::new(IntervalSource::new(name, Duration::from_millis(period_ms))) as Box<dyn Source>)
    })
}

fn console_factory() -> SinkFactory {
    Arc::new(|name, _config| Ok(Box::new(ConsoleSink::new(name)) as Box<dyn Sink>))
}

fn passthrough_factory() -> StageFactory {
    Arc::new(|name, _config| Ok(Box::new(PassthroughStage::new(name)) as Box<dyn Stage>))
}

fn filter_factory() -> StageFactory {
    Arc::new(|name, config| {
        let predicate = config
            .get("predicate")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("filter stage {name:?} requires a string `predicate`"))?;
        Ok(Box::new(FilterStage::new(name, predicate)?) as Box<dyn Stage>)
    })
}

fn remap_factory() -> StageFactory {
    Arc::new(|name, config| {
        let mappings = config
            .get("mappings")
            .and_then(Value::as_object)
            .ok_or_else(|| anyhow::anyhow!("remap stage {name:?} requires an object `mappings`"))?
            .iter()
            .map(|(from, to)| {
                let to = to
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("remap stage {name:?} mapping target must be a string"))?;
                Ok((from.clone(), to.to_string()))
            })
            .collect::<Result<Vec<(String, String)>, anyhow::Error>>()?;
        Ok(Box::new(RemapStage::new(name, mappings)) as Box<dyn Stage>)
    })
}

fn enrich_factory() -> StageFactory {
    Arc::new(|name, config| {
        let fields = config
            .get("fields")
            .and_then(Value::as_object)
            .ok_or_else(|| anyhow::anyhow!("enrich stage {name:?} requires an object `fields`"))?
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        let marker = config
            .get("marker")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        Ok(Box::new(EnrichStage::new(name, fields, marker)) as Box<dyn Stage>)
    })
}

fn sample_factory() -> StageFactory {
    Arc::new(|name, config| {
        let rate = config
            .get("rate")
            .and_then(Value::as_f64)
            .ok_or_else(|| anyhow::anyhow!("sample stage {name:?} requires a numeric `rate`"))?;
        let seed = config.get("seed").and_then(Value::as_u64).unwrap_or(0);
        Ok(Box::new(SampleStage::new(name, rate, seed)) as Box<dyn Stage>)
    })
}

fn aggregate_factory() -> StageFactory {
    Arc::new(|name, config| {
        let group_by = config
            .get("group_by")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let window_secs = config.get("window_secs").and_then(Value::as_u64).unwrap_or(60);
        let agg = config
            .get("agg")
            .ok_or_else(|| anyhow::anyhow!("aggregate stage {name:?} requires an `agg` object"))?;
        let kind = agg
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("aggregate stage {name:?}'s `agg` requires a string `kind`"))?;
        let field = || {
            agg.get("field")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("aggregate stage {name:?}'s `agg` requires a string `field`"))
        };
        let agg_fn = match kind {
            "count" => AggregateFn::CountOnly,
            "sum" => AggregateFn::Sum(field()?),
            "avg" => AggregateFn::Avg(field()?),
            "min" => AggregateFn::Min(field()?),
            "max" => AggregateFn::Max(field()?),
            other => return Err(anyhow::anyhow!("aggregate stage {name:?} has unknown agg kind {other:?}")),
        };
        Ok(Box::new(AggregateStage::new(name, group_by, Duration::from_secs(window_secs), agg_fn)) as Box<dyn Stage>)
    })
}
