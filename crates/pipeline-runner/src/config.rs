//! The runner's configuration surface (spec §6): "the runner consumes a
//! configuration object with the following recognized options — the core
//! reads exactly these, in this topology."

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use pipeline_core::OverflowPolicy;
use pipeline_rt::supervisor::SupervisionStrategy;
use pipeline_rt::SupervisionConfig;

/// Which topology [`crate::topology::build`] instantiates (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// "A map of sources, a map of transforms, a map of sinks connected
    /// by declared inputs — each becomes an actor."
    Flat,
    /// "A hierarchical tree rooted at a supervisor, recursively
    /// instantiated from an `ActorDefinition`."
    Actor,
    /// "The single-processor topology of §4.5, instantiated from the
    /// first source, all transforms in declaration order, and the first
    /// sink."
    Stream,
}

/// `actor_system.dispatcher.*` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSection {
    /// `actor_system.dispatcher.parallelism` — worker count (default 8).
    pub parallelism: usize,
}

impl Default for DispatcherSection {
    fn default() -> Self {
        Self { parallelism: 8 }
    }
}

/// The overflow policy name as it appears in configuration
/// (`actor_system.mailbox.overflow_strategy` ∈ {backpressure, drop_oldest,
/// drop_newest}, spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowStrategyName {
    Backpressure,
    DropOldest,
    DropNewest,
}

impl From<OverflowStrategyName> for OverflowPolicy {
    fn from(name: OverflowStrategyName) -> Self {
        match name {
            OverflowStrategyName::Backpressure => OverflowPolicy::Backpressure,
            OverflowStrategyName::DropOldest => OverflowPolicy::DropOldest,
            OverflowStrategyName::DropNewest => OverflowPolicy::DropNewest,
        }
    }
}

/// `actor_system.mailbox.*` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxSection {
    /// `actor_system.mailbox.capacity` (default 10000).
    pub capacity: usize,
    /// `actor_system.mailbox.overflow_strategy`.
    pub overflow_strategy: OverflowStrategyName,
}

impl Default for MailboxSection {
    fn default() -> Self {
        Self {
            capacity: pipeline_core::DEFAULT_MAILBOX_CAPACITY,
            overflow_strategy: OverflowStrategyName::Backpressure,
        }
    }
}

/// `actor_system.*` (spec §6), consumed by the actor and flat topologies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorSystemSection {
    pub dispatcher: DispatcherSection,
    pub mailbox: MailboxSection,
}

/// `supervision.*` attached to a per-actor definition (spec §6):
/// "`supervision.strategy`, `supervision.max_restarts`,
/// `supervision.within_seconds`".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisionSection {
    pub strategy: SupervisionStrategyName,
    pub max_restarts: u32,
    pub within_seconds: u64,
}

impl Default for SupervisionSection {
    fn default() -> Self {
        let defaults = SupervisionConfig::default();
        Self {
            strategy: SupervisionStrategyName::from(defaults.strategy),
            max_restarts: defaults.max_restarts,
            within_seconds: defaults.within_seconds,
        }
    }
}

impl From<&SupervisionSection> for SupervisionConfig {
    fn from(section: &SupervisionSection) -> Self {
        SupervisionConfig {
            strategy: section.strategy.into(),
            max_restarts: section.max_restarts,
            within_seconds: section.within_seconds,
        }
    }
}

/// `supervision.strategy` as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisionStrategyName {
    OneForOne,
    OneForAll,
    RestForOne,
}

impl From<SupervisionStrategyName> for SupervisionStrategy {
    fn from(name: SupervisionStrategyName) -> Self {
        match name {
            SupervisionStrategyName::OneForOne => SupervisionStrategy::OneForOne,
            SupervisionStrategyName::OneForAll => SupervisionStrategy::OneForAll,
            SupervisionStrategyName::RestForOne => SupervisionStrategy::RestForOne,
        }
    }
}

impl From<SupervisionStrategy> for SupervisionStrategyName {
    fn from(strategy: SupervisionStrategy) -> Self {
        match strategy {
            SupervisionStrategy::OneForOne => SupervisionStrategyName::OneForOne,
            SupervisionStrategy::OneForAll => SupervisionStrategyName::OneForAll,
            SupervisionStrategy::RestForOne => SupervisionStrategyName::RestForOne,
        }
    }
}

/// One node of a flat or actor topology (spec §6): "Per-actor: `name`,
/// `type`, `parallelism`, `supervision.strategy`, `supervision.max_restarts`,
/// `supervision.within_seconds`, `config` (opaque), `outputs` (list of
/// named downstream actors), `children` (recursive)."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    pub supervision: Option<SupervisionSection>,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub children: Vec<ActorDefinition>,
}

fn default_parallelism() -> usize {
    1
}

/// The flat topology's three maps (spec §4.8): sources, transforms, and
/// sinks, each keyed by declared name, wired by `outputs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatTopologyConfig {
    pub sources: Vec<ActorDefinition>,
    pub transforms: Vec<ActorDefinition>,
    pub sinks: Vec<ActorDefinition>,
}

/// How `dedup_ttl` expires under realtime mode (spec §6: "`dedup_ttl`
/// (duration)"). Configuration carries the wall-clock duration as a
/// compact string (`"1h"`, `"30s"`, `"500ms"`) to stay readable in TOML;
/// [`RealtimeSection::ttl`] parses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeSection {
    pub id_field: String,
    #[serde(default)]
    pub event_type_field: Option<String>,
    #[serde(default)]
    pub entity_id_field: Option<String>,
    #[serde(default)]
    pub dedup_storage: DedupStorageKind,
    pub dedup_ttl: String,
}

impl RealtimeSection {
    /// Parses [`RealtimeSection::dedup_ttl`], rejecting anything that
    /// isn't a non-negative integer followed by `ms`, `s`, `m`, `h`, or
    /// `d`.
    pub fn ttl(&self) -> Result<Duration, String> {
        parse_duration(&self.dedup_ttl)
    }
}

/// `dedup_storage` ∈ {memory, remote} (spec §6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStorageKind {
    #[default]
    Memory,
    Remote,
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split_at = input
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration {input:?} has no unit suffix"))?;
    let (digits, unit) = input.split_at(split_at);
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("duration {input:?} has a non-numeric magnitude"))?;
    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount * 60),
        "h" => Duration::from_secs(amount * 3600),
        "d" => Duration::from_secs(amount * 86_400),
        other => return Err(format!("duration {input:?} has unrecognized unit {other:?}")),
    };
    Ok(duration)
}

/// The complete configuration object the runner consumes (spec §4.8,
/// §6). Parsed from TOML via [`RunnerConfig::from_toml`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(rename = "type")]
    pub topology: TopologyKind,
    #[serde(default)]
    pub actor_system: ActorSystemSection,
    /// Root of the actor topology (spec §4.8). Required when `type =
    /// "actor"`.
    pub root: Option<ActorDefinition>,
    /// The flat topology's three maps. Required when `type = "flat"`.
    #[serde(default)]
    pub flat: FlatTopologyConfig,
    /// Stream topology component chain: first source, transforms in
    /// declaration order, first sink. Required when `type = "stream"`.
    #[serde(default)]
    pub stream: Option<ActorDefinition>,
    #[serde(default)]
    pub stream_transforms: Vec<ActorDefinition>,
    pub stream_sink: Option<ActorDefinition>,
    #[serde(default)]
    pub realtime: Option<RealtimeSection>,
}

impl RunnerConfig {
    /// Parses a [`RunnerConfig`] from a TOML document (spec §1: the TOML
    /// parser itself is an external collaborator; this only defines the
    /// shape it must produce).
    pub fn from_toml(document: &str) -> Result<Self, String> {
        toml::from_str(document).map_err(|error| error.to_string())
    }

    /// Validates cross-field requirements `serde` alone can't express:
    /// the topology-specific section must be present for the selected
    /// `type` (spec §7: configuration errors are fatal to `Start`).
    pub fn validate(&self) -> Result<(), String> {
        match self.topology {
            TopologyKind::Flat => {
                if self.flat.sources.is_empty() {
                    return Err("flat topology requires at least one source".to_string());
                }
                if self.flat.sinks.is_empty() {
                    return Err("flat topology requires at least one sink".to_string());
                }
            }
            TopologyKind::Actor => {
                if self.root.is_none() {
                    return Err("actor topology requires a `root` actor definition".to_string());
                }
            }
            TopologyKind::Stream => {
                if self.stream.is_none() {
                    return Err("stream topology requires a `stream` source definition".to_string());
                }
                if self.stream_sink.is_none() {
                    return Err("stream topology requires a `stream_sink` definition".to_string());
                }
            }
        }
        if let Some(realtime) = &self.realtime {
            realtime.ttl()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_stream_config() {
        let document = r#"
            type = "stream"

            [stream]
            name = "demo-source"
            type = "demo-interval"

            [stream_sink]
            name = "console"
            type = "console"
        "#;
        let config = RunnerConfig::from_toml(document).unwrap();
        assert_eq!(config.topology, TopologyKind::Stream);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_stream_without_sink() {
        let document = r#"
            type = "stream"

            [stream]
            name = "demo-source"
            type = "demo-interval"
        "#;
        let config = RunnerConfig::from_toml(document).unwrap();
        assert!(config.validate().unwrap_err().contains("stream_sink"));
    }

    #[test]
    fn default_actor_system_section_matches_spec_defaults() {
        let section = ActorSystemSection::default();
        assert_eq!(section.dispatcher.parallelism, 8);
        assert_eq!(section.mailbox.capacity, 10_000);
        assert_eq!(section.mailbox.overflow_strategy, OverflowStrategyName::Backpressure);
    }

    #[test]
    fn parses_duration_suffixes() {
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert!(parse_duration("1x").is_err());
        assert!(parse_duration("nope").is_err());
    }

    #[test]
    fn realtime_section_round_trips_through_json_opaque_config() {
        let document = r#"
            type = "stream"

            [stream]
            name = "s"
            type = "demo-interval"

            [stream_sink]
            name = "sink"
            type = "console"

            [realtime]
            id_field = "evt_id"
            event_type_field = "op"
            entity_id_field = "id"
            dedup_storage = "memory"
            dedup_ttl = "1h"
        "#;
        let config = RunnerConfig::from_toml(document).unwrap();
        let realtime = config.realtime.unwrap();
        assert_eq!(realtime.id_field, "evt_id");
        assert_eq!(realtime.ttl().unwrap(), Duration::from_secs(3600));
        assert_eq!(realtime.dedup_storage, DedupStorageKind::Memory);
    }
}
