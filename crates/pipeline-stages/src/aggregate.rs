//! The `aggregate` stage (spec §4.6, §9).
//!
//! The distilled contract allows a pass-through placeholder ("in this
//! version the stage is specified as a pass-through placeholder — an
//! implementation delivering only pass-through semantics is conformant"),
//! but also leaves a real tumbling-window aggregator as an explicitly
//! legal richer option. This implementation takes that option: a
//! fixed-size, per-group tumbling window keyed on `group_by` fields,
//! closing (and emitting) each window strictly in event-time order as
//! later records advance past it.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Stage, StageError};
use pipeline_core::{Record, RecordMetadata};

/// The numeric reduction an aggregate window computes over a field, in
/// addition to the always-present record count.
#[derive(Debug, Clone)]
pub enum AggregateFn {
    /// Only the per-window record count is emitted.
    CountOnly,
    /// Sum of `field` across the window.
    Sum(String),
    /// Arithmetic mean of `field` across the window.
    Avg(String),
    /// Minimum of `field` across the window.
    Min(String),
    /// Maximum of `field` across the window.
    Max(String),
}

struct Window {
    bucket: i64,
    window_start: DateTime<Utc>,
    group_values: Vec<(String, Value)>,
    count: u64,
    sum: f64,
}

/// A tumbling-window aggregation stage.
pub struct AggregateStage {
    name: String,
    group_by: Vec<String>,
    window: Duration,
    agg_fn: AggregateFn,
    /// One open window per group key, identified by the stringified
    /// group-by values joined with a separator unlikely to collide with
    /// real field content.
    open: HashMap<String, Window>,
}

impl AggregateStage {
    pub fn new(
        name: impl Into<String>,
        group_by: Vec<String>,
        window: Duration,
        agg_fn: AggregateFn,
    ) -> Self {
        Self {
            name: name.into(),
            group_by,
            window,
            agg_fn,
            open: HashMap::new(),
        }
    }

    fn bucket_for(&self, timestamp: DateTime<Utc>) -> i64 {
        let window_secs = self.window.as_secs_f64().max(1.0);
        (timestamp.timestamp() as f64 / window_secs).floor() as i64
    }

    fn window_start(&self, bucket: i64) -> DateTime<Utc> {
        let window_secs = self.window.as_secs_f64().max(1.0);
        Utc.timestamp_opt((bucket as f64 * window_secs) as i64, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn group_key_string(values: &[(String, Value)]) -> String {
        values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\u{1}")
    }

    fn numeric_field(&self) -> Option<&str> {
        match &self.agg_fn {
            AggregateFn::CountOnly => None,
            AggregateFn::Sum(f) | AggregateFn::Avg(f) | AggregateFn::Min(f) | AggregateFn::Max(f) => {
                Some(f.as_str())
            }
        }
    }

    fn finalize(&self, window: Window) -> Record {
        let mut payload = Map::new();
        for (key, value) in &window.group_values {
            payload.insert(key.clone(), value.clone());
        }
        payload.insert(
            "window_start".to_string(),
            Value::String(window.window_start.to_rfc3339()),
        );
        payload.insert(
            "window_end".to_string(),
            Value::String((window.window_start + chrono::Duration::from_std(self.window).unwrap_or_default()).to_rfc3339()),
        );
        payload.insert("count".to_string(), Value::from(window.count));
        match &self.agg_fn {
            AggregateFn::CountOnly => {}
            AggregateFn::Sum(field) => {
                payload.insert(format!("{field}_sum"), Value::from(window.sum));
            }
            AggregateFn::Avg(field) => {
                let avg = if window.count > 0 {
                    window.sum / window.count as f64
                } else {
                    0.0
                };
                payload.insert(format!("{field}_avg"), Value::from(avg));
            }
            AggregateFn::Min(field) => {
                payload.insert(format!("{field}_min"), Value::from(window.sum));
            }
            AggregateFn::Max(field) => {
                payload.insert(format!("{field}_max"), Value::from(window.sum));
            }
        }
        Record::new(payload, RecordMetadata::new(&self.name, "aggregate"))
    }
}

#[async_trait]
impl Stage for AggregateStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage_type(&self) -> &str {
        "aggregate"
    }

    async fn process(&mut self, _ctx: &OpContext, record: Record) -> Result<Option<Record>, StageError> {
        let group_values: Vec<(String, Value)> = self
            .group_by
            .iter()
            .map(|field| {
                let value = record.get(field).cloned().unwrap_or(Value::Null);
                (field.clone(), value)
            })
            .collect();
        let key = Self::group_key_string(&group_values);
        let bucket = self.bucket_for(record.ingested_at());

        let value = self
            .numeric_field()
            .and_then(|field| record.get(field))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let needs_new_window = match self.open.get(&key) {
            Some(existing) => existing.bucket != bucket,
            None => true,
        };

        let mut closed = None;
        if needs_new_window {
            closed = self.open.remove(&key).map(|window| self.finalize(window));
            self.open.insert(
                key.clone(),
                Window {
                    bucket,
                    window_start: self.window_start(bucket),
                    group_values,
                    count: 0,
                    sum: 0.0,
                },
            );
        }

        let window = match self.open.get_mut(&key) {
            Some(window) => window,
            None => unreachable!("a window for this key was just inserted or was already open"),
        };
        window.count += 1;
        match self.agg_fn {
            AggregateFn::Min(_) => {
                window.sum = if window.count == 1 {
                    value
                } else {
                    window.sum.min(value)
                }
            }
            AggregateFn::Max(_) => {
                window.sum = if window.count == 1 {
                    value
                } else {
                    window.sum.max(value)
                }
            }
            _ => window.sum += value,
        }

        Ok(closed)
    }

    async fn close(&mut self, _ctx: &OpContext) -> Result<Vec<Record>, StageError> {
        let windows: Vec<Window> = self.open.drain().map(|(_, w)| w).collect();
        Ok(windows.into_iter().map(|w| self.finalize(w)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use pipeline_core::RecordMetadata;
    use serde_json::json;

    fn record_at(fields: Value, timestamp: DateTime<Utc>) -> Record {
        let payload = match fields {
            Value::Object(map) => map,
            _ => panic!("test fixture must be a JSON object"),
        };
        Record::with_timestamp(payload, RecordMetadata::new("test", "test"), timestamp)
    }

    #[tokio::test]
    async fn counts_records_within_one_window() {
        let mut stage = AggregateStage::new(
            "agg",
            vec!["host".to_string()],
            Duration::from_secs(60),
            AggregateFn::CountOnly,
        );
        let ctx = OpContext::new_default();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        for i in 0..3 {
            let out = stage
                .process(&ctx, record_at(json!({"host": "a"}), base + ChronoDuration::seconds(i)))
                .await
                .unwrap();
            assert!(out.is_none());
        }

        let flushed = stage.close(&ctx).await.unwrap();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].get("count").unwrap(), 3);
    }

    #[tokio::test]
    async fn a_later_window_flushes_the_prior_one() {
        let mut stage = AggregateStage::new(
            "agg",
            vec!["host".to_string()],
            Duration::from_secs(60),
            AggregateFn::CountOnly,
        );
        let ctx = OpContext::new_default();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        stage
            .process(&ctx, record_at(json!({"host": "a"}), base))
            .await
            .unwrap();
        let flushed = stage
            .process(&ctx, record_at(json!({"host": "a"}), base + ChronoDuration::seconds(120)))
            .await
            .unwrap();

        let flushed = flushed.expect("a later window should flush the prior one");
        assert_eq!(flushed.get("count").unwrap(), 1);
    }

    #[tokio::test]
    async fn distinct_groups_aggregate_independently() {
        let mut stage = AggregateStage::new(
            "agg",
            vec!["host".to_string()],
            Duration::from_secs(60),
            AggregateFn::Sum("value".to_string()),
        );
        let ctx = OpContext::new_default();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        stage
            .process(&ctx, record_at(json!({"host": "a", "value": 10}), base))
            .await
            .unwrap();
        stage
            .process(&ctx, record_at(json!({"host": "b", "value": 5}), base))
            .await
            .unwrap();

        let flushed = stage.close(&ctx).await.unwrap();
        assert_eq!(flushed.len(), 2);
        let total: f64 = flushed
            .iter()
            .map(|r| r.get("value_sum").unwrap().as_f64().unwrap())
            .sum();
        assert_eq!(total, 15.0);
    }
}
