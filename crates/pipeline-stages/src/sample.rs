//! The `sample` stage (spec §4.6): "Passes the record with probability
//! `rate` ∈ [0,1]; uses a per-stage random stream seeded once at
//! construction."

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Stage, StageError};
use pipeline_core::Record;

/// A stage that randomly samples its input stream at a fixed rate.
pub struct SampleStage {
    name: String,
    rate: f64,
    rng: SmallRng,
}

impl SampleStage {
    /// `rate` is clamped to `[0, 1]`. `seed` fixes the per-stage random
    /// stream so a given seed reproduces the same sampling decisions.
    pub fn new(name: impl Into<String>, rate: f64, seed: u64) -> Self {
        Self {
            name: name.into(),
            rate: rate.clamp(0.0, 1.0),
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

#[async_trait]
impl Stage for SampleStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage_type(&self) -> &str {
        "sample"
    }

    async fn process(&mut self, _ctx: &OpContext, record: Record) -> Result<Option<Record>, StageError> {
        if self.rng.gen_bool(self.rate) {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::RecordMetadata;

    fn record() -> Record {
        Record::new(Default::default(), RecordMetadata::new("src", "origin"))
    }

    #[tokio::test]
    async fn rate_zero_never_passes() {
        let mut stage = SampleStage::new("sample", 0.0, 42);
        let ctx = OpContext::new_default();
        for _ in 0..50 {
            let out = stage.process(&ctx, record()).await.unwrap();
            assert!(out.is_none());
        }
    }

    #[tokio::test]
    async fn rate_one_always_passes() {
        let mut stage = SampleStage::new("sample", 1.0, 42);
        let ctx = OpContext::new_default();
        for _ in 0..50 {
            let out = stage.process(&ctx, record()).await.unwrap();
            assert!(out.is_some());
        }
    }

    #[tokio::test]
    async fn same_seed_reproduces_same_decisions() {
        let ctx = OpContext::new_default();
        let mut a = SampleStage::new("a", 0.5, 7);
        let mut b = SampleStage::new("b", 0.5, 7);
        for _ in 0..20 {
            let out_a = a.process(&ctx, record()).await.unwrap();
            let out_b = b.process(&ctx, record()).await.unwrap();
            assert_eq!(out_a.is_some(), out_b.is_some());
        }
    }
}
