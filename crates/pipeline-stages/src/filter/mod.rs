//! The `filter` stage (spec §4.6): "Evaluates a predicate against the
//! record; passes on true, filters on false."

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{Expr, Literal, Op};
pub use parser::{parse_filter, FilterParseError};

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Stage, StageError};
use pipeline_core::Record;

/// A stage that passes or drops records according to a predicate parsed
/// once, at construction, from the filter grammar (spec §4.6, §9).
pub struct FilterStage {
    name: String,
    predicate: Expr,
}

impl FilterStage {
    /// Parses `predicate` and builds a stage that evaluates it against
    /// every record it sees.
    pub fn new(name: impl Into<String>, predicate: &str) -> Result<Self, FilterParseError> {
        Ok(Self {
            name: name.into(),
            predicate: parse_filter(predicate)?,
        })
    }
}

#[async_trait]
impl Stage for FilterStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage_type(&self) -> &str {
        "filter"
    }

    async fn process(&mut self, _ctx: &OpContext, record: Record) -> Result<Option<Record>, StageError> {
        if eval::evaluate(&self.predicate, record.payload()) {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}
