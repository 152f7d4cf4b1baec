use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::operator::{TextOperator, TextValue};

/// An ordered composition of [`TextOperator`]s.
///
/// Applying the pipeline folds the input through every operator in the
/// order they were appended. Operators are validated on append, and nothing
/// may follow an operator that emits gram sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TextOperator>", into = "Vec<TextOperator>")]
pub struct TextPipeline {
    ops: Vec<TextOperator>,
}

impl TextPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from operators in application order.
    pub fn from_operators<I>(ops: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = TextOperator>,
    {
        let mut pipeline = Self::new();
        for op in ops {
            pipeline.push(op)?;
        }
        Ok(pipeline)
    }

    /// Append an operator in place.
    pub fn push(&mut self, op: TextOperator) -> Result<&mut Self, PipelineError> {
        op.validate()?;
        if let Some(last) = self.ops.last() {
            if last.is_terminal() {
                return Err(PipelineError::AfterTerminal {
                    op: op.name(),
                    terminal: last.name(),
                });
            }
        }
        self.ops.push(op);
        Ok(self)
    }

    /// Builder-style append.
    pub fn then(mut self, op: TextOperator) -> Result<Self, PipelineError> {
        self.push(op)?;
        Ok(self)
    }

    pub fn operators(&self) -> &[TextOperator] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Thread a value through every operator in order.
    pub fn apply(&self, value: TextValue) -> Result<TextValue, PipelineError> {
        self.ops.iter().try_fold(value, |acc, op| op.apply(acc))
    }

    pub fn apply_one(&self, text: &str) -> Result<TextValue, PipelineError> {
        self.apply(TextValue::Text(text.to_string()))
    }

    /// Apply to each string independently, preserving order and length.
    pub fn apply_many<S: AsRef<str>>(&self, items: &[S]) -> Result<Vec<TextValue>, PipelineError> {
        items.iter().map(|s| self.apply_one(s.as_ref())).collect()
    }
}

impl TryFrom<Vec<TextOperator>> for TextPipeline {
    type Error = PipelineError;

    fn try_from(ops: Vec<TextOperator>) -> Result<Self, Self::Error> {
        Self::from_operators(ops)
    }
}

impl From<TextPipeline> for Vec<TextOperator> {
    fn from(pipeline: TextPipeline) -> Self {
        pipeline.ops
    }
}
