//! Pipeline definition composition.
//!
//! The runtime accepts pipelines as a textual DSL where each stage is a `name --key=value`
//! fragment and stages are joined by a delimiter token. The grammar is owned by the runtime,
//! this module only assembles strings and never validates them.

use crate::fixtures::{Sink, ToDsl};

#[cfg(test)]
#[path = "dsl_test.rs"]
mod dsl_test;

/// The token used by the runtime to join pipeline stages.
pub const XD_DELIMITER: &str = " | ";

/// Join the given fragments with the given delimiter, preserving their order.
pub fn compose<I, S>(fragments: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (idx, fragment) in fragments.into_iter().enumerate() {
        if idx > 0 {
            out.push_str(delimiter);
        }
        out.push_str(fragment.as_ref());
    }
    out
}

/// The role a stage plays within a pipeline.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StageKind {
    /// A stage which produces data.
    Source,
    /// A stage which transforms data in flight.
    Processor,
    /// A terminal stage which persists or emits data.
    Sink,
}

/// A single stage of a pipeline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stage {
    pub kind: StageKind,
    pub fragment: String,
}

/// An ordered, immutable sequence of pipeline stages.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PipelineDefinition {
    stages: Vec<Stage>,
}

impl PipelineDefinition {
    /// Start building a new pipeline definition.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The stages of this pipeline, in submission order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Render this pipeline as a single submittable definition.
    pub fn render(&self, delimiter: &str) -> String {
        compose(self.stages.iter().map(|stage| stage.fragment.as_str()), delimiter)
    }
}

/// A builder of pipeline definitions.
#[derive(Clone, Debug, Default)]
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    /// Append a source stage.
    pub fn source(self, fixture: &impl ToDsl) -> Self {
        self.stage(StageKind::Source, fixture.to_dsl())
    }

    /// Append a processor stage given as a raw DSL fragment.
    pub fn processor(self, fragment: impl Into<String>) -> Self {
        self.stage(StageKind::Processor, fragment.into())
    }

    /// Append a sink stage.
    pub fn sink(self, sink: impl Into<Sink>) -> Self {
        let sink: Sink = sink.into();
        self.stage(StageKind::Sink, sink.to_dsl())
    }

    /// Append a stage of the given kind with a raw DSL fragment.
    pub fn stage(mut self, kind: StageKind, fragment: String) -> Self {
        self.stages.push(Stage { kind, fragment });
        self
    }

    /// Freeze the accumulated stages into a definition.
    pub fn build(self) -> PipelineDefinition {
        PipelineDefinition { stages: self.stages }
    }
}
