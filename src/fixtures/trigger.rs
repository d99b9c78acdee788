use super::{DslOptions, ToDsl};

/// A source which emits a fixed payload once deployed.
#[derive(Clone, Debug)]
pub struct TriggerSource {
    payload: String,
    options: DslOptions,
}

impl TriggerSource {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            options: DslOptions::default(),
        }
    }

    /// The payload emitted by this source.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Set an additional option, e.g. `fixedDelay`.
    pub fn option(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.options.set(key, val);
        self
    }
}

impl ToDsl for TriggerSource {
    fn to_dsl(&self) -> String {
        // Single quotes within a quoted DSL value are escaped by doubling them.
        let mut out = format!("trigger --payload='{}'", self.payload.replace('\'', "''"));
        self.options.render_into(&mut out);
        out
    }
}
