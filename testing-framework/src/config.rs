use crate::substitution::PlaceholderMap;

/// Engine behaviour switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Print every query before executing it
    pub echo_queries: bool,
}

/// Everything a run needs besides the connection and the output sink.
///
/// Built by the command line front-ends.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    /// Fixture location, e.g. `tests/postgresql/*.sql`
    pub fixtures: String,
    pub placeholders: PlaceholderMap,
    pub engine: EngineOptions,
}

impl HarnessConfig {
    pub fn new(fixtures: impl Into<String>, placeholders: PlaceholderMap) -> Self {
        Self {
            fixtures: fixtures.into(),
            placeholders,
            engine: EngineOptions::default(),
        }
    }

    pub fn with_echo_queries(mut self, echo_queries: bool) -> Self {
        self.engine.echo_queries = echo_queries;
        self
    }
}
