use thiserror::Error;

use crate::sources::SourceError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{context} fetch failed: {source}")]
    Source {
        context: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("fallback symbol \"{id}\" could not be loaded: {source}")]
    FallbackSymbol {
        id: String,
        #[source]
        source: SourceError,
    },
}
