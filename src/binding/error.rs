use rhai::{Dynamic, EvalAltResult, Map, Position};
use thiserror::Error;

use crate::engine::EngineError;
use crate::facade::FacadeError;

/// Caller mistakes detected before the engine is touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Wrong number of arguments: {function} expects {expected}, got {actual}")]
    ArgumentCount {
        function: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Wrong arguments: {function} argument {position} must be {expected}, got {actual}")]
    ArgumentType {
        function: &'static str,
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Wrong arguments: {function} {message}")]
    ArgumentRange {
        function: &'static str,
        message: String,
    },
}

/// Everything a bound function can fail with
#[derive(Debug, Error)]
pub enum BindingError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("ALPR engine is not initialized")]
    NotInitialized,
    #[error(transparent)]
    Engine(EngineError),
}

impl From<FacadeError> for BindingError {
    fn from(err: FacadeError) -> Self {
        match err {
            FacadeError::NotInitialized => Self::NotInitialized,
            FacadeError::Engine(e) => Self::Engine(e),
        }
    }
}

impl BindingError {
    /// Stable kind tag exposed to scripts
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Usage(_) => "TypeError",
            Self::NotInitialized => "NotInitialized",
            Self::Engine(_) => "EngineError",
        }
    }
}

/// Raised into the script as an object map `#{ kind, message }`
impl From<BindingError> for Box<EvalAltResult> {
    fn from(err: BindingError) -> Self {
        let mut map = Map::new();
        map.insert("kind".into(), Dynamic::from(err.kind().to_string()));
        map.insert("message".into(), Dynamic::from(err.to_string()));
        EvalAltResult::ErrorRuntime(Dynamic::from(map), Position::NONE).into()
    }
}

impl From<UsageError> for Box<EvalAltResult> {
    fn from(err: UsageError) -> Self {
        BindingError::Usage(err).into()
    }
}

impl From<FacadeError> for Box<EvalAltResult> {
    fn from(err: FacadeError) -> Self {
        BindingError::from(err).into()
    }
}

/// Recover the `(kind, message)` pair from an error raised by a bound function
pub fn error_kind(err: &EvalAltResult) -> Option<(String, String)> {
    let EvalAltResult::ErrorRuntime(value, _) = err.unwrap_inner() else {
        return None;
    };
    let map = value.read_lock::<Map>()?;
    let kind = map.get("kind")?.clone().into_string().ok()?;
    let message = map.get("message")?.clone().into_string().ok()?;
    Some((kind, message))
}
