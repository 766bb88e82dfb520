use thiserror::Error;

/// The single error type the core returns from every fallible entry point.
///
/// Bytecode-decode and movie-parse failures surface through here too, so a
/// host only needs to handle one error type regardless of whether the
/// failure came from the chunk parser or the VM.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("failed to parse movie data: {0}")]
    ParseError(String),

    #[error("invalid opcode byte 0x{byte:02x}")]
    InvalidOpcode { byte: u16 },

    #[error("opcode 0x{byte:02x} is recognized but not supported by this runtime")]
    UnsupportedOpcode { byte: u16 },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: i32, len: usize },

    #[error("handler \"{name}\" is undefined")]
    UndefinedHandler { name: String },

    #[error("name \"{name}\" is undefined")]
    UndefinedName { name: String },

    #[error("arithmetic error: {reason}")]
    ArithmeticError { reason: String },

    #[error("cast library \"{lib}\" is not loaded")]
    CastNotLoaded { lib: String },

    #[error("network error (code {code})")]
    NetError { code: i32 },
}

/// Lightweight conversion-failure type used by `Datum`'s accessor methods
/// (`int_value`, `to_list`, ...). Kept separate from `RuntimeError` because
/// most of these conversions happen deep in builtin/opcode handlers where a
/// short, ad hoc message is more useful than a structured variant; call
/// sites that need to bubble one up to the VM boundary convert it with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptErrorCode {
    HandlerNotFound,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub code: ScriptErrorCode,
    pub message: String,
}

impl ScriptError {
    pub fn new(message: String) -> ScriptError {
        Self::new_code(ScriptErrorCode::Generic, message)
    }

    pub fn new_code(code: ScriptErrorCode, message: String) -> ScriptError {
        ScriptError { code, message }
    }
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ScriptError {}

impl From<ScriptError> for RuntimeError {
    fn from(e: ScriptError) -> Self {
        match e.code {
            ScriptErrorCode::HandlerNotFound => RuntimeError::UndefinedHandler { name: e.message },
            ScriptErrorCode::Generic => RuntimeError::TypeMismatch {
                expected: "compatible datum".to_string(),
                found: e.message,
            },
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
