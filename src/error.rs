use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("Cannot decode cached results: {0}")]
    Decode(String),
    #[error("Cannot encode results: {0}")]
    Encode(String),
    #[error("Unsupported analysis '{name}' (known analyses: {known})")]
    UnsupportedAnalysis { name: String, known: String },
    #[error("Call {caller} -> {callee} references a missing node (graph has {nodes} nodes)")]
    GraphIntegrity {
        caller: usize,
        callee: usize,
        nodes: usize,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Error::Io(err.into());
        }
        Error::Parse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Map an error raised while writing JSON. Only I/O failures stay `Io`.
    pub fn encode_json(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Error::Io(err.into());
        }
        Error::Encode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
