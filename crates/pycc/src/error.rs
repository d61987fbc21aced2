#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{file}:{line}: unsupported syntax: {detail}")]
    UnsupportedSyntax {
        file: String,
        line: u32,
        detail: String,
    },

    #[error("{file}:{line}: unsupported type annotation '{annotation}'")]
    UnsupportedType {
        file: String,
        line: u32,
        annotation: String,
    },

    #[error("{file}:{line}: argument #{argument_index} is missing a type annotation")]
    MissingAnnotation {
        file: String,
        line: u32,
        argument_index: usize,
    },

    #[error("undefined value: {name}")]
    UndefinedValue { name: String },

    #[error("register pressure exceeded: no XMM register could be freed")]
    RegisterPressureExceeded,

    #[error("type mismatch: cannot mix operand locations across a binary operation")]
    TypeMismatch,

    #[error("external tool '{stage}' failed with status {status}")]
    ExternalToolFailure {
        stage: String,
        status: std::process::ExitStatus,
    },

    #[error("I/O error during '{stage}': {source}")]
    Io {
        stage: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
