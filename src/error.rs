use thiserror::Error;

/// User-facing errors.
///
/// Formatting never fails because of the SQL text itself: the lexer accepts
/// any input. Errors come from invalid options, configuration files, I/O, or
/// a failed safety check.
#[derive(Error, Debug)]
pub enum SqlfoldError {
    #[error("sqlfold config error: {0}")]
    Config(String),

    #[error("sqlfold equivalence error: {0}")]
    Equivalence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SqlfoldError>;
