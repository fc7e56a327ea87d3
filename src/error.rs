use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SkinError {
    #[error("Zone error: no zone named '{0}'")]
    ZoneNotFound(String),
    #[error("Input error: {0}")]
    InvalidNumericInput(String),
    #[error("Table error: {0}")]
    MissingTable(String),
    #[error("Input error: {0}")]
    Input(String),
    #[error("Output error: {0}")]
    Output(String),
}
