use thiserror::Error;

#[derive(Error, Debug)]
pub enum SocktabError {
    #[error("Socket table {source_name} unavailable: {reason}")]
    SourceUnavailable {
        source_name: String,
        reason: String,
    },
    #[error("Allocation failed while growing table to {0} records")]
    AllocationFailure(usize),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SocktabError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        SocktabError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SocktabError>;
