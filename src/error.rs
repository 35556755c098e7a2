use thiserror::Error;

#[derive(Error, Debug)]
pub enum PainelError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid filter: {0}")]
    QueryBuild(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PainelError>;

impl PainelError {
    /// Owned copy of an error held in shared state. Database and CSV errors
    /// cannot be cloned and come back as `Other` with the same message.
    pub fn to_owned_error(&self) -> Self {
        match self {
            Self::QueryBuild(msg) => Self::QueryBuild(msg.clone()),
            Self::Fetch(msg) => Self::Fetch(msg.clone()),
            Self::Render(msg) => Self::Render(msg.clone()),
            Self::Settings(msg) => Self::Settings(msg.clone()),
            Self::Other(msg) => Self::Other(msg.clone()),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
            Self::Db(_) | Self::Csv(_) => Self::Other(self.to_string()),
        }
    }
}
