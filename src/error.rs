use thiserror::Error;

/// Everything that can stop a map build.
///
/// A region without a matching boundary feature is deliberately not here:
/// it is reported through `JoinReport` and rendered as "no data".
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to fetch {resource}: {reason}")]
    Fetch { resource: String, reason: String },

    #[error("failed to parse {resource}: {reason}")]
    Parse { resource: String, reason: String },

    #[error("no usable rows for country '{country}'")]
    DataUnavailable { country: String },

    #[error("color scale requested without any values")]
    EmptyDomain,

    #[error("no aggregated data for region '{0}'")]
    UnknownRegion(String),

    #[error("boundary document has no collection '{0}'")]
    MissingCollection(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MapError>;

impl MapError {
    pub fn fetch(resource: impl Into<String>, reason: impl ToString) -> Self {
        MapError::Fetch {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(resource: impl Into<String>, reason: impl ToString) -> Self {
        MapError::Parse {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}
