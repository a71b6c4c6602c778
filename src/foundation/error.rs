pub type TracemapResult<T> = Result<T, TracemapError>;

#[derive(thiserror::Error, Debug)]
pub enum TracemapError {
    #[error("unit conversion error: {0}")]
    UnitConversion(String),

    #[error("tile fetch error: {0}")]
    TileFetch(String),

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("not enough points to draw a map: got {got}, need at least 2")]
    InsufficientPoints { got: usize },

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TracemapError {
    pub fn unit_conversion(msg: impl Into<String>) -> Self {
        Self::UnitConversion(msg.into())
    }

    pub fn tile_fetch(msg: impl Into<String>) -> Self {
        Self::TileFetch(msg.into())
    }

    pub fn invalid_bounding_box(msg: impl Into<String>) -> Self {
        Self::InvalidBoundingBox(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
