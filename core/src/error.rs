use thiserror::Error;

/// Errors raised by the matching engine and the feature index.
///
/// A query that simply finds nothing is not an error; those return `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("matching engine has not been filled")]
    EngineNotFilled,

    #[error("invalid argument value: {name} = {value} (expected a value within 0.0..=1.0)")]
    InvalidArgumentValue { name: &'static str, value: f32 },

    #[error("feature vector {index} references a feature outside the universe")]
    InvalidFeature { index: usize },

    #[error("a fill is already in progress")]
    AlreadyFilling,

    #[error("matching engine is already filled")]
    AlreadyFilled,

    #[error("fill worker stopped before publishing the corpus")]
    FillAborted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Checks that a quality threshold lies within `0.0..=1.0`. NaN is rejected.
pub(crate) fn check_unit_interval(name: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidArgumentValue { name, value })
    }
}
