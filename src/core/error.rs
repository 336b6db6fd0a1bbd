// Copyright @yucwang 2026

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid scene config: {what}")]
    ConfigInvalid { what: String },

    #[error("scene too large: {what}")]
    SceneTooLarge { what: String },
}

impl Error {
    pub fn config(what: impl Into<String>) -> Self {
        Self::ConfigInvalid { what: what.into() }
    }

    pub fn too_large(what: impl Into<String>) -> Self {
        Self::SceneTooLarge { what: what.into() }
    }
}
