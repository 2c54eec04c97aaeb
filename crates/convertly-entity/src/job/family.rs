//! Job family enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of a job, selecting which worker pool executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_family", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobFamily {
    /// PDF and office document operations.
    Document,
    /// Raster image operations.
    Image,
}

impl JobFamily {
    /// Return the family as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for JobFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
