//! Parsing of job input and output locations.

use crate::error::TransformError;
use crate::Result;
use std::fmt;
use std::path::PathBuf;

/// Where a job reads from or writes to.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectLocation {
    /// Object (or prefix) in a bucket, routed through [`super::ObjectStorage`]
    Object { bucket: String, key: String },
    /// Plain filesystem path
    Local(PathBuf),
}

impl ObjectLocation {
    /// Parse `s3://bucket/key`, `s3a://bucket/key` or a local path.
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(TransformError::Location("empty location".into()).into());
        }

        let rest = location
            .strip_prefix("s3://")
            .or_else(|| location.strip_prefix("s3a://"));

        match rest {
            Some(rest) => {
                let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(TransformError::Location(format!(
                        "missing bucket in {}",
                        location
                    ))
                    .into());
                }
                Ok(ObjectLocation::Object {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            None if location.contains("://") => Err(TransformError::Location(format!(
                "unsupported scheme in {}",
                location
            ))
            .into()),
            None => Ok(ObjectLocation::Local(PathBuf::from(location))),
        }
    }

    /// Location of `name` inside this location treated as a directory.
    pub fn child(&self, name: &str) -> ObjectLocation {
        match self {
            ObjectLocation::Object { bucket, key } => {
                let key = if key.is_empty() || key.ends_with('/') {
                    format!("{}{}", key, name)
                } else {
                    format!("{}/{}", key, name)
                };
                ObjectLocation::Object {
                    bucket: bucket.clone(),
                    key,
                }
            }
            ObjectLocation::Local(path) => ObjectLocation::Local(path.join(name)),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectLocation::Object { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
            ObjectLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
