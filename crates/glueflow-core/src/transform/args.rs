//! Named job arguments as passed by the job runner.

use crate::error::TransformError;
use crate::Result;
use std::collections::HashMap;

/// Arguments the transformation job cannot run without.
pub const REQUIRED_ARGUMENTS: [&str; 3] = ["JOB_NAME", "input_path", "output_path"];

/// `--key value` / `--key=value` pairs, keyed without the leading dashes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobArguments {
    values: HashMap<String, String>,
}

impl JobArguments {
    /// Parse `argv` and check that every key in `required` is present.
    ///
    /// Unknown keys are kept but never required. A key followed directly by
    /// another key has an empty value. Later occurrences win.
    pub fn resolve<S: AsRef<str>>(argv: &[S], required: &[&str]) -> Result<Self> {
        let mut values = HashMap::new();
        let mut tokens = argv.iter().map(AsRef::as_ref).peekable();

        while let Some(token) = tokens.next() {
            let Some(name) = token.strip_prefix("--") else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            if let Some((key, value)) = name.split_once('=') {
                values.insert(key.to_string(), value.to_string());
                continue;
            }

            let has_value = tokens.peek().is_some_and(|next| !next.starts_with("--"));
            let value = if has_value {
                tokens.next().unwrap_or_default()
            } else {
                ""
            };
            values.insert(name.to_string(), value.to_string());
        }

        let arguments = Self { values };
        for key in required {
            arguments.require(key)?;
        }
        Ok(arguments)
    }

    /// Value of `key`, if given.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of `key`, or an error naming it.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| TransformError::MissingArgument(key.to_string()).into())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_resolve_space_separated() {
        let argv = [
            "--JOB_NAME",
            "supplychain-etl-job",
            "--input_path",
            "s3://raw/input/test_data.csv",
            "--output_path",
            "s3://processed/output/",
        ];
        let args = JobArguments::resolve(&argv, &REQUIRED_ARGUMENTS).unwrap();
        assert_eq!(args.get("JOB_NAME"), Some("supplychain-etl-job"));
        assert_eq!(args.get("input_path"), Some("s3://raw/input/test_data.csv"));
        assert_eq!(args.get("output_path"), Some("s3://processed/output/"));
    }

    #[test]
    fn test_resolve_equals_form_and_unknown_keys() {
        let argv = [
            "--job-bookmark-option",
            "job-bookmark-disable",
            "--JOB_NAME=etl",
            "--input_path=s3://raw/a.csv",
            "--enable-metrics",
            "--output_path=s3://processed/out/",
            "--TempDir",
            "s3://tmp/",
        ];
        let args = JobArguments::resolve(&argv, &REQUIRED_ARGUMENTS).unwrap();
        assert_eq!(args.get("input_path"), Some("s3://raw/a.csv"));
        assert_eq!(args.get("output_path"), Some("s3://processed/out/"));
        assert_eq!(args.get("enable-metrics"), Some(""));
        assert_eq!(args.get("TempDir"), Some("s3://tmp/"));
        assert_eq!(args.len(), 6);
        assert!(!args.is_empty());
    }

    #[test]
    fn test_resolve_nothing_required() {
        let argv: [&str; 0] = [];
        let args = JobArguments::resolve(&argv, &[]).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_resolve_missing_required() {
        let argv = ["--JOB_NAME", "etl", "--input_path", "s3://raw/a.csv"];
        let err = JobArguments::resolve(&argv, &REQUIRED_ARGUMENTS).unwrap_err();
        assert!(matches!(
            err,
            Error::Transform(TransformError::MissingArgument(ref key)) if key == "output_path"
        ));
        assert_eq!(
            err.to_string(),
            "Transform error: Missing required job argument --output_path"
        );
    }

    #[test]
    fn test_flag_without_value_does_not_satisfy_required() {
        let argv = ["--JOB_NAME", "etl", "--input_path", "--output_path", "out/"];
        assert!(JobArguments::resolve(&argv, &REQUIRED_ARGUMENTS).is_err());
    }

    #[test]
    fn test_positional_tokens_ignored() {
        let argv = vec!["script.py".to_string(), "--input_path".into(), "a".into()];
        let args = JobArguments::resolve(&argv, &["input_path"]).unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args.require("input_path").unwrap(), "a");
    }
}
