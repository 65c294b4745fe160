use core::num::ParseIntError;

use crate::{BoxError, IdProvider};

/// Why an [`EnvProvider`] could not produce an id.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// None of the variables is set to a non-empty value.
    #[error("none of the environment variables {vars:?} is set")]
    NotSet { vars: Vec<String> },

    /// The first non-empty variable is not an unsigned integer.
    #[error("environment variable {var}={value:?} is not a valid id")]
    Invalid {
        var: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Reads an id from environment variables.
///
/// Variables are consulted in order; the first one holding a non-empty value
/// (after trimming whitespace) is parsed as a decimal `u64`. Later variables
/// are not consulted once a value is found, even if it fails to parse.
///
/// ```
/// use kubeflake::{EnvProvider, IdProvider};
///
/// let provider = EnvProvider::new(["CLUSTER_ID", "DEFAULT_CLUSTER_ID"])
///     .with_lookup(|name| (name == "DEFAULT_CLUSTER_ID").then(|| "3".to_owned()));
/// assert_eq!(provider.id().unwrap(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct EnvProvider {
    vars: Vec<String>,
    lookup: fn(&str) -> Option<String>,
}

impl EnvProvider {
    /// Creates a provider reading `vars` from the process environment.
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
            lookup: |name| std::env::var(name).ok(),
        }
    }

    /// Replaces the environment lookup, e.g. with a fixed table in tests.
    #[must_use]
    pub fn with_lookup(mut self, lookup: fn(&str) -> Option<String>) -> Self {
        self.lookup = lookup;
        self
    }

    /// The variables consulted, in order.
    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Resolves the id with a typed error.
    ///
    /// # Errors
    ///
    /// [`EnvError::NotSet`] if no variable has a value, [`EnvError::Invalid`]
    /// if the first value does not parse.
    pub fn resolve(&self) -> Result<u64, EnvError> {
        let (var, value) = self
            .vars
            .iter()
            .find_map(|var| {
                (self.lookup)(var)
                    .map(|v| v.trim().to_owned())
                    .filter(|v| !v.is_empty())
                    .map(|v| (var, v))
            })
            .ok_or_else(|| EnvError::NotSet {
                vars: self.vars.clone(),
            })?;
        value.parse().map_err(|source| EnvError::Invalid {
            var: var.clone(),
            value,
            source,
        })
    }
}

impl IdProvider for EnvProvider {
    fn id(&self) -> Result<u64, BoxError> {
        Ok(self.resolve()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> Option<String> {
        match name {
            "EMPTY" => Some(String::new()),
            "BLANK" => Some("  ".to_owned()),
            "SEVEN" => Some(" 7\n".to_owned()),
            "NINE" => Some("9".to_owned()),
            "BAD" => Some("nine".to_owned()),
            _ => None,
        }
    }

    #[test]
    fn first_non_empty_wins() {
        let p = EnvProvider::new(["MISSING", "EMPTY", "BLANK", "SEVEN", "NINE"]).with_lookup(table);
        assert_eq!(p.resolve().unwrap(), 7);
    }

    #[test]
    fn nothing_set() {
        let p = EnvProvider::new(["MISSING", "EMPTY"]).with_lookup(table);
        match p.resolve() {
            Err(EnvError::NotSet { vars }) => assert_eq!(vars, ["MISSING", "EMPTY"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn invalid_value_stops_the_search() {
        let p = EnvProvider::new(["BAD", "NINE"]).with_lookup(table);
        match p.resolve() {
            Err(EnvError::Invalid { var, value, .. }) => {
                assert_eq!(var, "BAD");
                assert_eq!(value, "nine");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn boxed_error_keeps_its_type() {
        let p = EnvProvider::new(["MISSING"]).with_lookup(table);
        let err = p.id().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnvError>(),
            Some(EnvError::NotSet { .. })
        ));
    }
}
