/// Reads one environment variable.
///
/// Every lookup in this crate goes through such a function so callers and
/// tests can supply a fixed table instead of the process environment.
pub type EnvLookup = fn(&str) -> Option<String>;

pub(crate) fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// The first of `names` set to a non-blank value, trimmed, with its name.
pub(crate) fn first_set<'a>(lookup: EnvLookup, names: &[&'a str]) -> Option<(&'a str, String)> {
    names.iter().find_map(|&name| {
        lookup(name)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .map(|v| (name, v))
    })
}
