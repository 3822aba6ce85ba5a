//! `${VAR}` references in `mermark.toml` string fields.
//!
//! Lets a shared config point `mermaid.executable` or `output.dir` at
//! machine-specific locations.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` in the value of config `field`.
///
/// An unset variable without a default is reported against `field`.
/// Values with no `${` are returned untouched, so a literal `$` in a
/// theme name or path is not an error.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Name of the unset variable, carried out of the shellexpand callback.
struct LookupError {
    var_name: String,
}
