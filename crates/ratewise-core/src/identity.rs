//! Session identity resolution for front ends.
//!
//! Determines which user a command signs in as, from an explicit flag or
//! the environment. No identity means the caller acts anonymously.

use std::env;

/// Environment variable naming the acting user.
pub const USER_VAR: &str = "RATEWISE_USER";

/// Resolve the acting user.
///
/// Resolution order:
/// 1. Explicit override (`--user`)
/// 2. `RATEWISE_USER` environment variable
///
/// Returns `None` when nothing is set.
#[must_use]
pub fn resolve_user(explicit: Option<&str>) -> Option<String> {
    resolve_user_with(explicit, |var| env::var(var).ok())
}

/// [`resolve_user`] with a custom environment reader.
pub fn resolve_user_with<F>(explicit: Option<&str>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(name.to_string());
    }

    lookup(USER_VAR)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_override() {
        let user = resolve_user_with(Some("explicit"), |_| Some("env".to_string()));
        assert_eq!(user.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_env_fallback() {
        let user = resolve_user_with(None, |var| {
            (var == USER_VAR).then(|| " dana ".to_string())
        });
        assert_eq!(user.as_deref(), Some("dana"));
    }

    #[test]
    fn test_nothing_set_is_anonymous() {
        assert_eq!(resolve_user_with(Some("  "), |_| None), None);
        assert_eq!(resolve_user_with(None, |_| Some(String::new())), None);
    }
}
