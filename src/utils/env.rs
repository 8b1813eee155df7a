/// Environment variable prefix shared by every setting.
pub const ENV_PREFIX: &str = "CHARGE_MOCK_";

/// Get environment variable with CHARGE_MOCK_ prefix, falling back to unprefixed version
///
/// Checks `CHARGE_MOCK_{key}` first, then `{key}`, so the legacy `REDIS_ADDR`
/// style variables keep working.
///
/// # Examples
///
/// ```rust,ignore
/// use charge_mock::utils::get_env_with_prefix;
///
/// // Checks CHARGE_MOCK_PORT first, then PORT
/// let port = get_env_with_prefix("PORT");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    let non_empty = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
    non_empty(&format!("{}{}", ENV_PREFIX, key)).or_else(|| non_empty(key))
}

/// Parse a prefixed environment variable, ignoring values that don't parse.
pub fn parse_env_with_prefix<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = get_env_with_prefix(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("CHARGE_MOCK_TEST_VAR", "prefixed_value");
        }
        assert_eq!(get_env_with_prefix("TEST_VAR"), Some("prefixed_value".to_string()));
        unsafe {
            std::env::remove_var("CHARGE_MOCK_TEST_VAR");
        }

        unsafe {
            std::env::set_var("CHARGE_MOCK_FALLBACK_VAR", "");
            std::env::set_var("FALLBACK_VAR", "unprefixed_value");
        }
        assert_eq!(get_env_with_prefix("FALLBACK_VAR"), Some("unprefixed_value".to_string()));
        unsafe {
            std::env::remove_var("CHARGE_MOCK_FALLBACK_VAR");
            std::env::remove_var("FALLBACK_VAR");
        }

        assert_eq!(get_env_with_prefix("NON_EXISTENT_VAR"), None);
    }

    #[test]
    fn test_parse_env_with_prefix() {
        unsafe {
            std::env::set_var("CHARGE_MOCK_PARSE_NUM", "42");
            std::env::set_var("CHARGE_MOCK_PARSE_BAD", "forty-two");
        }
        assert_eq!(parse_env_with_prefix::<u64>("PARSE_NUM"), Some(42));
        assert_eq!(parse_env_with_prefix::<u64>("PARSE_BAD"), None);
        unsafe {
            std::env::remove_var("CHARGE_MOCK_PARSE_NUM");
            std::env::remove_var("CHARGE_MOCK_PARSE_BAD");
        }
    }
}
