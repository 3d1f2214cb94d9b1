use regex::Regex;
use std::sync::OnceLock;

fn env_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env reference pattern"))
}

/// Expand `${VAR_NAME}` references through `lookup`. Unknown variables are
/// left as written.
pub fn expand_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_reference()
        .replace_all(value, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Normalize a backend base URL: trimmed, no trailing slash, http(s) only.
pub fn validate_base_url(url: &str) -> Result<String, String> {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err("API base URL is empty".to_string());
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("API base URL must start with http:// or https://: {}", url));
    }
    Ok(url.to_string())
}
