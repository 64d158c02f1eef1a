//! Best-effort geographic hints used when the geo endpoint is unreachable.
//!
//! These are allow-only signals: they can substitute for an undeterminable
//! HTTP geo check, never override a determined deny. Both are environment
//! heuristics and both are individually gated by configuration.

use std::env;

/// Country code derived from the process locale (`LC_ALL`, `LC_MESSAGES`,
/// `LANG`), e.g. `en_EG.UTF-8` yields `EG`.
pub fn locale_country() -> Option<String> {
    for key in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Ok(value) = env::var(key) {
            if let Some(code) = country_from_locale(&value) {
                return Some(code);
            }
        }
    }
    None
}

fn country_from_locale(locale: &str) -> Option<String> {
    let tag = locale
        .split(|c| c == '.' || c == '@')
        .next()
        .unwrap_or_default();
    let mut parts = tag.split(|c| c == '_' || c == '-');
    let _language = parts.next()?;
    let region = parts.next()?;
    if region.len() == 2 && region.bytes().all(|b| b.is_ascii_alphabetic()) {
        Some(region.to_ascii_uppercase())
    } else {
        None
    }
}

/// Whether the local timezone identifier mentions the given city,
/// case-insensitively (e.g. hint `"Cairo"` against `Africa/Cairo`).
pub fn timezone_mentions(city: &str) -> bool {
    match local_timezone_name() {
        Some(tz) => tz.to_ascii_lowercase().contains(&city.to_ascii_lowercase()),
        None => false,
    }
}

fn local_timezone_name() -> Option<String> {
    if let Ok(tz) = env::var("TZ") {
        if !tz.is_empty() {
            return Some(tz);
        }
    }
    if let Ok(name) = std::fs::read_to_string("/etc/timezone") {
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    // Symlink target carries the zone name on most other unixes.
    if let Ok(target) = std::fs::read_link("/etc/localtime") {
        return Some(target.to_string_lossy().into_owned());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_from_locale_typical() {
        assert_eq!(country_from_locale("en_EG.UTF-8"), Some("EG".to_string()));
        assert_eq!(country_from_locale("ar_SA"), Some("SA".to_string()));
        assert_eq!(country_from_locale("en-US"), Some("US".to_string()));
    }

    #[test]
    fn test_country_from_locale_modifier_suffix() {
        assert_eq!(
            country_from_locale("de_DE@euro"),
            Some("DE".to_string())
        );
    }

    #[test]
    fn test_country_from_locale_no_region() {
        assert_eq!(country_from_locale("C"), None);
        assert_eq!(country_from_locale("POSIX"), None);
        assert_eq!(country_from_locale("en"), None);
        assert_eq!(country_from_locale(""), None);
    }

    #[test]
    fn test_country_from_locale_bad_region() {
        assert_eq!(country_from_locale("en_USA"), None);
        assert_eq!(country_from_locale("en_1!"), None);
    }
}
