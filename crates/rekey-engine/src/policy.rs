//! Password generation policy.
//!
//! The orchestrator consults a pluggable policy when the password change
//! form has been examined; a policy returning `None` falls through to the
//! default generator.

use crate::protocol::PasswordChangeInfo;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use regex::Regex;

/// Pluggable policy: `(hostname, advertised constraints) -> new password`.
/// Return `None` to delegate to [`generate_password`].
pub type PasswordPolicy =
    Box<dyn Fn(&str, Option<&PasswordChangeInfo>) -> Option<String> + Send + Sync>;

const DEFAULT_LENGTH: u32 = 16;
const PATTERN_ATTEMPTS: usize = 16;

/// Default generator: a random alphanumeric token sized to the advertised
/// `min`/`max` length and, when the form declares a (compilable) pattern,
/// re-rolled until the pattern accepts it.
pub fn generate_password(info: Option<&PasswordChangeInfo>) -> String {
    let mut length = DEFAULT_LENGTH;
    if let Some(info) = info {
        if let Some(min) = info.min_length {
            length = length.max(min);
        }
        if let Some(max) = info.max_length {
            length = length.min(max.max(1));
        }
    }

    // HTML patterns are implicitly anchored; sites routinely ship JS
    // syntax the regex crate rejects, in which case the pattern is
    // ignored rather than failing the rotation.
    let pattern = info
        .and_then(|i| i.pattern.as_deref())
        .and_then(|p| Regex::new(&anchored(p)).ok());

    let mut candidate = random_token(length);
    if let Some(re) = pattern {
        for _ in 0..PATTERN_ATTEMPTS {
            if re.is_match(&candidate) {
                break;
            }
            candidate = random_token(length);
        }
    }
    candidate
}

fn anchored(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('^') {
        out.push('^');
    }
    out.push_str(pattern);
    if !pattern.ends_with('$') {
        out.push('$');
    }
    out
}

fn random_token(length: u32) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length as usize)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_generation_without_constraints() {
        let pw = generate_password(None);
        assert_eq!(pw.len(), DEFAULT_LENGTH as usize);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn respects_length_bounds() {
        let info = PasswordChangeInfo {
            pattern: None,
            min_length: Some(24),
            max_length: None,
        };
        assert_eq!(generate_password(Some(&info)).len(), 24);

        let info = PasswordChangeInfo {
            pattern: None,
            min_length: None,
            max_length: Some(10),
        };
        assert_eq!(generate_password(Some(&info)).len(), 10);
    }

    #[test]
    fn generated_password_matches_advertised_pattern() {
        let info = PasswordChangeInfo {
            pattern: Some("^[A-Za-z0-9]{8,}$".into()),
            min_length: None,
            max_length: None,
        };
        let re = Regex::new("^[A-Za-z0-9]{8,}$").unwrap();
        for _ in 0..8 {
            assert!(re.is_match(&generate_password(Some(&info))));
        }
    }

    #[test]
    fn uncompilable_pattern_is_ignored() {
        let info = PasswordChangeInfo {
            pattern: Some("(?<lookbehind)broken".into()),
            min_length: Some(12),
            max_length: Some(12),
        };
        assert_eq!(generate_password(Some(&info)).len(), 12);
    }

    #[test]
    fn successive_passwords_differ() {
        assert_ne!(generate_password(None), generate_password(None));
    }
}
