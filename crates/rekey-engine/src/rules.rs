//! Built-in recognizer rule sets and the YAML override layer.
//!
//! Matchers run against canonical attribute strings, so a rule like
//! `"regex:(?i)^password\\|"` anchors on the element's `type` value (the
//! canonical string leads with it) while plain substrings match anywhere.

use crate::recognizer::PatternSet;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// All recognizer groups the engine consults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    /// Form assembly rules for the login page, priority order.
    pub login_form: Vec<PatternSet>,
    /// Form assembly rules for the password change page, priority order.
    pub password_change_form: Vec<PatternSet>,
    /// Link role classification used by advance and the navigation search.
    pub links: Vec<PatternSet>,
    /// Nuisance indicators checked before every command.
    pub nuisance: Vec<PatternSet>,
    /// Error-styled element indicators checked by confirm_success.
    pub errors: Vec<PatternSet>,
}

impl RuleSet {
    /// Load a rule override file (YAML).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse rules from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        let rules: RuleSet = serde_yaml::from_str(yaml)?;
        rules.validate()?;
        Ok(rules)
    }

    fn validate(&self) -> Result<()> {
        for (group, sets) in [
            ("login_form", &self.login_form),
            ("password_change_form", &self.password_change_form),
            ("links", &self.links),
            ("nuisance", &self.nuisance),
            ("errors", &self.errors),
        ] {
            if sets.is_empty() {
                return Err(Error::Config(format!("{}: at least one pattern set required", group)));
            }
            for set in sets.iter() {
                if set.roles.is_empty() {
                    return Err(Error::Config(format!(
                        "{}: pattern set '{}' declares no roles",
                        group, set.name
                    )));
                }
                for rule in &set.roles {
                    if rule.matchers.is_empty() {
                        return Err(Error::Config(format!(
                            "{}: role '{}' in '{}' has no matchers",
                            group, rule.role, set.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            login_form: login_form_rules(),
            password_change_form: password_change_form_rules(),
            links: link_rules(),
            nuisance: nuisance_rules(),
            errors: error_rules(),
        }
    }
}

fn login_form_rules() -> Vec<PatternSet> {
    vec![
        // Full username + password login form.
        PatternSet::new("login")
            .role(
                "username",
                &[
                    "regex:(?i)^(text|email)\\|.*(user|e-?mail|login|account|uname)",
                    "regex:(?i)^email\\|",
                    "regex:(?i)(current-)?username",
                ],
            )
            .role("password", &["regex:(?i)^password\\|"])
            .role(
                "submit",
                &[
                    "regex:(?i)^(submit|button|image)\\|.*(log.?in|sign.?in|submit|continue|next)",
                    "regex:(?i)^submit\\|",
                ],
            ),
        // Username-first flows present the password on a later step.
        PatternSet::new("username-first")
            .role(
                "username",
                &[
                    "regex:(?i)^(text|email)\\|.*(user|e-?mail|login|account|uname)",
                    "regex:(?i)^email\\|",
                ],
            )
            .role(
                "submit",
                &["regex:(?i)(log.?in|sign.?in|submit|continue|next)"],
            ),
        // Password-only second step.
        PatternSet::new("password-only")
            .role("password", &["regex:(?i)^password\\|"])
            .role(
                "submit",
                &["regex:(?i)(log.?in|sign.?in|submit|continue|unlock)"],
            ),
    ]
}

fn password_change_form_rules() -> Vec<PatternSet> {
    // An element can hold both newPassword and confirmPassword; the fill
    // planner excludes confirm members when resolving the new field.
    let new_password = &["regex:(?i)^password\\|.*(new|change)"];
    let confirm = &["regex:(?i)^password\\|.*(confirm|repeat|again|verif|re.?enter)"];
    let submit = &["regex:(?i)(save|change|update|submit|confirm)"];
    vec![
        // Current + new + confirmation.
        PatternSet::new("change-with-confirm")
            .role(
                "password",
                &["regex:(?i)^password\\|.*(current|old|existing)"],
            )
            .role("newPassword", new_password)
            .role("confirmPassword", confirm)
            .role("submit", submit),
        // Current + new, no confirmation field.
        PatternSet::new("change-password")
            .role(
                "password",
                &["regex:(?i)^password\\|.*(current|old|existing)"],
            )
            .role("newPassword", new_password)
            .role("submit", submit),
        // Some sites skip re-authentication and only ask for the new one.
        PatternSet::new("new-password-only")
            .role("newPassword", new_password)
            .role("submit", submit),
    ]
}

fn link_rules() -> Vec<PatternSet> {
    vec![PatternSet::new("navigation")
        .role(
            "menu",
            &["menu", "hamburger", "drawer", "navbar-toggle", "regex:(?i)^nav"],
        )
        .role("profile", &["profile", "avatar", "regex:(?i)my.?page"])
        .role("account", &["regex:(?i)(my.?)?account"])
        .role(
            "settings",
            &["settings", "preferences", "regex:(?i)options"],
        )
        .role("security", &["security", "privacy"])
        .role(
            "changePassword",
            &["regex:(?i)(change|update|edit|reset).{0,3}password", "change-password"],
        )
        .role("login", &["regex:(?i)(log|sign).?in"])
        .role("logout", &["regex:(?i)(log|sign).?(out|off)"])]
}

fn nuisance_rules() -> Vec<PatternSet> {
    vec![
        // Declaration order doubles as reporting priority.
        PatternSet::new("tos").role(
            "tos",
            &["regex:(?i)^checkbox\\|.*(terms|tos|consent|agree|policy|gdpr)"],
        ),
        PatternSet::new("captcha").role(
            "captcha",
            &["recaptcha", "hcaptcha", "turnstile", "regex:(?i)captcha"],
        ),
        PatternSet::new("otp").role(
            "otp",
            &[
                "regex:(?i)(^|\\|)(otp|totp|2fa|mfa)",
                "regex:(?i)one.?time.?(code|pass)",
                "regex:(?i)(verification|authenticator).{0,6}code",
            ],
        ),
    ]
}

fn error_rules() -> Vec<PatternSet> {
    vec![PatternSet::new("errors").role(
        "error",
        &[
            "regex:(?i)(^|\\|)(error|alert|invalid|incorrect|failed)",
            "regex:(?i)alert-danger",
            "regex:(?i)(^|\\|)alert$",
        ],
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PageElement;
    use crate::recognizer::find_item_buckets_by_recognizers;

    fn el(tag: &str, attrs: &[(&str, &str)], text: &str) -> PageElement {
        PageElement {
            index: 0,
            tag: tag.into(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: text.into(),
            selector: "#x".into(),
            form: None,
            visible: true,
        }
    }

    #[test]
    fn default_rules_validate() {
        RuleSet::default().validate().unwrap();
    }

    #[test]
    fn default_login_rules_assemble_a_plain_form() {
        let elements = vec![
            el("input", &[("type", "email"), ("name", "email")], ""),
            el("input", &[("type", "password"), ("name", "password")], ""),
            el("input", &[("type", "submit"), ("value", "x")], ""),
        ];
        let rules = RuleSet::default();
        let buckets = find_item_buckets_by_recognizers(&elements, &rules.login_form, true);
        assert_eq!(buckets.len(), 1, "full login form should assemble");
        let bucket = &buckets[0];
        assert_eq!(bucket.first("username"), Some(0));
        assert_eq!(bucket.first("password"), Some(1));
        assert_eq!(bucket.first("submit"), Some(2));
    }

    #[test]
    fn change_password_rules_pick_the_new_password_field() {
        let elements = vec![
            el(
                "input",
                &[("type", "password"), ("name", "current_password")],
                "",
            ),
            el("input", &[("type", "password"), ("name", "new_password")], ""),
            el(
                "input",
                &[("type", "password"), ("name", "new_password_confirm")],
                "",
            ),
            el("button", &[("type", "submit"), ("id", "save")], "Save"),
        ];
        let rules = RuleSet::default();
        let buckets =
            find_item_buckets_by_recognizers(&elements, &rules.password_change_form, true);
        assert_eq!(buckets.len(), 1);
        let bucket = &buckets[0];
        assert_eq!(bucket.recognizer, 0, "confirm-aware set should win the tie");
        assert_eq!(bucket.first("password"), Some(0));
        // The confirmation field holds both roles; exclusion happens at
        // fill-planning time.
        assert_eq!(bucket.by_role["newPassword"], vec![1, 2]);
        assert_eq!(bucket.by_role["confirmPassword"], vec![2]);
    }

    #[test]
    fn link_rules_cover_the_full_change_password_path() {
        let rules = RuleSet::default();
        let cases = [
            ("menu", "main-menu"),
            ("profile", "profile"),
            ("account", "my-account"),
            ("settings", "settings"),
            ("security", "security"),
            ("changePassword", "change-password"),
            ("login", "sign-in"),
            ("logout", "sign-out"),
        ];
        for (role, id) in cases {
            let link = el("a", &[("id", id), ("href", "#")], "");
            let buckets = find_item_buckets_by_recognizers(
                std::slice::from_ref(&link),
                &rules.links,
                false,
            );
            assert_eq!(
                buckets[0].first(role),
                Some(0),
                "id '{}' should classify as '{}'",
                id,
                role
            );
        }
    }

    #[test]
    fn nuisance_rules_flag_tos_captcha_and_otp() {
        let rules = RuleSet::default();
        let tos = el(
            "input",
            &[("type", "checkbox"), ("name", "accept-terms")],
            "",
        );
        let captcha = el(
            "iframe",
            &[("src", "https://www.google.com/recaptcha/api2/anchor")],
            "",
        );
        let otp = el("input", &[("type", "text"), ("name", "otp_code")], "");
        let plain = el("input", &[("type", "text"), ("name", "city")], "");

        for (element, role) in [(&tos, "tos"), (&captcha, "captcha"), (&otp, "otp")] {
            let buckets = find_item_buckets_by_recognizers(
                std::slice::from_ref(element),
                &rules.nuisance,
                false,
            );
            assert!(
                buckets.iter().any(|b| b.first(role).is_some()),
                "expected '{}' to be flagged",
                role
            );
        }
        let buckets =
            find_item_buckets_by_recognizers(std::slice::from_ref(&plain), &rules.nuisance, false);
        assert!(buckets.iter().all(|b| b.by_role.is_empty()));
    }

    #[test]
    fn error_rules_match_styled_notices_only() {
        let rules = RuleSet::default();
        let bad = el(
            "div",
            &[("class", "form-error"), ("role", "alert")],
            "Wrong password",
        );
        let ok = el("div", &[("class", "banner info")], "Welcome back");
        let buckets =
            find_item_buckets_by_recognizers(std::slice::from_ref(&bad), &rules.errors, false);
        assert_eq!(buckets[0].first("error"), Some(0));
        let buckets =
            find_item_buckets_by_recognizers(std::slice::from_ref(&ok), &rules.errors, false);
        assert!(buckets[0].by_role.is_empty());
    }

    #[test]
    fn yaml_override_parses_and_validates() {
        let yaml = r#"
login_form:
  - name: custom
    roles:
      - role: username
        matchers: ["user"]
      - role: password
        matchers: ["regex:(?i)^password\\|"]
      - role: submit
        matchers: ["submit"]
password_change_form:
  - name: custom-change
    roles:
      - role: newPassword
        matchers: ["new"]
      - role: submit
        matchers: ["save"]
links:
  - name: nav
    roles:
      - role: login
        matchers: ["regex:(?i)sign.?in"]
nuisance:
  - name: captcha
    roles:
      - role: captcha
        matchers: ["captcha"]
errors:
  - name: errors
    roles:
      - role: error
        matchers: ["error"]
"#;
        let rules = RuleSet::parse(yaml).unwrap();
        assert_eq!(rules.login_form[0].name, "custom");
    }

    #[test]
    fn yaml_rejects_empty_roles() {
        let yaml = r#"
login_form:
  - name: broken
    roles: []
password_change_form:
  - name: c
    roles: [{role: newPassword, matchers: ["new"]}]
links:
  - name: l
    roles: [{role: login, matchers: ["login"]}]
nuisance:
  - name: n
    roles: [{role: captcha, matchers: ["captcha"]}]
errors:
  - name: e
    roles: [{role: error, matchers: ["error"]}]
"#;
        let err = RuleSet::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
