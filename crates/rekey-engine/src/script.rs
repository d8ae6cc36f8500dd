//! The page script runtime: element extraction, the four controller
//! commands and the nuisance check.
//!
//! Extraction runs in-page; classification and decision making run
//! natively on the extracted element list so they stay pure and
//! unit-testable. Every command reports its outcome through the bridge.

use crate::bridge::MessageBridge;
use crate::config::RotatorConfig;
use crate::element::PageElement;
use crate::protocol::{
    Destination, FailureReason, FormInfo, InboundMessage, LoginFormInfo, PasswordChangeInfo,
};
use crate::recognizer::{find_item_buckets_by_recognizers, RoleBuckets};
use crate::rules::RuleSet;
use crate::search::PageInfo;
use crate::{Error, Result};
use eoka::Page;
use serde::Deserialize;
use tracing::{debug, warn};

/// Enumerates page elements with their full attribute lists. The
/// `notice` scope targets message/alert candidates instead of
/// interactive elements.
const EXTRACT_JS: &str = r#"
((scope) => {
    const INTERACTIVE = 'a, button, input, select, textarea, form, iframe, [role="button"], [role="link"], [role="menuitem"], [onclick]';
    const NOTICE = '[role="alert"], [role="status"], [aria-live], div[class], span[class], p[class], label[class]';
    const MAX_RESULTS = 500;
    const results = [];

    function cssPath(el) {
        if (el.id) return '#' + CSS.escape(el.id);
        const path = [];
        let n = el;
        while (n && n.nodeType === 1) {
            let s = n.tagName.toLowerCase();
            if (n.id) { path.unshift('#' + CSS.escape(n.id)); break; }
            const p = n.parentElement;
            if (p) {
                const sibs = [...p.children].filter(c => c.tagName === n.tagName);
                if (sibs.length > 1) s += ':nth-of-type(' + (sibs.indexOf(n) + 1) + ')';
            }
            path.unshift(s);
            n = p;
        }
        return path.join(' > ');
    }

    function isVisible(el) {
        const r = el.getBoundingClientRect();
        if (r.width < 2 || r.height < 2) return false;
        const s = getComputedStyle(el);
        return s.display !== 'none' && s.visibility !== 'hidden' && parseFloat(s.opacity) >= 0.1;
    }

    function push(el) {
        if (results.length >= MAX_RESULTS) return;
        const tag = el.tagName.toLowerCase();
        let text = (el.innerText || el.value || '').trim().replace(/\s+/g, ' ');
        if (text.length > 80) text = text.slice(0, 80);
        if (scope === 'notice' && !text) return;
        const formEl = el.closest ? el.closest('form') : null;
        results.push({
            index: results.length,
            tag,
            attributes: Array.from(el.attributes).map(a => [a.name, a.value]),
            text,
            selector: cssPath(el),
            form: formEl && formEl !== el ? cssPath(formEl) : null,
            visible: tag === 'form' ? true : isVisible(el)
        });
    }

    function collect(root) {
        const selector = scope === 'notice' ? NOTICE : INTERACTIVE;
        for (const el of root.querySelectorAll(selector)) push(el);
        for (const el of root.querySelectorAll('*')) {
            if (el.shadowRoot) collect(el.shadowRoot);
        }
    }

    collect(document);
    return JSON.stringify(results);
})
"#;

/// Sets a field through the native value setter so framework-bound
/// inputs observe the change, then fires input/change.
const FILL_JS: &str = r#"
((selector, value) => {
    const el = document.querySelector(selector);
    if (!el) return false;
    const proto = el.tagName === 'TEXTAREA'
        ? window.HTMLTextAreaElement.prototype
        : window.HTMLInputElement.prototype;
    const desc = Object.getOwnPropertyDescriptor(proto, 'value');
    if (desc && desc.set) {
        desc.set.call(el, value);
    } else {
        el.value = value;
    }
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
})
"#;

/// Resolves the page origin and a form's action origin.
const FORM_ORIGIN_JS: &str = r#"
((selector) => {
    const result = { hostname: location.origin, form_action_origin: null };
    const form = selector ? document.querySelector(selector) : null;
    if (form && form.action) {
        try { result.form_action_origin = new URL(form.action, location.href).origin; } catch (e) {}
    }
    return JSON.stringify(result);
})
"#;

const PING_JS: &str = "1 + 1";

/// Which elements to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractScope {
    Interactive,
    Notice,
}

impl ExtractScope {
    fn as_js_arg(&self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Notice => "notice",
        }
    }
}

/// Outcome of an `advance` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The page already satisfies the destination; `Arrived` was posted.
    Arrived,
    /// A link on the destination's path was clicked; tap events posted.
    Clicked,
    /// A nuisance blocked the command; `Fail` was posted.
    Blocked,
    /// No link in the path resolved. Nothing was posted; the caller
    /// decides between the search fallback and a not-found failure.
    NotFound,
}

#[derive(Debug, Deserialize)]
struct RawFormOrigin {
    hostname: Option<String>,
    form_action_origin: Option<String>,
}

/// Native proxy for the injected page script. Holds the session token
/// and reports every command outcome through the bridge.
pub struct ScriptHost<'a> {
    page: &'a Page,
    bridge: &'a MessageBridge,
    rules: &'a RuleSet,
    config: &'a RotatorConfig,
    token: String,
}

impl<'a> ScriptHost<'a> {
    pub fn new(
        page: &'a Page,
        bridge: &'a MessageBridge,
        rules: &'a RuleSet,
        config: &'a RotatorConfig,
    ) -> Self {
        let token = bridge.token().to_string();
        Self {
            page,
            bridge,
            rules,
            config,
            token,
        }
    }

    fn post(&self, message: InboundMessage) {
        self.bridge.post(&self.token, message);
    }

    /// Extract page elements in the given scope.
    pub async fn extract(&self, scope: ExtractScope) -> Result<Vec<PageElement>> {
        let js = format!(
            "{}({})",
            EXTRACT_JS,
            serde_json::to_string(scope.as_js_arg()).unwrap()
        );
        let json: String = self.page.evaluate(&js).await?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Script(format!("element extraction parse error: {}", e)))
    }

    /// Best-effort wait for the page to stop mutating. Some sites never
    /// go fully idle, so a timeout here is not an error.
    pub async fn wait_for_stable(&self) {
        let _ = self
            .page
            .wait_for_network_idle(self.config.network_idle_ms, self.config.network_idle_timeout_ms)
            .await;
        self.page.wait(50).await;
    }

    /// Load a URL as a tap-like action: the load-finished notification
    /// synthesizes the end event once the navigation settles.
    pub async fn load_url(&self, url: &str) -> Result<()> {
        self.post(InboundMessage::TapBegin("pageLoad".into()));
        self.page.goto(url).await?;
        self.wait_for_stable().await;
        self.bridge.page_loaded();
        Ok(())
    }

    /// Scan for nuisance factors and short-circuit with a failure if one
    /// is visible. Returns true when the command must not proceed.
    pub async fn check_nuisance(&self) -> Result<bool> {
        let elements = self.extract(ExtractScope::Interactive).await?;
        if let Some(reason) = classify_nuisance(&elements, self.rules) {
            debug!("nuisance detected: {}", reason);
            self.post(InboundMessage::Fail("nuisance".into(), reason));
            return Ok(true);
        }
        Ok(false)
    }

    /// Walk toward the destination: report arrival, or click the deepest
    /// resolvable link on the destination's fixed link path.
    pub async fn advance(&self, destination: Destination) -> Result<AdvanceOutcome> {
        if self.check_nuisance().await? {
            return Ok(AdvanceOutcome::Blocked);
        }
        let elements = self.extract(ExtractScope::Interactive).await?;
        match plan_advance(&elements, self.rules, destination) {
            AdvancePlan::Arrived => {
                debug!("{}", destination.progress_found());
                self.post(InboundMessage::Arrived(destination));
                Ok(AdvanceOutcome::Arrived)
            }
            AdvancePlan::Click(selector) => {
                debug!("advance {}: clicking {}", destination, selector);
                self.tap_click(destination.action_name(), &selector).await?;
                Ok(AdvanceOutcome::Clicked)
            }
            AdvancePlan::NotFound => Ok(AdvanceOutcome::NotFound),
        }
    }

    /// Extract and report the destination's form info.
    pub async fn examine(&self, destination: Destination) -> Result<()> {
        if self.check_nuisance().await? {
            return Ok(());
        }
        let elements = self.extract(ExtractScope::Interactive).await?;
        let info = match destination {
            Destination::Login => {
                let form_selector = assemble_form(&elements, &self.rules.login_form)
                    .and_then(|b| {
                        b.first("password")
                            .or_else(|| b.first("username"))
                            .and_then(|i| elements[i].form.clone())
                    });
                let js = format!(
                    "{}({})",
                    FORM_ORIGIN_JS,
                    serde_json::to_string(&form_selector).unwrap()
                );
                let json: String = self.page.evaluate(&js).await?;
                let raw: RawFormOrigin = serde_json::from_str(&json)
                    .map_err(|e| Error::Script(format!("form origin parse error: {}", e)))?;
                Some(FormInfo::Login(LoginFormInfo {
                    hostname: raw.hostname,
                    form_action_origin: raw.form_action_origin,
                }))
            }
            Destination::PasswordChange => {
                assemble_form(&elements, &self.rules.password_change_form).and_then(|bucket| {
                    resolve_fill_target(&bucket, &elements, "newPassword").map(|i| {
                        let el = &elements[i];
                        FormInfo::PasswordChange(PasswordChangeInfo {
                            pattern: el.attr("pattern").map(str::to_string),
                            min_length: el.attr("minlength").and_then(|v| v.parse().ok()),
                            max_length: el.attr("maxlength").and_then(|v| v.parse().ok()),
                        })
                    })
                })
            }
            Destination::Logout => None,
        };
        self.post(InboundMessage::DestinationInfo(destination, info));
        Ok(())
    }

    /// Fill the destination's form with the given role → value pairs and
    /// submit it.
    pub async fn fill_form(
        &self,
        destination: Destination,
        values: &[(String, String)],
    ) -> Result<()> {
        if self.check_nuisance().await? {
            return Ok(());
        }
        let form_name = destination.action_name();
        let elements = self.extract(ExtractScope::Interactive).await?;
        let sets = match destination {
            Destination::Login => &self.rules.login_form,
            Destination::PasswordChange => &self.rules.password_change_form,
            Destination::Logout => {
                self.post(InboundMessage::Fail(form_name.into(), FailureReason::Bug));
                return Ok(());
            }
        };
        let Some(bucket) = assemble_form(&elements, sets) else {
            warn!("fill_form {}: form no longer assembles", form_name);
            self.post(InboundMessage::Fail(form_name.into(), FailureReason::Bug));
            return Ok(());
        };

        for (role, value) in values {
            match resolve_fill_target(&bucket, &elements, role) {
                Some(i) => self.set_field(&elements[i].selector, value).await?,
                // Multi-step forms legitimately miss roles (e.g. no
                // username on a password-only step).
                None => debug!("fill_form {}: no element for role '{}'", form_name, role),
            }
        }
        // A confirmation field mirrors the new password.
        if let Some((_, new_value)) = values.iter().find(|(r, _)| r == "newPassword") {
            if let Some(i) = bucket.first("confirmPassword") {
                self.set_field(&elements[i].selector, new_value).await?;
            }
        }

        let Some(submit) = bucket.first("submit") else {
            self.post(InboundMessage::Fail(form_name.into(), FailureReason::Bug));
            return Ok(());
        };
        let submit_selector = elements[submit].selector.clone();
        self.tap_click(form_name, &submit_selector).await?;
        self.post(InboundMessage::FormFillSuccess(form_name.into()));
        Ok(())
    }

    /// Decide whether the last submission succeeded.
    pub async fn confirm_success(
        &self,
        destination: Destination,
        success_if_page_changed: bool,
    ) -> Result<()> {
        if self.check_nuisance().await? {
            return Ok(());
        }
        self.wait_for_stable().await;

        let notices = self.extract(ExtractScope::Notice).await?;
        if has_visible_error(&notices, self.rules) {
            let reason = match destination {
                Destination::PasswordChange => FailureReason::PasswordChangeNotAccepted,
                _ => FailureReason::BadCredentials,
            };
            self.post(InboundMessage::Fail(destination.action_name().into(), reason));
            return Ok(());
        }

        if success_if_page_changed {
            let elements = self.extract(ExtractScope::Interactive).await?;
            let sets = match destination {
                Destination::Login => &self.rules.login_form,
                Destination::PasswordChange => &self.rules.password_change_form,
                Destination::Logout => &self.rules.login_form,
            };
            if assemble_form(&elements, sets).is_some() {
                // Multi-step form: the next stage is on screen.
                self.post(InboundMessage::Arrived(destination));
                return Ok(());
            }
        }
        self.post(InboundMessage::FormFillSuccess(
            destination.action_name().into(),
        ));
        Ok(())
    }

    /// Page info for a navigation-search episode.
    pub async fn page_info(&self, destination: Destination) -> Result<PageInfo> {
        let elements = self.extract(ExtractScope::Interactive).await?;
        let arrived = arrival_check(&elements, self.rules, destination);
        let links = candidate_links(&elements, self.rules)
            .into_iter()
            .map(|i| elements[i].selector.clone())
            .collect();
        Ok(PageInfo {
            url: self.page.url().await?,
            arrived,
            links,
        })
    }

    /// Click the i-th candidate link on the current page. Search clicks
    /// do not take part in the tap protocol.
    pub async fn click_candidate(&self, link_index: usize) -> Result<bool> {
        let elements = self.extract(ExtractScope::Interactive).await?;
        let candidates = candidate_links(&elements, self.rules);
        let Some(&element_index) = candidates.get(link_index) else {
            return Ok(false);
        };
        self.page.click(&elements[element_index].selector).await?;
        self.wait_for_stable().await;
        Ok(true)
    }

    /// Reload a previously visited URL during a search episode. Search
    /// navigation does not take part in the tap protocol.
    pub async fn reload_to(&self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        self.wait_for_stable().await;
        Ok(())
    }

    /// Go back one history entry.
    pub async fn go_back(&self) -> Result<()> {
        self.page.back().await?;
        self.wait_for_stable().await;
        Ok(())
    }

    /// Current page URL.
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?)
    }

    async fn set_field(&self, selector: &str, value: &str) -> Result<()> {
        let js = format!(
            "{}({},{})",
            FILL_JS,
            serde_json::to_string(selector).unwrap(),
            serde_json::to_string(value).unwrap()
        );
        let ok: bool = self.page.evaluate(&js).await?;
        if !ok {
            warn!("fill: element vanished before set: {}", selector);
        }
        Ok(())
    }

    /// Click with tap protocol events. If the click destroys the page
    /// context before the end event can be reported, the bridge
    /// synthesizes it from the load notification.
    async fn tap_click(&self, action: &str, selector: &str) -> Result<()> {
        self.post(InboundMessage::TapBegin(action.into()));
        self.page.click(selector).await?;
        self.wait_for_stable().await;
        match self.page.evaluate::<i64>(PING_JS).await {
            Ok(_) => self.post(InboundMessage::TapEnd(action.into())),
            Err(_) => self.bridge.page_loaded(),
        }
        Ok(())
    }
}

// =============================================================================
// Pure decision logic
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AdvancePlan {
    Arrived,
    Click(String),
    NotFound,
}

/// Assemble the destination's form: the winning complete-match bucket.
pub(crate) fn assemble_form(
    elements: &[PageElement],
    sets: &[crate::recognizer::PatternSet],
) -> Option<RoleBuckets> {
    find_item_buckets_by_recognizers(elements, sets, true)
        .into_iter()
        .next()
}

/// First element holding `role`, excluding confirmation fields when
/// resolving the new password.
pub(crate) fn resolve_fill_target(
    bucket: &RoleBuckets,
    _elements: &[PageElement],
    role: &str,
) -> Option<usize> {
    let members = bucket.by_role.get(role)?;
    if role == "newPassword" {
        let empty = Vec::new();
        let confirm = bucket.by_role.get("confirmPassword").unwrap_or(&empty);
        return members.iter().copied().find(|i| !confirm.contains(i));
    }
    members.first().copied()
}

/// Whether the current page already satisfies the destination.
pub(crate) fn arrival_check(
    elements: &[PageElement],
    rules: &RuleSet,
    destination: Destination,
) -> bool {
    match destination {
        Destination::Login => assemble_form(elements, &rules.login_form).is_some(),
        Destination::PasswordChange => {
            assemble_form(elements, &rules.password_change_form).is_some()
        }
        // Logged out when a login form or login link is visible again.
        Destination::Logout => {
            assemble_form(elements, &rules.login_form).is_some()
                || link_buckets(elements, rules)
                    .iter()
                    .any(|b| b.first("login").is_some())
        }
    }
}

fn link_buckets(elements: &[PageElement], rules: &RuleSet) -> Vec<RoleBuckets> {
    // Only clickable elements participate in link classification.
    let mut buckets = find_item_buckets_by_recognizers(elements, &rules.links, false);
    for bucket in &mut buckets {
        for members in bucket.by_role.values_mut() {
            members.retain(|&i| elements[i].is_link());
        }
        bucket.by_role.retain(|_, v| !v.is_empty());
    }
    buckets
}

/// Plan an advance: arrival, or the deepest resolvable link in the
/// destination's fixed path.
pub(crate) fn plan_advance(
    elements: &[PageElement],
    rules: &RuleSet,
    destination: Destination,
) -> AdvancePlan {
    if arrival_check(elements, rules, destination) {
        return AdvancePlan::Arrived;
    }
    let buckets = link_buckets(elements, rules);
    for role in destination.link_path().iter().rev() {
        for bucket in &buckets {
            if let Some(i) = bucket.first(role) {
                return AdvancePlan::Click(elements[i].selector.clone());
            }
        }
    }
    AdvancePlan::NotFound
}

/// Candidate links for the navigation search: every clickable element
/// holding any known link role, document order, deduplicated.
pub(crate) fn candidate_links(elements: &[PageElement], rules: &RuleSet) -> Vec<usize> {
    let buckets = link_buckets(elements, rules);
    let mut indices: Vec<usize> = buckets
        .iter()
        .flat_map(|b| b.by_role.values().flatten().copied())
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Classify the first visible nuisance factor, in rule declaration order.
pub(crate) fn classify_nuisance(
    elements: &[PageElement],
    rules: &RuleSet,
) -> Option<FailureReason> {
    let buckets = find_item_buckets_by_recognizers(elements, &rules.nuisance, false);
    for bucket in &buckets {
        for role in bucket.by_role.keys() {
            let reason = match role.as_str() {
                "tos" => FailureReason::BlockedByTos,
                "captcha" => FailureReason::BlockedByCaptcha,
                "otp" => FailureReason::BlockedBy2fa,
                _ => continue,
            };
            return Some(reason);
        }
    }
    None
}

/// Whether any visible error-styled element is on the page.
pub(crate) fn has_visible_error(elements: &[PageElement], rules: &RuleSet) -> bool {
    find_item_buckets_by_recognizers(elements, &rules.errors, false)
        .iter()
        .any(|b| b.first("error").is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, attrs: &[(&str, &str)], selector: &str) -> PageElement {
        PageElement {
            index: 0,
            tag: tag.into(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: String::new(),
            selector: selector.into(),
            form: Some("form".into()),
            visible: true,
        }
    }

    fn login_page() -> Vec<PageElement> {
        vec![
            el("input", &[("type", "email"), ("name", "email")], "#email"),
            el("input", &[("type", "password"), ("name", "password")], "#pw"),
            el("button", &[("type", "submit"), ("id", "signin")], "#signin"),
        ]
    }

    #[test]
    fn advance_reports_arrival_on_a_login_page() {
        let rules = RuleSet::default();
        assert_eq!(
            plan_advance(&login_page(), &rules, Destination::Login),
            AdvancePlan::Arrived
        );
    }

    #[test]
    fn advance_clicks_the_deepest_resolvable_link() {
        let rules = RuleSet::default();
        let elements = vec![
            el("a", &[("id", "main-menu"), ("href", "#")], "#main-menu"),
            el("a", &[("id", "settings"), ("href", "#")], "#settings"),
        ];
        // Path menu → … → settings → security → changePassword: settings
        // is the deepest role with a match.
        assert_eq!(
            plan_advance(&elements, &rules, Destination::PasswordChange),
            AdvancePlan::Click("#settings".into())
        );
    }

    #[test]
    fn advance_with_no_resolvable_link_is_not_found() {
        let rules = RuleSet::default();
        let elements = vec![el("a", &[("id", "pricing"), ("href", "#")], "#pricing")];
        assert_eq!(
            plan_advance(&elements, &rules, Destination::PasswordChange),
            AdvancePlan::NotFound
        );
    }

    #[test]
    fn logout_arrival_accepts_a_visible_login_link() {
        let rules = RuleSet::default();
        let elements = vec![el("a", &[("id", "sign-in"), ("href", "/login")], "#sign-in")];
        assert!(arrival_check(&elements, &rules, Destination::Logout));
        assert!(!arrival_check(&elements, &rules, Destination::PasswordChange));
    }

    #[test]
    fn non_links_never_resolve_on_the_link_path() {
        let rules = RuleSet::default();
        // An input named "settings" must not be treated as a nav link.
        let elements = vec![el(
            "input",
            &[("type", "text"), ("name", "settings")],
            "#settings-input",
        )];
        assert_eq!(
            plan_advance(&elements, &rules, Destination::PasswordChange),
            AdvancePlan::NotFound
        );
    }

    // A visible ToS checkbox short-circuits before any other command.
    #[test]
    fn tos_checkbox_blocks_with_its_code() {
        let rules = RuleSet::default();
        let mut elements = login_page();
        elements.push(el(
            "input",
            &[("type", "checkbox"), ("name", "agree-terms")],
            "#tos",
        ));
        assert_eq!(
            classify_nuisance(&elements, &rules),
            Some(FailureReason::BlockedByTos)
        );
    }

    #[test]
    fn hidden_nuisances_are_ignored() {
        let rules = RuleSet::default();
        let mut captcha = el(
            "iframe",
            &[("src", "https://hcaptcha.com/widget")],
            "#captcha",
        );
        captcha.visible = false;
        assert_eq!(classify_nuisance(&[captcha], &rules), None);
    }

    #[test]
    fn otp_field_blocks_as_2fa() {
        let rules = RuleSet::default();
        let elements = vec![el(
            "input",
            &[("type", "text"), ("name", "otp_code")],
            "#otp",
        )];
        assert_eq!(
            classify_nuisance(&elements, &rules),
            Some(FailureReason::BlockedBy2fa)
        );
    }

    #[test]
    fn fill_target_resolution_skips_confirm_fields() {
        let rules = RuleSet::default();
        let elements = vec![
            el(
                "input",
                &[("type", "password"), ("name", "old_password")],
                "#old",
            ),
            el(
                "input",
                &[("type", "password"), ("name", "new_password_confirm")],
                "#confirm",
            ),
            el(
                "input",
                &[("type", "password"), ("name", "new_password")],
                "#new",
            ),
            el("button", &[("type", "submit"), ("id", "save")], "#save"),
        ];
        let bucket = assemble_form(&elements, &rules.password_change_form).unwrap();
        // Even with the confirm field listed first, the real new-password
        // field is chosen.
        assert_eq!(resolve_fill_target(&bucket, &elements, "newPassword"), Some(2));
        assert_eq!(resolve_fill_target(&bucket, &elements, "password"), Some(0));
        assert_eq!(resolve_fill_target(&bucket, &elements, "username"), None);
    }

    #[test]
    fn candidate_links_are_document_ordered_and_deduped() {
        let rules = RuleSet::default();
        let elements = vec![
            el("a", &[("id", "my-account"), ("href", "#")], "#my-account"),
            el("input", &[("type", "text"), ("name", "q")], "#q"),
            el("a", &[("id", "settings"), ("href", "#")], "#settings"),
        ];
        assert_eq!(candidate_links(&elements, &rules), vec![0, 2]);
    }

    #[test]
    fn error_detection_requires_an_error_styled_element() {
        let rules = RuleSet::default();
        let bad = el("div", &[("class", "alert alert-danger")], "#err");
        let ok = el("div", &[("class", "content")], "#ok");
        assert!(has_visible_error(std::slice::from_ref(&bad), &rules));
        assert!(!has_visible_error(std::slice::from_ref(&ok), &rules));
    }
}
