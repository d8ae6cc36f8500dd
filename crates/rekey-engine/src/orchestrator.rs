//! The rotation orchestrator: owns the browser, wires bridge events and
//! the current phase through the state machine, refines the working
//! credential, and surfaces the final credential or a failure.

use crate::bridge::MessageBridge;
use crate::config::{BrowserConfig, RotatorConfig};
use crate::credential::Credential;
use crate::machine::{transition, Phase};
use crate::policy::{generate_password, PasswordPolicy};
use crate::protocol::{
    Destination, FailureReason, FormInfo, InboundMessage, OutboundCommand,
};
use crate::rules::RuleSet;
use crate::script::{AdvanceOutcome, ScriptHost};
use crate::search::{SearchEngine, SearchStep};
use crate::Result;
use eoka::{Browser, Page};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

/// Hard cap on replaying one message through quiet phase transitions.
const MAX_REPLAYS: usize = 8;

/// How a rotation episode ended.
#[derive(Debug)]
pub enum RotationOutcome {
    /// The password was changed and the session logged out cleanly.
    Rotated(Credential),
    /// The episode ended in a terminal failure. If the password change
    /// had already been accepted, the rotated record is preserved so the
    /// new password is not lost.
    Failed {
        reason: FailureReason,
        rotated: Option<Credential>,
    },
}

impl RotationOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::Rotated(_))
    }
}

/// Drives rotation episodes against a live browser.
pub struct Rotator {
    browser: Browser,
    page: Page,
    config: RotatorConfig,
    rules: RuleSet,
    policy: PasswordPolicy,
}

impl Rotator {
    /// Launch a browser for rotation work.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            config: RotatorConfig::default(),
            rules: RuleSet::default(),
            policy: Box::new(|_, _| None),
        })
    }

    /// Replace the recognizer rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the episode tunables.
    pub fn with_config(mut self, config: RotatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Install a password-generation policy. A policy returning `None`
    /// delegates to the default generator.
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one rotation episode for the given credential.
    pub async fn rotate(&mut self, original: &Credential) -> Result<RotationOutcome> {
        let bridge = MessageBridge::new();
        let mut events = bridge.subscribe();
        let host = ScriptHost::new(&self.page, &bridge, &self.rules, &self.config);

        let mut working = original.clone();
        working.hostname = normalize_start_url(&working.hostname);
        let mut phase = Phase::HomepageFinding;
        let mut rotated: Option<Credential> = None;
        let mut password_generated = false;

        info!("rotation starting at {}", working.hostname);
        host.load_url(&working.hostname).await?;

        loop {
            let message = match timeout(
                Duration::from_millis(self.config.event_timeout_ms),
                events.recv(),
            )
            .await
            {
                Ok(Ok(message)) => message,
                Ok(Err(RecvError::Lagged(skipped))) => {
                    warn!("event stream lagged, {} messages lost", skipped);
                    continue;
                }
                Ok(Err(RecvError::Closed)) => {
                    phase = Phase::Error(FailureReason::Bug);
                    break;
                }
                Err(_) => {
                    warn!("no event within {}ms, giving up", self.config.event_timeout_ms);
                    InboundMessage::Fail("episode".into(), FailureReason::Bug)
                }
            };
            debug!("event {} in phase {}", message.name(), phase);

            if let InboundMessage::DestinationInfo(dest, form_info) = &message {
                refine_working(
                    &mut working,
                    *dest,
                    form_info.as_ref(),
                    &mut password_generated,
                    &self.policy,
                );
            }

            // Replay the message against each newly entered phase until
            // the phase stabilizes; this carries the protocol across the
            // quiet transitions of the table.
            let mut replays = 0;
            loop {
                let (command, next) = transition(&phase, &message, original, &working);
                let changed = next != phase;
                if changed {
                    info!("phase {} -> {}", phase, next);
                    if next == Phase::LoginSuccessful {
                        working.touch();
                    }
                    if next == Phase::PasswordChangeSuccessful {
                        // Result sink: the rotated credential is fixed
                        // here, before logout can still fail.
                        rotated = Some(working.clone());
                    }
                }
                phase = next;
                if let Some(command) = command {
                    if command != OutboundCommand::Done {
                        self.dispatch(&host, &bridge, &phase, command).await;
                    }
                }
                if phase.is_terminal() || !changed {
                    break;
                }
                replays += 1;
                if replays >= MAX_REPLAYS {
                    warn!("phase did not stabilize, aborting");
                    phase = Phase::Error(FailureReason::Bug);
                    break;
                }
            }

            if phase.is_terminal() {
                break;
            }
        }

        bridge.complete();
        self.halt().await;

        match phase {
            Phase::Error(reason) => {
                warn!("rotation failed: {}", reason);
                Ok(RotationOutcome::Failed { reason, rotated })
            }
            _ => {
                info!("rotation complete");
                Ok(RotationOutcome::Rotated(rotated.unwrap_or(working)))
            }
        }
    }

    /// Halt the engine: stop any in-flight load and park the page so no
    /// page script keeps executing.
    pub async fn abort(&self) {
        self.halt().await;
    }

    async fn halt(&self) {
        let _ = self.page.execute("window.stop()").await;
        let _ = self.page.goto("about:blank").await;
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }

    async fn dispatch(
        &self,
        host: &ScriptHost<'_>,
        bridge: &MessageBridge,
        phase: &Phase,
        command: OutboundCommand,
    ) {
        let name = command.name();
        debug!("dispatch {}", name);
        tokio::time::sleep(Duration::from_millis(self.config.settle_ms)).await;

        let result = match command {
            OutboundCommand::Advance(dest) => {
                self.advance_with_fallback(host, bridge, phase, dest).await
            }
            OutboundCommand::ExamineDestination(dest) => host.examine(dest).await,
            OutboundCommand::FillForm(form_name, values) => {
                match Destination::from_form_name(&form_name) {
                    Some(dest) => host.fill_form(dest, &values).await,
                    None => {
                        bridge.post(
                            bridge.token(),
                            InboundMessage::Fail(form_name, FailureReason::Bug),
                        );
                        Ok(())
                    }
                }
            }
            OutboundCommand::ConfirmSuccess(form_name, success_if_page_changed) => {
                match Destination::from_form_name(&form_name) {
                    Some(dest) => host.confirm_success(dest, success_if_page_changed).await,
                    None => {
                        bridge.post(
                            bridge.token(),
                            InboundMessage::Fail(form_name, FailureReason::Bug),
                        );
                        Ok(())
                    }
                }
            }
            OutboundCommand::LoadUrl(u) => host.load_url(&u).await,
            OutboundCommand::Done => Ok(()),
        };

        if let Err(e) = result {
            warn!("command {} failed: {}", name, e);
            bridge.post(
                bridge.token(),
                InboundMessage::Fail(name.into(), FailureReason::Bug),
            );
        }
    }

    /// Run `advance`; when the direct link path cannot resolve inside a
    /// finding phase, fall back to one navigation-search episode.
    async fn advance_with_fallback(
        &self,
        host: &ScriptHost<'_>,
        bridge: &MessageBridge,
        phase: &Phase,
        dest: Destination,
    ) -> Result<()> {
        info!("{}", dest.progress_finding());
        match host.advance(dest).await? {
            AdvanceOutcome::NotFound => {
                if phase.is_finding() {
                    debug!("advance {}: link path unresolved, searching", dest);
                    self.run_search(host, bridge, dest).await
                } else {
                    bridge.post(
                        bridge.token(),
                        InboundMessage::Fail(dest.action_name().into(), dest.not_found()),
                    );
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Execute one navigation-search episode. The episode's terminal
    /// event (arrival or failure) feeds the same bridge as everything
    /// else.
    async fn run_search(
        &self,
        host: &ScriptHost<'_>,
        bridge: &MessageBridge,
        dest: Destination,
    ) -> Result<()> {
        let mut engine = SearchEngine::new(dest);
        let mut depth = 0usize;
        let mut step = engine.start();

        for _ in 0..self.config.max_search_steps {
            step = match step {
                SearchStep::RequestInfo => {
                    let page_info = host.page_info(dest).await?;
                    engine.on_info(&page_info)
                }
                SearchStep::ClickLink(link_index) => {
                    if host.click_candidate(link_index).await? {
                        depth += 1;
                        let page_info = host.page_info(dest).await?;
                        engine.on_info(&page_info)
                    } else {
                        // The link vanished since discovery; skip to the
                        // next node.
                        let url = host.current_url().await?;
                        engine.on_reload_done(&url)
                    }
                }
                SearchStep::GoBack => {
                    host.go_back().await?;
                    depth = depth.saturating_sub(1);
                    let url = host.current_url().await?;
                    engine.on_back_done(&url, depth > 0)
                }
                SearchStep::Reload(target) => {
                    host.reload_to(&target).await?;
                    depth += 1;
                    engine.on_reload_done(&target)
                }
                SearchStep::Arrived => {
                    info!("{}", dest.progress_found());
                    bridge.post(bridge.token(), InboundMessage::Arrived(dest));
                    return Ok(());
                }
                SearchStep::Fail(reason) => {
                    debug!("search for {} exhausted: {}", dest, reason);
                    bridge.post(
                        bridge.token(),
                        InboundMessage::Fail(dest.action_name().into(), reason),
                    );
                    return Ok(());
                }
            };
        }

        warn!("search for {} exceeded the step limit", dest);
        bridge.post(
            bridge.token(),
            InboundMessage::Fail(dest.action_name().into(), dest.not_found()),
        );
        Ok(())
    }
}

/// Upgrade the starting URL to https and tolerate bare hostnames.
fn normalize_start_url(hostname: &str) -> String {
    let parsed = Url::parse(hostname)
        .or_else(|_| Url::parse(&format!("https://{}", hostname)));
    match parsed {
        Ok(mut url) => {
            if url.scheme() == "http" {
                // set_scheme only fails for incompatible scheme changes.
                let _ = url.set_scheme("https");
            }
            url.to_string()
        }
        Err(_) => hostname.to_string(),
    }
}

/// Apply destination info to the working credential. Login info updates
/// the origin fields; password-change info triggers password generation,
/// exactly once per episode.
fn refine_working(
    working: &mut Credential,
    dest: Destination,
    form_info: Option<&FormInfo>,
    password_generated: &mut bool,
    policy: &PasswordPolicy,
) {
    if let Some(FormInfo::Login(login)) = form_info {
        if let Some(hostname) = &login.hostname {
            working.hostname = hostname.clone();
        }
        if let Some(origin) = &login.form_action_origin {
            working.form_submit_url = Some(origin.clone());
        }
    }
    if dest == Destination::PasswordChange && !*password_generated {
        let constraints = match form_info {
            Some(FormInfo::PasswordChange(change)) => Some(change),
            _ => None,
        };
        let password = policy(&working.hostname, constraints)
            .unwrap_or_else(|| generate_password(constraints));
        working.set_password(password);
        *password_generated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{LoginFormInfo, PasswordChangeInfo};
    use regex::Regex;

    #[test]
    fn start_url_upgrades_http_and_accepts_bare_hosts() {
        assert_eq!(
            normalize_start_url("http://example.com"),
            "https://example.com/"
        );
        assert_eq!(
            normalize_start_url("https://example.com/path"),
            "https://example.com/path"
        );
        assert_eq!(normalize_start_url("example.com"), "https://example.com/");
    }

    #[test]
    fn login_info_refines_origin_fields() {
        let mut working = Credential::new("https://example.com", None, "p1");
        let mut generated = false;
        let policy: PasswordPolicy = Box::new(|_, _| None);
        refine_working(
            &mut working,
            Destination::Login,
            Some(&FormInfo::Login(LoginFormInfo {
                hostname: Some("https://login.example.com".into()),
                form_action_origin: Some("https://auth.example.com".into()),
            })),
            &mut generated,
            &policy,
        );
        assert_eq!(working.hostname, "https://login.example.com");
        assert_eq!(
            working.form_submit_url.as_deref(),
            Some("https://auth.example.com")
        );
        assert_eq!(working.password, "p1");
        assert!(!generated);
    }

    #[test]
    fn change_info_generates_a_matching_password_once() {
        let mut working = Credential::new("https://example.com", None, "p1");
        let mut generated = false;
        let policy: PasswordPolicy = Box::new(|_, _| None);
        let info = FormInfo::PasswordChange(PasswordChangeInfo {
            pattern: Some("^[A-Za-z0-9]{8,}$".into()),
            min_length: None,
            max_length: None,
        });
        refine_working(
            &mut working,
            Destination::PasswordChange,
            Some(&info),
            &mut generated,
            &policy,
        );
        assert!(generated);
        assert_ne!(working.password, "p1");
        assert!(Regex::new("^[A-Za-z0-9]{8,}$")
            .unwrap()
            .is_match(&working.password));

        // A second examination must not regenerate.
        let first = working.password.clone();
        refine_working(
            &mut working,
            Destination::PasswordChange,
            Some(&info),
            &mut generated,
            &policy,
        );
        assert_eq!(working.password, first);
    }

    #[test]
    fn null_change_info_still_generates_via_default() {
        let mut working = Credential::new("https://example.com", None, "p1");
        let mut generated = false;
        let policy: PasswordPolicy = Box::new(|_, _| None);
        refine_working(
            &mut working,
            Destination::PasswordChange,
            None,
            &mut generated,
            &policy,
        );
        assert!(generated);
        assert_ne!(working.password, "p1");
    }

    #[test]
    fn custom_policy_output_wins_over_the_default() {
        let mut working = Credential::new("https://example.com", None, "p1");
        let mut generated = false;
        let policy: PasswordPolicy = Box::new(|hostname, _| {
            assert_eq!(hostname, "https://example.com");
            Some("Chosen-By-Policy-1".into())
        });
        refine_working(
            &mut working,
            Destination::PasswordChange,
            None,
            &mut generated,
            &policy,
        );
        assert_eq!(working.password, "Chosen-By-Policy-1");
    }
}
