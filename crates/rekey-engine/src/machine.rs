//! The credential rotation state machine.
//!
//! `transition` is a pure function over (phase, inbound message, original
//! credential, working credential). The orchestrator replays a message
//! against each newly entered phase until the phase stabilizes, which is
//! what carries the protocol across the quiet transitions of the table.

use crate::credential::Credential;
use crate::protocol::{Destination, FailureReason, InboundMessage, OutboundCommand};
use std::fmt;

/// The controller's position in the rotation protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    HomepageFinding,
    HomepageFound,
    LoginFinding,
    LoginFound,
    LoginSuccessful,
    PasswordChangeFinding,
    PasswordChangeFound,
    PasswordChangeSuccessful,
    LoggingOut,
    LoggedOut,
    Error(FailureReason),
}

impl Phase {
    /// Terminal phases absorb every message, emitting only `Done`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::LoggedOut | Phase::Error(_))
    }

    /// Whether this phase is searching for a destination page, which is
    /// where the navigation-search fallback may run.
    pub fn is_finding(&self) -> bool {
        matches!(
            self,
            Phase::HomepageFinding
                | Phase::LoginFinding
                | Phase::PasswordChangeFinding
                | Phase::LoggingOut
        )
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::HomepageFinding => "homepage_finding",
            Phase::HomepageFound => "homepage_found",
            Phase::LoginFinding => "login_finding",
            Phase::LoginFound => "login_found",
            Phase::LoginSuccessful => "login_successful",
            Phase::PasswordChangeFinding => "password_change_finding",
            Phase::PasswordChangeFound => "password_change_found",
            Phase::PasswordChangeSuccessful => "password_change_successful",
            Phase::LoggingOut => "logging_out",
            Phase::LoggedOut => "logged_out",
            Phase::Error(_) => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Error(reason) => write!(f, "error({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// Apply one inbound message to the current phase.
///
/// Returns the command to dispatch (if any) and the next phase. Messages
/// not listed for a phase are ignored; `Fail` is globally terminal.
pub fn transition(
    phase: &Phase,
    message: &InboundMessage,
    original: &Credential,
    working: &Credential,
) -> (Option<OutboundCommand>, Phase) {
    use InboundMessage as M;
    use OutboundCommand as C;

    if phase.is_terminal() {
        return (Some(C::Done), phase.clone());
    }
    if let M::Fail(_, reason) = message {
        return (Some(C::Done), Phase::Error(*reason));
    }

    match (phase, message) {
        (Phase::HomepageFinding, M::TapEnd(_)) => (None, Phase::HomepageFound),
        (Phase::HomepageFound, M::TapEnd(_)) => (None, Phase::LoginFinding),

        (Phase::LoginFinding, M::TapEnd(_)) => (
            Some(C::Advance(Destination::Login)),
            Phase::LoginFinding,
        ),
        (Phase::LoginFinding, M::Arrived(_)) => (None, Phase::LoginFound),

        (Phase::LoginFound, M::Arrived(_)) => (
            Some(C::ExamineDestination(Destination::Login)),
            Phase::LoginFound,
        ),
        (Phase::LoginFound, M::DestinationInfo(..)) => {
            let values = vec![
                (
                    "username".to_string(),
                    working.username.clone().unwrap_or_default(),
                ),
                ("password".to_string(), working.password.clone()),
            ];
            (
                Some(C::FillForm("login".into(), values)),
                Phase::LoginFound,
            )
        }
        (Phase::LoginFound, M::TapEnd(_)) => (
            Some(C::ConfirmSuccess("login".into(), true)),
            Phase::LoginFound,
        ),
        (Phase::LoginFound, M::FormFillSuccess(_)) => (None, Phase::LoginSuccessful),

        (Phase::LoginSuccessful, M::FormFillSuccess(_)) => {
            (None, Phase::PasswordChangeFinding)
        }

        (Phase::PasswordChangeFinding, M::FormFillSuccess(_) | M::TapEnd(_)) => (
            Some(C::Advance(Destination::PasswordChange)),
            Phase::PasswordChangeFinding,
        ),
        (Phase::PasswordChangeFinding, M::Arrived(_)) => (None, Phase::PasswordChangeFound),

        (Phase::PasswordChangeFound, M::Arrived(_)) => (
            Some(C::ExamineDestination(Destination::PasswordChange)),
            Phase::PasswordChangeFound,
        ),
        (Phase::PasswordChangeFound, M::DestinationInfo(..)) => {
            let values = vec![
                ("password".to_string(), original.password.clone()),
                ("newPassword".to_string(), working.password.clone()),
            ];
            (
                Some(C::FillForm("passwordChange".into(), values)),
                Phase::PasswordChangeFound,
            )
        }
        (Phase::PasswordChangeFound, M::TapEnd(_)) => (
            Some(C::ConfirmSuccess("passwordChange".into(), false)),
            Phase::PasswordChangeFound,
        ),
        (Phase::PasswordChangeFound, M::FormFillSuccess(_)) => {
            (None, Phase::PasswordChangeSuccessful)
        }

        (Phase::PasswordChangeSuccessful, M::FormFillSuccess(_)) => (None, Phase::LoggingOut),

        (Phase::LoggingOut, M::FormFillSuccess(_)) => (
            Some(C::LoadUrl(working.hostname.clone())),
            Phase::LoggingOut,
        ),
        (Phase::LoggingOut, M::TapEnd(_)) => (
            Some(C::Advance(Destination::Logout)),
            Phase::LoggingOut,
        ),
        (Phase::LoggingOut, M::Arrived(_)) => (None, Phase::LoggedOut),

        // Everything else is ignored in place.
        _ => (None, phase.clone()),
    }
}
