//! Message and command types exchanged between the controller, the page
//! script runtime and the rotation state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal failure reasons. Every rotation episode ends in exactly one
/// of these or in a successful logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    #[serde(rename = "BAD_CREDENTIALS")]
    BadCredentials,
    #[serde(rename = "BLOCKED_BY_CAPTCHA")]
    BlockedByCaptcha,
    #[serde(rename = "BLOCKED_BY_2FA")]
    BlockedBy2fa,
    #[serde(rename = "BLOCKED_BY_TOS")]
    BlockedByTos,
    #[serde(rename = "NOT_FOUND_LOGIN")]
    NotFoundLogin,
    #[serde(rename = "NOT_FOUND_LOGOUT")]
    NotFoundLogout,
    #[serde(rename = "NOT_FOUND_PASSWORD_CHANGE")]
    NotFoundPasswordChange,
    #[serde(rename = "PASSWORD_CHANGE_NOT_ACCEPTED")]
    PasswordChangeNotAccepted,
    #[serde(rename = "BUG")]
    Bug,
}

impl FailureReason {
    /// Stable wire code for this reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadCredentials => "BAD_CREDENTIALS",
            Self::BlockedByCaptcha => "BLOCKED_BY_CAPTCHA",
            Self::BlockedBy2fa => "BLOCKED_BY_2FA",
            Self::BlockedByTos => "BLOCKED_BY_TOS",
            Self::NotFoundLogin => "NOT_FOUND_LOGIN",
            Self::NotFoundLogout => "NOT_FOUND_LOGOUT",
            Self::NotFoundPasswordChange => "NOT_FOUND_PASSWORD_CHANGE",
            Self::PasswordChangeNotAccepted => "PASSWORD_CHANGE_NOT_ACCEPTED",
            Self::Bug => "BUG",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A page role the controller is trying to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Login,
    PasswordChange,
    Logout,
}

impl Destination {
    /// Script-side action name, also used as the form name on the wire.
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::PasswordChange => "passwordChange",
            Self::Logout => "logout",
        }
    }

    /// Reverse lookup from a wire form name.
    pub fn from_form_name(name: &str) -> Option<Self> {
        match name {
            "login" => Some(Self::Login),
            "passwordChange" => Some(Self::PasswordChange),
            "logout" => Some(Self::Logout),
            _ => None,
        }
    }

    /// Failure reason reported when this destination cannot be located.
    pub fn not_found(&self) -> FailureReason {
        match self {
            Self::Login => FailureReason::NotFoundLogin,
            Self::PasswordChange => FailureReason::NotFoundPasswordChange,
            Self::Logout => FailureReason::NotFoundLogout,
        }
    }

    /// Ordered link roles to follow when advancing toward this
    /// destination. The deepest resolvable role in the path is clicked.
    pub fn link_path(&self) -> &'static [&'static str] {
        match self {
            Self::Login => &["menu", "account", "login"],
            Self::PasswordChange => &[
                "menu",
                "profile",
                "account",
                "settings",
                "security",
                "changePassword",
            ],
            Self::Logout => &["menu", "profile", "account", "logout"],
        }
    }

    /// Progress message while searching for this destination.
    pub fn progress_finding(&self) -> &'static str {
        match self {
            Self::Login => "looking for the login page",
            Self::PasswordChange => "looking for the password change page",
            Self::Logout => "logging out",
        }
    }

    /// Progress message once this destination has been reached.
    pub fn progress_found(&self) -> &'static str {
        match self {
            Self::Login => "login page found",
            Self::PasswordChange => "password change page found",
            Self::Logout => "logged out",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

/// Form details reported by `examine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "camelCase")]
pub enum FormInfo {
    Login(LoginFormInfo),
    PasswordChange(PasswordChangeInfo),
}

/// What the login form revealed about the account origin.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoginFormInfo {
    pub hostname: Option<String>,
    pub form_action_origin: Option<String>,
}

/// Constraints the password change form advertises for new passwords.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PasswordChangeInfo {
    pub pattern: Option<String>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
}

/// Events flowing from the page script runtime to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    TapBegin(String),
    TapEnd(String),
    Arrived(Destination),
    DestinationInfo(Destination, Option<FormInfo>),
    FormFillSuccess(String),
    Fail(String, FailureReason),
}

impl InboundMessage {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TapBegin(_) => "tap_begin",
            Self::TapEnd(_) => "tap_end",
            Self::Arrived(_) => "arrived",
            Self::DestinationInfo(..) => "destination_info",
            Self::FormFillSuccess(_) => "form_fill_success",
            Self::Fail(..) => "fail",
        }
    }
}

/// Commands the controller issues to the page script runtime (or, for
/// `LoadUrl`, to the browser engine directly).
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundCommand {
    Advance(Destination),
    ExamineDestination(Destination),
    FillForm(String, Vec<(String, String)>),
    ConfirmSuccess(String, bool),
    LoadUrl(String),
    Done,
}

impl OutboundCommand {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Advance(_) => "advance",
            Self::ExamineDestination(_) => "examine",
            Self::FillForm(..) => "fill_form",
            Self::ConfirmSuccess(..) => "confirm_success",
            Self::LoadUrl(_) => "load_url",
            Self::Done => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_codes_are_stable() {
        assert_eq!(FailureReason::BadCredentials.code(), "BAD_CREDENTIALS");
        assert_eq!(FailureReason::BlockedBy2fa.code(), "BLOCKED_BY_2FA");
        assert_eq!(
            FailureReason::NotFoundPasswordChange.code(),
            "NOT_FOUND_PASSWORD_CHANGE"
        );
        let json = serde_json::to_string(&FailureReason::BlockedByTos).unwrap();
        assert_eq!(json, "\"BLOCKED_BY_TOS\"");
    }

    #[test]
    fn destination_table() {
        assert_eq!(Destination::Login.not_found(), FailureReason::NotFoundLogin);
        assert_eq!(
            Destination::PasswordChange.not_found(),
            FailureReason::NotFoundPasswordChange
        );
        assert_eq!(
            Destination::Logout.not_found(),
            FailureReason::NotFoundLogout
        );
        assert_eq!(
            Destination::from_form_name("passwordChange"),
            Some(Destination::PasswordChange)
        );
        assert_eq!(Destination::from_form_name("nope"), None);
    }

    #[test]
    fn link_paths_end_at_their_goal() {
        assert_eq!(Destination::Login.link_path().last(), Some(&"login"));
        assert_eq!(
            Destination::PasswordChange.link_path().last(),
            Some(&"changePassword")
        );
        assert_eq!(Destination::Logout.link_path().last(), Some(&"logout"));
    }

    #[test]
    fn form_info_roundtrips() {
        let info = FormInfo::PasswordChange(PasswordChangeInfo {
            pattern: Some("^[A-Za-z0-9]{8,}$".into()),
            min_length: Some(8),
            max_length: None,
        });
        let json = serde_json::to_string(&info).unwrap();
        let back: FormInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info, back);
    }
}
