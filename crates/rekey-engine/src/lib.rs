//! # rekey-engine
//!
//! Automated credential rotation: drive a browser through login →
//! password change → logout using only generic DOM heuristics, no
//! per-site code.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rekey_engine::{BrowserConfig, Credential, Rotator};
//!
//! # #[tokio::main]
//! # async fn main() -> rekey_engine::Result<()> {
//! let credential = Credential::new("https://example.com", Some("u1".into()), "p1");
//! let mut rotator = Rotator::new(&BrowserConfig::default()).await?;
//! let outcome = rotator.rotate(&credential).await?;
//! println!("Success: {}", outcome.success());
//! rotator.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod credential;
pub mod element;
pub mod machine;
pub mod orchestrator;
pub mod policy;
pub mod protocol;
pub mod recognizer;
pub mod rules;
pub mod script;
pub mod search;

pub use bridge::MessageBridge;
pub use config::{BrowserConfig, RotatorConfig, Viewport};
pub use credential::Credential;
pub use element::PageElement;
pub use machine::{transition, Phase};
pub use orchestrator::{RotationOutcome, Rotator};
pub use policy::{generate_password, PasswordPolicy};
pub use protocol::{
    Destination, FailureReason, FormInfo, InboundMessage, LoginFormInfo, OutboundCommand,
    PasswordChangeInfo,
};
pub use recognizer::{find_item_buckets_by_recognizers, Matcher, PatternSet, RoleBuckets};
pub use rules::RuleSet;
pub use script::{AdvanceOutcome, ExtractScope, ScriptHost};
pub use search::{PageInfo, SearchEngine, SearchNode, SearchStep};

/// Result type for rekey-engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or driving a rotation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("script error: {0}")]
    Script(String),
}
