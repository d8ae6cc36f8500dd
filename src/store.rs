//! File-backed credential record used by the CLI.

use anyhow::{bail, Context, Result};
use rekey_engine::Credential;
use std::path::Path;

/// Load a credential record from a JSON file.
pub fn load_credential(path: &Path) -> Result<Credential> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading credential file {}", path.display()))?;
    let credential: Credential = serde_json::from_str(&content)
        .with_context(|| format!("parsing credential file {}", path.display()))?;
    validate(&credential)?;
    Ok(credential)
}

/// Save a credential record back to its JSON file.
pub fn save_credential(path: &Path, credential: &Credential) -> Result<()> {
    let json = serde_json::to_string_pretty(credential)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing credential file {}", path.display()))?;
    Ok(())
}

fn validate(credential: &Credential) -> Result<()> {
    if credential.hostname.is_empty() {
        bail!("credential: hostname is required");
    }
    if credential.password.is_empty() {
        bail!("credential: password is required");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rekey-store-test-{}-{}.json",
            std::process::id(),
            content.len()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn roundtrips_a_record() {
        let credential = Credential::new("https://example.com", Some("u1".into()), "p1");
        let path = write_temp("{}");
        save_credential(&path, &credential).unwrap();
        let back = load_credential(&path).unwrap();
        assert_eq!(credential, back);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_empty_hostname() {
        let mut credential = Credential::new("", None, "p1");
        credential.id = "x".into();
        let path = write_temp(&serde_json::to_string(&credential).unwrap());
        let err = load_credential(&path).unwrap_err();
        assert!(err.to_string().contains("hostname"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_malformed_json() {
        let path = write_temp("not json");
        assert!(load_credential(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
