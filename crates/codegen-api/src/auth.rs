use anyhow::{Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token format: expected a JWT")]
    Malformed,

    #[error("Token has expired. Please run `codegen login` to get a new one.")]
    Expired,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
    pub preferred_username: Option<String>,
}

/// Claims read from the JWT payload. The signature is not verified here;
/// the backend does that on every request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    pub exp: Option<i64>,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl TokenClaims {
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let mut parts = token.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        // some issuers keep the padding
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
    }

    pub fn is_expired(&self) -> bool {
        self.exp.is_some_and(|exp| exp <= now())
    }
}

/// Contents of the token file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub expires_at: Option<i64>,
    pub email: Option<String>,
}

impl StoredToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now())
    }

    pub fn time_until_expiry(&self) -> String {
        let Some(expires_at) = self.expires_at else {
            return "never".to_string();
        };
        let remaining = expires_at - now();

        if remaining <= 0 {
            "expired".to_string()
        } else if remaining < 3600 {
            format!("{} minutes", remaining / 60)
        } else if remaining < 86400 {
            format!("{} hours", remaining / 3600)
        } else {
            format!("{} days", remaining / 86400)
        }
    }
}

/// Who the token belongs to, for `codegen profile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub username: String,
}

impl UserProfile {
    pub fn from_token(token: &str) -> Result<Self, TokenError> {
        let claims = TokenClaims::decode(token)?;
        let or_na = |value: Option<String>| value.unwrap_or_else(|| "N/A".to_string());
        Ok(Self {
            name: or_na(claims.user_metadata.full_name),
            email: or_na(claims.email),
            username: or_na(claims.user_metadata.preferred_username),
        })
    }
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn get_auth_file_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home_dir.join(".config").join("codegen-sh").join("auth.toml"))
}

pub fn load_token() -> Result<Option<StoredToken>> {
    load_token_from(&get_auth_file_path()?)
}

/// Validate and store a token. Returns what was written.
pub fn save_token(token: &str) -> Result<StoredToken> {
    save_token_to(&get_auth_file_path()?, token)
}

pub fn clear_token() -> Result<()> {
    clear_token_at(&get_auth_file_path()?)
}

/// The stored token, if there is one and it has not expired.
///
/// An expired token is removed so the next command starts clean.
pub fn get_current_token() -> Option<String> {
    let path = get_auth_file_path().ok()?;
    current_token_at(&path)
}

fn load_token_from(path: &Path) -> Result<Option<StoredToken>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let stored = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(stored))
}

fn save_token_to(path: &Path, token: &str) -> Result<StoredToken> {
    let token = token.trim();
    let claims = TokenClaims::decode(token)?;
    if claims.is_expired() {
        return Err(TokenError::Expired.into());
    }

    let stored = StoredToken {
        token: token.to_string(),
        expires_at: claims.exp,
        email: claims.email,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string(&stored)?;
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| {
            f.write_all(contents.as_bytes())?;
            f.flush()
        })
        .map_err(|err| anyhow::anyhow!("Failed to write {}: {err}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    log::debug!("Stored token in {}", path.display());
    Ok(stored)
}

fn clear_token_at(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

fn current_token_at(path: &Path) -> Option<String> {
    let stored = match load_token_from(path) {
        Ok(stored) => stored?,
        Err(e) => {
            log::debug!("Ignoring unreadable token file: {e:#}");
            return None;
        }
    };

    if stored.is_expired() {
        if let Err(e) = clear_token_at(path) {
            log::debug!("Failed to remove expired token: {e}");
        }
        eprintln!("Your session has expired. Run `codegen login` to log in again.");
        return None;
    }
    Some(stored.token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn token_path(dir: &TempDir) -> PathBuf {
        dir.path().join("codegen-sh").join("auth.toml")
    }

    #[test]
    fn test_decode_claims() {
        let token = jwt(
            r#"{"exp":4102444800,"email":"dev@example.com","user_metadata":{"full_name":"Dev One","preferred_username":"dev1"}}"#,
        );
        let claims = TokenClaims::decode(&token).unwrap();
        assert_eq!(claims.exp, Some(4102444800));
        assert_eq!(claims.email.as_deref(), Some("dev@example.com"));
        assert!(!claims.is_expired());

        let profile = UserProfile::from_token(&token).unwrap();
        assert_eq!(
            profile,
            UserProfile {
                name: "Dev One".into(),
                email: "dev@example.com".into(),
                username: "dev1".into(),
            }
        );
    }

    #[test]
    fn test_profile_defaults_to_na() {
        let profile = UserProfile::from_token(&jwt("{}")).unwrap();
        assert_eq!(profile.name, "N/A");
        assert_eq!(profile.email, "N/A");
        assert_eq!(profile.username, "N/A");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            TokenClaims::decode("not-a-token"),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(
            TokenClaims::decode("a.!!!.c"),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(
            TokenClaims::decode(&jwt("42")),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let path = token_path(&dir);
        let token = jwt(r#"{"exp":4102444800,"email":"dev@example.com"}"#);

        let stored = save_token_to(&path, &token).unwrap();
        assert_eq!(stored.email.as_deref(), Some("dev@example.com"));
        assert_eq!(load_token_from(&path).unwrap(), Some(stored));
        assert_eq!(current_token_at(&path), Some(token));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        clear_token_at(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(current_token_at(&path), None);
        // clearing twice is fine
        clear_token_at(&path).unwrap();
    }

    #[test]
    fn test_save_rejects_expired_and_malformed() {
        let dir = TempDir::new().unwrap();
        let path = token_path(&dir);

        let err = save_token_to(&path, &jwt(r#"{"exp":1}"#)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TokenError>(),
            Some(TokenError::Expired)
        ));
        let err = save_token_to(&path, "garbage").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TokenError>(),
            Some(TokenError::Malformed)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_expired_token_is_cleared() {
        let dir = TempDir::new().unwrap();
        let path = token_path(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "token = \"x.y.z\"\nexpires_at = 1\n").unwrap();

        assert_eq!(current_token_at(&path), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_unreadable_token_file() {
        let dir = TempDir::new().unwrap();
        let path = token_path(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not toml at all [").unwrap();

        assert_eq!(current_token_at(&path), None);
    }

    #[test]
    fn test_time_until_expiry() {
        let stored = StoredToken {
            token: "t".into(),
            expires_at: Some(now() + 2 * 86400 + 60),
            email: None,
        };
        assert_eq!(stored.time_until_expiry(), "2 days");

        let expired = StoredToken {
            expires_at: Some(1),
            ..stored
        };
        assert_eq!(expired.time_until_expiry(), "expired");
    }
}
