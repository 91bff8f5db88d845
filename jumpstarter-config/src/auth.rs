//! HTTP Basic authentication against local OS accounts.
//!
//! The check itself is an injectable capability so the handlers can be
//! exercised with fakes; the real implementation asks `su` to validate the
//! presented credentials.

use std::time::Duration;

use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use hyper::header;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// How long a credential check may take before it counts as a rejection.
/// This is the only timeout in the system.
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Verifies a user/password pair.
#[async_trait]
pub trait Credentials: Send + Sync {
    /// Returns whether the pair names a valid local account.
    async fn verify(&self, user: &str, password: &str) -> bool;
}

/// Credential check backed by `su`: the account is valid if `su -c true`
/// accepts the password on stdin within [`CHECK_TIMEOUT`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SuLogin;

#[async_trait]
impl Credentials for SuLogin {
    async fn verify(&self, user: &str, password: &str) -> bool {
        let attempt = async {
            let mut child = Command::new("su")
                .args(["-c", "true", user])
                .stdin(std::process::Stdio::piped())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .ok()?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(format!("{password}\n").as_bytes())
                    .await
                    .ok()?;
            }

            child.wait().await.ok().map(|status| status.success())
        };

        match tokio::time::timeout(CHECK_TIMEOUT, attempt).await {
            Ok(Some(valid)) => valid,
            Ok(None) => false,
            Err(_) => {
                debug!(user, "credential check timed out");
                false
            }
        }
    }
}

/// Decodes a `Basic` authorization header value into a user/password pair.
pub fn basic_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Checks a request's `Authorization` header against `creds`.
///
/// Absent, malformed, or rejected credentials all mean "not authorized";
/// the caller short-circuits with 401 before any handler runs.
pub async fn authorize<B>(req: &hyper::Request<B>, creds: &dyn Credentials) -> bool {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    match basic_credentials(value) {
        Some((user, password)) => creds.verify(&user, &password).await,
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::basic_credentials;
    use base64::{prelude::BASE64_STANDARD, Engine};

    #[test]
    fn decodes_a_basic_header() {
        let header = format!("Basic {}", BASE64_STANDARD.encode("admin:s3cr3t:x"));
        let (user, password) = basic_credentials(&header).expect("valid header");
        assert_eq!(user, "admin");
        // Only the first colon splits; passwords may contain colons.
        assert_eq!(password, "s3cr3t:x");
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(basic_credentials("Bearer abc"), None);
    }

    #[test]
    fn rejects_invalid_base64() {
        assert_eq!(basic_credentials("Basic !!!"), None);
    }

    #[test]
    fn rejects_credentials_without_a_colon() {
        let header = format!("Basic {}", BASE64_STANDARD.encode("admin"));
        assert_eq!(basic_credentials(&header), None);
    }
}
