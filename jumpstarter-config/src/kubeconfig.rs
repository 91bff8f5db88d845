//! Loading and rewriting of the MicroShift kubeconfig.
//!
//! The kubeadmin kubeconfig on disk points clients at
//! `https://localhost:<port>`, which is useless off the device. The served
//! copy gets its server address rewritten to the device hostname, and TLS
//! verification is disabled because the cluster certificate does not cover
//! that name. The file itself is never modified.

use std::path::Path;

use regex::Regex;
use thiserror::Error;

/// Default location of the MicroShift kubeadmin kubeconfig.
pub const DEFAULT_PATH: &str = "/var/lib/microshift/resources/kubeadmin/kubeconfig";

/// Indicates that the kubeconfig source file could not be served.
#[derive(Debug, Error)]
pub enum KubeconfigError {
    /// The source file does not exist.
    #[error("kubeconfig file not found")]
    NotFound,

    /// The source file exists but could not be read.
    #[error("failed to read kubeconfig: {0}")]
    Read(#[source] std::io::Error),
}

/// Reads the kubeconfig source file.
pub async fn load(path: &Path) -> Result<String, KubeconfigError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(KubeconfigError::NotFound),
        Err(e) => Err(KubeconfigError::Read(e)),
    }
}

/// Rewrites kubeconfig text for download.
///
/// Every `server: https://localhost:<port>` address is pointed at `hostname`
/// with the port digits preserved, and every `server: https://` line is
/// followed by an `insecure-skip-tls-verify: true` line at the cluster-entry
/// nesting depth. The transformation is textual, not YAML-structural, and
/// applies to all cluster entries in the document.
pub fn rewrite(kubeconfig: &str, hostname: &str) -> String {
    let localhost = Regex::new(r"server: https://localhost:(\d+)").expect("localhost regex");
    let server = Regex::new(r"server: https://").expect("server regex");

    let rewritten = localhost.replace_all(kubeconfig, format!("server: https://{hostname}:$1"));

    let mut lines = Vec::new();
    for line in rewritten.lines() {
        let is_server = server.is_match(line);
        lines.push(line.to_string());
        if is_server {
            lines.push("    insecure-skip-tls-verify: true".to_string());
        }
    }

    let mut text = lines.join("\n");
    if rewritten.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod test {
    use super::{load, rewrite, KubeconfigError};

    const KUBECONFIG: &str = "\
apiVersion: v1
clusters:
  - cluster:
      certificate-authority-data: LS0t
      server: https://localhost:6443
    name: microshift
kind: Config
";

    #[test]
    fn rewrites_localhost_and_inserts_skip_verify() {
        let out = rewrite(KUBECONFIG, "foo.example.com");
        assert!(out.contains(
            "      server: https://foo.example.com:6443\n    insecure-skip-tls-verify: true\n"
        ));
        assert!(!out.contains("localhost"));
    }

    #[test]
    fn preserves_port_digits() {
        let out = rewrite("server: https://localhost:16443\n", "host");
        assert!(out.starts_with("server: https://host:16443\n"));
    }

    #[test]
    fn flags_every_server_line() {
        let doc = "server: https://localhost:6443\nserver: https://other.example.com:8443\n";
        let out = rewrite(doc, "foo");
        assert_eq!(
            out,
            "server: https://foo:6443\n\
             \x20\x20\x20\x20insecure-skip-tls-verify: true\n\
             server: https://other.example.com:8443\n\
             \x20\x20\x20\x20insecure-skip-tls-verify: true\n"
        );
    }

    #[test]
    fn leaves_unrelated_lines_alone() {
        let out = rewrite("kind: Config\n", "foo");
        assert_eq!(out, "kind: Config\n");
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("kubeconfig");
        match load(&missing).await {
            Err(KubeconfigError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_returns_file_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("kubeconfig");
        tokio::fs::write(&path, KUBECONFIG).await.expect("write");
        assert_eq!(load(&path).await.expect("load"), KUBECONFIG);
    }
}
