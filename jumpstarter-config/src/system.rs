//! Adapters over the host utilities this service drives.
//!
//! Each adapter runs one external program exactly once per request: no
//! retries, no backoff, no partial-completion recovery. The collaborator
//! traits keep the HTTP handlers testable with fakes; the real
//! implementations shell out to `hostnamectl`, `ip`, `chpasswd`, and
//! `kubectl`.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// An external command failed to run or ran and reported failure.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be written to its temporary file.
    #[error("failed to stage manifest: {0}")]
    Stage(#[source] std::io::Error),

    /// The program exited unsuccessfully; the message is its stderr text.
    #[error("{0}")]
    Failed(String),
}

/// Result of one external invocation: the program's success message, or its
/// diagnostic text.
pub type CommandResult = Result<String, CommandError>;

/// Access to the device hostname and its network identity.
#[async_trait]
pub trait HostnameStore: Send + Sync {
    /// Returns the current system hostname.
    fn current(&self) -> String;

    /// Changes the system hostname.
    async fn set(&self, hostname: &str) -> CommandResult;

    /// Returns the default-route IPv4 address with dots replaced by hyphens
    /// (the form a nip.io-style wildcard domain embeds), or `None` when no
    /// default route is discoverable.
    async fn default_route_ip(&self) -> Option<String>;
}

/// Access to the cluster's declarative state.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Applies a serialized manifest to the cluster and returns the apply
    /// tool's output.
    async fn apply(&self, manifest: &str) -> CommandResult;
}

/// Access to local account passwords.
#[async_trait]
pub trait Accounts: Send + Sync {
    /// Sets the root account password.
    async fn set_root_password(&self, password: &str) -> CommandResult;
}

/// Suggested appliance domain for a hyphenated default-route address.
///
/// Falls back to a fixed literal when no default route is discoverable.
pub fn suggested_domain(route_ip: Option<&str>) -> String {
    match route_ip {
        Some(ip) => format!("jumpstarter.{ip}.nip.io"),
        None => "jumpstarter.local".to_string(),
    }
}

/// The `hostnamectl`/`ip`-backed hostname store.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemdHostname;

#[async_trait]
impl HostnameStore for SystemdHostname {
    fn current(&self) -> String {
        hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    async fn set(&self, hostname: &str) -> CommandResult {
        run("hostnamectl", &["set-hostname", hostname], None).await
    }

    async fn default_route_ip(&self) -> Option<String> {
        let route = match run("ip", &["route", "show", "default"], None).await {
            Ok(out) => out,
            Err(error) => {
                debug!(%error, "failed to query the default route");
                return None;
            }
        };
        let dev = default_route_device(&route)?;

        let addrs = match run("ip", &["-4", "addr", "show", &dev], None).await {
            Ok(out) => out,
            Err(error) => {
                debug!(%error, %dev, "failed to query interface addresses");
                return None;
            }
        };
        first_inet_address(&addrs).map(|ip| ip.replace('.', "-"))
    }
}

/// The `kubectl apply`-backed cluster API.
#[derive(Clone, Copy, Debug, Default)]
pub struct KubectlCluster;

#[async_trait]
impl ClusterApi for KubectlCluster {
    async fn apply(&self, manifest: &str) -> CommandResult {
        // The temp file lives exactly as long as this call; dropping the
        // handle deletes it best-effort whatever kubectl's outcome was.
        let file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .map_err(CommandError::Stage)?;
        tokio::fs::write(file.path(), manifest)
            .await
            .map_err(CommandError::Stage)?;

        let path = file.path().to_string_lossy().into_owned();
        run("kubectl", &["apply", "-f", &path], None).await
    }
}

/// The `chpasswd`-backed account store.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChpasswdAccounts;

#[async_trait]
impl Accounts for ChpasswdAccounts {
    async fn set_root_password(&self, password: &str) -> CommandResult {
        run("chpasswd", &[], Some(&format!("root:{password}\n"))).await
    }
}

/// Runs `program` once, optionally feeding `stdin`, and waits for it.
///
/// Success yields the trimmed stdout; failure yields the trimmed stderr (or
/// the exit status when stderr is empty).
async fn run(program: &'static str, args: &[&str], stdin: Option<&str>) -> CommandResult {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|source| CommandError::Spawn { program, source })?;

    if let Some(input) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(|source| CommandError::Spawn { program, source })?;
            // Dropping the pipe closes the child's stdin.
        }
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|source| CommandError::Spawn { program, source })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(CommandError::Failed(format!(
                "{program} exited with {}",
                output.status
            )))
        } else {
            Err(CommandError::Failed(stderr))
        }
    }
}

/// Extracts the interface name from `ip route show default` output.
///
/// Expected shape: `default via 192.168.1.1 dev eth0 proto dhcp ...`.
fn default_route_device(route: &str) -> Option<String> {
    let line = route.lines().next()?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    let dev = parts.iter().position(|p| *p == "dev")?;
    parts.get(dev + 1).map(|d| d.to_string())
}

/// Extracts the first IPv4 address from `ip -4 addr show <dev>` output,
/// stripping the prefix length.
fn first_inet_address(addrs: &str) -> Option<String> {
    for line in addrs.lines() {
        if let Some(rest) = line.trim_start().strip_prefix("inet ") {
            let with_mask = rest.split_whitespace().next()?;
            let ip = with_mask.split('/').next().unwrap_or(with_mask);
            return Some(ip.to_string());
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::{default_route_device, first_inet_address, suggested_domain};

    #[test]
    fn parses_default_route_device() {
        let route = "default via 192.168.1.1 dev eth0 proto dhcp src 192.168.1.10 metric 100\n";
        assert_eq!(default_route_device(route).as_deref(), Some("eth0"));
    }

    #[test]
    fn route_without_device_is_absent() {
        assert_eq!(default_route_device(""), None);
        assert_eq!(default_route_device("default via 192.168.1.1"), None);
        assert_eq!(default_route_device("default via 192.168.1.1 dev"), None);
    }

    #[test]
    fn parses_first_inet_address() {
        let addrs = "\
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UP group default
    inet 192.168.1.10/24 brd 192.168.1.255 scope global dynamic noprefixroute eth0
       valid_lft 86000sec preferred_lft 86000sec
    inet 10.0.0.5/8 scope global secondary eth0
";
        assert_eq!(first_inet_address(addrs).as_deref(), Some("192.168.1.10"));
    }

    #[test]
    fn missing_inet_line_is_absent() {
        assert_eq!(first_inet_address("2: eth0: <NO-CARRIER> mtu 1500\n"), None);
    }

    #[test]
    fn suggested_domain_embeds_the_hyphenated_address() {
        let ip = first_inet_address("    inet 192.168.1.10/24 scope global eth0\n")
            .map(|ip| ip.replace('.', "-"));
        assert_eq!(
            suggested_domain(ip.as_deref()),
            "jumpstarter.192-168-1-10.nip.io"
        );
    }

    #[test]
    fn suggested_domain_falls_back_without_a_route() {
        assert_eq!(suggested_domain(None), "jumpstarter.local");
    }
}
