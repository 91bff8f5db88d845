//! The fixed configuration page.
//!
//! One HTML document serves every response: forms for the hostname and
//! Jumpstarter configuration, the kubeconfig download link, and inline
//! banners for the outcome of the previous action. There is no separate
//! error page.

/// Banner severity, mapped onto the page's message styles.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// The action completed.
    Success,
    /// The action failed or was rejected.
    Error,
}

impl Severity {
    fn class(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// An inline banner rendered above the forms.
#[derive(Clone, Debug)]
pub struct Banner {
    /// Visual severity of the banner.
    pub severity: Severity,
    /// The message text.
    pub text: String,
}

impl Banner {
    /// Creates a success banner.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    /// Creates an error banner.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

/// Values interpolated into the page.
#[derive(Clone, Debug)]
pub struct PageState {
    /// The device's current hostname.
    pub current_hostname: String,
    /// The suggested hostname, derived from the default route.
    pub suggested_hostname: String,
}

const STYLE: &str = r#"
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            display: flex;
            justify-content: center;
            align-items: center;
            padding: 20px;
        }
        .container {
            background: white;
            border-radius: 12px;
            box-shadow: 0 10px 40px rgba(0,0,0,0.2);
            max-width: 600px;
            width: 100%;
            padding: 40px;
        }
        h1 {
            color: #333;
            margin-bottom: 10px;
            font-size: 28px;
        }
        .subtitle {
            color: #666;
            margin-bottom: 30px;
            font-size: 14px;
        }
        .section {
            margin-bottom: 30px;
            padding-bottom: 30px;
            border-bottom: 1px solid #eee;
        }
        .section:last-child {
            border-bottom: none;
            margin-bottom: 0;
            padding-bottom: 0;
        }
        h2 {
            color: #444;
            font-size: 20px;
            margin-bottom: 15px;
        }
        .info {
            background: #f8f9fa;
            padding: 12px 16px;
            border-radius: 6px;
            margin-bottom: 15px;
            font-size: 14px;
            color: #555;
        }
        .info strong {
            color: #333;
        }
        .form-group {
            margin-bottom: 15px;
        }
        label {
            display: block;
            margin-bottom: 6px;
            color: #555;
            font-size: 14px;
            font-weight: 500;
        }
        input[type="text"], input[type="password"] {
            width: 100%;
            padding: 10px 12px;
            border: 1px solid #ddd;
            border-radius: 6px;
            font-size: 14px;
            transition: border-color 0.3s;
        }
        input[type="text"]:focus, input[type="password"]:focus {
            outline: none;
            border-color: #667eea;
        }
        .hint {
            font-size: 12px;
            color: #888;
            margin-top: 4px;
        }
        button {
            background: #667eea;
            color: white;
            border: none;
            padding: 12px 24px;
            border-radius: 6px;
            font-size: 14px;
            font-weight: 500;
            cursor: pointer;
            transition: background 0.3s;
        }
        button:hover {
            background: #5568d3;
        }
        .download-btn {
            background: #28a745;
            display: inline-block;
            text-decoration: none;
            color: white;
            padding: 12px 24px;
            border-radius: 6px;
            font-size: 14px;
            font-weight: 500;
            transition: background 0.3s;
        }
        .download-btn:hover {
            background: #218838;
        }
        .message {
            padding: 12px 16px;
            border-radius: 6px;
            margin-bottom: 20px;
            font-size: 14px;
        }
        .message.success {
            background: #d4edda;
            color: #155724;
            border: 1px solid #c3e6cb;
        }
        .message.error {
            background: #f8d7da;
            color: #721c24;
            border: 1px solid #f5c6cb;
        }
"#;

/// Renders the page with the given state and banners.
pub fn render(state: &PageState, banners: &[Banner]) -> String {
    let banners = banners
        .iter()
        .map(|b| format!(r#"<div class="message {}">{}</div>"#, b.severity.class(), b.text))
        .collect::<Vec<_>>()
        .join("\n        ");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Jumpstarter Configuration</title>
    <style>{style}</style>
</head>
<body>
    <div class="container">
        <h1>Jumpstarter Configuration</h1>
        <p class="subtitle">Configure your Jumpstarter deployment settings</p>

        {banners}

        <div class="section">
            <h2>Hostname Configuration</h2>
            <div class="info">
                <strong>Current Hostname:</strong> {current_hostname}
            </div>
            <form method="POST" action="/configure-hostname">
                <div class="form-group">
                    <label for="hostname">New Hostname</label>
                    <input type="text" id="hostname" name="hostname" value="{suggested_hostname}" required>
                    <div class="hint">Default: {suggested_hostname}</div>
                </div>
                <button type="submit">Update Hostname</button>
            </form>
        </div>

        <div class="section">
            <h2>Jumpstarter Configuration</h2>
            <form method="POST" action="/configure-jumpstarter">
                <div class="form-group">
                    <label for="baseDomain">Base Domain *</label>
                    <input type="text" id="baseDomain" name="baseDomain" placeholder="example.com" required>
                    <div class="hint">Required: The base domain for your Jumpstarter deployment</div>
                </div>
                <div class="form-group">
                    <label for="imageVersion">Image Version</label>
                    <input type="text" id="imageVersion" name="imageVersion" placeholder="latest">
                    <div class="hint">Optional: Specific image version to use</div>
                </div>
                <div class="form-group">
                    <label for="rootPassword">Root Password *</label>
                    <input type="password" id="rootPassword" name="rootPassword" required>
                    <div class="hint">Required: New root password, at least 8 characters</div>
                </div>
                <button type="submit">Apply Configuration</button>
            </form>
        </div>

        <div class="section">
            <h2>Download Kubeconfig</h2>
            <p style="color: #666; font-size: 14px; margin-bottom: 15px;">
                Download the MicroShift kubeconfig file to access the Kubernetes cluster.
            </p>
            <a href="/kubeconfig" class="download-btn">Download kubeconfig</a>
        </div>
    </div>
</body>
</html>"#,
        style = STYLE,
        banners = banners,
        current_hostname = state.current_hostname,
        suggested_hostname = state.suggested_hostname,
    )
}

#[cfg(test)]
mod test {
    use super::{render, Banner, PageState};

    fn state() -> PageState {
        PageState {
            current_hostname: "edge-01".to_string(),
            suggested_hostname: "jumpstarter.192-168-1-10.nip.io".to_string(),
        }
    }

    #[test]
    fn interpolates_hostnames() {
        let html = render(&state(), &[]);
        assert!(html.contains("<strong>Current Hostname:</strong> edge-01"));
        assert!(html.contains(r#"value="jumpstarter.192-168-1-10.nip.io""#));
    }

    #[test]
    fn renders_banners_with_their_severity() {
        let html = render(
            &state(),
            &[
                Banner::success("all good"),
                Banner::error("that did not work"),
            ],
        );
        assert!(html.contains(r#"<div class="message success">all good</div>"#));
        assert!(html.contains(r#"<div class="message error">that did not work</div>"#));
    }

    #[test]
    fn always_offers_the_kubeconfig_download() {
        assert!(render(&state(), &[]).contains(r#"href="/kubeconfig""#));
    }
}
