//! Request routing and form handling.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::{self, Credentials};
use crate::kubeconfig::{self, KubeconfigError};
use crate::manifest::JumpstarterSpec;
use crate::page::{self, Banner, PageState};
use crate::system::{self, Accounts, ClusterApi, HostnameStore};

/// Minimum accepted root password length.
const MIN_PASSWORD_LEN: usize = 8;

/// Shared handler state: the collaborator capabilities and the kubeconfig
/// source path. Cheap to clone; one copy is captured per connection.
#[derive(Clone)]
pub struct Context {
    /// Hostname access and default-route discovery.
    pub hosts: Arc<dyn HostnameStore>,
    /// Cluster manifest application.
    pub cluster: Arc<dyn ClusterApi>,
    /// Local account passwords.
    pub accounts: Arc<dyn Accounts>,
    /// Credential verification for HTTP Basic auth.
    pub credentials: Arc<dyn Credentials>,
    /// Path of the kubeconfig served for download.
    pub kubeconfig: PathBuf,
    /// Whether requests must carry valid credentials.
    pub require_auth: bool,
}

/// Form fields accepted by `POST /configure-hostname`.
#[derive(Debug, Default, Deserialize)]
struct HostnameForm {
    #[serde(default)]
    hostname: String,
}

/// Form fields accepted by `POST /configure-jumpstarter`.
#[derive(Debug, Default, Deserialize)]
struct JumpstarterForm {
    #[serde(rename = "baseDomain", default)]
    base_domain: String,

    #[serde(default)]
    image: Option<String>,

    #[serde(rename = "imageVersion", default)]
    image_version: Option<String>,

    #[serde(rename = "rootPassword", default)]
    root_password: String,
}

/// Routes one request.
///
/// Infallible by construction: every failure mode renders as a response, so
/// the service layer never sees an error.
pub async fn handle<B>(req: Request<B>, ctx: Context) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if ctx.require_auth && !auth::authorize(&req, &*ctx.credentials).await {
        debug!(%method, %path, "rejecting unauthenticated request");
        return unauthorized();
    }

    let rsp = match (&method, path.as_str()) {
        (&Method::GET, "/") => main_page(&ctx, Vec::new()).await,
        (&Method::GET, "/kubeconfig") => serve_kubeconfig(&ctx).await,
        (&Method::POST, "/configure-hostname") => match read_form::<HostnameForm, B>(req).await {
            Ok(form) => configure_hostname(&ctx, form).await,
            Err(rsp) => rsp,
        },
        (&Method::POST, "/configure-jumpstarter") => {
            match read_form::<JumpstarterForm, B>(req).await {
                Ok(form) => configure_jumpstarter(&ctx, form).await,
                Err(rsp) => rsp,
            }
        }
        _ => plain(StatusCode::NOT_FOUND, "Not Found"),
    };

    info!(%method, %path, status = %rsp.status().as_u16(), "handled request");
    rsp
}

/// Collects the request body and decodes it as a urlencoded form.
async fn read_form<F, B>(req: Request<B>) -> Result<F, Response<Full<Bytes>>>
where
    F: serde::de::DeserializeOwned,
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => {
            return Err(plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error reading request body: {error}"),
            ))
        }
    };

    serde_urlencoded::from_bytes(&body)
        .map_err(|error| plain(StatusCode::BAD_REQUEST, format!("Invalid form data: {error}")))
}

async fn main_page(ctx: &Context, banners: Vec<Banner>) -> Response<Full<Bytes>> {
    let suggested =
        system::suggested_domain(ctx.hosts.default_route_ip().await.as_deref());
    let state = PageState {
        current_hostname: ctx.hosts.current(),
        suggested_hostname: suggested,
    };

    let html = page::render(&state, &banners);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(html)))
        .unwrap()
}

async fn configure_hostname(ctx: &Context, form: HostnameForm) -> Response<Full<Bytes>> {
    let hostname = form.hostname.trim();
    if hostname.is_empty() {
        return main_page(ctx, vec![Banner::error("Hostname cannot be empty")]).await;
    }

    let banner = match ctx.hosts.set(hostname).await {
        Ok(_) => Banner::success(format!("Hostname successfully updated to: {hostname}")),
        Err(error) => Banner::error(format!("Failed to update hostname: {error}")),
    };
    main_page(ctx, vec![banner]).await
}

async fn configure_jumpstarter(ctx: &Context, form: JumpstarterForm) -> Response<Full<Bytes>> {
    let base_domain = form.base_domain.trim().to_string();
    let root_password = form.root_password;

    let mut invalid = Vec::new();
    if base_domain.is_empty() {
        invalid.push(Banner::error("Base domain is required"));
    }
    if root_password.len() < MIN_PASSWORD_LEN {
        invalid.push(Banner::error(format!(
            "Root password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if !invalid.is_empty() {
        return main_page(ctx, invalid).await;
    }

    let spec = JumpstarterSpec {
        base_domain: base_domain.clone(),
        image: normalize(form.image),
        image_version: normalize(form.image_version),
    };

    // The three steps run in strict sequence with no rollback: a failed step
    // never stops the later ones, and each failure reports independently.
    let mut failures = Vec::new();

    if let Err(error) = ctx.accounts.set_root_password(&root_password).await {
        failures.push(Banner::error(format!("Failed to set root password: {error}")));
    }

    if let Err(error) = ctx.hosts.set(&base_domain).await {
        failures.push(Banner::error(format!("Failed to update hostname: {error}")));
    }

    if let Err(error) = ctx.cluster.apply(&spec.to_yaml()).await {
        failures.push(Banner::error(format!(
            "Failed to apply Jumpstarter CR: {error}"
        )));
    }

    if failures.is_empty() {
        let mut message = format!(
            "Configuration applied: root password set, hostname updated, \
             Jumpstarter CR applied with baseDomain: {base_domain}"
        );
        if let Some(image) = &spec.image {
            message.push_str(&format!(", image: {image}"));
        } else if let Some(version) = &spec.image_version {
            message.push_str(&format!(", imageVersion: {version}"));
        }
        main_page(ctx, vec![Banner::success(message)]).await
    } else {
        main_page(ctx, failures).await
    }
}

async fn serve_kubeconfig(ctx: &Context) -> Response<Full<Bytes>> {
    let text = match kubeconfig::load(&ctx.kubeconfig).await {
        Ok(text) => text,
        Err(KubeconfigError::NotFound) => {
            return plain(StatusCode::NOT_FOUND, "Kubeconfig file not found")
        }
        Err(error) => {
            return plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error reading kubeconfig: {error}"),
            )
        }
    };

    let rewritten = kubeconfig::rewrite(&text, &ctx.hosts.current());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"kubeconfig\"",
        )
        .body(Full::new(Bytes::from(rewritten)))
        .unwrap()
}

/// Drops empty or whitespace-only optional fields.
fn normalize(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn unauthorized() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(
            header::WWW_AUTHENTICATE,
            "Basic realm=\"jumpstarter-config\"",
        )
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from("unauthorized\n")))
        .unwrap()
}

fn plain(status: StatusCode, body: impl Into<String>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from(body.into())))
        .unwrap()
}
