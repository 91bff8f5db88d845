//! Web-based configuration for a Jumpstarter appliance running on MicroShift
//!
//! The service lets an operator set the device hostname, apply the
//! Jumpstarter custom resource, set a root password, and download a rewritten
//! copy of the cluster kubeconfig. Every request is a synchronous sequence:
//! parse form fields, shell out to one or two host utilities, render the
//! fixed HTML page.
//!
//! System state (the hostname, the cluster) lives outside the process; the
//! handlers reach it through the collaborator traits in [`system`] and
//! [`auth`] so they can be exercised with fakes.

#![deny(warnings, rust_2018_idioms, missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod kubeconfig;
pub mod log;
pub mod manifest;
pub mod page;
pub mod server;
pub mod shutdown;
pub mod system;
pub mod web;
pub mod yaml;

pub use self::log::{LogFilter, LogFormat};
pub use self::server::ServerArgs;
