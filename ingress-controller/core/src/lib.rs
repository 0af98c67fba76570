//! Shared model for the ADC ingress controller.
//!
//! Both halves of a reconciliation produce the same shape: the desired state derived from cluster
//! resources and the current state projected from the ADC inventory are each an ordered list of
//! [`VirtualServer`]s, so that a later diff compares like with like.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cancel;
mod config;
mod error;
pub mod virtual_server;

pub use self::{
    cancel::cancelable,
    config::Config,
    error::{Error, Result},
    virtual_server::{CurrentState, DesiredState, Member, MonitorSpec, VirtualServer},
};

/// Monitor type applied when the backend is reached over TLS and no type was configured.
pub const MONITOR_TYPE_HTTPS: &str = "https";

/// Monitor type applied when no monitor information was supplied at all.
pub const MONITOR_TYPE_HTTP: &str = "http";
