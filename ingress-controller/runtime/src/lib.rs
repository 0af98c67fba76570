#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use ingress_controller_bigip as bigip;
pub use ingress_controller_core as core;
pub use ingress_controller_k8s_api as k8s;
pub use ingress_controller_k8s_index as index;

mod args;

pub use self::args::Args;
