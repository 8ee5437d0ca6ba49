//! Application-level orchestration.
//!
//! This module owns the computation lifecycle (start/cancel/reset) and the
//! consumer-side gate that UI/CLI layers push controller events through.

mod controller;
mod presenter;

pub(crate) use controller::{run_controller, Controller, UiCommand};
pub(crate) use presenter::{Presenter, ProgressView};
