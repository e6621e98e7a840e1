//! PageReader application wiring: command dispatch, console presenter, and
//! runtime assembly over the session orchestrator.

pub mod dispatch;
pub mod presenter;
pub mod runtime;

pub use dispatch::Command;
pub use runtime::{start, AppHandle, AppRuntimeOptions};
