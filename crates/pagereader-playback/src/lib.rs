//! Audio playback layer for PageReader.
//!
//! The `PlaybackDriver` trait owns one active audio output per tab and
//! reports completion through the subscription handle returned from `play`.
//! `CompletionWatch` wraps that handle in the redundant completion race the
//! session orchestrator relies on: natural end signal, near-end fallback,
//! and a hard per-section ceiling.

pub mod completion;
pub mod driver;
pub mod error;
#[cfg(feature = "rodio")]
pub mod rodio_driver;
pub mod simulated;

pub use completion::{CompletionReason, CompletionWatch, SECTION_TIMEOUT_CEILING};
pub use driver::{PlaybackDriver, PlaybackHandle, PlaybackProgress};
pub use error::{PlaybackError, PlaybackResult};
#[cfg(feature = "rodio")]
pub use rodio_driver::RodioDriver;
pub use simulated::{SimulatedDriver, SimulatedDriverConfig};
