//! Driver layer for mobile UI automation.
//!
//! This crate exposes the Appium session and the element/gesture helpers the
//! traversal engine is built on.
//!
//! - [`appium::provider::SessionProvider`]: lazily created, shared Appium session
//! - [`appium::session::AppiumSession`]: [`MobileSession`] over a `fantoccini` client
//! - [`resolver::ElementResolver`]: multi-strategy lookup with retries
//! - [`gesture::GestureEngine`]: taps, swipes and native scroll gestures
//! - [`pacing::Pacing`]: cancellable waits between UI actions
pub mod appium;
pub mod bounds;
pub mod gesture;
pub mod locator;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pacing;
pub mod resolver;
pub mod session;

pub use bounds::Bounds;
pub use locator::{Locator, LocatorSpec, Strategy};
pub use session::{ElementId, MobileSession, WindowSize};
