pub mod cookies;
pub mod driver;
pub mod launcher;
pub mod scripts;
pub mod session;

pub use driver::{
    jitter_ms, wait_for, DriverError, DriverResult, ElementHandle, FieldError, FieldFill,
    FieldKind, FieldOption, FormField, Locator, PageDriver, ScrollTarget, POLL_INTERVAL,
};
pub use session::{BrowserLauncher, BrowserSession, CdpLauncher, Diagnostics, SessionOptions};
