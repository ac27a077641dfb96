//! # Event Proxy Test Suite
//!
//! Cross-crate scenarios exercising the proxy against bus clients.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Observing bus client, event builders
//! └── integration/
//!     ├── ordering.rs   # FIFO delivery, drain on stop
//!     └── filtering.rs  # Filter engine with catalog events
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ep-tests
//! cargo test -p ep-tests integration::ordering::
//! ```

pub mod fixtures;
pub mod integration;
