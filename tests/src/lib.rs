//! # Division Test Suite
//!
//! Cross-crate flows exercising the runtime together with the example
//! divisions.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── lifecycle_flows.rs    # discovery → setup → start → cleanup
//!     ├── environment_flows.rs  # env files, schemas, coercion
//!     └── cli_flows.rs          # command assembly and dispatch
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p division-tests
//! cargo test -p division-tests integration::lifecycle_flows
//! ```

pub mod integration;
