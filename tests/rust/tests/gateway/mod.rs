//! Gateway integration tests
//!
//! HTTP and RPC adapters in front of a logged database.

mod http;
