//! Logging engine, configuration, and capture shim tests

mod capture;
