//! Service-specific tests
//!
//! Each service has its own test file. Tests that spawn processes rely on
//! standard unix utilities (`echo`, `false`, `sh`).


// Common test utilities for services
pub mod common {
    use shared::ContentHash;

    /// Hash of the small artifact in the built-in plan
    pub fn test_hash() -> ContentHash {
        ContentHash::new("Qmay7eKcsxZ5UkraAucEGtTsv6LzA5hn3P8JnQQcWaVwcN").expect("Valid test hash")
    }
}
