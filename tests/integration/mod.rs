//! Integration tests for release-reactor
//!
//! Every test builds a throwaway git repository and runs the compiled binary.

mod helpers;
mod test_next;
mod test_release;
mod test_validation;
