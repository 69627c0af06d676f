pub mod verifier;

pub use verifier::DependencyHealthVerifier;
