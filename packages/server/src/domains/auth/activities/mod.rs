//! Auth domain activities - business logic functions
//!
//! Activities take already-deserialized input plus `ServerDeps` and return
//! typed results. Route handlers only translate envelopes.

mod send_otp;
mod sign_in;
mod verify_otp;

pub use send_otp::send_otp;
pub use sign_in::sign_in;
pub use verify_otp::verify_otp;
