pub mod account;
pub mod otp_request;

pub use account::{Account, InsertAccount};
pub use otp_request::{NewOtpRequest, OtpRequest};
