//! Typed ID definitions for the portal's entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for pending OTP verification requests.
pub struct OtpRequestMarker;

/// Marker type for identity-provider accounts. Profiles share the account id.
pub struct AccountMarker;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Opaque capability token returned by `sendOtp` (the `rid`).
pub type OtpRequestId = Id<OtpRequestMarker>;

/// Subject id assigned by the identity provider; also keys the profile record.
pub type AccountId = Id<AccountMarker>;
