pub mod error;
pub mod jwt;
pub mod lifecycle;
pub mod memory;
pub mod password;
pub mod store;
mod types;

pub use error::{CodecError, TokenError};
pub use jwt::{AccessTokenCodec, JwtKeys};
pub use lifecycle::{TokenLifecycle, TokenSettings};
pub use store::{IdentityStore, NewRefreshToken, Redemption, RefreshTokenStore};
pub use types::{
    AccessClaims, AuthSubject, RefreshTokenState, SessionSummary, TokenPair, UserIdentity,
};
