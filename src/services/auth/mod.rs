pub mod access_jwt;

pub use access_jwt::{
    AccessJwtError, AccessTokenPolicy, Claims, JwtValidator, TokenError, TokenValidator,
    VerificationKey,
};
