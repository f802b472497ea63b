pub mod cookie;
pub mod jwt;
pub mod password;

pub use jwt::{decode_jwt, encode_access_token, init_jwt_config};
pub use password::{hash_password, verify_password};
