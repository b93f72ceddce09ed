pub mod authz;
pub mod credentials;
pub mod tokens;
