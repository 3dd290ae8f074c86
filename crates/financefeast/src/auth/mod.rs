/*
[INPUT]:  Credential options, environment, login responses
[OUTPUT]: Resolved credentials, cached bearer tokens, login/validate flow
[POS]:    Auth layer - handles Financefeast API authentication
[UPDATE]: When auth flow or credential sources change
*/

pub mod credentials;
pub mod manager;
pub mod token;

pub use credentials::{
    CLIENT_ID_ENV, CLIENT_SECRET_ENV, ClientCredentials, Credentials, ResolvedCredentials,
};
pub use token::{TokenData, TokenSource, TokenStore};
