mod client;
mod request;

pub use client::{ApiClient, SessionEvent, REFRESH_TOKEN_PATH};
pub(crate) use client::{parse_token_pair, required_str};
pub use request::ApiRequest;
