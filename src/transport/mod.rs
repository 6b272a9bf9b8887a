//! HTTP transport layer for the Gemini API.

pub mod endpoints;
mod error;
mod http;
mod request;
mod reqwest;
mod response;

pub use error::TransportError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use self::reqwest::ReqwestTransport;
pub use request::RequestBuilder;
pub use response::ResponseParser;
