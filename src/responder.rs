//! Conversions from handler return values into [`Response`] values.
//!
//! Handlers registered with [`Pipelines::dispatch`](crate::pipeline::Pipelines::dispatch)
//! may return any `Responder`: strings, byte buffers, bare status codes, a status paired
//! with a body, or a fully built response.
//!
//! # Examples
//!
//! ```rust
//! use tako_gzip::responder::Responder;
//! use http::StatusCode;
//!
//! let ok = "Hello, World!".into_response();
//! let empty = StatusCode::NO_CONTENT.into_response();
//! let teapot = (StatusCode::IM_A_TEAPOT, "short and stout").into_response();
//! ```

use std::{convert::Infallible, fmt::Display};

use bytes::Bytes;
use http::StatusCode;

use crate::{body::Contents, types::Response};

/// Trait for converting types into HTTP responses.
pub trait Responder {
    /// Converts the implementing type into an HTTP response.
    fn into_response(self) -> Response;
}

impl Responder for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl Responder for Contents {
    fn into_response(self) -> Response {
        Response::new(self)
    }
}

impl Responder for &'static str {
    fn into_response(self) -> Response {
        Response::new(Contents::from(self))
    }
}

impl Responder for String {
    fn into_response(self) -> Response {
        Response::new(Contents::from(self))
    }
}

impl Responder for Bytes {
    fn into_response(self) -> Response {
        Response::new(Contents::from(self))
    }
}

impl Responder for Vec<u8> {
    fn into_response(self) -> Response {
        Response::new(Contents::from(self))
    }
}

impl Responder for () {
    fn into_response(self) -> Response {
        Response::new(Contents::empty())
    }
}

impl Responder for Infallible {
    fn into_response(self) -> Response {
        match self {}
    }
}

impl Responder for StatusCode {
    fn into_response(self) -> Response {
        let mut res = Response::new(Contents::empty());
        *res.status_mut() = self;
        res
    }
}

impl<R> Responder for (StatusCode, R)
where
    R: Display,
{
    fn into_response(self) -> Response {
        let (status, body) = self;
        let mut res = Response::new(Contents::from(body.to_string()));
        *res.status_mut() = status;
        res
    }
}
