use bytes::Bytes;

use crate::body::Contents;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Incoming request as seen by pipeline hooks. Only headers are inspected.
pub type Request = http::Request<Bytes>;

/// Outgoing response whose body is a one-shot [`Contents`] producer.
pub type Response = http::Response<Contents>;

/// Hook run after the handler produced a response and before it is serialized.
pub type AfterHook =
    std::sync::Arc<dyn Fn(&Request, &mut Response) -> Result<(), BoxError> + Send + Sync>;
