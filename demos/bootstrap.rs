use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use http::{
    HeaderValue, StatusCode,
    header::{ACCEPT_ENCODING, CONTENT_TYPE},
};
use tako_gzip::{
    Pipelines,
    log::TracingLog,
    plugins::compression::{CompressionBuilder, Config},
    responder::Responder,
    types::{Request, Response},
};

fn report(_: &Request) -> Response {
    let rows: String = (0..500)
        .map(|i| format!("{{\"id\":{i},\"name\":\"row {i}\"}},"))
        .collect();
    let mut res = format!("[{}]", rows.trim_end_matches(',')).into_response();
    res.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    res
}

fn main() -> Result<()> {
    #[cfg(feature = "init-tracing")]
    tako_gzip::tracing::init_tracing();

    let defaults = Config::from_env()?;
    let mut pipelines = Pipelines::new();
    pipelines.plugin(
        CompressionBuilder::new()
            .min_bytes(defaults.min_bytes)
            .mime_types(defaults.mime_types)
            .level(defaults.level)
            .logger(Arc::new(TracingLog))
            .build(),
    )?;

    let mut req = Request::new(Bytes::new());
    req.headers_mut()
        .insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, br"));

    for handler in [report as fn(&Request) -> Response, |_: &Request| {
        StatusCode::NO_CONTENT.into_response()
    }] {
        let res = pipelines
            .dispatch(&req, &handler)
            .map_err(|e| anyhow::anyhow!(e))?;
        let (parts, body) = res.into_parts();
        let body = body.into_bytes()?;
        println!("{} {:?} ({} bytes on the wire)", parts.status, parts.headers, body.len());
    }

    Ok(())
}
