use std::io::{self, Read};

use bytes::Bytes;
use flate2::read::{DeflateDecoder, GzDecoder};
use http::{
    HeaderValue, StatusCode,
    header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE},
};
use tako_gzip::{
    CompressionError, Pipelines,
    body::Contents,
    enable_compression,
    plugins::compression::CompressionBuilder,
    responder::Responder,
    types::{Request, Response},
};

const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVXYZ,";

fn alphabet_json() -> Vec<u8> {
    ALPHABET.bytes().cycle().take(26_000).collect()
}

fn app() -> Pipelines {
    let mut pipelines = Pipelines::new();
    enable_compression(&mut pipelines, None).unwrap();
    pipelines
}

fn get(accept: Option<&'static str>) -> Request {
    let mut req = Request::new(Bytes::new());
    if let Some(accept) = accept {
        req.headers_mut()
            .insert(ACCEPT_ENCODING, HeaderValue::from_static(accept));
    }
    req
}

fn ok_json(_: &Request) -> Response {
    let mut res = alphabet_json().into_response();
    res.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    res
}

fn small(_: &Request) -> Response {
    let mut res = ().into_response();
    res.headers_mut()
        .insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    res
}

fn not_valid_content_type(_: &Request) -> Response {
    let mut res = alphabet_json().into_response();
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/x-not-valid"));
    res
}

fn no_content(_: &Request) -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn body_of(res: Response) -> Vec<u8> {
    res.into_body().into_bytes().unwrap().to_vec()
}

#[test]
fn should_return_content_encoding_when_accept() {
    let res = app().dispatch(&get(Some("gzip")), &ok_json).unwrap();

    assert_eq!(res.headers()[CONTENT_ENCODING], "gzip");
    let length: usize = res.headers()[CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(length < 26_000);

    let body = body_of(res);
    assert_eq!(body.len(), length);
    let mut plain = Vec::new();
    GzDecoder::new(&body[..]).read_to_end(&mut plain).unwrap();
    assert_eq!(plain, alphabet_json());
}

#[test]
fn should_prefer_deflate_when_both_offered() {
    let res = app()
        .dispatch(&get(Some("gzip, deflate")), &ok_json)
        .unwrap();
    assert_eq!(res.headers()[CONTENT_ENCODING], "deflate");

    let body = body_of(res);
    let mut plain = Vec::new();
    DeflateDecoder::new(&body[..])
        .read_to_end(&mut plain)
        .unwrap();
    assert_eq!(plain, alphabet_json());
}

#[test]
fn should_return_no_content_encoding_when_too_small() {
    let res = app().dispatch(&get(Some("gzip")), &small).unwrap();
    assert!(!res.headers().contains_key(CONTENT_ENCODING));
    assert_eq!(res.headers()[CONTENT_LENGTH], "0");
    assert!(body_of(res).is_empty());
}

#[test]
fn should_return_no_content_encoding_when_not_valid_content_type() {
    let res = app()
        .dispatch(&get(Some("gzip")), &not_valid_content_type)
        .unwrap();
    assert!(!res.headers().contains_key(CONTENT_ENCODING));
    assert_eq!(body_of(res), alphabet_json());
}

#[test]
fn should_return_no_content_encoding_when_not_valid_accept() {
    for accept in [None, Some("br"), Some("identity")] {
        let res = app().dispatch(&get(accept), &ok_json).unwrap();
        assert!(!res.headers().contains_key(CONTENT_ENCODING));
        assert_eq!(body_of(res), alphabet_json());
    }
}

#[test]
fn should_return_no_content_encoding_when_not_valid_return_status_code() {
    let res = app().dispatch(&get(Some("gzip")), &no_content).unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(!res.headers().contains_key(CONTENT_ENCODING));
}

#[test]
fn non_ok_responses_pass_through_untouched() {
    let handler = |_: &Request| {
        let mut res = ok_json(&get(None));
        *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        res
    };
    let res = app().dispatch(&get(Some("gzip")), &handler).unwrap();
    assert_eq!(res.headers().len(), 1);
    assert_eq!(body_of(res), alphabet_json());
}

#[test]
fn already_encoded_responses_are_not_recompressed() {
    let handler = |_: &Request| {
        let mut res = ok_json(&get(None));
        res.headers_mut()
            .insert(CONTENT_ENCODING, HeaderValue::from_static("identity"));
        res
    };
    let res = app().dispatch(&get(Some("gzip")), &handler).unwrap();
    assert_eq!(res.headers()[CONTENT_ENCODING], "identity");
    assert_eq!(body_of(res), alphabet_json());
}

#[test]
fn compression_runs_once_even_when_registered_twice() {
    let mut pipelines = app();
    enable_compression(&mut pipelines, None).unwrap();
    let res = pipelines.dispatch(&get(Some("gzip")), &ok_json).unwrap();
    assert_eq!(res.headers().get_all(CONTENT_ENCODING).iter().count(), 1);

    let body = body_of(res);
    let mut plain = Vec::new();
    GzDecoder::new(&body[..]).read_to_end(&mut plain).unwrap();
    assert_eq!(plain, alphabet_json());
}

#[test]
fn malformed_content_length_surfaces_as_invalid_state() {
    let handler = |_: &Request| {
        let mut res = ok_json(&get(None));
        res.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("twelve"));
        res
    };
    let err = app().dispatch(&get(Some("gzip")), &handler).unwrap_err();
    let err = err.downcast::<CompressionError>().unwrap();
    assert!(matches!(*err, CompressionError::InvalidResponseState(_)));
}

#[test]
fn producer_faults_reach_the_caller() {
    let handler = |_: &Request| {
        let mut res = Response::new(Contents::from_fn(|_| {
            Err(io::Error::new(io::ErrorKind::TimedOut, "backend timed out"))
        }));
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        res
    };
    let err = app().dispatch(&get(Some("gzip")), &handler).unwrap_err();
    let err = err.downcast::<CompressionError>().unwrap();
    match *err {
        CompressionError::Body(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn custom_configuration_is_honoured() {
    let mut pipelines = Pipelines::new();
    pipelines
        .plugin(
            CompressionBuilder::new()
                .min_bytes(10)
                .mime_types(["text/csv"])
                .build(),
        )
        .unwrap();

    let handler = |_: &Request| {
        let mut res = "a,b,c\n1,2,3\n4,5,6\n".into_response();
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        res
    };
    let res = pipelines.dispatch(&get(Some("gzip")), &handler).unwrap();
    assert_eq!(res.headers()[CONTENT_ENCODING], "gzip");

    let res = pipelines.dispatch(&get(Some("gzip")), &ok_json).unwrap();
    assert!(!res.headers().contains_key(CONTENT_ENCODING));
}
