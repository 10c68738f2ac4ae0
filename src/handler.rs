use crate::{
    responder::Responder,
    types::{Request, Response},
};

pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: &Request) -> Response;
}

impl<F, R> Handler for F
where
    F: Fn(&Request) -> R + Send + Sync + 'static,
    R: Responder,
{
    fn call(&self, req: &Request) -> Response {
        (self)(req).into_response()
    }
}
