//! The host pipeline: an ordered list of after-request hooks.
//!
//! Hooks see the request and the response the handler produced, and may rewrite the
//! response in place before the transport serializes it. Routing is out of scope; the
//! caller supplies the handler for each dispatch.

use std::sync::Arc;

use anyhow::Result;

use crate::{
    handler::Handler,
    plugins::TakoPlugin,
    types::{AfterHook, BoxError, Request, Response},
};

#[derive(Default)]
pub struct Pipelines {
    after: Vec<AfterHook>,
}

impl Pipelines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook run after every handler, in registration order.
    pub fn after_request<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(f));
        self
    }

    /// Installs a plugin by letting it register its hooks.
    pub fn plugin<P>(&mut self, plugin: P) -> Result<&mut Self>
    where
        P: TakoPlugin,
    {
        plugin.setup(self)?;
        tracing::debug!(plugin = plugin.name(), "plugin registered");
        Ok(self)
    }

    pub fn hooks(&self) -> usize {
        self.after.len()
    }

    /// Runs `handler` for `req`, then every after hook against the produced response.
    ///
    /// The first failing hook aborts the chain and its error is returned.
    pub fn dispatch<H>(&self, req: &Request, handler: &H) -> Result<Response, BoxError>
    where
        H: Handler,
    {
        let mut res = handler.call(req);
        self.run_after(req, &mut res)?;
        Ok(res)
    }

    pub fn run_after(&self, req: &Request, res: &mut Response) -> Result<(), BoxError> {
        for hook in &self.after {
            hook(req, res)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::{HeaderValue, StatusCode};

    use super::*;

    fn get() -> Request {
        Request::new(Bytes::new())
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let mut pipelines = Pipelines::new();
        pipelines
            .after_request(|_, res| {
                res.headers_mut()
                    .insert("x-order", HeaderValue::from_static("first"));
                Ok(())
            })
            .after_request(|_, res| {
                res.headers_mut()
                    .append("x-order", HeaderValue::from_static("second"));
                Ok(())
            });

        let res = pipelines.dispatch(&get(), &|_: &Request| "ok").unwrap();
        let order: Vec<_> = res
            .headers()
            .get_all("x-order")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(order, ["first", "second"]);
    }

    #[test]
    fn failing_hook_stops_the_chain() {
        let mut pipelines = Pipelines::new();
        pipelines
            .after_request(|_, _| Err("broken".into()))
            .after_request(|_, res| {
                *res.status_mut() = StatusCode::IM_A_TEAPOT;
                Ok(())
            });

        let err = pipelines
            .dispatch(&get(), &|_: &Request| "ok")
            .unwrap_err();
        assert_eq!(err.to_string(), "broken");
    }

    #[test]
    fn dispatch_without_hooks_returns_handler_output() {
        let pipelines = Pipelines::new();
        let res = pipelines
            .dispatch(&get(), &|_: &Request| StatusCode::ACCEPTED)
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(pipelines.hooks(), 0);
    }
}
