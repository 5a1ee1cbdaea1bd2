//! Tower integration of the unary interceptor.

use std::fmt;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use opscope_core::{CallContext, SharedLogger};
use serde::Serialize;
use tower::{Layer, Service};

use super::{RpcLoggerConfig, UnaryInterceptor, UnaryServerInfo};

/// A unary call as seen by tower services.
#[derive(Debug, Clone)]
pub struct RpcRequest<Req> {
    pub context: CallContext,
    pub info: UnaryServerInfo,
    pub payload: Req,
}

impl<Req> RpcRequest<Req> {
    pub fn new(context: CallContext, full_method: impl Into<String>, payload: Req) -> Self {
        Self {
            context,
            info: UnaryServerInfo::new(full_method),
            payload,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RpcLoggingLayer {
    interceptor: UnaryInterceptor,
}

impl RpcLoggingLayer {
    pub fn new(logger: SharedLogger, config: RpcLoggerConfig) -> Self {
        Self {
            interceptor: UnaryInterceptor::new(logger, config),
        }
    }
}

impl From<UnaryInterceptor> for RpcLoggingLayer {
    fn from(interceptor: UnaryInterceptor) -> Self {
        Self { interceptor }
    }
}

impl<S> Layer<S> for RpcLoggingLayer {
    type Service = RpcLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        tracing::debug!(config = ?self.interceptor.config(), "Installing RPC logging layer");
        RpcLogging {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RpcLogging<S> {
    inner: S,
    interceptor: UnaryInterceptor,
}

impl<S, Req> Service<RpcRequest<Req>> for RpcLogging<S>
where
    S: Service<RpcRequest<Req>> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Serialize + Send,
    S::Error: fmt::Display + Send,
    Req: Serialize + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: RpcRequest<Req>) -> Self::Future {
        // The readied service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let interceptor = self.interceptor.clone();

        Box::pin(async move {
            let RpcRequest {
                context,
                info,
                payload,
            } = request;
            let method = info.clone();
            interceptor
                .intercept(context, payload, &method, move |context, payload| {
                    inner.call(RpcRequest {
                        context,
                        info,
                        payload,
                    })
                })
                .await
        })
    }
}

impl<S> fmt::Debug for RpcLogging<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcLogging")
            .field("interceptor", &self.interceptor)
            .finish_non_exhaustive()
    }
}
