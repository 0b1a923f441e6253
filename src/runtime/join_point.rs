use std::sync::Arc;

use serde_json::Value;

use super::chain::AdviceChain;
use super::error::InvocationError;
use super::proxy::ProxyObject;
use super::{ArgVec, InvocationResult};

/// Runtime context of one intercepted call
///
/// A join point is created per invocation and handed to every advice of that call. Around
/// advice continue the call with [`JoinPoint::proceed`]; after-returning and after advice see
/// the [`result`](JoinPoint::result), after-throwing and after advice on the failure path see
/// the [`exception`](JoinPoint::exception).
pub struct JoinPoint<'a> {
    proxy: &'a ProxyObject,
    target_class: &'a str,
    method: &'a str,
    arguments: ArgVec,
    chain: Option<AdviceChain<'a>>,
    result: Option<Value>,
    exception: Option<InvocationError>,
}

impl<'a> JoinPoint<'a> {
    pub fn new(
        proxy: &'a ProxyObject,
        target_class: &'a str,
        method: &'a str,
        arguments: ArgVec,
    ) -> Self {
        JoinPoint {
            proxy,
            target_class,
            method,
            arguments,
            chain: None,
            result: None,
            exception: None,
        }
    }

    /// The proxy the call was made on
    pub fn proxy(&self) -> &'a ProxyObject {
        self.proxy
    }

    pub fn target_class(&self) -> &'a str {
        self.target_class
    }

    pub fn method_name(&self) -> &'a str {
        self.method
    }

    pub fn arguments(&self) -> &ArgVec {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Replace an argument, or append it if the call had none of that name
    ///
    /// Changes made by around advice before proceeding are seen by the method body.
    pub fn set_argument(&mut self, name: &str, value: Value) {
        match self.arguments.iter_mut().find(|(n, _)| n.as_ref() == name) {
            Some((_, slot)) => *slot = value,
            None => self.arguments.push((Arc::from(name), value)),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn exception(&self) -> Option<&InvocationError> {
        self.exception.as_ref()
    }

    pub fn has_exception(&self) -> bool {
        self.exception.is_some()
    }

    pub(crate) fn set_result(&mut self, result: Value) {
        self.result = Some(result);
    }

    pub(crate) fn set_exception(&mut self, exception: InvocationError) {
        self.exception = Some(exception);
    }

    pub(crate) fn set_chain(&mut self, chain: Option<AdviceChain<'a>>) {
        self.chain = chain;
    }

    /// Continue the call
    ///
    /// Runs the next around advice, or the method body when none is left. The body runs at most
    /// once per call; proceeding again returns its first outcome.
    ///
    /// # Errors
    ///
    /// Whatever the next advice or the body returns, or an `AdviceChain` error when called
    /// outside of around advice.
    pub fn proceed(&mut self) -> InvocationResult {
        let Some(mut chain) = self.chain.take() else {
            return Err(InvocationError::new(
                "AdviceChain",
                format!(
                    "proceed() called outside of around advice in {}::{}",
                    self.target_class, self.method
                ),
            ));
        };
        match chain.advance() {
            Some(advice) => {
                self.chain = Some(chain);
                advice.invoke(self)
            }
            None => {
                let outcome = chain.invoke_body(self.proxy, &self.arguments);
                self.chain = Some(chain);
                outcome
            }
        }
    }
}
