use std::collections::HashMap;
use std::sync::Arc;

use super::chain::{AdviceChain, AdviceHandler};
use super::error::InvocationError;
use super::join_point::JoinPoint;
use super::objects::MethodBody;
use super::proxy::ProxyObject;
use super::{ArgVec, InvocationResult};

/// Resolved advice of one method, in execution order per kind
#[derive(Clone, Default)]
pub(crate) struct AdviceHandlers {
    pub before: Vec<Arc<dyn AdviceHandler>>,
    pub around: Vec<Arc<dyn AdviceHandler>>,
    pub after_returning: Vec<Arc<dyn AdviceHandler>>,
    pub after_throwing: Vec<Arc<dyn AdviceHandler>>,
    pub after: Vec<Arc<dyn AdviceHandler>>,
}

/// Dispatch code of one advised method
///
/// Runs before advice, the around chain (or the body), then after-returning and after advice.
/// Any failure switches to after-throwing advice, then after advice if they have not run yet,
/// and finally returns the original error. An error raised by after-throwing or after advice
/// replaces it.
pub(crate) struct MethodInterceptor {
    handlers: AdviceHandlers,
    body: Arc<dyn MethodBody>,
}

impl MethodInterceptor {
    pub fn new(handlers: AdviceHandlers, body: Arc<dyn MethodBody>) -> Self {
        MethodInterceptor { handlers, body }
    }

    pub fn invoke(
        &self,
        proxy: &ProxyObject,
        target_class: &str,
        method: &str,
        arguments: ArgVec,
    ) -> InvocationResult {
        let mut join_point = JoinPoint::new(proxy, target_class, method, arguments);
        let mut after_invoked = false;

        match self.run(&mut join_point, &mut after_invoked) {
            Ok(result) => Ok(result),
            Err(error) => {
                join_point.set_exception(error.clone());
                for advice in &self.handlers.after_throwing {
                    advice.invoke(&mut join_point)?;
                }
                if !after_invoked {
                    for advice in &self.handlers.after {
                        advice.invoke(&mut join_point)?;
                    }
                }
                Err(error)
            }
        }
    }

    fn run<'a>(
        &'a self,
        join_point: &mut JoinPoint<'a>,
        after_invoked: &mut bool,
    ) -> InvocationResult {
        for advice in &self.handlers.before {
            advice.invoke(join_point)?;
        }

        let result = if self.handlers.around.is_empty() {
            self.body.call(join_point.proxy(), join_point.arguments())?
        } else {
            join_point.set_chain(Some(AdviceChain::new(&self.handlers.around, &*self.body)));
            let outcome = join_point.proceed();
            join_point.set_chain(None);
            outcome?
        };
        join_point.set_result(result.clone());

        for advice in &self.handlers.after_returning {
            advice.invoke(join_point)?;
        }
        *after_invoked = true;
        for advice in &self.handlers.after {
            advice.invoke(join_point)?;
        }
        Ok(result)
    }
}

pub(crate) enum MethodDispatch {
    Passthrough(Arc<dyn MethodBody>),
    Intercepted(MethodInterceptor),
}

/// Static dispatch table of one class
///
/// Built once per weave by the proxy factory; every proxy object of the class shares it.
pub struct InterceptionTable {
    class_name: String,
    proxy_class: Option<String>,
    introduced_interfaces: Vec<String>,
    methods: HashMap<String, MethodDispatch>,
}

impl InterceptionTable {
    pub(crate) fn new(
        class_name: String,
        proxy_class: Option<String>,
        introduced_interfaces: Vec<String>,
        methods: HashMap<String, MethodDispatch>,
    ) -> Self {
        InterceptionTable {
            class_name,
            proxy_class,
            introduced_interfaces,
            methods,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Proxy class name, `None` for classes that are not woven
    pub fn proxy_class(&self) -> Option<&str> {
        self.proxy_class.as_deref()
    }

    pub fn introduced_interfaces(&self) -> &[String] {
        &self.introduced_interfaces
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Whether calls to `method` go through advice
    pub fn is_intercepted(&self, method: &str) -> bool {
        matches!(self.methods.get(method), Some(MethodDispatch::Intercepted(_)))
    }

    pub(crate) fn dispatch(
        &self,
        proxy: &ProxyObject,
        method: &str,
        arguments: ArgVec,
    ) -> InvocationResult {
        match self.methods.get(method) {
            Some(MethodDispatch::Passthrough(body)) => body.call(proxy, &arguments),
            Some(MethodDispatch::Intercepted(interceptor)) => {
                interceptor.invoke(proxy, &self.class_name, method, arguments)
            }
            None => Err(InvocationError::undefined_method(&self.class_name, method)),
        }
    }
}

impl std::fmt::Debug for InterceptionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut intercepted: Vec<&str> = self
            .methods
            .iter()
            .filter(|(_, d)| matches!(d, MethodDispatch::Intercepted(_)))
            .map(|(name, _)| name.as_str())
            .collect();
        intercepted.sort_unstable();
        f.debug_struct("InterceptionTable")
            .field("class_name", &self.class_name)
            .field("proxy_class", &self.proxy_class)
            .field("introduced_interfaces", &self.introduced_interfaces)
            .field("intercepted", &intercepted)
            .finish()
    }
}
