use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::chain::AdviceHandler;
use super::error::InvocationError;
use super::join_point::JoinPoint;
use super::proxy::ProxyObject;
use super::{ArgVec, InvocationResult};
use crate::error::{AopError, Result};
use crate::pointcut::{FilterResolver, PointcutFilter};

/// Implementation of a method: an original body or an introduced default implementation
pub trait MethodBody: Send + Sync {
    fn call(&self, proxy: &ProxyObject, arguments: &ArgVec) -> InvocationResult;
}

impl<F> MethodBody for F
where
    F: Fn(&ProxyObject, &ArgVec) -> InvocationResult + Send + Sync,
{
    fn call(&self, proxy: &ProxyObject, arguments: &ArgVec) -> InvocationResult {
        self(proxy, arguments)
    }
}

/// Body of synthetic methods without a registered implementation
pub(crate) struct NoOp;

impl MethodBody for NoOp {
    fn call(&self, _proxy: &ProxyObject, _arguments: &ArgVec) -> InvocationResult {
        Ok(Value::Null)
    }
}

/// Body of a declared method nobody registered an implementation for
pub(crate) struct MissingBody {
    pub class_name: String,
    pub method: String,
}

impl MethodBody for MissingBody {
    fn call(&self, _proxy: &ProxyObject, _arguments: &ArgVec) -> InvocationResult {
        Err(InvocationError::new(
            "MissingImplementation",
            format!(
                "no implementation registered for {}::{}",
                self.class_name, self.method
            ),
        ))
    }
}

/// Body of an introduced method that only around advice implements
pub(crate) struct VoidImplementation {
    pub interface: String,
    pub method: String,
}

impl MethodBody for VoidImplementation {
    fn call(&self, _proxy: &ProxyObject, _arguments: &ArgVec) -> InvocationResult {
        Err(InvocationError::new(
            "VoidImplementation",
            format!(
                "introduced method {}::{} has no implementation to proceed to",
                self.interface, self.method
            ),
        ))
    }
}

enum RegisteredObject {
    Filter(Arc<dyn PointcutFilter>),
    Other(Arc<dyn Any + Send + Sync>),
}

type MethodKey = (String, String);

/// Boundary to the objects the weaver does not create itself
///
/// Holds custom pointcut filters and other named objects, advice handlers keyed by
/// `(aspect class, method)`, default implementations of introduced methods keyed by
/// `(aspect class, method)` and original method bodies keyed by `(class, method)`.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: HashMap<String, RegisteredObject>,
    advice: HashMap<MethodKey, Arc<dyn AdviceHandler>>,
    introductions: HashMap<MethodKey, Arc<dyn MethodBody>>,
    bodies: HashMap<MethodKey, Arc<dyn MethodBody>>,
}

fn key(class: &str, method: &str) -> MethodKey {
    (class.to_string(), method.to_string())
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom filter for `filter(name)`
    pub fn register_filter<F>(&mut self, name: &str, filter: F) -> &mut Self
    where
        F: PointcutFilter + 'static,
    {
        self.objects
            .insert(name.to_string(), RegisteredObject::Filter(Arc::new(filter)));
        self
    }

    /// Register an arbitrary named object
    pub fn register_object(&mut self, name: &str, object: Arc<dyn Any + Send + Sync>) -> &mut Self {
        self.objects
            .insert(name.to_string(), RegisteredObject::Other(object));
        self
    }

    pub fn object(&self, name: &str) -> Option<&Arc<dyn Any + Send + Sync>> {
        match self.objects.get(name) {
            Some(RegisteredObject::Other(object)) => Some(object),
            _ => None,
        }
    }

    /// Register the handler of the advice declared by `aspect_class::method`
    pub fn register_advice<F>(&mut self, aspect_class: &str, method: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut JoinPoint<'_>) -> InvocationResult + Send + Sync + 'static,
    {
        self.advice.insert(key(aspect_class, method), Arc::new(handler));
        self
    }

    pub fn register_advice_handler(
        &mut self,
        aspect_class: &str,
        method: &str,
        handler: Arc<dyn AdviceHandler>,
    ) -> &mut Self {
        self.advice.insert(key(aspect_class, method), handler);
        self
    }

    /// Register the default implementation of an introduced method
    pub fn register_introduction<F>(
        &mut self,
        aspect_class: &str,
        method: &str,
        body: F,
    ) -> &mut Self
    where
        F: Fn(&ProxyObject, &ArgVec) -> InvocationResult + Send + Sync + 'static,
    {
        self.introductions
            .insert(key(aspect_class, method), Arc::new(body));
        self
    }

    /// Register the original body of `class::method`
    pub fn register_body<F>(&mut self, class: &str, method: &str, body: F) -> &mut Self
    where
        F: Fn(&ProxyObject, &ArgVec) -> InvocationResult + Send + Sync + 'static,
    {
        self.bodies.insert(key(class, method), Arc::new(body));
        self
    }

    pub fn advice_handler(
        &self,
        aspect_class: &str,
        method: &str,
    ) -> Option<Arc<dyn AdviceHandler>> {
        self.advice.get(&key(aspect_class, method)).map(Arc::clone)
    }

    pub fn introduction(&self, aspect_class: &str, method: &str) -> Option<Arc<dyn MethodBody>> {
        self.introductions
            .get(&key(aspect_class, method))
            .map(Arc::clone)
    }

    pub fn body(&self, class: &str, method: &str) -> Option<Arc<dyn MethodBody>> {
        self.bodies.get(&key(class, method)).map(Arc::clone)
    }
}

impl FilterResolver for ObjectRegistry {
    fn resolve_filter(&self, name: &str) -> Result<Arc<dyn PointcutFilter>> {
        match self.objects.get(name) {
            Some(RegisteredObject::Filter(filter)) => Ok(Arc::clone(filter)),
            Some(RegisteredObject::Other(_)) => Err(AopError::configuration(format!(
                "object \"{}\" used in filter() is not a pointcut filter",
                name
            ))),
            None => Err(AopError::configuration(format!(
                "no object \"{}\" registered for filter()",
                name
            ))),
        }
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("objects", &self.objects.len())
            .field("advice", &self.advice.len())
            .field("introductions", &self.introductions.len())
            .field("bodies", &self.bodies.len())
            .finish()
    }
}
