use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use super::chain::AdviceHandler;
use super::error::InvocationError;
use super::ids::ObjectId;
use super::interceptor::{AdviceHandlers, InterceptionTable, MethodDispatch, MethodInterceptor};
use super::objects::{MethodBody, MissingBody, NoOp, ObjectRegistry, VoidImplementation};
use super::{ArgVec, InvocationResult};
use crate::aspect::{Advice, AdviceKind};
use crate::error::{AopError, Result};
use crate::weaver::{
    is_lifecycle_method, ClassInterception, MethodOrigin, MethodPlan, ProxySpec, WeaverContext,
    CONSTRUCTOR,
};

/// Instance of a target class as handed out by the [`ProxyFactory`]
///
/// Method calls go through the class's [`InterceptionTable`]: advised methods run their advice,
/// everything else calls the original body directly. Objects of classes that are not woven
/// behave exactly like the original class.
pub struct ProxyObject {
    id: ObjectId,
    table: Arc<InterceptionTable>,
}

impl ProxyObject {
    fn new(table: Arc<InterceptionTable>) -> Self {
        ProxyObject {
            id: ObjectId::new(),
            table,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Name of the original class
    pub fn class_name(&self) -> &str {
        self.table.class_name()
    }

    /// Name of the proxy class, `None` if the class is not woven
    pub fn proxy_class(&self) -> Option<&str> {
        self.table.proxy_class()
    }

    pub fn is_woven(&self) -> bool {
        self.table.proxy_class().is_some()
    }

    /// Whether the object implements an interface introduced by an aspect
    pub fn has_introduced(&self, interface: &str) -> bool {
        self.table
            .introduced_interfaces()
            .iter()
            .any(|i| i == interface)
    }

    pub fn table(&self) -> &Arc<InterceptionTable> {
        &self.table
    }

    /// Call a method
    ///
    /// # Errors
    ///
    /// The error raised by the body or advice, or `UndefinedMethod` for unknown methods.
    pub fn call(&self, method: &str, arguments: ArgVec) -> InvocationResult {
        self.table.dispatch(self, method, arguments)
    }
}

impl std::fmt::Debug for ProxyObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyObject")
            .field("id", &self.id)
            .field("class_name", &self.class_name())
            .field("proxy_class", &self.proxy_class())
            .finish()
    }
}

struct TableSet {
    context: Arc<WeaverContext>,
    tables: BTreeMap<String, Arc<InterceptionTable>>,
}

/// Creates proxy objects from a weave
///
/// All advice handlers and introduced implementations are resolved when the factory is built
/// or reloaded; a missing one fails the build instead of the first call. The current tables
/// are swapped atomically on [`reload`](ProxyFactory::reload), objects created earlier keep
/// the tables they were created with.
pub struct ProxyFactory {
    objects: Arc<ObjectRegistry>,
    current: ArcSwap<TableSet>,
}

impl ProxyFactory {
    /// # Errors
    ///
    /// [`AopError::Configuration`] if an advice handler or introduced default implementation is
    /// not registered.
    pub fn new(context: Arc<WeaverContext>, objects: Arc<ObjectRegistry>) -> Result<Self> {
        let set = build_tables(context, &objects)?;
        Ok(ProxyFactory {
            objects,
            current: ArcSwap::from_pointee(set),
        })
    }

    /// Switch to the tables of a new weave
    pub fn reload(&self, context: Arc<WeaverContext>) -> Result<()> {
        let set = build_tables(context, &self.objects)?;
        let generation = set.context.generation();
        self.current.store(Arc::new(set));
        info!(generation, "Proxy factory reloaded");
        Ok(())
    }

    /// Context of the tables currently in use
    pub fn context(&self) -> Arc<WeaverContext> {
        Arc::clone(&self.current.load().context)
    }

    pub fn table(&self, class_name: &str) -> Option<Arc<InterceptionTable>> {
        self.current.load().tables.get(class_name).map(Arc::clone)
    }

    /// Create an object of `class_name`, running its (possibly advised) constructor
    ///
    /// # Errors
    ///
    /// `UnknownClass` for classes that are not weave targets, or the constructor's error.
    pub fn instantiate(
        &self,
        class_name: &str,
        arguments: ArgVec,
    ) -> InvocationResult<ProxyObject> {
        let table = self.table(class_name).ok_or_else(|| {
            InvocationError::new(
                "UnknownClass",
                format!("class {} is not known to the weaver", class_name),
            )
        })?;
        let object = ProxyObject::new(table);
        object.call(CONSTRUCTOR, arguments)?;
        Ok(object)
    }
}

impl std::fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = self.current.load();
        f.debug_struct("ProxyFactory")
            .field("generation", &set.context.generation())
            .field("tables", &set.tables.len())
            .finish()
    }
}

fn build_tables(context: Arc<WeaverContext>, objects: &ObjectRegistry) -> Result<TableSet> {
    let mut tables = BTreeMap::new();
    for interception in context.interceptions() {
        let spec = context.proxy_for(&interception.class_name);
        let table = build_table(&context, interception, spec, objects)?;
        tables.insert(interception.class_name.clone(), Arc::new(table));
    }
    debug!(
        generation = context.generation(),
        tables = tables.len(),
        "Interception tables built"
    );
    Ok(TableSet { context, tables })
}

fn build_table(
    context: &WeaverContext,
    interception: &ClassInterception,
    spec: Option<&ProxySpec>,
    objects: &ObjectRegistry,
) -> Result<InterceptionTable> {
    let class_name = &interception.class_name;
    let mut methods = HashMap::new();

    for (name, method) in &interception.methods {
        let body: Arc<dyn MethodBody> = match &method.origin {
            MethodOrigin::Introduced {
                interface,
                aspect_class,
                has_default,
            } => {
                if *has_default {
                    objects.introduction(aspect_class, name).ok_or_else(|| {
                        AopError::configuration(format!(
                            "no default implementation registered for method \"{}\" introduced by aspect \"{}\"",
                            name, aspect_class
                        ))
                    })?
                } else {
                    Arc::new(VoidImplementation {
                        interface: interface.clone(),
                        method: name.clone(),
                    })
                }
            }
            MethodOrigin::Synthetic => objects
                .body(class_name, name)
                .unwrap_or_else(|| Arc::new(NoOp)),
            MethodOrigin::Declared if is_lifecycle_method(name) => objects
                .body(class_name, name)
                .or_else(|| objects.body(&method.declaring_class, name))
                .unwrap_or_else(|| Arc::new(NoOp)),
            MethodOrigin::Declared => {
                resolve_body(objects, class_name, &method.declaring_class, name)
            }
        };

        let plan = spec.and_then(|s| s.method(name)).map(|m| &m.plan);
        let dispatch = match plan {
            Some(MethodPlan::Advised) | Some(MethodPlan::Introduced { .. }) => {
                MethodDispatch::Intercepted(MethodInterceptor::new(
                    resolve_handlers(objects, &method.grouped_advices)?,
                    body,
                ))
            }
            Some(MethodPlan::Passthrough) | None => MethodDispatch::Passthrough(body),
        };
        methods.insert(name.clone(), dispatch);
    }

    // Final and static methods are never intercepted but stay callable.
    for found in context.classes().methods_of(class_name) {
        if methods.contains_key(&found.method.name) {
            continue;
        }
        let body = resolve_body(objects, class_name, found.declaring_class, &found.method.name);
        methods.insert(found.method.name.clone(), MethodDispatch::Passthrough(body));
    }

    Ok(InterceptionTable::new(
        class_name.clone(),
        spec.map(|s| s.proxy_class.clone()),
        spec.map(|s| {
            s.introduced_interfaces
                .iter()
                .map(|i| i.interface.clone())
                .collect()
        })
        .unwrap_or_default(),
        methods,
    ))
}

fn resolve_body(
    objects: &ObjectRegistry,
    class_name: &str,
    declaring_class: &str,
    method: &str,
) -> Arc<dyn MethodBody> {
    objects
        .body(class_name, method)
        .or_else(|| objects.body(declaring_class, method))
        .unwrap_or_else(|| {
            Arc::new(MissingBody {
                class_name: class_name.to_string(),
                method: method.to_string(),
            })
        })
}

fn resolve_handlers(
    objects: &ObjectRegistry,
    grouped: &BTreeMap<AdviceKind, Vec<Advice>>,
) -> Result<AdviceHandlers> {
    let mut handlers = AdviceHandlers::default();
    for (kind, advices) in grouped {
        let resolved = advices
            .iter()
            .map(|advice| resolve_handler(objects, advice))
            .collect::<Result<Vec<_>>>()?;
        match kind {
            AdviceKind::Before => handlers.before = resolved,
            AdviceKind::Around => handlers.around = resolved,
            AdviceKind::AfterReturning => handlers.after_returning = resolved,
            AdviceKind::AfterThrowing => handlers.after_throwing = resolved,
            AdviceKind::After => handlers.after = resolved,
        }
    }
    Ok(handlers)
}

fn resolve_handler(objects: &ObjectRegistry, advice: &Advice) -> Result<Arc<dyn AdviceHandler>> {
    objects
        .advice_handler(&advice.aspect_class, &advice.method)
        .ok_or_else(|| {
            AopError::configuration(format!(
                "no advice handler registered for {}::{}",
                advice.aspect_class, advice.method
            ))
        })
}
