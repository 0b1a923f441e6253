use super::intercepted::{ClassInterception, GroupedAdvices, IntroducedInterface, MethodOrigin};
use crate::aspect::{Advice, AdviceKind};

/// How a proxy implements one method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodPlan {
    /// No advice: delegate straight to the original body
    Passthrough,
    /// Dispatch through the interceptor
    Advised,
    /// Method of an introduced interface; implemented by the introducing aspect's default
    /// implementation unless an around advice implements it
    Introduced {
        interface: String,
        aspect_class: String,
        has_default: bool,
    },
}

/// One method of a proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub declaring_class: String,
    pub plan: MethodPlan,
    pub grouped_advices: GroupedAdvices,
}

impl MethodSpec {
    pub fn advices(&self, kind: AdviceKind) -> &[Advice] {
        self.grouped_advices
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Blueprint of the proxy generated for one woven class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySpec {
    pub target_class: String,
    pub proxy_class: String,
    pub introduced_interfaces: Vec<IntroducedInterface>,
    pub methods: Vec<MethodSpec>,
}

impl ProxySpec {
    /// Plan the proxy of an intercepted class
    ///
    /// Every method of the intercepted map gets a plan, advised or not, so later aspects can
    /// attach without touching unrelated methods.
    pub fn plan(interception: &ClassInterception, proxy_class: String) -> Self {
        let methods = interception
            .methods
            .iter()
            .map(|(name, method)| {
                let plan = match &method.origin {
                    MethodOrigin::Introduced {
                        interface,
                        aspect_class,
                        has_default,
                    } => MethodPlan::Introduced {
                        interface: interface.clone(),
                        aspect_class: aspect_class.clone(),
                        has_default: *has_default,
                    },
                    _ if method.has_advice() => MethodPlan::Advised,
                    _ => MethodPlan::Passthrough,
                };
                MethodSpec {
                    name: name.clone(),
                    declaring_class: method.declaring_class.clone(),
                    plan,
                    grouped_advices: method.grouped_advices.clone(),
                }
            })
            .collect();

        ProxySpec {
            target_class: interception.class_name.clone(),
            proxy_class,
            introduced_interfaces: interception.introduced_interfaces.clone(),
            methods,
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Methods dispatched through the interceptor
    pub fn advised_methods(&self) -> impl Iterator<Item = &MethodSpec> {
        self.methods
            .iter()
            .filter(|m| !matches!(m.plan, MethodPlan::Passthrough))
    }
}
