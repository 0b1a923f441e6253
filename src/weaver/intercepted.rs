use std::collections::BTreeMap;

use tracing::debug;

use crate::aspect::{Advice, AdviceKind, AspectRegistry};
use crate::error::{AopError, Result};
use crate::pointcut::{ClassNameIndex, MatchContext, Subject};
use crate::reflection::{ClassInfo, ClassRegistry, MethodInfo};
use crate::settings::Settings;

/// Name of the synthetic constructor entry
pub const CONSTRUCTOR: &str = "new";
/// Name of the synthetic post-deserialization hook entry
pub const POST_DESERIALIZE: &str = "post_deserialize";

/// Whether `name` is the constructor or post-deserialization hook
///
/// Every target has both entries, even when the class declares them static or final.
pub fn is_lifecycle_method(name: &str) -> bool {
    name == CONSTRUCTOR || name == POST_DESERIALIZE
}

/// Advice grouped by kind, each group in aspect then declaration order
pub type GroupedAdvices = BTreeMap<AdviceKind, Vec<Advice>>;

/// Interface introduced into a class, with the aspect introducing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroducedInterface {
    pub interface: String,
    pub aspect_class: String,
}

/// Where an intercepted method comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodOrigin {
    /// `new` / `post_deserialize` added for every target
    Synthetic,
    /// Declared by the class or one of its parents
    Declared,
    /// Added by an introduced interface
    Introduced {
        interface: String,
        aspect_class: String,
        has_default: bool,
    },
}

/// One entry of the intercepted methods map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedMethod {
    pub declaring_class: String,
    pub origin: MethodOrigin,
    pub grouped_advices: GroupedAdvices,
}

impl InterceptedMethod {
    fn new(declaring_class: impl Into<String>, origin: MethodOrigin) -> Self {
        InterceptedMethod {
            declaring_class: declaring_class.into(),
            origin,
            grouped_advices: GroupedAdvices::new(),
        }
    }

    /// Advice of one kind, empty if there is none
    pub fn advices(&self, kind: AdviceKind) -> &[Advice] {
        self.grouped_advices
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_advice(&self) -> bool {
        self.grouped_advices.values().any(|group| !group.is_empty())
    }
}

/// Result of matching every advisor and introduction against one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInterception {
    pub class_name: String,
    pub methods: BTreeMap<String, InterceptedMethod>,
    pub introduced_interfaces: Vec<IntroducedInterface>,
}

impl ClassInterception {
    pub fn method(&self, name: &str) -> Option<&InterceptedMethod> {
        self.methods.get(name)
    }

    /// Whether the class needs a proxy at all
    pub fn needs_proxy(&self) -> bool {
        !self.introduced_interfaces.is_empty() || self.methods.values().any(|m| m.has_advice())
    }
}

/// Matches aspects against target classes
///
/// Every single match attempt gets its own call id; candidate sets from class-name reduction are
/// computed once per aspect container.
pub(crate) struct InterceptionBuilder<'a> {
    classes: &'a ClassRegistry,
    settings: &'a Settings,
    aspects: &'a AspectRegistry,
    candidates: Vec<ClassNameIndex>,
    next_call_id: u64,
}

impl<'a> InterceptionBuilder<'a> {
    pub fn new(
        classes: &'a ClassRegistry,
        settings: &'a Settings,
        aspects: &'a AspectRegistry,
        targets: &ClassNameIndex,
    ) -> Result<Self> {
        let mut builder = InterceptionBuilder {
            classes,
            settings,
            aspects,
            candidates: Vec::new(),
            next_call_id: 0,
        };
        for container in aspects.containers() {
            let ctx = builder.context();
            let candidates = container.reduce_target_class_names(&ctx, targets)?;
            debug!(
                aspect = container.class_name(),
                candidates = candidates.len(),
                "Reduced candidate classes"
            );
            builder.candidates.push(candidates);
        }
        Ok(builder)
    }

    fn context(&mut self) -> MatchContext<'a> {
        self.next_call_id += 1;
        MatchContext::new(self.classes, self.settings, self.aspects, self.next_call_id)
    }

    /// Build the intercepted methods map of one target class
    ///
    /// # Errors
    ///
    /// Matching errors (cycles, unknown pointcuts), conflicting introductions and introduced
    /// methods without any implementation.
    pub fn build(&mut self, class: &ClassInfo) -> Result<ClassInterception> {
        let classes = self.classes;
        let aspects = self.aspects;
        let introduced = self.match_introductions(class)?;

        let mut methods = BTreeMap::new();
        let mut infos: BTreeMap<String, MethodInfo> = BTreeMap::new();
        for name in [CONSTRUCTOR, POST_DESERIALIZE] {
            if class.method(name).is_none() {
                methods.insert(
                    name.to_string(),
                    InterceptedMethod::new(&class.name, MethodOrigin::Synthetic),
                );
                infos.insert(name.to_string(), MethodInfo::synthetic(name));
            }
        }
        for found in classes.methods_of(&class.name) {
            let mut info = found.method.clone();
            if is_lifecycle_method(&info.name) {
                info.is_static = false;
                info.is_final = false;
            } else if info.is_static || info.is_final {
                continue;
            }
            methods.insert(
                info.name.clone(),
                InterceptedMethod::new(found.declaring_class, MethodOrigin::Declared),
            );
            infos.insert(info.name.clone(), info);
        }
        self.add_introduced_methods(class, &introduced, &mut methods, &mut infos)?;

        for (name, entry) in methods.iter_mut() {
            let Some(info) = infos.get(name) else {
                continue;
            };
            for (index, container) in aspects.containers().iter().enumerate() {
                if !self.candidates[index].contains(&class.name) {
                    continue;
                }
                for advisor in container.advisors() {
                    let ctx = self.context();
                    let subject = Subject::method(class, info, &entry.declaring_class);
                    if advisor.pointcut.matches(&ctx, &subject)? {
                        debug!(
                            class = %class.name,
                            method = %name,
                            advice = %advisor.advice,
                            "Advisor matched"
                        );
                        entry
                            .grouped_advices
                            .entry(advisor.advice.kind)
                            .or_default()
                            .push(advisor.advice.clone());
                    }
                }
            }
        }

        check_void_implementations(class, &methods)?;

        Ok(ClassInterception {
            class_name: class.name.clone(),
            methods,
            introduced_interfaces: introduced,
        })
    }

    fn match_introductions(&mut self, class: &ClassInfo) -> Result<Vec<IntroducedInterface>> {
        let classes = self.classes;
        let aspects = self.aspects;
        let implemented = classes.interfaces_of(&class.name);
        let mut introduced: Vec<IntroducedInterface> = Vec::new();
        for (index, container) in aspects.containers().iter().enumerate() {
            if !self.candidates[index].contains(&class.name) {
                continue;
            }
            for introduction in container.introductions() {
                let ctx = self.context();
                if !introduction
                    .pointcut
                    .matches(&ctx, &Subject::class_level(class))?
                {
                    continue;
                }
                if implemented.contains(&introduction.interface.as_str()) {
                    debug!(
                        class = %class.name,
                        interface = %introduction.interface,
                        "Class already implements introduced interface"
                    );
                    continue;
                }
                introduced.push(IntroducedInterface {
                    interface: introduction.interface.clone(),
                    aspect_class: introduction.aspect_class.clone(),
                });
            }
        }
        Ok(introduced)
    }

    fn add_introduced_methods(
        &self,
        class: &ClassInfo,
        introduced: &[IntroducedInterface],
        methods: &mut BTreeMap<String, InterceptedMethod>,
        infos: &mut BTreeMap<String, MethodInfo>,
    ) -> Result<()> {
        let mut introduced_by: BTreeMap<&str, &IntroducedInterface> = BTreeMap::new();
        for introduction in introduced {
            for (declaring, method) in self.classes.interface_methods(&introduction.interface) {
                if let Some(previous) = introduced_by.get(method.name.as_str()) {
                    return Err(AopError::configuration(format!(
                        "method name conflict in class \"{}\": method \"{}\" introduced by aspect \"{}\" is already introduced by aspect \"{}\"",
                        class.name, method.name, introduction.aspect_class, previous.aspect_class
                    )));
                }
                introduced_by.insert(method.name.as_str(), introduction);
                if methods.contains_key(&method.name) {
                    continue;
                }
                methods.insert(
                    method.name.clone(),
                    InterceptedMethod::new(
                        declaring,
                        MethodOrigin::Introduced {
                            interface: introduction.interface.clone(),
                            aspect_class: introduction.aspect_class.clone(),
                            has_default: method.default,
                        },
                    ),
                );
                let mut info = MethodInfo::synthetic(&method.name);
                info.tags = method.tags.clone();
                infos.insert(method.name.clone(), info);
            }
        }
        Ok(())
    }
}

fn check_void_implementations(
    class: &ClassInfo,
    methods: &BTreeMap<String, InterceptedMethod>,
) -> Result<()> {
    for (name, entry) in methods {
        if let MethodOrigin::Introduced {
            interface,
            has_default: false,
            ..
        } = &entry.origin
        {
            if entry.advices(AdviceKind::Around).is_empty() {
                return Err(AopError::configuration(format!(
                    "method \"{}\" of interface \"{}\" introduced into class \"{}\" has neither a default implementation nor an around advice",
                    name, interface, class.name
                )));
            }
        }
    }
    Ok(())
}
