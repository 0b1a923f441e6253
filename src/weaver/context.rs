use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::builder::ProxySpec;
use super::intercepted::{ClassInterception, InterceptionBuilder};
use super::naming::ProxyNamer;
use crate::aspect::AspectRegistry;
use crate::config::WeaverConfig;
use crate::error::Result;
use crate::pointcut::{ClassNameIndex, FilterResolver};
use crate::reflection::ClassRegistry;
use crate::settings::Settings;

/// Immutable result of a weave
///
/// Holds everything the runtime needs: the classes, the aspect registry, the intercepted
/// methods map of every target class and the proxy spec of every woven class. Shared behind
/// [`Arc`] once built.
#[derive(Debug)]
pub struct WeaverContext {
    generation: u64,
    classes: ClassRegistry,
    settings: Settings,
    aspects: AspectRegistry,
    interceptions: BTreeMap<String, ClassInterception>,
    proxies: BTreeMap<String, ProxySpec>,
}

impl WeaverContext {
    /// Number of the weave that produced this context, starting at 1
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn aspects(&self) -> &AspectRegistry {
        &self.aspects
    }

    /// Intercepted methods map of a target class
    pub fn interception(&self, class_name: &str) -> Option<&ClassInterception> {
        self.interceptions.get(class_name)
    }

    /// All target classes that were matched, woven or not
    pub fn interceptions(&self) -> impl Iterator<Item = &ClassInterception> {
        self.interceptions.values()
    }

    /// Proxy of a woven class; `None` for classes that need no proxy
    pub fn proxy_for(&self, class_name: &str) -> Option<&ProxySpec> {
        self.proxies.get(class_name)
    }

    /// Proxy specs, sorted by target class name
    pub fn proxies(&self) -> impl Iterator<Item = &ProxySpec> {
        self.proxies.values()
    }

    pub fn is_woven(&self, class_name: &str) -> bool {
        self.proxies.contains_key(class_name)
    }
}

/// Long-lived weaver
///
/// Each call to [`Weaver::weave`] produces a fresh [`WeaverContext`]. The weaver remembers the
/// proxy names it issued, so proxies of a later weave never collide with earlier ones.
#[derive(Debug, Clone)]
pub struct Weaver {
    config: WeaverConfig,
    namer: ProxyNamer,
    generation: u64,
}

impl Weaver {
    pub fn new(config: WeaverConfig) -> Self {
        let namer = ProxyNamer::new(config.proxy_suffix.clone());
        Weaver {
            config,
            namer,
            generation: 0,
        }
    }

    pub fn config(&self) -> &WeaverConfig {
        &self.config
    }

    /// Weave all aspects into all target classes
    ///
    /// Either the complete context is returned or nothing changes: on error the weaver's issued
    /// proxy names and generation are left as they were.
    ///
    /// # Errors
    ///
    /// Any parse, configuration or matching error.
    pub fn weave(
        &mut self,
        classes: ClassRegistry,
        settings: Settings,
        filters: &dyn FilterResolver,
    ) -> Result<Arc<WeaverContext>> {
        let aspects = AspectRegistry::build(&classes, &self.config.aspect_tag, filters)?;
        let aspect_classes = aspects.aspect_classes();

        let mut targets = Vec::new();
        for class in classes.classes() {
            if aspect_classes.contains(class.name.as_str()) {
                continue;
            }
            if self.config.is_excluded(&class.name) {
                warn!(class = %class.name, "Class is in an excluded namespace, not weaving");
                continue;
            }
            targets.push(class);
        }
        let index = ClassNameIndex::new(targets.iter().map(|c| c.name.as_str()));

        let mut namer = self.namer.clone();
        let mut interceptions = BTreeMap::new();
        let mut proxies = BTreeMap::new();
        {
            let mut builder = InterceptionBuilder::new(&classes, &settings, &aspects, &index)?;
            for class in &targets {
                let interception = builder.build(class)?;
                if interception.needs_proxy() {
                    let proxy_class = namer.proxy_name(&classes, class);
                    let spec = ProxySpec::plan(&interception, proxy_class);
                    debug!(
                        class = %spec.target_class,
                        proxy = %spec.proxy_class,
                        advised = spec.advised_methods().count(),
                        introduced = spec.introduced_interfaces.len(),
                        "Proxy planned"
                    );
                    proxies.insert(class.name.clone(), spec);
                }
                interceptions.insert(class.name.clone(), interception);
            }
        }

        self.namer = namer;
        self.generation += 1;
        info!(
            generation = self.generation,
            aspects = aspects.containers().len(),
            targets = interceptions.len(),
            proxies = proxies.len(),
            "Weave complete"
        );

        Ok(Arc::new(WeaverContext {
            generation: self.generation,
            classes,
            settings,
            aspects,
            interceptions,
            proxies,
        }))
    }
}
