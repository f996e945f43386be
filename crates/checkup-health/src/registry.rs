//! Check registry and reference resolution
//!
//! A reference such as `app.cache.redis_ping` is split on its last `.` into
//! a module path (`app.cache`) and a symbol (`redis_ping`). Modules are
//! registered up front or as lazy loaders that run on first resolution.

use crate::check::Check;
use checkup_core::{Error, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Separator between module path segments and the trailing symbol
pub const REFERENCE_SEPARATOR: char = '.';

/// A parsed `<module-path>.<symbol>` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    module: String,
    symbol: String,
}

impl Reference {
    /// Parse a reference, splitting on the last separator
    pub fn parse(reference: &str) -> Result<Self> {
        match reference.rsplit_once(REFERENCE_SEPARATOR) {
            Some((module, symbol)) if !module.is_empty() && !symbol.is_empty() => Ok(Self {
                module: module.to_string(),
                symbol: symbol.to_string(),
            }),
            _ => Err(Error::InvalidReference(reference.to_string())),
        }
    }

    /// Parse a reference from a raw instruction value; non-strings are
    /// rejected
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            other => Err(Error::InvalidReference(other.to_string())),
        }
    }

    /// Module path
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Symbol within the module
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl FromStr for Reference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.module, REFERENCE_SEPARATOR, self.symbol)
    }
}

/// A named collection of checks
#[derive(Clone, Default)]
pub struct CheckModule {
    checks: HashMap<String, Arc<dyn Check>>,
}

impl fmt::Debug for CheckModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut symbols: Vec<_> = self.checks.keys().collect();
        symbols.sort();
        f.debug_struct("CheckModule")
            .field("symbols", &symbols)
            .finish()
    }
}

impl CheckModule {
    /// Create an empty module
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check under `symbol`, builder style
    pub fn with_check(mut self, symbol: impl Into<String>, check: impl Check + 'static) -> Self {
        self.insert(symbol, Arc::new(check));
        self
    }

    /// Add or replace a check under `symbol`
    pub fn insert(&mut self, symbol: impl Into<String>, check: Arc<dyn Check>) {
        self.checks.insert(symbol.into(), check);
    }

    /// Look up a symbol
    pub fn get(&self, symbol: &str) -> Option<Arc<dyn Check>> {
        self.checks.get(symbol).cloned()
    }

    /// Exported symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.checks.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Number of exported checks
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether the module exports nothing
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

type ModuleLoader = Arc<dyn Fn() -> Result<CheckModule> + Send + Sync>;

#[derive(Clone)]
enum ModuleEntry {
    Loaded(Arc<CheckModule>),
    Lazy(ModuleLoader),
}

/// Registry mapping module paths to check modules
///
/// Cloning is cheap; clones share the same module table.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    modules: Arc<RwLock<HashMap<String, ModuleEntry>>>,
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("modules", &self.module_paths())
            .finish()
    }
}

impl CheckRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fully built module, replacing any previous one at `path`
    pub fn register_module(&self, path: impl Into<String>, module: CheckModule) {
        let path = path.into();
        let previous = self
            .modules
            .write()
            .insert(path.clone(), ModuleEntry::Loaded(Arc::new(module)));

        if previous.is_some() {
            warn!(module = %path, "Replaced previously registered module");
        }
        debug!(module = %path, "Module registered");
    }

    /// Register a loader that builds the module on first resolution
    ///
    /// A failing loader is retried on the next resolution.
    pub fn register_loader<F>(&self, path: impl Into<String>, loader: F)
    where
        F: Fn() -> Result<CheckModule> + Send + Sync + 'static,
    {
        let path = path.into();
        let previous = self
            .modules
            .write()
            .insert(path.clone(), ModuleEntry::Lazy(Arc::new(loader)));

        if previous.is_some() {
            warn!(module = %path, "Replaced previously registered module");
        }
        debug!(module = %path, "Module loader registered");
    }

    /// Register a single check under a full reference, creating its module
    /// if needed
    pub fn register(&self, reference: &str, check: impl Check + 'static) -> Result<()> {
        let reference = Reference::parse(reference)?;
        let check: Arc<dyn Check> = Arc::new(check);

        loop {
            let mut modules = self.modules.write();
            let current = match modules.get(reference.module()) {
                None => Some(CheckModule::new()),
                Some(ModuleEntry::Loaded(module)) => Some(module.as_ref().clone()),
                Some(ModuleEntry::Lazy(_)) => None,
            };

            let Some(mut module) = current else {
                // Materialize the lazy module without holding the lock, then
                // merge on the next pass.
                drop(modules);
                self.load_module(reference.module())?;
                continue;
            };

            module.insert(reference.symbol(), check);
            modules.insert(
                reference.module().to_string(),
                ModuleEntry::Loaded(Arc::new(module)),
            );
            break;
        }

        debug!(reference = %reference, "Check registered");
        Ok(())
    }

    /// Resolve a reference string to its check
    pub fn resolve(&self, reference: &str) -> Result<Arc<dyn Check>> {
        self.resolve_reference(&Reference::parse(reference)?)
    }

    /// Resolve a parsed reference to its check
    pub fn resolve_reference(&self, reference: &Reference) -> Result<Arc<dyn Check>> {
        let module = self.load_module(reference.module())?;
        module
            .get(reference.symbol())
            .ok_or_else(|| Error::SymbolNotFound {
                module: reference.module().to_string(),
                symbol: reference.symbol().to_string(),
            })
    }

    /// Return the module at `path`, running its loader if it has not been
    /// loaded yet
    pub fn load_module(&self, path: &str) -> Result<Arc<CheckModule>> {
        let entry = self
            .modules
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound(path.to_string()))?;

        let loader = match entry {
            ModuleEntry::Loaded(module) => return Ok(module),
            ModuleEntry::Lazy(loader) => loader,
        };

        // Loader runs outside the lock so it may itself consult the registry.
        let module = loader().map_err(|e| Error::ModuleLoad {
            module: path.to_string(),
            message: e.to_string(),
        })?;
        let module = Arc::new(module);

        let mut modules = self.modules.write();
        match modules.get(path) {
            // Another caller finished loading first
            Some(ModuleEntry::Loaded(existing)) => Ok(existing.clone()),
            _ => {
                modules.insert(path.to_string(), ModuleEntry::Loaded(module.clone()));
                debug!(module = %path, symbols = module.len(), "Module loaded");
                Ok(module)
            }
        }
    }

    /// Whether a module path is registered (loaded or lazy)
    pub fn contains_module(&self, path: &str) -> bool {
        self.modules.read().contains_key(path)
    }

    /// Registered module paths, sorted
    pub fn module_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.modules.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Every resolvable reference, sorted; loads lazy modules
    pub fn references(&self) -> Result<Vec<String>> {
        let mut references = Vec::new();
        for path in self.module_paths() {
            let module = self.load_module(&path)?;
            references.extend(
                module
                    .symbols()
                    .into_iter()
                    .map(|symbol| format!("{path}{REFERENCE_SEPARATOR}{symbol}")),
            );
        }
        references.sort();
        Ok(references)
    }
}
