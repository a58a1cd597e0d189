//! Layered name scopes with multi-bind entries and dotted lookup.
//!
//! A name maps to a *range* of entries: overloaded functions register the
//! same name repeatedly and the resolver disambiguates. Dotted names
//! (`a.b.c`) walk module locals; every step before the last must resolve
//! to a single module entry.

use super::{EntryId, Instances, ModuleId};
use indexmap::IndexMap;
use std::fmt;

const EMPTY: &[EntryId] = &[];

/// One flat name -> entries map.
///
/// Backed by an ordered map so scope dumps and tests see declaration order.
#[derive(Debug, Clone, Default)]
pub struct LocalScope {
    entries: IndexMap<String, Vec<EntryId>>,
}

impl LocalScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `entry`, keeping earlier bindings (multi-bind).
    pub fn declare(&mut self, name: impl Into<String>, entry: EntryId) {
        self.entries.entry(name.into()).or_default().push(entry);
    }

    /// All entries bound to `name`; empty if unbound.
    pub fn get(&self, name: &str) -> &[EntryId] {
        self.entries.get(name).map_or(EMPTY, Vec::as_slice)
    }

    /// Iterate bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EntryId])> {
        self.entries
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no name is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One layer of the active scope chain.
#[derive(Debug)]
enum Frame {
    /// Scope owned by the stack (globals, function bodies)
    Local(LocalScope),
    /// Scope owned by a module; declarations land in its locals
    Module(ModuleId),
}

/// The active scope chain, innermost frame last.
///
/// Pushing a module frame routes declarations into the module's locals, so
/// parsing a module body populates the module itself.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    /// Create a stack with one (global) frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::Local(LocalScope::new())],
        }
    }

    /// Push a fresh local frame.
    pub fn push(&mut self) {
        self.frames.push(Frame::Local(LocalScope::new()));
    }

    /// Push a module's locals as the innermost frame.
    pub fn push_module(&mut self, module: ModuleId) {
        self.frames.push(Frame::Module(module));
    }

    /// Pop the innermost frame. The global frame stays.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Declare into the innermost frame.
    pub fn declare(&mut self, instances: &mut Instances, name: impl Into<String>, entry: EntryId) {
        match self.frames.last_mut() {
            Some(Frame::Local(scope)) => scope.declare(name, entry),
            Some(Frame::Module(module)) => {
                instances.module_mut(*module).locals.declare(name, entry)
            }
            None => unreachable!("scope stack keeps its global frame"),
        }
    }

    /// First frame, innermost outwards, that binds `name`.
    pub fn first_binding<'a>(&'a self, instances: &'a Instances, name: &str) -> &'a [EntryId] {
        for frame in self.frames.iter().rev() {
            let entries = match frame {
                Frame::Local(scope) => scope.get(name),
                Frame::Module(module) => instances.module(*module).locals.get(name),
            };
            if !entries.is_empty() {
                return entries;
            }
        }
        EMPTY
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// First segment unbound in every frame
    NameNotFound { name: String },
    /// Intermediate segment resolved to something that is not a module
    NotAModule { segment: String },
    /// Later segment unbound in the module's locals
    NestedNameNotFound { segment: String },
    /// Segment needed a single entry but is multi-bound
    Ambiguous { segment: String },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::NameNotFound { name } => write!(f, "name '{}' not found", name),
            LookupError::NotAModule { segment } => write!(f, "'{}' is not a module", segment),
            LookupError::NestedNameNotFound { segment } => {
                write!(f, "name '{}' not found in module", segment)
            }
            LookupError::Ambiguous { segment } => {
                write!(f, "'{}' is ambiguous where a single entry is required", segment)
            }
        }
    }
}

/// Resolve a possibly dotted name against the active scope chain.
///
/// The final segment may be multi-bound (overload sets); every segment
/// before it must resolve to exactly one module.
pub fn lookup<'a>(
    scope: &'a ScopeStack,
    instances: &'a Instances,
    name: &str,
) -> Result<&'a [EntryId], LookupError> {
    let mut segments = name.split('.');
    let first = segments.next().unwrap_or_default();
    let mut range = scope.first_binding(instances, first);
    if range.is_empty() {
        return Err(LookupError::NameNotFound { name: first.into() });
    }

    for segment in segments {
        let module = match range {
            [EntryId::Module(module)] => *module,
            [_] => {
                return Err(LookupError::NotAModule {
                    segment: segment.into(),
                })
            }
            _ => {
                return Err(LookupError::Ambiguous {
                    segment: segment.into(),
                })
            }
        };
        range = instances.module(module).locals.get(segment);
        if range.is_empty() {
            return Err(LookupError::NestedNameNotFound {
                segment: segment.into(),
            });
        }
    }
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Function, Module, Variable};

    fn with_module_tree() -> (Instances, ScopeStack) {
        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();

        let say = instances.add_function(Function::new("say"));
        let context = instances.add_module(Module::new("Context"));
        let mut root = Module::new("Rebuild");
        root.locals.declare("say", EntryId::Function(say));
        root.locals.declare("Context", EntryId::Module(context));
        let root = instances.add_module(root);
        scope.declare(&mut instances, "Rebuild", EntryId::Module(root));

        (instances, scope)
    }

    #[test]
    fn plain_lookup_walks_frames_innermost_first() {
        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();
        let outer = instances.add_variable(Variable::default());
        let inner = instances.add_variable(Variable::default());

        scope.declare(&mut instances, "x", EntryId::Variable(outer));
        scope.push();
        scope.declare(&mut instances, "x", EntryId::Variable(inner));

        assert_eq!(
            lookup(&scope, &instances, "x").unwrap(),
            &[EntryId::Variable(inner)]
        );
        scope.pop();
        assert_eq!(
            lookup(&scope, &instances, "x").unwrap(),
            &[EntryId::Variable(outer)]
        );
    }

    #[test]
    fn dotted_lookup_steps_through_modules() {
        let (instances, scope) = with_module_tree();
        let range = lookup(&scope, &instances, "Rebuild.say").unwrap();
        assert!(matches!(range, [EntryId::Function(_)]));

        let range = lookup(&scope, &instances, "Rebuild.Context").unwrap();
        assert!(matches!(range, [EntryId::Module(_)]));
    }

    #[test]
    fn dotted_lookup_failures() {
        let (mut instances, mut scope) = with_module_tree();

        assert_eq!(
            lookup(&scope, &instances, "Missing.say"),
            Err(LookupError::NameNotFound {
                name: "Missing".into()
            })
        );
        assert_eq!(
            lookup(&scope, &instances, "Rebuild.missing"),
            Err(LookupError::NestedNameNotFound {
                segment: "missing".into()
            })
        );

        let v = instances.add_variable(Variable::default());
        scope.declare(&mut instances, "v", EntryId::Variable(v));
        assert_eq!(
            lookup(&scope, &instances, "v.member"),
            Err(LookupError::NotAModule {
                segment: "member".into()
            })
        );
    }

    #[test]
    fn multi_bind_is_ambiguous_only_midway() {
        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();
        let f = instances.add_function(Function::new("f"));
        let g = instances.add_function(Function::new("f"));
        scope.declare(&mut instances, "f", EntryId::Function(f));
        scope.declare(&mut instances, "f", EntryId::Function(g));

        // final segment may be multi-bound
        assert_eq!(lookup(&scope, &instances, "f").unwrap().len(), 2);
        // intermediate segment may not
        assert_eq!(
            lookup(&scope, &instances, "f.member"),
            Err(LookupError::Ambiguous {
                segment: "member".into()
            })
        );
    }

    #[test]
    fn lookup_is_idempotent() {
        let (instances, scope) = with_module_tree();
        let first = lookup(&scope, &instances, "Rebuild.say").unwrap().to_vec();
        let second = lookup(&scope, &instances, "Rebuild.say").unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn module_frame_declarations_land_in_module_locals() {
        let mut instances = Instances::new();
        let mut scope = ScopeStack::new();
        let module = instances.add_module(Module::new("test"));
        scope.declare(&mut instances, "test", EntryId::Module(module));

        scope.push_module(module);
        let v = instances.add_variable(Variable::default());
        scope.declare(&mut instances, "inner", EntryId::Variable(v));
        scope.pop();

        assert_eq!(instances.module(module).locals.get("inner").len(), 1);
        assert!(matches!(
            lookup(&scope, &instances, "test.inner").unwrap(),
            [EntryId::Variable(_)]
        ));
    }
}
