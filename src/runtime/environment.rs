use crate::runtime::{error::RuntimeErrorKind, value::Value};
use std::collections::HashMap;

/// Handle to a scope in the [`Environment`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

struct Scope {
    bindings: HashMap<String, Value>,
    parent: Option<ScopeId>,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Self {
            bindings: HashMap::new(),
            parent,
        }
    }
}

/// All live scopes, indexed by [`ScopeId`].
///
/// Scopes are released in LIFO order, so an id stays valid for as long as
/// the evaluation that pushed it is running. The global scope is never
/// released.
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None)],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId::GLOBAL
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(parent)));
        tracing::trace!(scope = id.0, parent = parent.0, "push scope");
        id
    }

    /// Releases `id` and every scope pushed after it, dropping their
    /// bindings.
    pub fn pop_scope(&mut self, id: ScopeId) {
        if id == ScopeId::GLOBAL {
            return;
        }
        tracing::trace!(scope = id.0, "pop scope");
        self.scopes.truncate(id.0);
    }

    /// Introduces `name` in exactly `scope`. Shadowing an outer binding is
    /// fine; repeating a name within one scope is not.
    pub fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeErrorKind> {
        if self.is_defined_in(scope, name) {
            return Err(RuntimeErrorKind::Redefinition {
                name: name.to_string(),
            });
        }
        self.bind(scope, name, value);
        Ok(())
    }

    /// Binds unconditionally, replacing any existing binding in `scope`.
    pub fn bind(&mut self, scope: ScopeId, name: &str, value: Value) {
        if let Some(frame) = self.scopes.get_mut(scope.0) {
            frame.bindings.insert(name.to_string(), value);
        }
    }

    pub fn is_defined_in(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes
            .get(scope.0)
            .is_some_and(|frame| frame.bindings.contains_key(name))
    }

    /// Nearest scope, starting at `scope` and walking parents, that binds
    /// `name`.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = self.scopes.get(id.0)?;
            if frame.bindings.contains_key(name) {
                return Some(id);
            }
            current = frame.parent;
        }
        None
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<Value> {
        let id = self.resolve(scope, name)?;
        self.scopes.get(id.0)?.bindings.get(name).cloned()
    }

    /// Overwrites the nearest existing binding of `name`.
    pub fn assign(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeErrorKind> {
        let slot = self
            .resolve(scope, name)
            .and_then(|id| self.scopes.get_mut(id.0))
            .and_then(|frame| frame.bindings.get_mut(name));
        match slot {
            Some(slot) => {
                // The old value is released only after the new one is in place.
                let _previous = std::mem::replace(slot, value);
                Ok(())
            }
            None => Err(RuntimeErrorKind::UndefinedName {
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_to_the_nearest_binding() {
        let mut env = Environment::new();
        let global = env.global();
        env.define(global, "x", Value::Int(1)).unwrap();
        let inner = env.push_scope(global);
        assert_eq!(env.lookup(inner, "x").and_then(|v| v.as_int()), Some(1));

        env.define(inner, "x", Value::Int(2)).unwrap();
        assert_eq!(env.lookup(inner, "x").and_then(|v| v.as_int()), Some(2));
        assert_eq!(env.lookup(global, "x").and_then(|v| v.as_int()), Some(1));
    }

    #[test]
    fn define_rejects_repeats_in_one_scope() {
        let mut env = Environment::new();
        let global = env.global();
        env.define(global, "x", Value::Int(1)).unwrap();
        assert_eq!(
            env.define(global, "x", Value::Int(2)),
            Err(RuntimeErrorKind::Redefinition { name: "x".into() })
        );
    }

    #[test]
    fn assign_updates_the_defining_scope() {
        let mut env = Environment::new();
        let global = env.global();
        env.define(global, "x", Value::Int(1)).unwrap();
        let inner = env.push_scope(global);
        env.assign(inner, "x", Value::Int(5)).unwrap();
        env.pop_scope(inner);
        assert_eq!(env.lookup(global, "x").and_then(|v| v.as_int()), Some(5));

        assert_eq!(
            env.assign(global, "y", Value::Int(0)),
            Err(RuntimeErrorKind::UndefinedName { name: "y".into() })
        );
    }

    #[test]
    fn popping_releases_bindings() {
        let mut env = Environment::new();
        let global = env.global();
        let shared = Value::array(Vec::new());
        let inner = env.push_scope(global);
        env.define(inner, "a", shared.clone()).unwrap();
        let nested = env.push_scope(inner);
        env.define(nested, "b", shared.clone()).unwrap();
        assert_eq!(shared.ref_count(), Some(3));

        env.pop_scope(inner);
        assert_eq!(shared.ref_count(), Some(1));
        assert_eq!(env.depth(), 1);
        assert!(env.lookup(global, "a").is_none());
    }

    #[test]
    fn global_scope_survives_pop() {
        let mut env = Environment::new();
        let global = env.global();
        env.bind(global, "f", Value::Int(3));
        env.pop_scope(global);
        assert!(env.is_defined_in(global, "f"));
    }
}
