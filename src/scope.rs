//! Lexical scopes.
//!
//! Every scope created while running a program lives in one arena, owned by
//! the root `Scope` handle the host created. Scopes refer to their parent by
//! index, and function values keep a `ScopeRef` to their declaring scope,
//! which does not own the arena. Dropping the last handle into an arena frees
//! every scope and binding in it, closures included.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use crate::{
    error::{Result, RuntimeError},
    value::{Binding, RuntimeValue},
};

type ScopeId = usize;

type Arena = RefCell<Vec<ScopeData>>;

#[derive(Default)]
struct ScopeData {
    parent: Option<ScopeId>,
    bindings: HashMap<String, Binding>,
    /// Script function calls active when this scope was entered.
    call_depth: usize,
}

/// Owning handle to a scope. Keeps the whole arena alive.
#[derive(Clone)]
pub struct Scope {
    arena: Rc<Arena>,
    id: ScopeId,
}

/// Non-owning handle to a scope, held by function values.
#[derive(Clone)]
pub struct ScopeRef {
    arena: Weak<Arena>,
    id: ScopeId,
}

impl ScopeRef {
    /// Returns `None` once every owning handle to the arena has been dropped.
    pub fn upgrade(&self) -> Option<Scope> {
        Some(Scope {
            arena: self.arena.upgrade()?,
            id: self.id,
        })
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Creates a root scope in a fresh arena.
    pub fn new() -> Self {
        Scope {
            arena: Rc::new(RefCell::new(vec![ScopeData::default()])),
            id: 0,
        }
    }

    /// Creates a child scope, e.g. for a branch body. It belongs to the same
    /// call as its parent.
    pub fn with_parent(parent: &Scope) -> Self {
        parent.push_child(parent.call_depth())
    }

    /// Creates the scope a function body runs in, `call_depth` calls deep.
    pub fn call_frame(declaration: &Scope, call_depth: usize) -> Self {
        declaration.push_child(call_depth)
    }

    fn push_child(&self, call_depth: usize) -> Self {
        let mut scopes = self.arena.borrow_mut();
        let id = scopes.len();
        scopes.push(ScopeData {
            parent: Some(self.id),
            bindings: HashMap::new(),
            call_depth,
        });

        tracing::trace!(id, parent = self.id, call_depth, "push scope");

        Scope {
            arena: self.arena.clone(),
            id,
        }
    }

    pub fn downgrade(&self) -> ScopeRef {
        ScopeRef {
            arena: Rc::downgrade(&self.arena),
            id: self.id,
        }
    }

    pub fn parent(&self) -> Option<Scope> {
        let parent = self.arena.borrow()[self.id].parent?;
        Some(Scope {
            arena: self.arena.clone(),
            id: parent,
        })
    }

    pub fn call_depth(&self) -> usize {
        self.arena.borrow()[self.id].call_depth
    }

    /// Whether both handles point at the same scope.
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena) && self.id == other.id
    }

    /// Whether `name` is bound in this scope itself, ignoring parents.
    pub fn contains_own(&self, name: &str) -> bool {
        self.arena.borrow()[self.id].bindings.contains_key(name)
    }

    /// Binds `name` in this scope. Shadowing a parent's binding is allowed,
    /// rebinding a name this scope already owns is not.
    pub fn declare(&self, name: &str, value: RuntimeValue, constant: bool) -> Result<RuntimeValue> {
        let mut scopes = self.arena.borrow_mut();
        let bindings = &mut scopes[self.id].bindings;
        if bindings.contains_key(name) {
            return Err(RuntimeError::Redeclaration(name.to_string()).into());
        }

        tracing::trace!(name, constant, scope = self.id, "declare");
        bindings.insert(name.to_string(), Binding::new(name, value.clone(), constant));

        Ok(value)
    }

    /// Overwrites the nearest binding of `name`. Constants cannot be assigned.
    pub fn assign(&self, name: &str, value: RuntimeValue) -> Result<RuntimeValue> {
        let owner = self.resolve_id(name)?;
        let mut scopes = self.arena.borrow_mut();

        let binding = scopes[owner]
            .bindings
            .get_mut(name)
            .ok_or_else(|| RuntimeError::UnresolvedVariable(name.to_string()))?;

        if binding.constant {
            return Err(RuntimeError::ConstantAssignment(name.to_string()).into());
        }

        binding.value = Box::new(value.clone());
        binding.constant = false;

        Ok(value)
    }

    pub fn lookup(&self, name: &str) -> Result<RuntimeValue> {
        let owner = self.resolve_id(name)?;
        let scopes = self.arena.borrow();

        scopes[owner]
            .bindings
            .get(name)
            .map(|binding| (*binding.value).clone())
            .ok_or_else(|| RuntimeError::UnresolvedVariable(name.to_string()).into())
    }

    /// Walks from this scope towards the root and returns the first scope that
    /// owns `name`.
    pub fn resolve(&self, name: &str) -> Result<Scope> {
        let id = self.resolve_id(name)?;
        Ok(Scope {
            arena: self.arena.clone(),
            id,
        })
    }

    fn resolve_id(&self, name: &str) -> Result<ScopeId> {
        let scopes = self.arena.borrow();
        let mut current = self.id;

        loop {
            let data = &scopes[current];
            if data.bindings.contains_key(name) {
                return Ok(current);
            }

            match data.parent {
                Some(parent) => current = parent,
                None => return Err(RuntimeError::UnresolvedVariable(name.to_string()).into()),
            }
        }
    }

    /// Snapshot of a binding owned by this scope.
    pub fn binding(&self, name: &str) -> Option<Binding> {
        self.arena.borrow()[self.id].bindings.get(name).cloned()
    }

    /// Names bound in this scope itself, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = self.arena.borrow()[self.id]
            .bindings
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn depth(&self) -> usize {
        let scopes = self.arena.borrow();
        let mut depth = 0;
        let mut current = scopes[self.id].parent;
        while let Some(id) = current {
            depth += 1;
            current = scopes[id].parent;
        }
        depth
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("depth", &self.depth())
            .field("names", &self.names())
            .finish()
    }
}

impl fmt::Debug for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRef").field("id", &self.id).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn number(value: f64) -> RuntimeValue {
        RuntimeValue::Number(value)
    }

    #[test]
    fn declare_then_lookup() {
        let scope = Scope::new();
        assert_eq!(scope.declare("x", number(42.0), false).unwrap(), number(42.0));
        assert_eq!(scope.lookup("x").unwrap(), number(42.0));
    }

    #[test]
    fn redeclare_in_same_scope_fails() {
        let scope = Scope::new();
        scope.declare("x", number(1.0), false).unwrap();

        assert_eq!(
            scope.declare("x", number(2.0), false),
            Err(Error::Runtime(RuntimeError::Redeclaration("x".into())))
        );
        assert_eq!(scope.lookup("x").unwrap(), number(1.0));
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Scope::new();
        parent.declare("x", number(1.0), true).unwrap();

        let child = Scope::with_parent(&parent);
        child.declare("x", number(2.0), false).unwrap();

        assert_eq!(child.lookup("x").unwrap(), number(2.0));
        assert_eq!(parent.lookup("x").unwrap(), number(1.0));
    }

    #[test]
    fn assign_writes_into_owning_scope() {
        let parent = Scope::new();
        parent.declare("x", number(1.0), false).unwrap();
        let child = Scope::with_parent(&parent);

        child.assign("x", number(5.0)).unwrap();

        assert!(!child.contains_own("x"));
        assert_eq!(parent.lookup("x").unwrap(), number(5.0));
        assert!(child.resolve("x").unwrap().ptr_eq(&parent));
    }

    #[test]
    fn assign_to_constant_fails() {
        let scope = Scope::new();
        scope.declare("x", number(1.0), true).unwrap();

        assert_eq!(
            scope.assign("x", number(2.0)),
            Err(Error::Runtime(RuntimeError::ConstantAssignment("x".into())))
        );
        assert_eq!(scope.lookup("x").unwrap(), number(1.0));
    }

    #[test]
    fn unresolved_names_fail() {
        let child = Scope::with_parent(&Scope::new());
        let unresolved = Err(Error::Runtime(RuntimeError::UnresolvedVariable("y".into())));

        assert_eq!(child.lookup("y"), unresolved);
        assert_eq!(child.assign("y", number(1.0)), unresolved);
        assert!(child.resolve("y").is_err());
    }

    #[test]
    fn names_and_bindings() {
        let scope = Scope::new();
        scope.declare("b", number(1.0), false).unwrap();
        scope.declare("a", RuntimeValue::Null, true).unwrap();

        assert_eq!(scope.names(), vec!["a".to_string(), "b".to_string()]);
        let binding = scope.binding("a").unwrap();
        assert!(binding.constant);
        assert_eq!(*binding.value, RuntimeValue::Null);
        assert_eq!(Scope::with_parent(&scope).depth(), 1);
    }

    #[test]
    fn call_depth_is_inherited_by_child_scopes() {
        let root = Scope::new();
        let frame = Scope::call_frame(&root, 3);
        let branch = Scope::with_parent(&frame);

        assert_eq!(root.call_depth(), 0);
        assert_eq!(branch.call_depth(), 3);
        assert!(branch.parent().unwrap().ptr_eq(&frame));
        assert_eq!(branch.depth(), 2);
    }

    #[test]
    fn scope_refs_do_not_keep_the_arena_alive() {
        let root = Scope::new();
        let child = Scope::with_parent(&root);
        let weak = child.downgrade();

        assert!(weak.upgrade().unwrap().ptr_eq(&child));

        drop(child);
        assert!(weak.upgrade().is_some());

        drop(root);
        assert!(weak.upgrade().is_none());
    }
}
