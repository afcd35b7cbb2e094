// ABOUTME: Scope chain - identifier-to-handle maps, walked outward for lookup

use crate::rca::Handle;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A mapping from identifier to Object handle, plus an optional outer Scope.
/// Lookup walks outward; assignment updates the innermost scope that
/// already binds the name. A fresh binding adds to the current scope only.
#[derive(Debug)]
pub struct Scope {
    bindings: RefCell<HashMap<String, Handle>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// True if `name` is bound in this frame only (not the parent chain).
    pub fn exists(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// True if `name` is bound anywhere on the scope chain.
    pub fn exists_any(&self, name: &str) -> bool {
        if self.exists(name) {
            return true;
        }
        match &self.parent {
            Some(p) => p.exists_any(name),
            None => false,
        }
    }

    /// Walks the chain outward, returning the first binding found.
    pub fn get(&self, name: &str) -> Option<Handle> {
        if let Some(v) = self.bindings.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Always writes to the current frame, shadowing any outer binding.
    pub fn set(&self, name: impl Into<String>, value: Handle) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Walks outward until it finds the binding, replacing it there. Returns
    /// false if no scope in the chain binds `name`.
    pub fn update(&self, name: &str, value: Handle) -> bool {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(p) => p.update(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;
    use crate::rca;

    #[test]
    fn set_binds_in_current_frame_only() {
        let root = Scope::root();
        root.set("x", rca::alloc(Object::Int(1)));
        let child = Scope::child(&root);
        assert!(child.exists_any("x"));
        assert!(!child.exists("x"));
    }

    #[test]
    fn update_walks_outward_to_find_binding() {
        let root = Scope::root();
        root.set("x", rca::alloc(Object::Int(1)));
        let child = Scope::child(&root);
        assert!(child.update("x", rca::alloc(Object::Int(2))));
        assert_eq!(root.get("x").unwrap().as_int(), Some(2));
    }

    #[test]
    fn update_returns_false_for_unbound_name() {
        let root = Scope::root();
        assert!(!root.update("missing", rca::alloc(Object::Int(1))));
    }

    #[test]
    fn child_shadows_parent_binding() {
        let root = Scope::root();
        root.set("x", rca::alloc(Object::Int(1)));
        let child = Scope::child(&root);
        child.set("x", rca::alloc(Object::Int(2)));
        assert_eq!(child.get("x").unwrap().as_int(), Some(2));
        assert_eq!(root.get("x").unwrap().as_int(), Some(1));
    }
}
