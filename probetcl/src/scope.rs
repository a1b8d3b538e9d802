//! The variable store: a stack of scopes.
//!
//! Scope 0 is the global scope; each proc call pushes a fresh scope and pops
//! it on return.  A variable owns a growable vector of element values:
//! element 0 is the scalar, higher indices are the `name(n)` array elements.
//! The vector grows when an element beyond its length is written (newly
//! exposed slots start empty) and never shrinks.
//!
//! A scope entry may instead be a *global alias*, created by the `global`
//! command: the entry holds no storage, and reads and writes through it are
//! forwarded to the global scope.

use crate::types::{ErrorKind, Exception, TclHasher, TclList, TclResult};
use crate::value::Value;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use indexmap::IndexMap;

/// Upper bound on the element index of an array variable.  Growth beyond
/// this raises a memory error instead of exhausting the host.
const MAX_ELEMENT_INDEX: usize = 1 << 20;

/// A variable: owned element storage, or an alias forwarding to the global
/// scope.
enum Var {
    Owned(Vec<Value>),
    GlobalAlias,
}

#[derive(Default)]
struct Scope {
    vars: IndexMap<String, Var, TclHasher>,
}

pub(crate) struct ScopeStack {
    stack: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            stack: alloc::vec![Scope::default()],
        }
    }

    /// Pushes a new scope onto the stack; it becomes the current scope.
    pub fn push(&mut self) {
        self.stack.push(Scope::default());
    }

    /// Pops the current scope, dropping all the variables it owns.  Aliased
    /// globals survive; only the alias entries are dropped.
    pub fn pop(&mut self) {
        self.stack.pop();
        assert!(!self.stack.is_empty(), "popped the global scope");
    }

    /// The current scope level; the global scope is level 0.
    pub fn current(&self) -> usize {
        self.stack.len() - 1
    }

    /// Resolves `name` in the current scope to the index of the scope that
    /// actually holds its storage, following a global alias if present.
    fn storage_scope(&self, name: &str) -> Option<usize> {
        let top = self.current();
        match self.stack[top].vars.get(name) {
            Some(Var::Owned(_)) => Some(top),
            Some(Var::GlobalAlias) => Some(0),
            None => None,
        }
    }

    fn elements(&self, name: &str) -> Option<&Vec<Value>> {
        let scope = self.storage_scope(name)?;
        match self.stack[scope].vars.get(name) {
            Some(Var::Owned(elements)) => Some(elements),
            _ => None,
        }
    }

    /// Reads the scalar value (element 0) of `name`.
    pub fn get(&self, name: &str) -> TclResult {
        self.get_elem(name, 0)
    }

    /// Reads element `index` of `name`.
    pub fn get_elem(&self, name: &str, index: usize) -> TclResult {
        match self.elements(name) {
            Some(elements) => match elements.get(index) {
                Some(value) => Ok(value.clone()),
                None => Err(Exception::error_for(
                    ErrorKind::VarUnknown,
                    Value::from(format!(
                        "can't read \"{}({})\": no such element in array",
                        name, index
                    )),
                    name,
                )),
            },
            None => Err(Exception::error_for(
                ErrorKind::VarUnknown,
                Value::from(format!("can't read \"{}\": no such variable", name)),
                name,
            )),
        }
    }

    /// Writes the scalar value (element 0) of `name`, creating the variable
    /// if necessary.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), Exception> {
        self.set_elem(name, 0, value)
    }

    /// Writes element `index` of `name`, creating the variable and growing
    /// its element vector as needed.
    pub fn set_elem(&mut self, name: &str, index: usize, value: Value) -> Result<(), Exception> {
        if index > MAX_ELEMENT_INDEX {
            return Err(Exception::error_for(
                ErrorKind::Memory,
                Value::from(format!("array index {} exceeds the element limit", index)),
                name,
            ));
        }

        // Create-for-write in the current scope, or in the global scope when
        // writing through an alias whose storage has gone away.
        let scope = self.storage_scope(name).unwrap_or_else(|| self.current());
        let vars = &mut self.stack[scope].vars;

        if !matches!(vars.get(name), Some(Var::Owned(_))) {
            vars.insert(String::from(name), Var::Owned(Vec::new()));
        }

        match vars.get_mut(name) {
            Some(Var::Owned(elements)) => {
                if index >= elements.len() {
                    elements.resize_with(index + 1, Value::empty);
                }
                elements[index] = value;
                Ok(())
            }
            _ => unreachable!(),
        }
    }

    /// Whether `name` exists in the current scope (following aliases).
    pub fn exists(&self, name: &str) -> bool {
        self.elements(name).is_some_and(|e| !e.is_empty())
    }

    /// Whether element `index` of `name` exists.
    pub fn elem_exists(&self, name: &str, index: usize) -> bool {
        self.elements(name).is_some_and(|e| index < e.len())
    }

    /// Removes `name` from the current scope.  Removing an aliased name
    /// removes both the alias entry and the global storage it forwards to.
    /// Unsetting a variable that doesn't exist is not an error.
    pub fn unset(&mut self, name: &str) {
        let top = self.current();
        match self.stack[top].vars.shift_remove(name) {
            Some(Var::GlobalAlias) => {
                self.stack[0].vars.shift_remove(name);
            }
            _ => (),
        }
    }

    /// Clears element `index` of `name` back to an empty value.  Element
    /// storage never shrinks.
    pub fn unset_elem(&mut self, name: &str, index: usize) {
        if let Some(scope) = self.storage_scope(name) {
            if let Some(Var::Owned(elements)) = self.stack[scope].vars.get_mut(name) {
                if let Some(slot) = elements.get_mut(index) {
                    *slot = Value::empty();
                }
            }
        }
    }

    /// Implements the `global` command: marks `name` in the current scope as
    /// an alias for the same name in the global scope, creating the global
    /// if it doesn't exist yet.
    ///
    /// Fails with a scope error in the global scope itself, and with a
    /// name-collision error if `name` already exists locally as an ordinary
    /// variable.
    pub fn link_global(&mut self, name: &str) -> Result<(), Exception> {
        let top = self.current();
        if top == 0 {
            return Err(Exception::error_for(
                ErrorKind::Scope,
                Value::from("global may only be used inside a proc body"),
                name,
            ));
        }

        match self.stack[top].vars.get(name) {
            Some(Var::Owned(_)) => {
                return Err(Exception::error_for(
                    ErrorKind::VarName,
                    Value::from(format!("variable \"{}\" already exists", name)),
                    name,
                ));
            }
            Some(Var::GlobalAlias) => return Ok(()),
            None => (),
        }

        // Make sure the global storage exists.
        if !matches!(self.stack[0].vars.get(name), Some(Var::Owned(_))) {
            self.stack[0]
                .vars
                .insert(String::from(name), Var::Owned(Vec::new()));
        }

        self.stack[top]
            .vars
            .insert(String::from(name), Var::GlobalAlias);
        Ok(())
    }

    /// Writes a scalar directly into the global scope.
    pub fn set_global(&mut self, name: &str, value: Value) {
        match self.stack[0].vars.get_mut(name) {
            Some(Var::Owned(elements)) => {
                if elements.is_empty() {
                    elements.push(value);
                } else {
                    elements[0] = value;
                }
            }
            _ => {
                self.stack[0]
                    .vars
                    .insert(String::from(name), Var::Owned(alloc::vec![value]));
            }
        }
    }

    /// The number of elements of `name`, or 0 if it doesn't exist.
    pub fn array_size(&self, name: &str) -> usize {
        self.elements(name).map_or(0, Vec::len)
    }

    /// Clones the elements of `name` in the index range `[first, last]`,
    /// clamped to the existing elements.
    pub fn array_slice(&self, name: &str, first: usize, last: usize) -> TclList {
        match self.elements(name) {
            Some(elements) if first < elements.len() => {
                let last = last.min(elements.len() - 1);
                elements[first..=last].to_vec()
            }
            _ => TclList::new(),
        }
    }

    /// The names visible in the current scope, in insertion order.
    pub fn vars_in_scope(&self) -> TclList {
        self.stack[self.current()]
            .vars
            .keys()
            .map(|name| Value::from(name))
            .collect()
    }

    /// The names defined in the global scope, in insertion order.
    pub fn vars_in_global_scope(&self) -> TclList {
        self.stack[0]
            .vars
            .keys()
            .map(|name| Value::from(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_set_get() {
        let mut scopes = ScopeStack::new();
        scopes.set("a", Value::from("1")).unwrap();
        assert_eq!(scopes.get("a").unwrap().as_str(), "1");
    }

    #[test]
    fn test_read_unset_is_error() {
        let scopes = ScopeStack::new();
        let err = scopes.get("nope").unwrap_err();
        assert_eq!(err.error_data().unwrap().kind(), ErrorKind::VarUnknown);
        assert_eq!(err.error_data().unwrap().symbol(), Some("nope"));
    }

    #[test]
    fn test_elements_grow() {
        let mut scopes = ScopeStack::new();
        scopes.set_elem("a", 4, Value::from("x")).unwrap();
        assert_eq!(scopes.array_size("a"), 5);
        assert_eq!(scopes.get_elem("a", 4).unwrap().as_str(), "x");
        // Newly exposed slots read as empty.
        assert_eq!(scopes.get_elem("a", 2).unwrap(), Value::empty());
        // Reading past the end is still an error.
        assert!(scopes.get_elem("a", 5).is_err());
    }

    #[test]
    fn test_element_limit() {
        let mut scopes = ScopeStack::new();
        let err = scopes
            .set_elem("a", MAX_ELEMENT_INDEX + 1, Value::empty())
            .unwrap_err();
        assert_eq!(err.error_data().unwrap().kind(), ErrorKind::Memory);
    }

    #[test]
    fn test_scopes_isolate() {
        let mut scopes = ScopeStack::new();
        scopes.set("a", Value::from("outer")).unwrap();
        scopes.push();
        assert!(scopes.get("a").is_err());
        scopes.set("a", Value::from("inner")).unwrap();
        assert_eq!(scopes.get("a").unwrap().as_str(), "inner");
        scopes.pop();
        assert_eq!(scopes.get("a").unwrap().as_str(), "outer");
    }

    #[test]
    fn test_global_alias() {
        let mut scopes = ScopeStack::new();
        scopes.set("x", Value::from("1")).unwrap();
        scopes.push();
        scopes.link_global("x").unwrap();
        assert_eq!(scopes.get("x").unwrap().as_str(), "1");
        scopes.set("x", Value::from("2")).unwrap();
        scopes.pop();
        assert_eq!(scopes.get("x").unwrap().as_str(), "2");
    }

    #[test]
    fn test_global_creates_missing() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.link_global("fresh").unwrap();
        scopes.set("fresh", Value::from("v")).unwrap();
        scopes.pop();
        assert_eq!(scopes.get("fresh").unwrap().as_str(), "v");
    }

    #[test]
    fn test_global_collision() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.set("x", Value::from("local")).unwrap();
        let err = scopes.link_global("x").unwrap_err();
        assert_eq!(err.error_data().unwrap().kind(), ErrorKind::VarName);
    }

    #[test]
    fn test_global_at_top_is_scope_error() {
        let mut scopes = ScopeStack::new();
        let err = scopes.link_global("x").unwrap_err();
        assert_eq!(err.error_data().unwrap().kind(), ErrorKind::Scope);
    }

    #[test]
    fn test_unset_alias_removes_global() {
        let mut scopes = ScopeStack::new();
        scopes.set("x", Value::from("1")).unwrap();
        scopes.push();
        scopes.link_global("x").unwrap();
        scopes.unset("x");
        scopes.pop();
        assert!(scopes.get("x").is_err());
    }
}
