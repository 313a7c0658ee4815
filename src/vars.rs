//! Memory variable store: PUBLIC/PRIVATE/LOCAL scopes over a flat,
//! name-uppercased table keyed by a numeric scope level (single-threaded
//! per session, so no locking is needed).

use crate::lang::ast::VarScope;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct VarEntry {
    value: Value,
    scope: VarScope,
    scope_level: u32,
}

#[derive(Debug, Default)]
pub struct VarStore {
    vars: HashMap<String, VarEntry>,
    scope_level: u32,
}

impl VarStore {
    pub fn new() -> VarStore {
        VarStore::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(&name.to_ascii_uppercase()).map(|e| &e.value)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.vars.contains_key(&name.to_ascii_uppercase())
    }

    /// Sets a variable's value, creating it as PRIVATE at the current scope
    /// level if it did not already exist.
    pub fn set(&mut self, name: &str, value: Value) {
        let key = name.to_ascii_uppercase();
        let level = self.scope_level;
        self.vars
            .entry(key)
            .and_modify(|e| e.value = value.clone())
            .or_insert(VarEntry { value, scope: VarScope::Private, scope_level: level });
    }

    pub fn declare(&mut self, scope: VarScope, name: &str) {
        let key = name.to_ascii_uppercase();
        let level = self.scope_level;
        self.vars
            .entry(key)
            .and_modify(|e| e.scope = scope.clone())
            .or_insert(VarEntry { value: Value::Nil, scope, scope_level: level });
    }

    pub fn release(&mut self, name: &str) {
        self.vars.remove(&name.to_ascii_uppercase());
    }

    pub fn release_all(&mut self) {
        self.vars.clear();
    }

    /// Drops every variable declared LOCAL at or above the current scope
    /// level, mirroring `var_release_locals` called on scope pop.
    pub fn release_locals(&mut self) {
        let level = self.scope_level;
        self.vars
            .retain(|_, e| !(e.scope == VarScope::Local && e.scope_level >= level));
    }

    pub fn push_scope(&mut self) {
        self.scope_level += 1;
    }

    pub fn pop_scope(&mut self) {
        self.release_locals();
        self.scope_level = self.scope_level.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips() {
        let mut vars = VarStore::new();
        vars.set("x", Value::Number(42.0));
        assert_eq!(vars.get("X"), Some(&Value::Number(42.0)));
    }

    #[test]
    fn locals_are_dropped_on_scope_pop() {
        let mut vars = VarStore::new();
        vars.push_scope();
        vars.declare(VarScope::Local, "temp");
        vars.set("temp", Value::Number(1.0));
        vars.pop_scope();
        assert!(!vars.exists("temp"));
    }

    #[test]
    fn release_removes_variable() {
        let mut vars = VarStore::new();
        vars.set("x", Value::Number(1.0));
        vars.release("x");
        assert!(!vars.exists("x"));
    }
}
