//! Field and method resolution across the class hierarchy.
//!
//! The comparator resolves member references the way the JVM does: declared
//! members first, then interfaces, then the ancestor chain, with the
//! maximally-specific rule deciding between competing default methods. A
//! resolution miss is normal (platform types have no members in the arena)
//! and surfaces as `None`, never as an error.

use dashmap::DashMap;
use rustc_hash::FxHashSet;

use crate::model::{ClassId, FieldId, MatchEnv, MethodAccess, MethodId};

/// Resolves a field reference against a class, following JVMS §5.4.3.2.
///
/// Lookup order: declared fields of `class`, then its direct and transitive
/// interfaces in declaration order, then the same two steps on each ancestor
/// up the superclass chain.
///
/// # Returns
///
/// The resolved field, or `None` when nothing in the hierarchy declares a
/// matching name and descriptor.
#[must_use]
pub fn resolve_field(env: &MatchEnv, class: ClassId, name: &str, desc: &str) -> Option<FieldId> {
    let mut current = Some(class);
    while let Some(c) = current {
        let def = env.class(c);
        if let Some(field) = def.find_field(env, name, desc) {
            return Some(field);
        }
        if let Some(field) = find_interface_field(env, c, name, desc) {
            return Some(field);
        }
        current = def.superclass;
    }
    None
}

/// BFS over a class's direct and transitive interfaces, declaration order.
fn find_interface_field(env: &MatchEnv, class: ClassId, name: &str, desc: &str) -> Option<FieldId> {
    let mut queue: Vec<ClassId> = env.class(class).interfaces.clone();
    let mut seen: FxHashSet<ClassId> = queue.iter().copied().collect();
    let mut head = 0;
    while head < queue.len() {
        let itf = queue[head];
        head += 1;
        if let Some(field) = env.class(itf).find_field(env, name, desc) {
            return Some(field);
        }
        for &parent in &env.class(itf).interfaces {
            if seen.insert(parent) {
                queue.push(parent);
            }
        }
    }
    None
}

/// Resolves a method reference against a class.
///
/// For a virtual (non-interface) call the lookup walks the class itself, then
/// the superclass chain, then falls back to interface-method resolution. For
/// an interface call (`to_interface`), a superclass method is only accepted
/// when it is public and non-static, per JVMS §5.4.3.4.
///
/// # Arguments
///
/// * `class` - The referenced owner class
/// * `name`, `desc` - The referenced signature
/// * `to_interface` - Whether the call site carries the interface bit
///
/// # Returns
///
/// The resolved method, or `None` when resolution fails or is ambiguous.
#[must_use]
pub fn resolve_method(
    env: &MatchEnv,
    class: ClassId,
    name: &str,
    desc: &str,
    to_interface: bool,
) -> Option<MethodId> {
    if let Some(method) = env.class(class).find_method(env, name, desc) {
        return Some(method);
    }

    let mut current = env.class(class).superclass;
    while let Some(c) = current {
        if let Some(method) = env.class(c).find_method(env, name, desc) {
            let access = env.method(method).access;
            if !to_interface
                || (access.contains(MethodAccess::PUBLIC) && !access.contains(MethodAccess::STATIC))
            {
                return Some(method);
            }
        }
        current = env.class(c).superclass;
    }

    resolve_interface_method(env, class, name, desc)
}

/// Resolves among the super-interfaces of a class, preferring non-abstract
/// candidates and applying the maximally-specific rule.
fn resolve_interface_method(
    env: &MatchEnv,
    class: ClassId,
    name: &str,
    desc: &str,
) -> Option<MethodId> {
    // Collect every super-interface, transitively, walking the superclass
    // chain as well since a parent's interfaces are inherited.
    let mut queue: Vec<ClassId> = Vec::new();
    let mut seen: FxHashSet<ClassId> = FxHashSet::default();
    let mut current = Some(class);
    while let Some(c) = current {
        for &itf in &env.class(c).interfaces {
            if seen.insert(itf) {
                queue.push(itf);
            }
        }
        current = env.class(c).superclass;
    }
    let mut head = 0;
    while head < queue.len() {
        let itf = queue[head];
        head += 1;
        for &parent in &env.class(itf).interfaces {
            if seen.insert(parent) {
                queue.push(parent);
            }
        }
    }

    let mut candidates: Vec<MethodId> = Vec::new();
    for &itf in &queue {
        if let Some(method) = env.class(itf).find_method(env, name, desc) {
            let access = env.method(method).access;
            if !access.contains(MethodAccess::PRIVATE) && !access.contains(MethodAccess::STATIC) {
                candidates.push(method);
            }
        }
    }
    if candidates.is_empty() {
        return None;
    }

    let non_abstract: Vec<MethodId> = candidates
        .iter()
        .copied()
        .filter(|&m| !env.method(m).access.contains(MethodAccess::ABSTRACT))
        .collect();
    if !non_abstract.is_empty() {
        candidates = non_abstract;
    }

    // Maximally-specific rule: drop candidates whose owner is a
    // super-interface of another candidate's owner.
    let survivors: Vec<MethodId> = candidates
        .iter()
        .copied()
        .filter(|&m| {
            let owner = env.method(m).owner;
            !candidates.iter().any(|&other| {
                other != m && is_super_interface(env, owner, env.method(other).owner)
            })
        })
        .collect();

    match survivors.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Returns true if `sup` is a transitive super-interface of `class`.
fn is_super_interface(env: &MatchEnv, sup: ClassId, class: ClassId) -> bool {
    if sup == class {
        return false;
    }
    env.class(class).hierarchy.iter().any(|&c| c == sup)
}

/// Key of a memoized member resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolveKey {
    class: ClassId,
    name: String,
    desc: String,
    to_interface: bool,
}

/// Concurrent memoization of member resolutions within one matching pass.
///
/// Ranking tasks of a pass share one cache; resolution only depends on the
/// immutable environment, so entries never go stale.
#[derive(Debug, Default)]
pub struct ResolveCache {
    fields: DashMap<ResolveKey, Option<FieldId>>,
    methods: DashMap<ResolveKey, Option<MethodId>>,
}

impl ResolveCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized [`resolve_field`].
    #[must_use]
    pub fn field(&self, env: &MatchEnv, class: ClassId, name: &str, desc: &str) -> Option<FieldId> {
        let key = ResolveKey {
            class,
            name: name.to_owned(),
            desc: desc.to_owned(),
            to_interface: false,
        };
        if let Some(hit) = self.fields.get(&key) {
            return *hit;
        }
        let resolved = resolve_field(env, class, name, desc);
        self.fields.insert(key, resolved);
        resolved
    }

    /// Memoized [`resolve_method`].
    #[must_use]
    pub fn method(
        &self,
        env: &MatchEnv,
        class: ClassId,
        name: &str,
        desc: &str,
        to_interface: bool,
    ) -> Option<MethodId> {
        let key = ResolveKey {
            class,
            name: name.to_owned(),
            desc: desc.to_owned(),
            to_interface,
        };
        if let Some(hit) = self.methods.get(&key) {
            return *hit;
        }
        let resolved = resolve_method(env, class, name, desc, to_interface);
        self.methods.insert(key, resolved);
        resolved
    }
}
