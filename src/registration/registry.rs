//! Name -> registration registry
//!
//! Guarantees at most one [`Registration`] per [`Name`]. Also keeps the route
//! table the event dispatcher uses to find a registration from the numeric
//! id in an OS event.

use std::collections::HashMap;

use tracing::debug;

use super::proxy::Registration;
use crate::hotkey::Name;
use crate::platform::HotKeyId;

/// Numeric hotkey id -> owning name, for registered hotkeys only
pub type Routes = HashMap<u32, Name>;

/// Registry of registrations, one per name
#[derive(Debug)]
pub struct Registry {
    signature: u32,
    next_id: u32,
    entries: HashMap<Name, Registration>,
    routes: Routes,
}

impl Registry {
    /// Create an empty registry issuing ids under `signature`
    pub fn new(signature: u32) -> Self {
        Self {
            signature,
            next_id: 1,
            entries: HashMap::new(),
            routes: Routes::new(),
        }
    }

    /// Existing registration for `name`, never creating one
    pub fn lookup(&self, name: &Name) -> Option<&Registration> {
        self.entries.get(name)
    }

    /// Existing registration for `name`, or a blank one inserted now
    pub fn get_or_create(&mut self, name: &Name) -> &mut Registration {
        self.get_or_create_with_routes(name).0
    }

    /// Like [`Registry::get_or_create`], also lending the route table
    pub(crate) fn get_or_create_with_routes(
        &mut self,
        name: &Name,
    ) -> (&mut Registration, &mut Routes) {
        let Self {
            signature,
            next_id,
            entries,
            routes,
        } = self;

        let registration = entries.entry(name.clone()).or_insert_with(|| {
            let id = HotKeyId {
                signature: *signature,
                id: *next_id,
            };
            *next_id = next_id.wrapping_add(1).max(1);
            debug!(name = %name, %id, "registration created");
            Registration::new(name.clone(), id)
        });

        (registration, routes)
    }

    /// Delete the entry for `name`
    ///
    /// Does not unregister from the OS; callers tear the registration down first.
    pub fn remove(&mut self, name: &Name) -> Option<Registration> {
        let removed = self.entries.remove(name)?;
        self.routes.remove(&removed.id().id);
        Some(removed)
    }

    /// Name routed to a numeric hotkey id
    pub fn route(&self, id: u32) -> Option<&Name> {
        self.routes.get(&id)
    }

    /// Registration an OS event id resolves to
    pub fn resolve_mut(&mut self, id: u32) -> Option<&mut Registration> {
        let name = self.routes.get(&id)?;
        self.entries.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn registrations_mut(&mut self) -> impl Iterator<Item = &mut Registration> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_does_not_create() {
        let registry = Registry::new(7);
        assert!(registry.lookup(&Name::new("x")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_or_create_shares_identity() {
        let mut registry = Registry::new(7);
        let name = Name::with_prefix("toggle", "app.");

        let first = registry.get_or_create(&name).id();
        let second = registry.get_or_create(&name.clone()).id();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(first.signature, 7);
    }

    #[test]
    fn test_new_registration_is_blank() {
        let mut registry = Registry::new(7);
        let r = registry.get_or_create(&Name::new("x"));
        assert_eq!(r.key(), None);
        assert!(r.modifiers().is_empty());
        assert!(!r.is_registered());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut registry = Registry::new(7);
        let a = registry.get_or_create(&Name::new("a")).id();
        let b = registry.get_or_create(&Name::new("b")).id();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_remove_then_recreate_starts_fresh() {
        let mut registry = Registry::new(7);
        let name = Name::new("a");
        let before = registry.get_or_create(&name).id();

        assert!(registry.remove(&name).is_some());
        assert!(registry.lookup(&name).is_none());
        assert!(registry.remove(&name).is_none());

        let after = registry.get_or_create(&name).id();
        assert_ne!(before, after);
    }

    #[test]
    fn test_resolve_by_route() {
        let mut registry = Registry::new(7);
        let name = Name::new("a");
        let (registration, routes) = registry.get_or_create_with_routes(&name);
        let id = registration.id().id;
        routes.insert(id, name.clone());

        assert_eq!(registry.route(id), Some(&name));
        assert_eq!(registry.resolve_mut(id).map(|r| r.name().clone()), Some(name.clone()));

        registry.remove(&name);
        assert!(registry.resolve_mut(id).is_none());
    }
}
