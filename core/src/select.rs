//! Selection and navigation
//!
//! Tracks the selected instance, the chosen component slot, and a bounded
//! back-history. Selection never outlives the snapshot that produced it:
//! after every rescan the selection is validated against the cache's alive
//! set, and navigating back skips history entries that died in the interim.
//!
//! Reference resolution turns an object pointer read out of a field into a
//! selectable instance, trying identity channels from cheapest to weakest:
//! direct pointer match, component ownership, cached native handle, and
//! finally the runtime identity number when the host exposes one.

use log::debug;

use crate::cache::GraphCache;
use crate::host::{Host, InstanceRef, RawPtr};
use crate::meta;

/// Most selections remembered for back-navigation.
pub const MAX_HISTORY: usize = 64;

/// Current selection plus back-history.
#[derive(Debug, Default)]
pub struct Selection {
    current: Option<InstanceRef>,
    component: usize,
    history: Vec<InstanceRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<InstanceRef> {
        self.current
    }

    /// Selected component slot, reset to 0 on every instance change.
    pub fn component_index(&self) -> usize {
        self.component
    }

    pub fn set_component_index(&mut self, index: usize) {
        self.component = index;
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Direct selection, as from a hierarchy click. Starts a fresh
    /// navigation trail.
    pub fn select_direct(&mut self, instance: InstanceRef) {
        self.history.clear();
        self.current = Some(instance);
        self.component = 0;
    }

    /// Navigation selection, as from following a reference. The previous
    /// selection goes onto the history so `back` can return to it.
    pub fn select_push(&mut self, instance: InstanceRef) {
        if self.current == Some(instance) {
            return;
        }
        if let Some(previous) = self.current {
            if self.history.len() == MAX_HISTORY {
                self.history.remove(0);
            }
            self.history.push(previous);
        }
        self.current = Some(instance);
        self.component = 0;
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.component = 0;
    }

    /// Drop selection and history both, as when the overlay hides.
    pub fn reset(&mut self) {
        self.clear();
        self.history.clear();
    }

    /// Drop the selection if the last scan no longer contains it. The
    /// history is left alone; dead entries are skipped lazily on `back`.
    pub fn validate(&mut self, cache: &GraphCache) {
        if let Some(current) = self.current
            && !cache.contains(current)
        {
            debug!("selected instance {:#x} left the graph", current.raw());
            self.clear();
        }
    }

    /// Navigate to the most recent still-alive history entry, skipping and
    /// discarding stale ones. Returns the new selection, or `None` (with
    /// the current selection untouched) when the history is exhausted.
    pub fn back(&mut self, cache: &GraphCache) -> Option<InstanceRef> {
        while let Some(candidate) = self.history.pop() {
            if cache.contains(candidate) && Some(candidate) != self.current {
                self.current = Some(candidate);
                self.component = 0;
                return Some(candidate);
            }
        }
        None
    }
}

/// Resolve an object pointer to a scanned instance.
///
/// Tries, in order: the pointer itself as an instance, ownership of the
/// pointer as a component, the host-side native handle, and the runtime
/// identity number. Every channel is best effort; a faulting probe falls
/// through to the next one.
pub fn resolve_reference<H: Host>(
    host: &H,
    cache: &GraphCache,
    ptr: RawPtr,
) -> Option<InstanceRef> {
    if ptr.is_null() {
        return None;
    }

    if let Some(instance) = cache.instance_by_ptr(ptr) {
        return Some(instance);
    }

    // Component pointers resolve to their owning instance.
    if let Ok(class) = host.class_of(ptr) {
        let component = &host.well_known().component;
        if meta::is_class_or_parent(host, class, &component.namespace, &component.name) {
            for entry in cache.iter() {
                let Ok(components) = host.components_of(entry.instance) else {
                    continue;
                };
                if components.iter().any(|c| c.as_ptr() == ptr) {
                    return Some(entry.instance);
                }
            }
        }
    }

    // Wrapper objects share a native handle with the instance they wrap.
    if let Ok(native) = host.native_handle(ptr)
        && !native.is_null()
    {
        for entry in cache.iter() {
            if host.native_handle(entry.instance.as_ptr()) == Ok(native) {
                return Some(entry.instance);
            }
        }
    }

    // Weakest channel: the runtime identity number, when resolved.
    if host.has_instance_id()
        && let Ok(id) = host.instance_id(ptr)
    {
        for entry in cache.iter() {
            if host.instance_id(entry.instance.as_ptr()) == Ok(id) {
                return Some(entry.instance);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_host::FakeHost;

    fn scanned(host: &FakeHost) -> GraphCache {
        let mut cache = GraphCache::new();
        cache.rescan(host, false);
        cache
    }

    #[test]
    fn push_select_builds_history_and_resets_component() {
        let mut host = FakeHost::new();
        let a = host.add_instance("A");
        let b = host.add_instance("B");

        let mut selection = Selection::new();
        selection.select_push(a);
        selection.set_component_index(3);
        selection.select_push(b);

        assert_eq!(selection.selected(), Some(b));
        assert_eq!(selection.component_index(), 0);
        assert_eq!(selection.history_len(), 1);

        // Re-selecting the current instance is a no-op.
        selection.select_push(b);
        assert_eq!(selection.history_len(), 1);
    }

    #[test]
    fn direct_select_starts_a_fresh_trail() {
        let mut host = FakeHost::new();
        let a = host.add_instance("A");
        let b = host.add_instance("B");
        let c = host.add_instance("C");

        let mut selection = Selection::new();
        selection.select_push(a);
        selection.select_push(b);
        assert_eq!(selection.history_len(), 1);

        selection.select_direct(c);
        assert_eq!(selection.selected(), Some(c));
        assert_eq!(selection.history_len(), 0);
    }

    #[test]
    fn history_is_bounded() {
        let mut host = FakeHost::new();
        let instances: Vec<_> = (0..(MAX_HISTORY + 10))
            .map(|i| host.add_instance(&format!("i{i}")))
            .collect();

        let mut selection = Selection::new();
        for instance in &instances {
            selection.select_push(*instance);
        }
        assert_eq!(selection.history_len(), MAX_HISTORY);
    }

    #[test]
    fn back_skips_stale_entries() {
        let mut host = FakeHost::new();
        let a = host.add_instance("A");
        let b = host.add_instance("B");
        let c = host.add_instance("C");

        let mut selection = Selection::new();
        selection.select_push(a);
        selection.select_push(b);
        selection.select_push(c);

        host.remove_instance(b);
        let cache = scanned(&host);

        // b is gone; back lands on a.
        assert_eq!(selection.back(&cache), Some(a));
        assert_eq!(selection.selected(), Some(a));
    }

    #[test]
    fn back_on_exhausted_history_keeps_selection() {
        let mut host = FakeHost::new();
        let a = host.add_instance("A");
        let cache = scanned(&host);

        let mut selection = Selection::new();
        selection.select_push(a);
        assert_eq!(selection.back(&cache), None);
        assert_eq!(selection.selected(), Some(a));
    }

    #[test]
    fn validate_clears_dead_selection() {
        let mut host = FakeHost::new();
        let doomed = host.add_instance("Doomed");
        let mut selection = Selection::new();
        selection.select_push(doomed);

        host.remove_instance(doomed);
        let cache = scanned(&host);
        selection.validate(&cache);
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn resolves_direct_instance_pointer() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("Target");
        let cache = scanned(&host);

        assert_eq!(
            resolve_reference(&host, &cache, instance.as_ptr()),
            Some(instance)
        );
        assert_eq!(resolve_reference(&host, &cache, RawPtr::NULL), None);
    }

    #[test]
    fn resolves_component_to_owner() {
        let mut host = FakeHost::new();
        let owner = host.add_instance("Owner");
        let component_base = host.component_class();
        let class = host.add_class_with_parent("Game", "Mover", component_base);
        let component = host.add_component(owner, class);
        let cache = scanned(&host);

        assert_eq!(
            resolve_reference(&host, &cache, component.as_ptr()),
            Some(owner)
        );
    }

    #[test]
    fn resolves_via_native_handle() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("Wrapped");
        let native = host.native_handle(instance.as_ptr()).unwrap();

        // A distinct wrapper object sharing the instance's native handle.
        let wrapper_class = host.add_class("Game", "Wrapper");
        let wrapper = host.add_object(wrapper_class);
        host.set_native_handle(wrapper, native);

        let cache = scanned(&host);
        assert_eq!(resolve_reference(&host, &cache, wrapper), Some(instance));
    }

    #[test]
    fn resolves_via_instance_id_as_last_resort() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("Identified");
        let id = host.instance_id(instance.as_ptr()).unwrap();

        let proxy_class = host.add_class("Game", "Proxy");
        let proxy = host.add_object(proxy_class);
        host.set_instance_id_of(proxy, id);

        let cache = scanned(&host);
        assert_eq!(resolve_reference(&host, &cache, proxy), Some(instance));

        host.instance_id_available = false;
        assert_eq!(resolve_reference(&host, &cache, proxy), None);
    }
}
