//! Object graph cache
//!
//! Snapshot of the host's instance graph taken by periodic rescans. The
//! cache owns everything the hierarchy pane renders between scans: the
//! alive set, parent/child edges, sorted sibling order, the scene handle
//! list, plus memoized search visibility and class display names. Handles
//! stored here are only trusted until the next rescan; instances whose
//! identity reads fault during a scan are skipped, not retried.

use hashbrown::HashMap;
use log::{debug, warn};
use smallvec::SmallVec;

use crate::host::{ClassRef, Host, InstanceRef, NodeRef, RawPtr};
use crate::meta;

/// Deepest hierarchy level the cache will walk; a parent cycle reported by
/// a corrupt host terminates here instead of overflowing the stack.
pub const MAX_TREE_DEPTH: usize = 64;

/// One scanned instance.
#[derive(Debug, Clone)]
pub struct InstanceEntry {
    pub instance: InstanceRef,
    pub name: String,
    /// Lowercased copy of the name, kept for sorting and search probes.
    pub name_lower: String,
    pub node: NodeRef,
    /// Parent hierarchy node, `None` at a root.
    pub parent: Option<NodeRef>,
    /// Owning scene handle, 0 when global/unscoped.
    pub scene: i32,
}

/// Cached view of the host object graph.
#[derive(Debug, Default)]
pub struct GraphCache {
    entries: HashMap<u64, InstanceEntry>,
    roots: Vec<InstanceRef>,
    children: HashMap<u64, Vec<InstanceRef>>,
    node_owner: HashMap<u64, InstanceRef>,
    scenes: Vec<i32>,
    /// Bumped on every completed rescan; selection code keys off it.
    generation: u64,
    skipped: usize,

    filter: String,
    filter_lower: String,
    /// Restrict visibility to one scene handle, `None` shows all.
    scene_filter: Option<i32>,
    visibility: HashMap<u64, bool>,

    class_names: HashMap<u64, String>,
    /// Per-instance lowercased join of component class names, built lazily
    /// for the class filter and dropped on rescan.
    class_blobs: HashMap<u64, String>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the snapshot from a fresh host enumeration.
    ///
    /// Returns the number of instances captured. Instances whose name or
    /// node read faults are dropped from the snapshot and counted in
    /// [`GraphCache::skipped`].
    pub fn rescan<H: Host>(&mut self, host: &H, include_inactive: bool) -> usize {
        self.entries.clear();
        self.roots.clear();
        self.children.clear();
        self.node_owner.clear();
        self.visibility.clear();
        self.class_blobs.clear();
        self.skipped = 0;

        let instances = match host.find_all_instances(include_inactive) {
            Ok(instances) => instances,
            Err(err) => {
                warn!("instance enumeration failed: {err}");
                self.scenes.clear();
                self.generation += 1;
                return 0;
            }
        };

        for instance in instances {
            let (name, node) = match (host.instance_name(instance), host.node_of(instance)) {
                (Ok(name), Ok(node)) => (name, node),
                _ => {
                    self.skipped += 1;
                    continue;
                }
            };
            // A faulting parent read demotes the instance to a root rather
            // than dropping it.
            let parent = host.parent_of(node).unwrap_or(None);
            let scene = host.instance_scene(instance).unwrap_or(0);

            self.node_owner.insert(node.raw(), instance);
            let name_lower = name.to_lowercase();
            self.entries.insert(
                instance.raw(),
                InstanceEntry {
                    instance,
                    name,
                    name_lower,
                    node,
                    parent,
                    scene,
                },
            );
        }

        // Parent edges pointing at nodes outside the snapshot orphan the
        // child up to root level.
        let mut roots = Vec::new();
        for entry in self.entries.values() {
            match entry.parent {
                Some(parent) if self.node_owner.contains_key(&parent.raw()) => {
                    self.children
                        .entry(parent.raw())
                        .or_default()
                        .push(entry.instance);
                }
                _ => roots.push(entry.instance),
            }
        }
        self.sort_siblings(&mut roots);
        self.roots = roots;
        let mut child_lists: Vec<u64> = self.children.keys().copied().collect();
        for key in child_lists.drain(..) {
            let mut list = self.children.remove(&key).unwrap_or_default();
            self.sort_siblings(&mut list);
            self.children.insert(key, list);
        }

        self.scenes = host.scene_handles().unwrap_or_default();
        self.generation += 1;

        if self.skipped > 0 {
            warn!("scan skipped {} faulting instance(s)", self.skipped);
        }
        debug!(
            "scan captured {} instance(s), {} root(s)",
            self.entries.len(),
            self.roots.len()
        );
        self.entries.len()
    }

    /// Case-insensitive name order, handle as the stable tiebreak.
    fn sort_siblings(&self, list: &mut [InstanceRef]) {
        list.sort_by(|a, b| {
            let name_a = self
                .entries
                .get(&a.raw())
                .map(|e| e.name_lower.as_str())
                .unwrap_or("");
            let name_b = self
                .entries
                .get(&b.raw())
                .map(|e| e.name_lower.as_str())
                .unwrap_or("");
            name_a.cmp(name_b).then_with(|| a.raw().cmp(&b.raw()))
        });
    }

    pub fn contains(&self, instance: InstanceRef) -> bool {
        self.entries.contains_key(&instance.raw())
    }

    pub fn entry(&self, instance: InstanceRef) -> Option<&InstanceEntry> {
        self.entries.get(&instance.raw())
    }

    pub fn roots(&self) -> &[InstanceRef] {
        &self.roots
    }

    pub fn children_of(&self, node: NodeRef) -> &[InstanceRef] {
        self.children
            .get(&node.raw())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Instance owning a hierarchy node captured by the last scan.
    pub fn owner_of(&self, node: NodeRef) -> Option<InstanceRef> {
        self.node_owner.get(&node.raw()).copied()
    }

    /// Instance whose object pointer equals `ptr`, if scanned.
    pub fn instance_by_ptr(&self, ptr: RawPtr) -> Option<InstanceRef> {
        self.entries
            .contains_key(&ptr.raw())
            .then_some(InstanceRef(ptr.raw()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Instances dropped by the last scan due to faulting reads.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Scene handles captured by the last scan, in load order.
    pub fn scenes(&self) -> &[i32] {
        &self.scenes
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstanceEntry> {
        self.entries.values()
    }

    // --- search filter ---

    pub fn set_filter(&mut self, text: &str) {
        if self.filter == text {
            return;
        }
        self.filter = text.to_string();
        self.filter_lower = text.to_lowercase();
        self.visibility.clear();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Restrict visibility to one scene handle, `None` for all scenes.
    pub fn set_scene_filter(&mut self, scene: Option<i32>) {
        if self.scene_filter != scene {
            self.scene_filter = scene;
            self.visibility.clear();
        }
    }

    pub fn scene_filter(&self) -> Option<i32> {
        self.scene_filter
    }

    fn scene_passes(&self, entry: &InstanceEntry) -> bool {
        self.scene_filter.is_none_or(|scene| entry.scene == scene)
    }

    /// Whether the instance survives the search and scene filters: it
    /// matches itself or has a matching descendant. Memoized until a
    /// filter or the snapshot changes.
    pub fn is_visible(&mut self, instance: InstanceRef) -> bool {
        self.visible_at_depth(instance, 0)
    }

    fn visible_at_depth(&mut self, instance: InstanceRef, depth: usize) -> bool {
        if depth > MAX_TREE_DEPTH {
            return false;
        }
        if self.filter_lower.is_empty() && self.scene_filter.is_none() {
            return true;
        }
        if let Some(&hit) = self.visibility.get(&instance.raw()) {
            return hit;
        }

        let mut hit = self
            .entries
            .get(&instance.raw())
            .map(|entry| {
                self.scene_passes(entry)
                    && (self.filter_lower.is_empty()
                        || entry.name_lower.contains(&self.filter_lower))
            })
            .unwrap_or(false);

        if !hit {
            let node = match self.entries.get(&instance.raw()) {
                Some(entry) => entry.node,
                None => return false,
            };
            let children: SmallVec<[InstanceRef; 8]> =
                self.children_of(node).iter().copied().collect();
            hit = children
                .into_iter()
                .any(|child| self.visible_at_depth(child, depth + 1));
        }

        self.visibility.insert(instance.raw(), hit);
        hit
    }

    // --- flat search ---

    /// Flat search across the snapshot: case-insensitive name substring
    /// plus an optional component class substring, both gated by the scene
    /// filter. Results come back in name order. Class probes go through
    /// the per-instance blob memo; instances whose components fault simply
    /// fail the class filter.
    pub fn search<H: Host>(
        &mut self,
        host: &H,
        name_filter: &str,
        class_filter: &str,
    ) -> Vec<InstanceRef> {
        let name_filter = name_filter.to_lowercase();
        let class_filter = class_filter.to_lowercase();

        let candidates: Vec<InstanceRef> = self
            .entries
            .values()
            .filter(|entry| {
                self.scene_passes(entry)
                    && (name_filter.is_empty() || entry.name_lower.contains(&name_filter))
            })
            .map(|entry| entry.instance)
            .collect();

        let mut hits = Vec::new();
        for instance in candidates {
            if class_filter.is_empty() || self.matches_class(host, instance, &class_filter) {
                hits.push(instance);
            }
        }
        self.sort_siblings(&mut hits);
        hits
    }

    fn matches_class<H: Host>(
        &mut self,
        host: &H,
        instance: InstanceRef,
        class_filter_lower: &str,
    ) -> bool {
        if !self.class_blobs.contains_key(&instance.raw()) {
            let blob = self.build_class_blob(host, instance);
            self.class_blobs.insert(instance.raw(), blob);
        }
        self.class_blobs[&instance.raw()].contains(class_filter_lower)
    }

    /// Lowercased join of the instance's component class names.
    fn build_class_blob<H: Host>(&mut self, host: &H, instance: InstanceRef) -> String {
        let Ok(components) = host.components_of(instance) else {
            return String::new();
        };
        let mut blob = String::new();
        for component in components {
            if let Ok(class) = host.class_of(component.as_ptr()) {
                blob.push_str(&self.class_name(host, class).to_lowercase());
                blob.push(';');
            }
        }
        blob
    }

    // --- class display names ---

    /// Memoized class display name; survives rescans since class metadata
    /// outlives instances.
    pub fn class_name<H: Host>(&mut self, host: &H, class: ClassRef) -> String {
        if let Some(name) = self.class_names.get(&class.raw()) {
            return name.clone();
        }
        let name = meta::class_display_name(host, class);
        // Placeholders are not cached so a transient fault can recover.
        if name != meta::INVALID_CLASS {
            self.class_names.insert(class.raw(), name.clone());
        }
        name
    }
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
    fn roots_sorted_case_insensitively() {
        let mut host = FakeHost::new();
        host.add_instance("Zeta");
        host.add_instance("alpha");
        host.add_instance("Beta");
        let cache = scanned(&host);

        let names: Vec<_> = cache
            .roots()
            .iter()
            .map(|i| cache.entry(*i).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn children_attach_under_parent_node() {
        let mut host = FakeHost::new();
        let root = host.add_instance("Root");
        let child_b = host.add_instance("b-child");
        let child_a = host.add_instance("A-child");
        host.set_parent(child_a, root);
        host.set_parent(child_b, root);
        let cache = scanned(&host);

        assert_eq!(cache.roots(), [root]);
        let node = cache.entry(root).unwrap().node;
        assert_eq!(cache.children_of(node), [child_a, child_b]);
        assert_eq!(cache.owner_of(node), Some(root));
    }

    #[test]
    fn faulting_instances_are_skipped() {
        let mut host = FakeHost::new();
        host.add_instance("Fine");
        let broken = host.add_instance("Broken");
        host.fault(broken.raw());
        let cache = scanned(&host);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.skipped(), 1);
        assert!(!cache.contains(broken));
    }

    #[test]
    fn inactive_instances_respect_scan_mode() {
        let mut host = FakeHost::new();
        let sleeping = host.add_instance("Sleeping");
        host.set_active(sleeping, false);

        let mut cache = GraphCache::new();
        cache.rescan(&host, false);
        assert!(!cache.contains(sleeping));
        cache.rescan(&host, true);
        assert!(cache.contains(sleeping));
    }

    #[test]
    fn rescan_drops_dead_instances_and_bumps_generation() {
        let mut host = FakeHost::new();
        let doomed = host.add_instance("Doomed");
        let mut cache = GraphCache::new();
        cache.rescan(&host, false);
        let first = cache.generation();
        assert!(cache.contains(doomed));

        host.remove_instance(doomed);
        cache.rescan(&host, false);
        assert!(!cache.contains(doomed));
        assert!(cache.generation() > first);
    }

    #[test]
    fn orphaned_parent_edge_promotes_to_root() {
        let mut host = FakeHost::new();
        let parent = host.add_instance("Parent");
        let child = host.add_instance("Child");
        host.set_parent(child, parent);
        host.remove_instance(parent);
        let cache = scanned(&host);

        assert_eq!(cache.roots(), [child]);
    }

    #[test]
    fn filter_keeps_matching_subtrees() {
        let mut host = FakeHost::new();
        let root = host.add_instance("World");
        let mid = host.add_instance("Mid");
        let leaf = host.add_instance("PlayerWeapon");
        let other = host.add_instance("Rock");
        host.set_parent(mid, root);
        host.set_parent(leaf, mid);

        let mut cache = scanned(&host);
        cache.set_filter("player");

        // Ancestors of a match stay visible so the path can be drawn.
        assert!(cache.is_visible(root));
        assert!(cache.is_visible(mid));
        assert!(cache.is_visible(leaf));
        assert!(!cache.is_visible(other));

        cache.set_filter("");
        assert!(cache.is_visible(other));
    }

    #[test]
    fn flat_search_combines_name_and_class_filters() {
        let mut host = FakeHost::new();
        let hero = host.add_instance("Hero");
        let boss = host.add_instance("BossEnemy");
        let crate_ = host.add_instance("Crate");
        let enemy_class = host.add_class("Game", "EnemyBrain");
        host.add_component(boss, enemy_class);
        let instance_class = host.instance_class();
        host.add_component(crate_, instance_class);

        let mut cache = scanned(&host);
        assert_eq!(cache.search(&host, "", ""), [boss, crate_, hero]);
        assert_eq!(cache.search(&host, "e", "enemybrain"), [boss]);
        assert!(cache.search(&host, "hero", "enemybrain").is_empty());
        assert_eq!(cache.search(&host, "crate", ""), [crate_]);
    }

    #[test]
    fn class_names_are_memoized() {
        let mut host = FakeHost::new();
        let class = host.add_class("Game", "Boss");
        let mut cache = GraphCache::new();
        assert_eq!(cache.class_name(&host, class), "Game.Boss");

        // A later metadata fault is masked by the memo.
        host.fault(class.raw());
        assert_eq!(cache.class_name(&host, class), "Game.Boss");
    }

    #[test]
    fn instance_lookup_by_pointer() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("Thing");
        let cache = scanned(&host);
        assert_eq!(cache.instance_by_ptr(instance.as_ptr()), Some(instance));
        assert_eq!(cache.instance_by_ptr(RawPtr(0xdead)), None);
    }

    #[test]
    fn lowercase_name_is_captured_at_scan() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("MixedCase");
        let cache = scanned(&host);
        assert_eq!(cache.entry(instance).unwrap().name_lower, "mixedcase");
    }

    #[test]
    fn scene_filter_gates_visibility_and_search() {
        let mut host = FakeHost::new();
        let town = host.add_instance("Town");
        let dungeon = host.add_instance("Dungeon");
        host.set_instance_scene(town, 1);
        host.set_instance_scene(dungeon, 2);

        let mut cache = scanned(&host);
        assert!(cache.is_visible(town));
        assert!(cache.is_visible(dungeon));

        cache.set_scene_filter(Some(1));
        assert!(cache.is_visible(town));
        assert!(!cache.is_visible(dungeon));
        assert_eq!(cache.search(&host, "", ""), [town]);

        cache.set_scene_filter(None);
        assert_eq!(cache.search(&host, "", ""), [dungeon, town]);
    }

    #[test]
    fn class_blob_survives_until_rescan() {
        let mut host = FakeHost::new();
        let boss = host.add_instance("Boss");
        let brain = host.add_class("Game", "EnemyBrain");
        let component = host.add_component(boss, brain);

        let mut cache = scanned(&host);
        assert_eq!(cache.search(&host, "", "enemybrain"), [boss]);

        // The blob memo masks a component fault between scans.
        host.fault(component.raw());
        assert_eq!(cache.search(&host, "", "enemybrain"), [boss]);

        // A rescan rebuilds the blob and the broken component drops out.
        cache.rescan(&host, false);
        assert!(cache.search(&host, "", "enemybrain").is_empty());
    }

    #[test]
    fn parent_cycle_terminates_visibility_walk() {
        let mut host = FakeHost::new();
        let a = host.add_instance("Alpha");
        let b = host.add_instance("Beta");
        host.set_parent(a, b);
        host.set_parent(b, a);

        let mut cache = scanned(&host);
        assert!(cache.roots().is_empty());

        cache.set_filter("nothing-matches");
        assert!(!cache.is_visible(a));
        assert!(!cache.is_visible(b));
    }
}
