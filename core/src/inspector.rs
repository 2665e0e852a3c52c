//! Inspector facade
//!
//! Owns the host connection and all inspector state: the graph cache, the
//! selection, edit drafts, the activity log, and the refresh clock. The
//! overlay talks only to this type; every mutation routes through here so
//! outcomes land in the activity log uniformly.

use log::info;

use crate::access::{self, AccessState, FieldRow, MemberKey};
use crate::cache::GraphCache;
use crate::config::Config;
use crate::host::{ComponentRef, Host, InstanceRef, LoadMode, RawPtr};
use crate::logbuf::LogBuffer;
use crate::meta::{self, MethodDesc};
use crate::select::{self, Selection};

/// Instance layer values accepted by the layer editor.
pub const MAX_LAYER: u32 = 31;

/// Editable snapshot of a node transform.
///
/// Taken once when editing starts so typing does not fight the running
/// simulation; written back in a single call on apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformEdit {
    pub position: [f32; 3],
    pub euler: [f32; 3],
    pub scale: [f32; 3],
}

/// The inspector core.
pub struct Inspector<H: Host> {
    host: H,
    config: Config,
    cache: GraphCache,
    selection: Selection,
    access: AccessState,
    log: LogBuffer,
    edit: Option<TransformEdit>,
    visible: bool,
    /// Instant of the last completed scan; `None` forces a scan on the
    /// next tick.
    last_scan_ms: Option<u64>,
}

impl<H: Host> Inspector<H> {
    pub fn new(host: H, mut config: Config) -> Self {
        config.clamp();
        let visible = config.overlay.start_visible;
        Self {
            host,
            config,
            cache: GraphCache::new(),
            selection: Selection::new(),
            access: AccessState::new(),
            log: LogBuffer::new(),
            edit: None,
            visible,
            last_scan_ms: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    #[cfg(test)]
    pub(crate) fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut GraphCache {
        &mut self.cache
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogBuffer {
        &mut self.log
    }

    pub fn access_mut(&mut self) -> &mut AccessState {
        &mut self.access
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the overlay. Becoming visible schedules an immediate
    /// rescan; hiding drops the selection, history, drafts, and any
    /// in-progress transform edit, and pauses the refresh clock.
    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.last_scan_ms = None;
        }
        if !visible && self.visible {
            self.selection.reset();
            self.access.clear();
            self.edit = None;
        }
        self.visible = visible;
    }

    /// Whether the host's reflection domain is attachable yet.
    pub fn is_ready(&self) -> bool {
        self.host.is_ready()
    }

    /// Drive the refresh clock. A pending scan (first attach, forced, or
    /// post scene load) always runs; after that the timer only rescans
    /// when auto refresh is enabled and the interval has elapsed.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.visible || !self.host.is_ready() {
            return;
        }
        let due = match self.last_scan_ms {
            None => true,
            Some(last) => {
                self.config.scan.auto_refresh
                    && now_ms.saturating_sub(last) >= self.config.scan.refresh_interval_ms
            }
        };
        if due {
            self.rescan(now_ms);
        }
    }

    /// Rescan immediately, ignoring the interval.
    pub fn force_refresh(&mut self, now_ms: u64) {
        if self.host.is_ready() {
            self.rescan(now_ms);
        }
    }

    fn rescan(&mut self, now_ms: u64) {
        let include_inactive = self.config.scan.include_inactive;
        let count = self.cache.rescan(&self.host, include_inactive);
        self.last_scan_ms = Some(now_ms);

        let had_selection = self.selection.selected().is_some();
        self.selection.validate(&self.cache);
        if had_selection && self.selection.selected().is_none() {
            self.edit = None;
            self.log.warn("selected instance left the graph".to_string());
        }
        self.prune_dead_drafts();
        self.clamp_component_index();

        info!(
            "scan: {count} instance(s), {} skipped",
            self.cache.skipped()
        );
    }

    /// Drop drafts and results whose owning component no longer resolves.
    /// Live owners keep their half-typed edits across scans.
    fn prune_dead_drafts(&mut self) {
        let host = &self.host;
        self.access
            .drafts
            .retain(|key, _| host.class_of(RawPtr(key.owner)).is_ok());
        self.access
            .results
            .retain(|key, _| host.class_of(RawPtr(key.owner)).is_ok());
    }

    fn clamp_component_index(&mut self) {
        let Some(selected) = self.selection.selected() else {
            return;
        };
        let count = self
            .host
            .components_of(selected)
            .map(|c| c.len())
            .unwrap_or(0);
        if self.selection.component_index() >= count {
            self.selection.set_component_index(0);
        }
    }

    // --- selection ---

    pub fn selected(&self) -> Option<InstanceRef> {
        self.selection.selected()
    }

    pub fn component_index(&self) -> usize {
        self.selection.component_index()
    }

    pub fn set_component_index(&mut self, index: usize) {
        self.selection.set_component_index(index);
    }

    /// Direct selection from the hierarchy; starts a fresh navigation
    /// trail. Drafts stay keyed by member and survive the change.
    pub fn select(&mut self, instance: InstanceRef) {
        if self.selection.selected() != Some(instance) {
            self.edit = None;
        }
        self.selection.select_direct(instance);
    }

    pub fn select_back(&mut self) -> Option<InstanceRef> {
        let landed = self.selection.back(&self.cache);
        if landed.is_some() {
            self.edit = None;
        }
        landed
    }

    /// Jump to the instance a reference field points at, if resolvable.
    /// The previous selection stays reachable through `select_back`.
    pub fn jump_to_reference(&mut self, ptr: RawPtr) -> Option<InstanceRef> {
        match select::resolve_reference(&self.host, &self.cache, ptr) {
            Some(instance) => {
                if self.selection.selected() != Some(instance) {
                    self.edit = None;
                }
                self.selection.select_push(instance);
                Some(instance)
            }
            None => {
                self.log
                    .warn(format!("reference {:#x} did not resolve", ptr.raw()));
                None
            }
        }
    }

    pub fn set_filter(&mut self, text: &str) {
        self.cache.set_filter(text);
    }

    /// Flat search over the cached graph by instance name and component
    /// class name substrings.
    pub fn search_instances(&mut self, name_filter: &str, class_filter: &str) -> Vec<InstanceRef> {
        self.cache.search(&self.host, name_filter, class_filter)
    }

    /// Components of the selected instance, in host order.
    pub fn selected_components(&self) -> Vec<ComponentRef> {
        let Some(selected) = self.selection.selected() else {
            return Vec::new();
        };
        self.host.components_of(selected).unwrap_or_default()
    }

    /// Component at the selected slot.
    pub fn selected_component(&self) -> Option<ComponentRef> {
        self.selected_components()
            .get(self.selection.component_index())
            .copied()
    }

    /// Display name of a component's class, memoized.
    pub fn component_class_name(&mut self, component: ComponentRef) -> String {
        match self.host.class_of(component.as_ptr()) {
            Ok(class) => self.cache.class_name(&self.host, class),
            Err(_) => meta::INVALID_CLASS.to_string(),
        }
    }

    // --- member access ---

    pub fn field_rows(&self, component: ComponentRef) -> Vec<FieldRow> {
        access::field_rows(&self.host, component)
    }

    pub fn method_rows(&self, component: ComponentRef) -> Vec<MethodDesc> {
        access::method_rows(&self.host, component)
    }

    /// Parse and commit a field draft, logging the outcome.
    pub fn commit_field(
        &mut self,
        component: ComponentRef,
        desc: &meta::FieldDesc,
        draft: &str,
    ) -> bool {
        match access::apply_field_draft(&mut self.host, component, desc, draft) {
            Ok(written) => {
                self.log.good(format!(
                    "wrote {} = {}",
                    desc.name,
                    crate::value::format_value(&written)
                ));
                self.access
                    .drafts
                    .remove(&MemberKey::field(component, desc));
                true
            }
            Err(err) => {
                self.log.error(format!("write {} failed: {err}", desc.name));
                false
            }
        }
    }

    /// Invoke a method using the current argument drafts; the formatted
    /// result (or error) lands in the result slot and the log.
    pub fn invoke_method(&mut self, component: ComponentRef, desc: &MethodDesc) {
        let args: Vec<String> = (0..desc.arg_count)
            .map(|index| {
                self.access
                    .drafts
                    .get(&MemberKey::arg(component, desc, index))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        let key = MemberKey::result(component, desc);
        match access::invoke(&mut self.host, component, desc, &args) {
            Ok(result) => {
                self.log.good(format!("{} -> {result}", desc.name));
                self.access.results.insert(key, result);
            }
            Err(err) => {
                self.log.error(format!("{} failed: {err}", desc.name));
                self.access.results.insert(key, err.to_string());
            }
        }
    }

    // --- instance surface ---

    pub fn set_selected_active(&mut self, active: bool) {
        let Some(selected) = self.selection.selected() else {
            return;
        };
        match self.host.set_instance_active(selected, active) {
            Ok(()) => self.log.good(format!(
                "instance {}",
                if active { "activated" } else { "deactivated" }
            )),
            Err(err) => self.log.error(format!("active toggle failed: {err}")),
        }
    }

    pub fn set_selected_layer(&mut self, layer: u32) {
        let Some(selected) = self.selection.selected() else {
            return;
        };
        let layer = layer.min(MAX_LAYER);
        match self.host.set_instance_layer(selected, layer) {
            Ok(()) => self.log.good(format!("layer set to {layer}")),
            Err(err) => self.log.error(format!("layer change failed: {err}")),
        }
    }

    /// Snapshot the selected instance's transform as the edit target.
    /// Returns whether a snapshot could be taken.
    pub fn begin_transform_edit(&mut self) -> bool {
        self.edit = (|| {
            let selected = self.selection.selected()?;
            let node = self.cache.entry(selected)?.node;
            Some(TransformEdit {
                position: self.host.node_local_position(node).ok()?,
                euler: self.host.node_euler(node).ok()?,
                scale: self.host.node_local_scale(node).ok()?,
            })
        })();
        self.edit.is_some()
    }

    /// The in-progress edit target, if any.
    pub fn transform_edit_mut(&mut self) -> Option<&mut TransformEdit> {
        self.edit.as_mut()
    }

    pub fn cancel_transform_edit(&mut self) {
        self.edit = None;
    }

    /// Write the edit target back to the selected instance's node and
    /// clear it.
    pub fn apply_transform(&mut self) -> bool {
        let Some(edit) = self.edit.take() else {
            return false;
        };
        let Some(selected) = self.selection.selected() else {
            return false;
        };
        let Some(node) = self.cache.entry(selected).map(|e| e.node) else {
            return false;
        };
        match self
            .host
            .set_node_transform(node, edit.position, edit.euler, edit.scale)
        {
            Ok(()) => {
                self.log.good("transform applied".to_string());
                true
            }
            Err(err) => {
                self.log.error(format!("transform apply failed: {err}"));
                false
            }
        }
    }

    // --- scenes ---

    pub fn scenes(&self) -> &[i32] {
        self.cache.scenes()
    }

    pub fn load_scene(&mut self, name: &str, mode: LoadMode) {
        let name = name.trim();
        if name.is_empty() {
            self.log.warn("scene name is empty".to_string());
            return;
        }
        match self.host.load_scene(name, mode) {
            Ok(()) => {
                self.log.good(format!("scene load requested: {name}"));
                // The graph is about to change wholesale.
                self.last_scan_ms = None;
            }
            Err(err) => self.log.error(format!("scene load failed: {err}")),
        }
    }
}
