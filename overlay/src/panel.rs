//! Inspector window UI
//!
//! Provides the egui window for browsing the instance hierarchy, editing
//! members, invoking methods, and reading the activity log.

use std::collections::HashSet;

use egui::{Color32, RichText};

use spyglass_core::access::{displayed_arg_count, FIELD_DRAW_MAX, METHOD_DRAW_MAX, UI_ARG_LIMIT};
use spyglass_core::cache::MAX_TREE_DEPTH;
use spyglass_core::config::{MAX_REFRESH_MS, MIN_REFRESH_MS};
use spyglass_core::host::{ComponentRef, InstanceRef, LoadMode};
use spyglass_core::meta::{self, MethodDesc};
use spyglass_core::value::{default_draft, TypeCode};
use spyglass_core::{FieldDisplay, Host, Inspector, MemberKey, Severity, MAX_LAYER};

/// Inspector window state.
///
/// Holds only widget-local state; everything observable lives in the core.
pub struct InspectorPanel {
    /// Hierarchy search box contents.
    search: String,
    /// Component class filter; a non-empty filter switches the hierarchy
    /// pane to a flat result list.
    class_search: String,
    /// Instances whose subtree is expanded.
    expanded: HashSet<u64>,
    /// Scene name entry for the loader.
    scene_name: String,
    /// Log pane text filter.
    log_filter: String,
}

impl Default for InspectorPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectorPanel {
    pub fn new() -> Self {
        Self {
            search: String::new(),
            class_search: String::new(),
            expanded: HashSet::new(),
            scene_name: String::new(),
            log_filter: String::new(),
        }
    }

    /// Flip overlay visibility; wired to the configured toggle key by the
    /// embedding application.
    pub fn toggle<H: Host>(&mut self, inspector: &mut Inspector<H>) {
        let visible = !inspector.is_visible();
        log::debug!("overlay {}", if visible { "shown" } else { "hidden" });
        inspector.set_visible(visible);
    }

    /// Drive the refresh clock and render the window when visible.
    pub fn render<H: Host>(
        &mut self,
        ctx: &egui::Context,
        inspector: &mut Inspector<H>,
        now_ms: u64,
    ) {
        inspector.tick(now_ms);
        if !inspector.is_visible() {
            return;
        }

        egui::Window::new("Spyglass")
            .id(egui::Id::new("spyglass_inspector_window"))
            .default_pos([20.0, 20.0])
            .default_size([900.0, 520.0])
            .resizable(true)
            .collapsible(true)
            .show(ctx, |ui| {
                if !inspector.is_ready() {
                    ui.label(RichText::new("runtime not ready").color(Color32::YELLOW));
                    return;
                }

                self.render_toolbar(ui, inspector, now_ms);
                ui.separator();

                ui.columns(3, |columns| {
                    egui::ScrollArea::vertical()
                        .id_salt("spyglass_hierarchy")
                        .auto_shrink([false, false])
                        .show(&mut columns[0], |ui| {
                            self.render_hierarchy(ui, inspector);
                        });
                    egui::ScrollArea::vertical()
                        .id_salt("spyglass_members")
                        .auto_shrink([false, false])
                        .show(&mut columns[1], |ui| {
                            self.render_members(ui, inspector);
                        });
                    egui::ScrollArea::vertical()
                        .id_salt("spyglass_log")
                        .auto_shrink([false, false])
                        .stick_to_bottom(inspector.config().overlay.log_auto_scroll)
                        .show(&mut columns[2], |ui| {
                            self.render_log(ui, inspector);
                        });
                });
            });
    }

    fn render_toolbar<H: Host>(
        &mut self,
        ui: &mut egui::Ui,
        inspector: &mut Inspector<H>,
        now_ms: u64,
    ) {
        ui.horizontal(|ui| {
            if ui.button("Refresh").clicked() {
                inspector.force_refresh(now_ms);
            }
            if ui.button("< Back").clicked() {
                inspector.select_back();
            }

            let mut include_inactive = inspector.config().scan.include_inactive;
            if ui.checkbox(&mut include_inactive, "Inactive").changed() {
                inspector.config_mut().scan.include_inactive = include_inactive;
                inspector.force_refresh(now_ms);
            }

            let mut auto_refresh = inspector.config().scan.auto_refresh;
            if ui.checkbox(&mut auto_refresh, "Auto").changed() {
                inspector.config_mut().scan.auto_refresh = auto_refresh;
            }
            let mut interval = inspector.config().scan.refresh_interval_ms;
            if ui
                .add(
                    egui::DragValue::new(&mut interval)
                        .range(MIN_REFRESH_MS..=MAX_REFRESH_MS)
                        .suffix(" ms"),
                )
                .changed()
            {
                inspector.config_mut().scan.refresh_interval_ms = interval;
            }

            ui.label("Find:");
            if ui.text_edit_singleline(&mut self.search).changed() {
                let search = self.search.clone();
                inspector.set_filter(&search);
            }

            ui.label("Class:");
            ui.text_edit_singleline(&mut self.class_search);
        });

        ui.horizontal(|ui| {
            let scenes = inspector.scenes().to_vec();
            let mut filter = inspector.cache().scene_filter();
            let shown = match filter {
                Some(scene) => format!("Scene {scene}"),
                None => "All scenes".to_string(),
            };
            egui::ComboBox::from_id_salt("spyglass_scene_filter")
                .selected_text(shown)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut filter, None, "All scenes");
                    for scene in scenes {
                        ui.selectable_value(&mut filter, Some(scene), format!("Scene {scene}"));
                    }
                });
            inspector.cache_mut().set_scene_filter(filter);

            ui.label("Load:");
            ui.text_edit_singleline(&mut self.scene_name);
            if ui.button("Single").clicked() {
                let name = self.scene_name.clone();
                inspector.load_scene(&name, LoadMode::Single);
            }
            if ui.button("Additive").clicked() {
                let name = self.scene_name.clone();
                inspector.load_scene(&name, LoadMode::Additive);
            }
        });
    }

    fn render_hierarchy<H: Host>(&mut self, ui: &mut egui::Ui, inspector: &mut Inspector<H>) {
        if inspector.cache().is_empty() {
            ui.label(RichText::new("no instances scanned").weak());
            return;
        }
        if !self.class_search.is_empty() {
            self.render_search_results(ui, inspector);
            return;
        }
        let roots = inspector.cache().roots().to_vec();
        for root in roots {
            self.render_node(ui, inspector, root, 0);
        }
    }

    fn render_search_results<H: Host>(&mut self, ui: &mut egui::Ui, inspector: &mut Inspector<H>) {
        let hits = inspector.search_instances(&self.search, &self.class_search);
        if hits.is_empty() {
            ui.label(RichText::new("no matches").weak());
            return;
        }
        for hit in hits {
            let Some(entry) = inspector.cache().entry(hit) else {
                continue;
            };
            let name = meta::clamp_label(&entry.name, meta::MAX_UI_LABEL_CHARS);
            let selected = inspector.selected() == Some(hit);
            if ui.selectable_label(selected, name).clicked() {
                inspector.select(hit);
            }
        }
    }

    fn render_node<H: Host>(
        &mut self,
        ui: &mut egui::Ui,
        inspector: &mut Inspector<H>,
        instance: InstanceRef,
        depth: usize,
    ) {
        if depth > MAX_TREE_DEPTH || !inspector.cache_mut().is_visible(instance) {
            return;
        }
        let Some(entry) = inspector.cache().entry(instance) else {
            return;
        };
        let name = meta::clamp_label(&entry.name, meta::MAX_UI_LABEL_CHARS);
        let node = entry.node;
        let children = inspector.cache().children_of(node).to_vec();
        let selected = inspector.selected() == Some(instance);

        if children.is_empty() {
            if ui.selectable_label(selected, name).clicked() {
                inspector.select(instance);
            }
            return;
        }

        let open = self.expanded.contains(&instance.raw());
        let header = egui::CollapsingHeader::new(name)
            .id_salt(instance.raw())
            .default_open(open)
            .show(ui, |ui| {
                for child in &children {
                    self.render_node(ui, inspector, *child, depth + 1);
                }
            });
        if header.header_response.clicked() {
            if open {
                self.expanded.remove(&instance.raw());
            } else {
                self.expanded.insert(instance.raw());
            }
            inspector.select(instance);
        }
    }

    fn render_members<H: Host>(&mut self, ui: &mut egui::Ui, inspector: &mut Inspector<H>) {
        let Some(selected) = inspector.selected() else {
            ui.label(RichText::new("nothing selected").weak());
            return;
        };
        let Some(entry) = inspector.cache().entry(selected) else {
            return;
        };
        ui.heading(meta::clamp_label(&entry.name, meta::MAX_UI_LABEL_CHARS));

        self.render_instance_controls(ui, inspector, selected);
        ui.separator();
        self.render_transform(ui, inspector);
        ui.separator();

        let components = inspector.selected_components();
        if components.is_empty() {
            ui.label(RichText::new("no components").weak());
            return;
        }

        let mut index = inspector.component_index().min(components.len() - 1);
        let current_name = inspector.component_class_name(components[index]);
        egui::ComboBox::from_id_salt("spyglass_component")
            .selected_text(current_name)
            .show_ui(ui, |ui| {
                for (i, component) in components.iter().enumerate() {
                    let label = inspector.component_class_name(*component);
                    ui.selectable_value(&mut index, i, label);
                }
            });
        if index != inspector.component_index() {
            inspector.set_component_index(index);
        }

        let component = components[index];
        ui.separator();
        self.render_fields(ui, inspector, component);
        ui.separator();
        self.render_methods(ui, inspector, component);
    }

    fn render_instance_controls<H: Host>(
        &mut self,
        ui: &mut egui::Ui,
        inspector: &mut Inspector<H>,
        selected: InstanceRef,
    ) {
        ui.horizontal(|ui| {
            let mut active = inspector
                .host()
                .instance_active(selected)
                .unwrap_or(false);
            if ui.checkbox(&mut active, "Active").changed() {
                inspector.set_selected_active(active);
            }

            let mut layer = inspector.host().instance_layer(selected).unwrap_or(0);
            ui.label("Layer:");
            if ui
                .add(egui::DragValue::new(&mut layer).range(0..=MAX_LAYER))
                .changed()
            {
                inspector.set_selected_layer(layer);
            }
        });
    }

    fn render_transform<H: Host>(&mut self, ui: &mut egui::Ui, inspector: &mut Inspector<H>) {
        if inspector.transform_edit_mut().is_none() {
            if ui.button("Edit transform").clicked() {
                inspector.begin_transform_edit();
            }
            return;
        }

        if let Some(edit) = inspector.transform_edit_mut() {
            for (label, triple) in [
                ("Position", &mut edit.position),
                ("Rotation", &mut edit.euler),
                ("Scale", &mut edit.scale),
            ] {
                ui.horizontal(|ui| {
                    ui.label(label);
                    for axis in triple.iter_mut() {
                        ui.add(egui::DragValue::new(axis).speed(0.1));
                    }
                });
            }
        }
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                inspector.apply_transform();
            } else if ui.button("Cancel").clicked() {
                inspector.cancel_transform_edit();
            }
        });
    }

    fn render_fields<H: Host>(
        &mut self,
        ui: &mut egui::Ui,
        inspector: &mut Inspector<H>,
        component: ComponentRef,
    ) {
        let rows = inspector.field_rows(component);
        if rows.is_empty() {
            ui.label(RichText::new("no fields").weak());
            return;
        }
        if rows.len() == FIELD_DRAW_MAX {
            ui.label(RichText::new("field list truncated").weak());
        }

        for row in rows {
            let name = meta::clamp_label(&row.desc.name, meta::MAX_UI_LABEL_CHARS);
            match row.display {
                FieldDisplay::Editable { current } => {
                    let key = MemberKey::field(component, &row.desc);
                    ui.horizontal(|ui| {
                        ui.label(format!("{name}: {}", row.desc.type_name));
                        {
                            let seed = current.clone();
                            let draft = inspector.access_mut().draft_mut(key, move || seed);
                            ui.text_edit_singleline(draft);
                        }
                        if ui.button("Set").clicked() {
                            let draft = inspector
                                .access_mut()
                                .drafts
                                .get(&key)
                                .cloned()
                                .unwrap_or(current);
                            inspector.commit_field(component, &row.desc, &draft);
                        }
                    });
                }
                FieldDisplay::Text { current } => {
                    let key = MemberKey::field(component, &row.desc);
                    ui.horizontal(|ui| {
                        let shown = match &current {
                            Some(text) => {
                                format!("\"{}\"", meta::clamp_label(text, meta::MAX_UI_LABEL_CHARS))
                            }
                            None => meta::NULL_NAME.to_string(),
                        };
                        ui.label(format!("{name}: string = {shown}"));
                        {
                            let seed = current.clone().unwrap_or_default();
                            let draft = inspector.access_mut().draft_mut(key, move || seed);
                            ui.text_edit_singleline(draft);
                        }
                        if ui.button("Set").clicked() {
                            let draft = inspector
                                .access_mut()
                                .drafts
                                .get(&key)
                                .cloned()
                                .unwrap_or_default();
                            inspector.commit_field(component, &row.desc, &draft);
                        }
                    });
                }
                FieldDisplay::Reference { ptr, preview } => {
                    ui.horizontal(|ui| {
                        ui.label(format!("{name}: {preview}"));
                        if !ptr.is_null() && ui.button("Jump").clicked() {
                            inspector.jump_to_reference(ptr);
                        }
                    });
                }
                FieldDisplay::Opaque { raw } => {
                    ui.label(
                        RichText::new(format!("{name}: {} @ {:#x}", row.desc.type_name, raw.raw()))
                            .weak()
                            .monospace(),
                    );
                }
                FieldDisplay::Error => {
                    ui.label(RichText::new(format!("{name}: <read fault>")).color(Color32::RED));
                }
            }
        }
    }

    fn render_methods<H: Host>(
        &mut self,
        ui: &mut egui::Ui,
        inspector: &mut Inspector<H>,
        component: ComponentRef,
    ) {
        let methods = inspector.method_rows(component);
        if methods.is_empty() {
            ui.label(RichText::new("no methods").weak());
            return;
        }
        if methods.len() == METHOD_DRAW_MAX {
            ui.label(RichText::new("method list truncated").weak());
        }

        for desc in methods {
            let displayed = displayed_arg_count(desc.arg_count);
            let signature =
                meta::method_signature(inspector.host(), &desc, displayed, desc.arg_count);
            egui::CollapsingHeader::new(signature)
                .id_salt(("spyglass_method", component.raw(), desc.method.raw()))
                .show(ui, |ui| {
                    self.render_method_body(ui, inspector, component, &desc, displayed);
                });
        }
    }

    fn render_method_body<H: Host>(
        &mut self,
        ui: &mut egui::Ui,
        inspector: &mut Inspector<H>,
        component: ComponentRef,
        desc: &MethodDesc,
        displayed: u32,
    ) {
        if desc.arg_count > UI_ARG_LIMIT {
            ui.label(
                RichText::new(format!(
                    "{} arguments, invoke limit is {UI_ARG_LIMIT}",
                    desc.arg_count
                ))
                .color(Color32::YELLOW),
            );
            return;
        }

        for index in 0..displayed {
            let label = meta::param_label(inspector.host(), desc.method, index);
            let code = inspector
                .host()
                .param_type(desc.method, index)
                .map(|ty| meta::effective_type_code(inspector.host(), ty))
                .unwrap_or(TypeCode::Other(0));
            let key = MemberKey::arg(component, desc, index);
            ui.horizontal(|ui| {
                ui.label(label);
                let draft = inspector
                    .access_mut()
                    .draft_mut(key, move || default_draft(code));
                ui.text_edit_singleline(draft);
            });
        }

        ui.horizontal(|ui| {
            let can_invoke = inspector.host().can_invoke();
            ui.add_enabled_ui(can_invoke, |ui| {
                if ui.button("Invoke").clicked() {
                    inspector.invoke_method(component, desc);
                }
            });
            if !can_invoke {
                ui.label(RichText::new("invoke unavailable").weak());
            }

            let key = MemberKey::result(component, desc);
            if let Some(result) = inspector.access_mut().results.get(&key) {
                let result = result.clone();
                ui.label(RichText::new(result).monospace());
            }
        });
    }

    fn render_log<H: Host>(&mut self, ui: &mut egui::Ui, inspector: &mut Inspector<H>) {
        ui.horizontal(|ui| {
            ui.label(format!("Log ({})", inspector.log().len()));
            if ui.button("Clear").clicked() {
                inspector.log_mut().clear();
            }
            let mut auto_scroll = inspector.config().overlay.log_auto_scroll;
            if ui.checkbox(&mut auto_scroll, "Follow").changed() {
                inspector.config_mut().overlay.log_auto_scroll = auto_scroll;
            }
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.log_filter);
        });
        ui.separator();
        let filter = self.log_filter.to_lowercase();
        for line in inspector.log().iter() {
            if !filter.is_empty() && !line.text.to_lowercase().contains(&filter) {
                continue;
            }
            ui.label(RichText::new(&line.text).color(severity_color(line.severity)));
        }
    }
}

fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Info => Color32::GRAY,
        Severity::Good => Color32::from_rgb(64, 200, 64),
        Severity::Warn => Color32::from_rgb(230, 190, 0),
        Severity::Error => Color32::from_rgb(230, 64, 64),
    }
}
