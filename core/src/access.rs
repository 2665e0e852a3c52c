//! Member access engine
//!
//! Reads, edits, and invokes members of a selected component. Field values
//! are re-read every frame and rendered from formatted snapshots; edits go
//! through draft strings that are parsed and width-checked before a single
//! typed write. Invocation marshals primitive and string arguments into
//! the host's generic invoke entry point and formats the boxed result.

use hashbrown::HashMap;
use log::warn;

use crate::host::{ArgSlot, ComponentRef, Host, HostError, InvokeError, RawPtr};
use crate::meta::{self, FieldDesc, MethodDesc, MAX_UI_LABEL_CHARS};
use crate::value::{self, ParseError, TypeCode, Value};

/// Absolute argument-count bound; methods beyond it are rejected outright.
pub const HARD_ARG_LIMIT: u32 = 128;
/// Arguments the invoke surface will actually marshal.
pub const UI_ARG_LIMIT: u32 = 16;
/// Fields drawn per component.
pub const FIELD_DRAW_MAX: usize = 128;
/// Methods drawn per component.
pub const METHOD_DRAW_MAX: usize = 256;

/// Arguments whose metadata the UI may read for a method. A count past the
/// hard ceiling marks the descriptor as suspect; its parameter list is
/// hidden entirely and no per-argument metadata is ever fetched.
pub fn displayed_arg_count(arg_count: u32) -> u32 {
    if arg_count > HARD_ARG_LIMIT {
        0
    } else {
        arg_count.min(UI_ARG_LIMIT)
    }
}

/// Stable identity for a draft or result slot, surviving re-reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub owner: u64,
    pub member: u64,
    pub arg: u32,
}

impl MemberKey {
    pub fn field(component: ComponentRef, desc: &FieldDesc) -> Self {
        Self {
            owner: component.raw(),
            member: desc.field.raw(),
            arg: 0,
        }
    }

    pub fn arg(component: ComponentRef, desc: &MethodDesc, index: u32) -> Self {
        Self {
            owner: component.raw(),
            member: desc.method.raw(),
            arg: index,
        }
    }

    pub fn result(component: ComponentRef, desc: &MethodDesc) -> Self {
        Self {
            owner: component.raw(),
            member: desc.method.raw(),
            arg: u32::MAX,
        }
    }
}

/// Edit drafts and last invoke results, keyed by member.
///
/// Cleared wholesale when the selection changes; entries are otherwise
/// retained so half-typed edits survive the refresh cycle.
#[derive(Debug, Default)]
pub struct AccessState {
    pub drafts: HashMap<MemberKey, String>,
    pub results: HashMap<MemberKey, String>,
}

impl AccessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.drafts.clear();
        self.results.clear();
    }

    /// Draft string for a member, seeded from `init` on first access.
    pub fn draft_mut(&mut self, key: MemberKey, init: impl FnOnce() -> String) -> &mut String {
        self.drafts.entry(key).or_insert_with(init)
    }
}

/// Failure of a member operation, rendered into the activity log.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
    /// One invoke argument failed to parse.
    #[error("argument {index} rejected: {source}")]
    Arg { index: u32, source: ParseError },
    #[error("method takes {0} argument(s), limit is {1}")]
    TooManyArgs(u32, u32),
    #[error("member access faulted")]
    Fault,
    #[error("runtime invoke unavailable")]
    Unavailable,
    #[error("{0}")]
    Invoke(InvokeError),
}

impl From<HostError> for AccessError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Fault => AccessError::Fault,
            HostError::Unavailable => AccessError::Unavailable,
        }
    }
}

/// How one field renders in the member pane.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDisplay {
    /// Editable primitive with its formatted current value.
    Editable { current: String },
    /// String content, quoted; read-only.
    Text { current: Option<String> },
    /// Object reference with a preview label; jumpable when non-null.
    Reference { ptr: RawPtr, preview: String },
    /// Unsupported type shown as a raw pointer-sized read.
    Opaque { raw: RawPtr },
    /// The read faulted this frame.
    Error,
}

#[derive(Debug, Clone)]
pub struct FieldRow {
    pub desc: FieldDesc,
    pub display: FieldDisplay,
}

fn read_field_value<H: Host>(
    host: &H,
    component: ComponentRef,
    desc: &FieldDesc,
) -> Result<Value, HostError> {
    if desc.is_static() {
        host.read_static(desc.field, desc.code)
    } else {
        host.read_instance(component, desc.offset as u32, desc.code)
    }
}

fn read_field_raw<H: Host>(
    host: &H,
    component: ComponentRef,
    desc: &FieldDesc,
) -> Result<RawPtr, HostError> {
    if desc.is_static() {
        host.read_static_raw(desc.field)
    } else {
        host.read_instance_raw(component, desc.offset as u32)
    }
}

fn reference_preview<H: Host>(host: &H, ptr: RawPtr) -> String {
    if ptr.is_null() {
        return meta::NULL_NAME.to_string();
    }
    match host.class_of(ptr) {
        Ok(class) => meta::clamp_label(&meta::class_display_name(host, class), MAX_UI_LABEL_CHARS),
        Err(_) => meta::INVALID_CLASS.to_string(),
    }
}

fn field_display<H: Host>(host: &H, component: ComponentRef, desc: &FieldDesc) -> FieldDisplay {
    // Strings are editable but live behind a pointer; the typed read path
    // cannot carry them, so they must be picked off first.
    if desc.code == TypeCode::Str {
        return match read_field_raw(host, component, desc) {
            Ok(ptr) if ptr.is_null() => FieldDisplay::Text { current: None },
            Ok(ptr) => match host.read_string(ptr) {
                Ok(text) => FieldDisplay::Text {
                    current: Some(text),
                },
                Err(_) => FieldDisplay::Error,
            },
            Err(_) => FieldDisplay::Error,
        };
    }

    if value::is_editable(desc.code) {
        return match read_field_value(host, component, desc) {
            Ok(current) => FieldDisplay::Editable {
                current: value::format_value(&current),
            },
            Err(_) => FieldDisplay::Error,
        };
    }

    if value::is_reference(desc.code) {
        return match read_field_raw(host, component, desc) {
            Ok(ptr) => FieldDisplay::Reference {
                ptr,
                preview: reference_preview(host, ptr),
            },
            Err(_) => FieldDisplay::Error,
        };
    }

    match read_field_raw(host, component, desc) {
        Ok(raw) => FieldDisplay::Opaque { raw },
        Err(_) => FieldDisplay::Error,
    }
}

/// Field rows for one component, capped at [`FIELD_DRAW_MAX`]. Descriptors
/// that fault are dropped from the list for this frame.
pub fn field_rows<H: Host>(host: &H, component: ComponentRef) -> Vec<FieldRow> {
    let fields = match host.fields_of(component) {
        Ok(fields) => fields,
        Err(err) => {
            warn!("field enumeration faulted: {err}");
            return Vec::new();
        }
    };

    fields
        .into_iter()
        .take(FIELD_DRAW_MAX)
        .filter_map(|field| {
            let desc = FieldDesc::read(host, field)?;
            let display = field_display(host, component, &desc);
            Some(FieldRow { desc, display })
        })
        .collect()
}

/// Method descriptors for one component, capped at [`METHOD_DRAW_MAX`].
pub fn method_rows<H: Host>(host: &H, component: ComponentRef) -> Vec<MethodDesc> {
    let methods = match host.methods_of(component) {
        Ok(methods) => methods,
        Err(err) => {
            warn!("method enumeration faulted: {err}");
            return Vec::new();
        }
    };

    methods
        .into_iter()
        .take(METHOD_DRAW_MAX)
        .filter_map(|method| MethodDesc::read(host, method))
        .collect()
}

/// Parse a draft and write it to the field. Returns the written value so
/// the caller can log what was committed.
pub fn apply_field_draft<H: Host>(
    host: &mut H,
    component: ComponentRef,
    desc: &FieldDesc,
    draft: &str,
) -> Result<Value, AccessError> {
    let parsed = value::parse_value(desc.code, draft)?;
    if desc.is_static() {
        host.write_static(desc.field, &parsed)?;
    } else {
        host.write_instance(component, desc.offset as u32, &parsed)?;
    }
    Ok(parsed)
}

fn marshal_arg<H: Host>(
    host: &H,
    desc: &MethodDesc,
    index: u32,
    draft: &str,
) -> Result<ArgSlot, AccessError> {
    let ty = host.param_type(desc.method, index).map_err(AccessError::from)?;
    let code = meta::effective_type_code(host, ty);

    if code == TypeCode::Str {
        return Ok(ArgSlot::Text(draft.to_string()));
    }
    if !value::is_editable(code) {
        return Err(AccessError::Arg {
            index,
            source: ParseError::Unsupported,
        });
    }

    let parsed =
        value::parse_value(code, draft).map_err(|source| AccessError::Arg { index, source })?;
    let bytes = parsed.to_le_bytes().ok_or(AccessError::Arg {
        index,
        source: ParseError::Unsupported,
    })?;
    Ok(ArgSlot::Bytes { code, bytes })
}

fn format_result<H: Host>(host: &H, desc: &MethodDesc, result: RawPtr) -> String {
    let code = meta::effective_type_code(host, desc.return_type);
    if code == TypeCode::Void {
        return "<void>".to_string();
    }
    if result.is_null() {
        return meta::NULL_NAME.to_string();
    }
    if code == TypeCode::Str {
        return match host.read_string(result) {
            Ok(text) => format!("\"{}\"", meta::clamp_label(&text, MAX_UI_LABEL_CHARS)),
            Err(_) => meta::INVALID_NAME.to_string(),
        };
    }
    if value::is_editable(code)
        && let Ok(unboxed) = host.unbox(result, code)
    {
        return value::format_value(&unboxed);
    }
    format!("{:#x}", result.raw())
}

/// Invoke a method with textual argument drafts.
///
/// Static methods get no receiver; everything else receives `component`.
/// Returns the formatted result line for the log and result slot.
pub fn invoke<H: Host>(
    host: &mut H,
    component: ComponentRef,
    desc: &MethodDesc,
    arg_drafts: &[String],
) -> Result<String, AccessError> {
    if !host.can_invoke() {
        return Err(AccessError::Unavailable);
    }
    if desc.arg_count > HARD_ARG_LIMIT {
        return Err(AccessError::TooManyArgs(desc.arg_count, HARD_ARG_LIMIT));
    }
    if desc.arg_count > UI_ARG_LIMIT {
        return Err(AccessError::TooManyArgs(desc.arg_count, UI_ARG_LIMIT));
    }

    let mut args = Vec::with_capacity(desc.arg_count as usize);
    for index in 0..desc.arg_count {
        let draft = arg_drafts
            .get(index as usize)
            .map(String::as_str)
            .unwrap_or("");
        args.push(marshal_arg(host, desc, index, draft)?);
    }

    let receiver = if desc.is_static() {
        None
    } else {
        Some(component)
    };

    let result = host
        .runtime_invoke(desc.method, receiver, &args)
        .map_err(|err| match err {
            InvokeError::Unavailable => AccessError::Unavailable,
            other => AccessError::Invoke(other),
        })?;

    Ok(format_result(host, desc, result))
}
