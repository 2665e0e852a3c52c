//! Metadata reader
//!
//! Safe accessors over host reflection metadata. Raw name strings coming
//! out of the host are copy-sanitized (printable ASCII only, length capped)
//! before anything renders them; faults surface as placeholder tokens, and
//! the parent-chain walk is depth bounded so a corrupted chain cannot hang
//! the inspector.

use bitflags::bitflags;

use crate::host::{ClassRef, FieldRef, Host, MethodRef, RawBytes, TypeRef};
use crate::value::TypeCode;

/// Longest accepted metadata name, in bytes.
pub const MAX_NAME_BYTES: usize = 128;
/// Inline UI label cap, in chars.
pub const MAX_UI_LABEL_CHARS: usize = 96;
/// Full method signature cap, in chars.
pub const MAX_SIGNATURE_CHARS: usize = 384;
/// Parent-chain walk bound; guarantees termination on a corrupted cycle.
pub const MAX_PARENT_DEPTH: usize = 64;

pub const NULL_NAME: &str = "<null>";
pub const INVALID_NAME: &str = "<invalid-name>";
pub const UNNAMED: &str = "<unnamed>";
pub const INVALID_CLASS: &str = "<invalid-class>";
pub const UNKNOWN_CLASS: &str = "<unknown>";

bitflags! {
    /// Method attribute bits the inspector cares about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u32 {
        const STATIC = 0x0010;
    }
}

fn is_printable_ascii(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// Copy-sanitize a raw metadata name.
///
/// Accepts only non-empty runs of printable ASCII shorter than
/// [`MAX_NAME_BYTES`]; anything else collapses to a placeholder token.
pub fn sanitize_name(raw: Option<&[u8]>) -> String {
    let Some(bytes) = raw else {
        return NULL_NAME.to_string();
    };
    if bytes.is_empty() || bytes.len() >= MAX_NAME_BYTES {
        return INVALID_NAME.to_string();
    }
    if !bytes.iter().copied().all(is_printable_ascii) {
        return INVALID_NAME.to_string();
    }
    // Printable ASCII is valid UTF-8 by construction.
    String::from_utf8_lossy(bytes).into_owned()
}

/// True when sanitization produced a placeholder instead of a usable name.
fn is_placeholder(label: &str) -> bool {
    label.is_empty() || label == NULL_NAME || label == INVALID_NAME
}

/// Sanitized member label with a stable fallback derived from the member's
/// handle, so corrupted names still render uniquely.
pub fn member_label(raw: Option<&[u8]>, fallback_prefix: &str, identity: u64) -> String {
    let label = sanitize_name(raw);
    if is_placeholder(&label) {
        return format!("{fallback_prefix}_{identity:#x}");
    }
    label
}

/// Clamp a label for rendering, marking truncation with an ellipsis.
pub fn clamp_label(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    if max_chars <= 3 {
        return value.chars().take(max_chars).collect();
    }
    let mut out: String = value.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Human-readable class name: `{namespace}.{name}`, bare `{name}` when the
/// namespace is empty or unusable, placeholders on fault.
pub fn class_display_name<H: Host>(host: &H, class: ClassRef) -> String {
    if class.raw() == 0 {
        return UNKNOWN_CLASS.to_string();
    }
    let Ok(info) = host.class_info(class) else {
        return INVALID_CLASS.to_string();
    };

    let mut name = sanitize_name(info.name.as_deref());
    if is_placeholder(&name) {
        name = UNNAMED.to_string();
    }

    let namespace = sanitize_name(info.namespace.as_deref());
    if is_placeholder(&namespace) {
        return name;
    }

    format!("{namespace}.{name}")
}

fn bytes_eq(raw: Option<&RawBytes>, expected: &str) -> bool {
    raw.map(|bytes| bytes.as_slice() == expected.as_bytes())
        .unwrap_or(false)
}

/// Whether `class` is `namespace.name` or inherits from it.
///
/// Walks the parent chain at most [`MAX_PARENT_DEPTH`] steps and stops on a
/// self-parent, so a cycle introduced by corrupt metadata still terminates.
/// An empty `namespace` matches any namespace.
pub fn is_class_or_parent<H: Host>(
    host: &H,
    class: ClassRef,
    namespace: &str,
    name: &str,
) -> bool {
    if name.is_empty() {
        return false;
    }

    let mut current = class;
    for _ in 0..MAX_PARENT_DEPTH {
        let Ok(info) = host.class_info(current) else {
            return false;
        };

        if bytes_eq(info.name.as_ref(), name)
            && (namespace.is_empty() || bytes_eq(info.namespace.as_ref(), namespace))
        {
            return true;
        }

        match info.parent {
            Some(parent) if parent != current => current = parent,
            _ => return false,
        }
    }

    false
}

fn map_system_primitive(namespace: Option<&RawBytes>, name: Option<&RawBytes>) -> Option<TypeCode> {
    if !bytes_eq(namespace, "System") {
        return None;
    }
    let name = name?;
    let code = match name.as_slice() {
        b"Boolean" => TypeCode::Bool,
        b"Char" => TypeCode::Char,
        b"SByte" => TypeCode::I1,
        b"Byte" => TypeCode::U1,
        b"Int16" => TypeCode::I2,
        b"UInt16" => TypeCode::U2,
        b"Int32" => TypeCode::I4,
        b"UInt32" => TypeCode::U4,
        b"Single" => TypeCode::R4,
        b"Double" => TypeCode::R8,
        b"String" => TypeCode::Str,
        b"Object" => TypeCode::Object,
        _ => return None,
    };
    Some(code)
}

/// Effective type code of a type reference.
///
/// Class-like codes (value type, class, enum, object) are resolved through
/// their backing class: boxed `System.*` primitives collapse to the matching
/// primitive code so their fields stay editable.
pub fn effective_type_code<H: Host>(host: &H, ty: TypeRef) -> TypeCode {
    let Ok(raw) = host.type_code(ty) else {
        return TypeCode::Other(0);
    };
    let code = TypeCode::from_raw(raw);

    if matches!(
        code,
        TypeCode::ValueType | TypeCode::Class | TypeCode::Enum | TypeCode::Object
    ) && let Ok(Some(class)) = host.type_class(ty)
        && let Ok(info) = host.class_info(class)
        && let Some(primitive) = map_system_primitive(info.namespace.as_ref(), info.name.as_ref())
    {
        return primitive;
    }

    code
}

/// Display name for a field/parameter/return type.
pub fn type_display_name<H: Host>(host: &H, ty: TypeRef) -> String {
    let code = effective_type_code(host, ty);
    if let Some(name) = code.primitive_name() {
        return name.to_string();
    }

    if let Ok(Some(class)) = host.type_class(ty) {
        return class_display_name(host, class);
    }

    match code {
        TypeCode::Class => "class".to_string(),
        TypeCode::Object => "object".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Snapshot of one field descriptor, re-fetched per inspection frame.
#[derive(Debug, Clone)]
pub struct FieldDesc {
    pub field: FieldRef,
    pub name: String,
    pub type_name: String,
    pub code: TypeCode,
    pub offset: i32,
}

impl FieldDesc {
    /// Read a field descriptor; `None` on a metadata fault.
    pub fn read<H: Host>(host: &H, field: FieldRef) -> Option<Self> {
        let info = host.field_info(field).ok()?;
        Some(Self {
            field,
            name: member_label(info.name.as_deref(), "field", field.raw()),
            type_name: clamp_label(&type_display_name(host, info.ty), MAX_UI_LABEL_CHARS),
            code: effective_type_code(host, info.ty),
            offset: info.offset,
        })
    }

    /// Negative offset is the static-storage sentinel.
    pub fn is_static(&self) -> bool {
        self.offset < 0
    }
}

/// Snapshot of one method descriptor, re-fetched per inspection frame.
#[derive(Debug, Clone)]
pub struct MethodDesc {
    pub method: MethodRef,
    pub name: String,
    pub return_type: TypeRef,
    pub arg_count: u32,
    pub flags: MethodFlags,
}

impl MethodDesc {
    /// Read a method descriptor; `None` on a metadata fault.
    pub fn read<H: Host>(host: &H, method: MethodRef) -> Option<Self> {
        let info = host.method_info(method).ok()?;
        Some(Self {
            method,
            name: member_label(info.name.as_deref(), "method", method.raw()),
            return_type: info.return_type,
            arg_count: info.arg_count,
            flags: MethodFlags::from_bits_retain(info.flags),
        })
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }
}

/// Parameter label, falling back to `argN` on missing or corrupt names.
pub fn param_label<H: Host>(host: &H, method: MethodRef, index: u32) -> String {
    let raw = host.param_name(method, index).ok().flatten();
    let label = sanitize_name(raw.as_deref());
    if is_placeholder(&label) {
        return format!("arg{index}");
    }
    label
}

/// Render `name(type0 arg0, type1 arg1, ...)` for a method, listing at most
/// `displayed_args` parameters and noting the hidden remainder. The whole
/// signature is capped at [`MAX_SIGNATURE_CHARS`].
pub fn method_signature<H: Host>(
    host: &H,
    desc: &MethodDesc,
    displayed_args: u32,
    total_args: u32,
) -> String {
    let mut signature = clamp_label(&desc.name, MAX_UI_LABEL_CHARS);
    signature.push('(');

    for index in 0..displayed_args {
        let type_name = match host.param_type(desc.method, index) {
            Ok(ty) => clamp_label(&type_display_name(host, ty), MAX_UI_LABEL_CHARS),
            Err(_) => "unknown".to_string(),
        };
        let part = format!("{type_name} {}", param_label(host, desc.method, index));

        if signature.len() + part.len() + 8 >= MAX_SIGNATURE_CHARS {
            signature.push_str("...");
            break;
        }

        signature.push_str(&part);
        if index + 1 < displayed_args {
            signature.push_str(", ");
        }
    }

    if total_args > displayed_args {
        if displayed_args > 0 {
            signature.push_str(", ");
        }
        signature.push_str(&format!("... +{}", total_args - displayed_args));
    }

    signature.push(')');
    clamp_label(&signature, MAX_SIGNATURE_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_host::FakeHost;

    #[test]
    fn sanitize_accepts_printable_ascii() {
        assert_eq!(sanitize_name(Some(b"Player")), "Player");
        assert_eq!(sanitize_name(Some(b"m_Speed_01")), "m_Speed_01");
    }

    #[test]
    fn sanitize_rejects_control_bytes_and_overlong_runs() {
        assert_eq!(sanitize_name(Some(b"bad\x01name")), INVALID_NAME);
        assert_eq!(sanitize_name(Some(b"\xFFutf")), INVALID_NAME);
        assert_eq!(sanitize_name(Some(b"")), INVALID_NAME);
        let long = vec![b'a'; MAX_NAME_BYTES];
        assert_eq!(sanitize_name(Some(&long)), INVALID_NAME);
        assert_eq!(sanitize_name(None), NULL_NAME);
    }

    #[test]
    fn member_label_falls_back_to_handle() {
        assert_eq!(member_label(Some(b"health"), "field", 0x10), "health");
        assert_eq!(member_label(None, "field", 0x10), "field_0x10");
        assert_eq!(member_label(Some(b"\x07"), "method", 0xab), "method_0xab");
    }

    #[test]
    fn clamp_label_marks_truncation() {
        assert_eq!(clamp_label("short", 96), "short");
        let long = "x".repeat(100);
        let clamped = clamp_label(&long, 96);
        assert_eq!(clamped.chars().count(), 96);
        assert!(clamped.ends_with("..."));
        assert_eq!(clamp_label("abcdef", 3), "abc");
    }

    #[test]
    fn class_display_name_composition() {
        let mut host = FakeHost::new();
        let plain = host.add_class("", "Bare");
        let namespaced = host.add_class("Game.Units", "Soldier");
        assert_eq!(class_display_name(&host, plain), "Bare");
        assert_eq!(class_display_name(&host, namespaced), "Game.Units.Soldier");

        let broken = host.add_class("Game", "Broken");
        host.fault(broken.raw());
        assert_eq!(class_display_name(&host, broken), INVALID_CLASS);
        assert_eq!(class_display_name(&host, ClassRef(0)), UNKNOWN_CLASS);
    }

    #[test]
    fn class_display_name_unnamed_placeholder() {
        let mut host = FakeHost::new();
        let class = host.add_class_raw(Some(b"Ok".to_vec()), None, None);
        assert_eq!(class_display_name(&host, class), "Ok");
        let nameless = host.add_class_raw(None, Some(b"Ns".to_vec()), None);
        assert_eq!(class_display_name(&host, nameless), "Ns.<unnamed>");
    }

    #[test]
    fn parent_chain_walk_finds_ancestors() {
        let mut host = FakeHost::new();
        let base = host.add_class("Engine", "Behaviour");
        let derived = host.add_class_with_parent("Game", "PlayerController", base);

        assert!(is_class_or_parent(&host, derived, "Game", "PlayerController"));
        assert!(is_class_or_parent(&host, derived, "Engine", "Behaviour"));
        // Empty namespace matches any namespace.
        assert!(is_class_or_parent(&host, derived, "", "Behaviour"));
        assert!(!is_class_or_parent(&host, derived, "Other", "Behaviour"));
        assert!(!is_class_or_parent(&host, derived, "Engine", "Renderer"));
    }

    #[test]
    fn parent_chain_walk_terminates_on_cycle() {
        let mut host = FakeHost::new();
        let a = host.add_class("Ns", "A");
        let b = host.add_class_with_parent("Ns", "B", a);
        host.set_class_parent(a, b); // cycle a <-> b
        assert!(!is_class_or_parent(&host, a, "Ns", "Missing"));
    }

    #[test]
    fn effective_code_unwraps_boxed_system_primitives() {
        let mut host = FakeHost::new();
        let bool_class = host.add_class("System", "Boolean");
        let boxed = host.add_type(17, Some(bool_class)); // ValueType
        assert_eq!(effective_type_code(&host, boxed), TypeCode::Bool);

        let plain = host.add_type(8, None);
        assert_eq!(effective_type_code(&host, plain), TypeCode::I4);

        let user_class = host.add_class("Game", "Inventory");
        let class_ty = host.add_type(18, Some(user_class));
        assert_eq!(effective_type_code(&host, class_ty), TypeCode::Class);
    }

    #[test]
    fn type_display_name_prefers_primitives_then_classes() {
        let mut host = FakeHost::new();
        let int_ty = host.add_type(8, None);
        assert_eq!(type_display_name(&host, int_ty), "int");

        let user_class = host.add_class("Game", "Inventory");
        let class_ty = host.add_type(18, Some(user_class));
        assert_eq!(type_display_name(&host, class_ty), "Game.Inventory");

        let object_ty = host.add_type(28, None);
        assert_eq!(type_display_name(&host, object_ty), "object");
    }

    #[test]
    fn field_desc_static_sentinel() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("Thing");
        let class = host.add_class("Game", "Stats");
        let component = host.add_component(instance, class);
        let int_ty = host.add_type(8, None);
        let member = host.add_field(component, "count", int_ty, 0x20);
        let static_member = host.add_field(component, "total", int_ty, -1);

        let desc = FieldDesc::read(&host, member).unwrap();
        assert!(!desc.is_static());
        assert_eq!(desc.name, "count");
        assert_eq!(desc.code, TypeCode::I4);

        let static_desc = FieldDesc::read(&host, static_member).unwrap();
        assert!(static_desc.is_static());
    }

    #[test]
    fn method_signature_lists_and_elides_args() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("Thing");
        let class = host.add_class("Game", "Stats");
        let component = host.add_component(instance, class);
        let void_ty = host.add_type(1, None);
        let int_ty = host.add_type(8, None);
        let float_ty = host.add_type(12, None);
        let method = host.add_method(
            component,
            "SetScore",
            void_ty,
            &[(int_ty, Some("points")), (float_ty, Some("multiplier"))],
            0,
        );

        let desc = MethodDesc::read(&host, method).unwrap();
        assert_eq!(
            method_signature(&host, &desc, 2, 2),
            "SetScore(int points, float multiplier)"
        );
        assert_eq!(
            method_signature(&host, &desc, 1, 2),
            "SetScore(int points, ... +1)"
        );
        assert_eq!(method_signature(&host, &desc, 0, 2), "SetScore(... +2)");
    }

    #[test]
    fn param_label_fallback() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("Thing");
        let class = host.add_class("Game", "Stats");
        let component = host.add_component(instance, class);
        let void_ty = host.add_type(1, None);
        let int_ty = host.add_type(8, None);
        let method = host.add_method(component, "M", void_ty, &[(int_ty, None)], 0);
        assert_eq!(param_label(&host, method, 0), "arg0");
    }

    #[test]
    fn method_desc_static_flag() {
        let mut host = FakeHost::new();
        let instance = host.add_instance("Thing");
        let class = host.add_class("Game", "Stats");
        let component = host.add_component(instance, class);
        let void_ty = host.add_type(1, None);
        let method = host.add_method(component, "Reset", void_ty, &[], 0x0010);
        let desc = MethodDesc::read(&host, method).unwrap();
        assert!(desc.is_static());
    }
}
