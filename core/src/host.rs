//! Host runtime boundary
//!
//! Everything the inspector consumes from the attached process lives behind
//! the [`Host`] trait. The graph it exposes is externally owned and can be
//! mutated or partially destroyed at any time, so every method doubles as a
//! fault-isolation boundary: a stale or corrupt handle must come back as
//! [`HostError::Fault`], never as a process fault. The core never holds live
//! references into host memory, only the opaque copy handles defined here
//! plus copied-out snapshot data.

use smallvec::SmallVec;

use crate::value::{TypeCode, Value};

macro_rules! opaque_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);

        impl $name {
            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

opaque_handle!(
    /// Untyped pointer-sized value copied out of host memory.
    RawPtr
);
opaque_handle!(
    /// A live top-level object in the host's graph.
    InstanceRef
);
opaque_handle!(
    /// The hierarchy (transform-equivalent) node of an instance.
    NodeRef
);
opaque_handle!(
    /// A sub-object attached to an instance.
    ComponentRef
);
opaque_handle!(
    /// A type descriptor in host metadata.
    ClassRef
);
opaque_handle!(
    /// A field descriptor in host metadata.
    FieldRef
);
opaque_handle!(
    /// A method descriptor in host metadata.
    MethodRef
);
opaque_handle!(
    /// A field/parameter/return type reference in host metadata.
    TypeRef
);

impl RawPtr {
    pub const NULL: RawPtr = RawPtr(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl InstanceRef {
    /// The instance viewed as an untyped object pointer.
    pub fn as_ptr(self) -> RawPtr {
        RawPtr(self.0)
    }
}

impl ComponentRef {
    /// The component viewed as an untyped object pointer.
    pub fn as_ptr(self) -> RawPtr {
        RawPtr(self.0)
    }
}

/// Failure of a single host access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// An illegal access was trapped at the boundary. The handle is stale,
    /// the metadata is corrupt, or the host tore the object down mid-read.
    #[error("host access fault")]
    Fault,
    /// The required runtime entry point is not resolved on this host.
    #[error("host entry point unavailable")]
    Unavailable,
}

pub type HostResult<T> = Result<T, HostError>;

/// Failure of a dynamic method invocation, distinguished for diagnostics
/// only; neither variant is fatal to the inspector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    /// The invoke call itself faulted inside the host.
    #[error("<runtime invoke fault>")]
    Fault,
    /// The invoked method threw a managed exception.
    #[error("<runtime exception>")]
    Exception,
    /// The generic invoke entry point is not resolved.
    #[error("runtime invoke unavailable")]
    Unavailable,
}

/// One marshaled argument handed to the host's generic invoke entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSlot {
    /// A primitive boxed as little-endian bytes, tagged with its type code.
    Bytes {
        code: TypeCode,
        bytes: SmallVec<[u8; 8]>,
    },
    /// Text; the host allocates the runtime string representation.
    Text(String),
}

/// Scene load mode forwarded to the host's scene manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Single,
    Additive,
}

/// `(namespace, name)` pair identifying a class by its metadata strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassName {
    pub namespace: String,
    pub name: String,
}

impl ClassName {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Well-known base classes reference resolution walks against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnown {
    /// Root class of everything the host tracks (object base).
    pub base_object: ClassName,
    /// The top-level instance class (the inspector's unit of selection).
    pub instance: ClassName,
    /// The attached sub-object class.
    pub component: ClassName,
}

/// Raw byte run copied out of a metadata string.
///
/// The host copies up to and excluding the terminating NUL, reading at most
/// [`RAW_NAME_WINDOW`] bytes; if no terminator is found inside the window it
/// returns the whole window and the metadata reader's length cap rejects it.
pub type RawBytes = Vec<u8>;

/// Read window for metadata name strings.
pub const RAW_NAME_WINDOW: usize = 256;

/// Class metadata snapshot, all fields read inside one fault boundary.
#[derive(Debug, Clone, Default)]
pub struct RawClassInfo {
    pub name: Option<RawBytes>,
    pub namespace: Option<RawBytes>,
    pub parent: Option<ClassRef>,
}

/// Field metadata snapshot.
#[derive(Debug, Clone)]
pub struct RawFieldInfo {
    pub name: Option<RawBytes>,
    pub ty: TypeRef,
    /// Byte offset from the owning object base; negative means static
    /// storage (the offset is unspecified for statics).
    pub offset: i32,
}

/// Method metadata snapshot.
#[derive(Debug, Clone)]
pub struct RawMethodInfo {
    pub name: Option<RawBytes>,
    pub return_type: TypeRef,
    pub arg_count: u32,
    /// Raw attribute bits; see [`crate::meta::MethodFlags`].
    pub flags: u32,
}

/// The attached runtime, viewed through fault-isolated accessors.
///
/// Mutating operations take `&mut self`; read accessors take `&self`.
/// Implementations own whatever trapping mechanism (hardware-exception
/// guard, bounds validation) turns bad accesses into [`HostError::Fault`].
pub trait Host {
    /// Well-known class names for this runtime.
    fn well_known(&self) -> &WellKnown;

    // --- enumeration & hierarchy ---

    /// All live top-level instances, optionally including inactive ones.
    fn find_all_instances(&self, include_inactive: bool) -> HostResult<Vec<InstanceRef>>;

    /// Hierarchy node owning the instance's parent/child relationships.
    fn node_of(&self, instance: InstanceRef) -> HostResult<NodeRef>;

    /// Parent hierarchy node, `None` at a root.
    fn parent_of(&self, node: NodeRef) -> HostResult<Option<NodeRef>>;

    /// Sub-objects attached to the instance, via the host's component query.
    fn components_of(&self, instance: InstanceRef) -> HostResult<Vec<ComponentRef>>;

    // --- identity ---

    /// Display name of the instance (copied out, NUL-trimmed UTF-8).
    fn instance_name(&self, instance: InstanceRef) -> HostResult<String>;

    /// Class of an arbitrary object pointer.
    fn class_of(&self, object: RawPtr) -> HostResult<ClassRef>;

    /// The host-side native pointer cached on a managed wrapper object,
    /// used as a secondary identity channel during reference resolution.
    fn native_handle(&self, object: RawPtr) -> HostResult<RawPtr>;

    /// Whether the runtime's identity-number entry point resolved. When
    /// false, [`Host::instance_id`] returns `Unavailable` and reference
    /// resolution degrades to pointer-only matching.
    fn has_instance_id(&self) -> bool;

    /// Runtime-assigned identity number; best effort, host-defined reuse.
    fn instance_id(&self, object: RawPtr) -> HostResult<i32>;

    // --- metadata ---

    fn class_info(&self, class: ClassRef) -> HostResult<RawClassInfo>;

    fn fields_of(&self, component: ComponentRef) -> HostResult<Vec<FieldRef>>;

    fn field_info(&self, field: FieldRef) -> HostResult<RawFieldInfo>;

    fn methods_of(&self, component: ComponentRef) -> HostResult<Vec<MethodRef>>;

    fn method_info(&self, method: MethodRef) -> HostResult<RawMethodInfo>;

    fn param_type(&self, method: MethodRef, index: u32) -> HostResult<TypeRef>;

    fn param_name(&self, method: MethodRef, index: u32) -> HostResult<Option<RawBytes>>;

    /// Raw element-type id of a type reference.
    fn type_code(&self, ty: TypeRef) -> HostResult<u32>;

    /// Class backing a class-like type reference, if any.
    fn type_class(&self, ty: TypeRef) -> HostResult<Option<ClassRef>>;

    // --- member storage ---

    /// Read static storage through the host's static-getter entry point.
    fn read_static(&self, field: FieldRef, code: TypeCode) -> HostResult<Value>;

    fn write_static(&mut self, field: FieldRef, value: &Value) -> HostResult<()>;

    /// Typed read at `component base + offset`.
    fn read_instance(&self, component: ComponentRef, offset: u32, code: TypeCode)
    -> HostResult<Value>;

    fn write_instance(
        &mut self,
        component: ComponentRef,
        offset: u32,
        value: &Value,
    ) -> HostResult<()>;

    /// Pointer-sized raw read, the only access path for unsupported types.
    fn read_instance_raw(&self, component: ComponentRef, offset: u32) -> HostResult<RawPtr>;

    /// Pointer-sized raw read of static storage.
    fn read_static_raw(&self, field: FieldRef) -> HostResult<RawPtr>;

    /// Copy out a runtime string object as NUL-trimmed UTF-8.
    fn read_string(&self, object: RawPtr) -> HostResult<String>;

    // --- invocation ---

    /// Whether the generic runtime-invoke entry point resolved.
    fn can_invoke(&self) -> bool;

    /// Dynamic call through the runtime's generic invoke entry point.
    /// Receiver is `None` for static methods. Returns the boxed result
    /// object (`RawPtr::NULL` for null/void returns).
    fn runtime_invoke(
        &mut self,
        method: MethodRef,
        receiver: Option<ComponentRef>,
        args: &[ArgSlot],
    ) -> Result<RawPtr, InvokeError>;

    /// Unwrap a boxed primitive result object.
    fn unbox(&self, object: RawPtr, code: TypeCode) -> HostResult<Value>;

    // --- instance surface ---

    fn instance_active(&self, instance: InstanceRef) -> HostResult<bool>;

    fn set_instance_active(&mut self, instance: InstanceRef, active: bool) -> HostResult<()>;

    fn instance_layer(&self, instance: InstanceRef) -> HostResult<u32>;

    fn set_instance_layer(&mut self, instance: InstanceRef, layer: u32) -> HostResult<()>;

    /// Local position of a hierarchy node.
    fn node_local_position(&self, node: NodeRef) -> HostResult<[f32; 3]>;

    /// Euler rotation of a hierarchy node.
    fn node_euler(&self, node: NodeRef) -> HostResult<[f32; 3]>;

    /// Local scale of a hierarchy node.
    fn node_local_scale(&self, node: NodeRef) -> HostResult<[f32; 3]>;

    fn set_node_transform(
        &mut self,
        node: NodeRef,
        position: [f32; 3],
        euler: [f32; 3],
        scale: [f32; 3],
    ) -> HostResult<()>;

    // --- scenes / groups ---

    /// Handles of the currently loaded scenes, in load order.
    fn scene_handles(&self) -> HostResult<Vec<i32>>;

    fn load_scene(&mut self, name: &str, mode: LoadMode) -> HostResult<()>;

    /// Owning scene handle of an instance; 0 means global/unscoped.
    ///
    /// Per-instance scene attribution is unimplemented in the runtimes this
    /// inspector targets; the default keeps every instance unscoped so the
    /// scene filter never discriminates.
    fn instance_scene(&self, _instance: InstanceRef) -> HostResult<i32> {
        Ok(0)
    }

    /// Whether the runtime's reflection domain is up and attachable.
    fn is_ready(&self) -> bool {
        true
    }
}
