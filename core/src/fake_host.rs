//! Scriptable in-memory [`Host`] used by the test suite.
//!
//! Builds a small object graph out of plain maps, with per-handle fault
//! injection so tests can exercise the inspector's isolation paths without
//! an attached runtime.

use std::cell::Cell;

use hashbrown::{HashMap, HashSet};

use crate::host::{
    ArgSlot, ClassName, ClassRef, ComponentRef, FieldRef, Host, HostError, HostResult,
    InstanceRef, InvokeError, LoadMode, MethodRef, NodeRef, RawBytes, RawClassInfo, RawFieldInfo,
    RawMethodInfo, RawPtr, TypeRef, WellKnown,
};
use crate::value::{TypeCode, Value};

/// What a scripted method does when invoked.
#[derive(Debug, Clone)]
pub enum InvokeBehavior {
    /// Return a boxed primitive or string result.
    Return(Value),
    /// Return a reference to an already registered object.
    ReturnObject(RawPtr),
    /// Void or null return.
    ReturnNull,
    /// Throw a managed exception.
    Throw,
    /// Fault inside the invoke call.
    Fault,
}

#[derive(Debug, Clone)]
struct FakeClass {
    name: Option<RawBytes>,
    namespace: Option<RawBytes>,
    parent: Option<ClassRef>,
}

#[derive(Debug, Clone)]
struct FakeType {
    raw_code: u32,
    class: Option<ClassRef>,
}

#[derive(Debug, Clone)]
struct FakeField {
    name: Option<RawBytes>,
    ty: TypeRef,
    offset: i32,
}

#[derive(Debug, Clone)]
struct FakeMethod {
    name: Option<RawBytes>,
    return_type: TypeRef,
    flags: u32,
    params: Vec<(TypeRef, Option<RawBytes>)>,
    behavior: InvokeBehavior,
}

#[derive(Debug, Clone)]
struct FakeComponent {
    class: ClassRef,
    fields: Vec<FieldRef>,
    methods: Vec<MethodRef>,
    memory: HashMap<u32, Value>,
    raw_memory: HashMap<u32, RawPtr>,
}

#[derive(Debug, Clone)]
struct FakeInstance {
    name: String,
    node: NodeRef,
    parent: Option<NodeRef>,
    components: Vec<ComponentRef>,
    active: bool,
    layer: u32,
    position: [f32; 3],
    euler: [f32; 3],
    scale: [f32; 3],
}

/// In-memory host. Every handle comes out of one shared counter, so handles
/// never collide across kinds and fault injection works on any of them.
pub struct FakeHost {
    well_known: WellKnown,
    next_handle: u64,
    next_instance_id: i32,

    classes: HashMap<u64, FakeClass>,
    types: HashMap<u64, FakeType>,
    fields: HashMap<u64, FakeField>,
    methods: HashMap<u64, FakeMethod>,
    components: HashMap<u64, FakeComponent>,
    instances: HashMap<u64, FakeInstance>,
    /// Instance enumeration order, oldest first.
    order: Vec<InstanceRef>,
    node_owner: HashMap<u64, InstanceRef>,

    object_class: HashMap<u64, ClassRef>,
    native_handles: HashMap<u64, RawPtr>,
    instance_ids: HashMap<u64, i32>,
    strings: HashMap<u64, String>,
    boxed: HashMap<u64, Value>,
    statics: HashMap<u64, Value>,
    static_raw: HashMap<u64, RawPtr>,

    scenes: Vec<i32>,
    instance_scenes: HashMap<u64, i32>,
    /// Journal of scene loads requested through the host.
    pub loaded: Vec<(String, LoadMode)>,
    /// Count of `param_type`/`param_name` calls, for metadata-traffic
    /// assertions.
    pub param_metadata_reads: Cell<usize>,
    /// Journal of invocations, receiver and marshaled args included.
    pub invocations: Vec<(MethodRef, Option<ComponentRef>, Vec<ArgSlot>)>,

    faulted: HashSet<u64>,
    pub instance_id_available: bool,
    pub invoke_available: bool,
    pub ready: bool,
}

impl FakeHost {
    pub fn new() -> Self {
        let mut host = Self {
            well_known: WellKnown {
                base_object: ClassName::new("Engine", "Object"),
                instance: ClassName::new("Engine", "GameObject"),
                component: ClassName::new("Engine", "Component"),
            },
            next_handle: 1,
            next_instance_id: 1000,
            classes: HashMap::new(),
            types: HashMap::new(),
            fields: HashMap::new(),
            methods: HashMap::new(),
            components: HashMap::new(),
            instances: HashMap::new(),
            order: Vec::new(),
            node_owner: HashMap::new(),
            object_class: HashMap::new(),
            native_handles: HashMap::new(),
            instance_ids: HashMap::new(),
            strings: HashMap::new(),
            boxed: HashMap::new(),
            statics: HashMap::new(),
            static_raw: HashMap::new(),
            scenes: vec![1],
            instance_scenes: HashMap::new(),
            loaded: Vec::new(),
            param_metadata_reads: Cell::new(0),
            invocations: Vec::new(),
            faulted: HashSet::new(),
            instance_id_available: true,
            invoke_available: true,
            ready: true,
        };
        // Seed the well-known hierarchy.
        let base = host.add_class("Engine", "Object");
        host.add_class_with_parent("Engine", "GameObject", base);
        host.add_class_with_parent("Engine", "Component", base);
        host
    }

    fn alloc(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn check(&self, handle: u64) -> HostResult<()> {
        if self.faulted.contains(&handle) {
            Err(HostError::Fault)
        } else {
            Ok(())
        }
    }

    /// Make every access through `handle` fault.
    pub fn fault(&mut self, handle: u64) {
        self.faulted.insert(handle);
    }

    // --- graph builders ---

    pub fn add_class(&mut self, namespace: &str, name: &str) -> ClassRef {
        self.add_class_raw(
            Some(name.as_bytes().to_vec()),
            Some(namespace.as_bytes().to_vec()),
            None,
        )
    }

    pub fn add_class_with_parent(
        &mut self,
        namespace: &str,
        name: &str,
        parent: ClassRef,
    ) -> ClassRef {
        self.add_class_raw(
            Some(name.as_bytes().to_vec()),
            Some(namespace.as_bytes().to_vec()),
            Some(parent),
        )
    }

    pub fn add_class_raw(
        &mut self,
        name: Option<RawBytes>,
        namespace: Option<RawBytes>,
        parent: Option<ClassRef>,
    ) -> ClassRef {
        let handle = self.alloc();
        self.classes.insert(
            handle,
            FakeClass {
                name,
                namespace,
                parent,
            },
        );
        ClassRef(handle)
    }

    pub fn set_class_parent(&mut self, class: ClassRef, parent: ClassRef) {
        if let Some(entry) = self.classes.get_mut(&class.raw()) {
            entry.parent = Some(parent);
        }
    }

    /// Class handle of the well-known instance class.
    pub fn instance_class(&self) -> ClassRef {
        self.find_class(&self.well_known.instance.namespace, &self.well_known.instance.name)
            .expect("well-known instance class is seeded in new()")
    }

    /// Class handle of the well-known component class.
    pub fn component_class(&self) -> ClassRef {
        self.find_class(
            &self.well_known.component.namespace,
            &self.well_known.component.name,
        )
        .expect("well-known component class is seeded in new()")
    }

    fn find_class(&self, namespace: &str, name: &str) -> Option<ClassRef> {
        self.classes.iter().find_map(|(handle, class)| {
            let name_hit = class.name.as_deref() == Some(name.as_bytes());
            let ns_hit = class.namespace.as_deref() == Some(namespace.as_bytes());
            (name_hit && ns_hit).then_some(ClassRef(*handle))
        })
    }

    pub fn add_type(&mut self, raw_code: u32, class: Option<ClassRef>) -> TypeRef {
        let handle = self.alloc();
        self.types.insert(handle, FakeType { raw_code, class });
        TypeRef(handle)
    }

    pub fn add_instance(&mut self, name: &str) -> InstanceRef {
        let class = self.instance_class();
        self.add_instance_of(name, class)
    }

    pub fn add_instance_of(&mut self, name: &str, class: ClassRef) -> InstanceRef {
        let handle = self.alloc();
        let node = NodeRef(self.alloc());
        let instance = InstanceRef(handle);
        self.instances.insert(
            handle,
            FakeInstance {
                name: name.to_string(),
                node,
                parent: None,
                components: Vec::new(),
                active: true,
                layer: 0,
                position: [0.0; 3],
                euler: [0.0; 3],
                scale: [1.0; 3],
            },
        );
        self.order.push(instance);
        self.node_owner.insert(node.raw(), instance);
        self.object_class.insert(handle, class);
        self.native_handles.insert(handle, RawPtr(handle ^ 0xA000));
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        self.instance_ids.insert(handle, id);
        instance
    }

    pub fn set_parent(&mut self, child: InstanceRef, parent: InstanceRef) {
        let parent_node = self.instances[&parent.raw()].node;
        if let Some(entry) = self.instances.get_mut(&child.raw()) {
            entry.parent = Some(parent_node);
        }
    }

    pub fn set_active(&mut self, instance: InstanceRef, active: bool) {
        if let Some(entry) = self.instances.get_mut(&instance.raw()) {
            entry.active = active;
        }
    }

    /// Tear the instance out of the graph; its handles fault afterwards.
    pub fn remove_instance(&mut self, instance: InstanceRef) {
        if let Some(entry) = self.instances.remove(&instance.raw()) {
            self.node_owner.remove(&entry.node.raw());
            for component in &entry.components {
                self.faulted.insert(component.raw());
            }
        }
        self.order.retain(|i| *i != instance);
        self.faulted.insert(instance.raw());
    }

    pub fn add_component(&mut self, instance: InstanceRef, class: ClassRef) -> ComponentRef {
        let handle = self.alloc();
        self.components.insert(
            handle,
            FakeComponent {
                class,
                fields: Vec::new(),
                methods: Vec::new(),
                memory: HashMap::new(),
                raw_memory: HashMap::new(),
            },
        );
        if let Some(entry) = self.instances.get_mut(&instance.raw()) {
            entry.components.push(ComponentRef(handle));
        }
        self.object_class.insert(handle, class);
        self.native_handles.insert(handle, RawPtr(handle ^ 0xC000));
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        self.instance_ids.insert(handle, id);
        ComponentRef(handle)
    }

    pub fn add_field(
        &mut self,
        component: ComponentRef,
        name: &str,
        ty: TypeRef,
        offset: i32,
    ) -> FieldRef {
        let handle = self.alloc();
        self.fields.insert(
            handle,
            FakeField {
                name: Some(name.as_bytes().to_vec()),
                ty,
                offset,
            },
        );
        if let Some(entry) = self.components.get_mut(&component.raw()) {
            entry.fields.push(FieldRef(handle));
        }
        FieldRef(handle)
    }

    pub fn add_method(
        &mut self,
        component: ComponentRef,
        name: &str,
        return_type: TypeRef,
        params: &[(TypeRef, Option<&str>)],
        flags: u32,
    ) -> MethodRef {
        let handle = self.alloc();
        self.methods.insert(
            handle,
            FakeMethod {
                name: Some(name.as_bytes().to_vec()),
                return_type,
                flags,
                params: params
                    .iter()
                    .map(|(ty, name)| (*ty, name.map(|n| n.as_bytes().to_vec())))
                    .collect(),
                behavior: InvokeBehavior::ReturnNull,
            },
        );
        if let Some(entry) = self.components.get_mut(&component.raw()) {
            entry.methods.push(MethodRef(handle));
        }
        MethodRef(handle)
    }

    pub fn script_invoke(&mut self, method: MethodRef, behavior: InvokeBehavior) {
        if let Some(entry) = self.methods.get_mut(&method.raw()) {
            entry.behavior = behavior;
        }
    }

    // --- storage seeding ---

    pub fn set_field_value(&mut self, component: ComponentRef, offset: u32, value: Value) {
        if let Some(entry) = self.components.get_mut(&component.raw()) {
            entry.memory.insert(offset, value);
        }
    }

    pub fn set_field_raw(&mut self, component: ComponentRef, offset: u32, ptr: RawPtr) {
        if let Some(entry) = self.components.get_mut(&component.raw()) {
            entry.raw_memory.insert(offset, ptr);
        }
    }

    pub fn set_static_value(&mut self, field: FieldRef, value: Value) {
        self.statics.insert(field.raw(), value);
    }

    pub fn set_static_raw(&mut self, field: FieldRef, ptr: RawPtr) {
        self.static_raw.insert(field.raw(), ptr);
    }

    /// Register a free-standing object of `class`, outside the instance
    /// graph. Useful for wrapper and proxy objects.
    pub fn add_object(&mut self, class: ClassRef) -> RawPtr {
        let ptr = RawPtr(self.alloc());
        self.object_class.insert(ptr.raw(), class);
        ptr
    }

    pub fn set_native_handle(&mut self, object: RawPtr, native: RawPtr) {
        self.native_handles.insert(object.raw(), native);
    }

    pub fn set_instance_id_of(&mut self, object: RawPtr, id: i32) {
        self.instance_ids.insert(object.raw(), id);
    }

    /// Register a runtime string object and return its pointer.
    pub fn add_string(&mut self, text: &str) -> RawPtr {
        let ptr = RawPtr(self.alloc());
        self.strings.insert(ptr.raw(), text.to_string());
        ptr
    }

    /// Register a boxed primitive object and return its pointer.
    pub fn box_value(&mut self, value: Value) -> RawPtr {
        let ptr = RawPtr(self.alloc());
        self.boxed.insert(ptr.raw(), value);
        ptr
    }

    pub fn set_scenes(&mut self, handles: Vec<i32>) {
        self.scenes = handles;
    }

    /// Attribute an instance to a scene handle.
    pub fn set_instance_scene(&mut self, instance: InstanceRef, scene: i32) {
        self.instance_scenes.insert(instance.raw(), scene);
    }

    pub fn static_value(&self, field: FieldRef) -> Option<&Value> {
        self.statics.get(&field.raw())
    }

    pub fn field_value(&self, component: ComponentRef, offset: u32) -> Option<&Value> {
        self.components.get(&component.raw())?.memory.get(&offset)
    }

    pub fn transform_of(&self, instance: InstanceRef) -> ([f32; 3], [f32; 3], [f32; 3]) {
        let entry = &self.instances[&instance.raw()];
        (entry.position, entry.euler, entry.scale)
    }

    fn instance(&self, instance: InstanceRef) -> HostResult<&FakeInstance> {
        self.check(instance.raw())?;
        self.instances.get(&instance.raw()).ok_or(HostError::Fault)
    }

    fn component(&self, component: ComponentRef) -> HostResult<&FakeComponent> {
        self.check(component.raw())?;
        self.components
            .get(&component.raw())
            .ok_or(HostError::Fault)
    }

    fn zero_value(code: TypeCode) -> HostResult<Value> {
        let size = code.byte_size().ok_or(HostError::Fault)?;
        Value::from_le_bytes(code, &[0u8; 8][..size]).ok_or(HostError::Fault)
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for FakeHost {
    fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    fn find_all_instances(&self, include_inactive: bool) -> HostResult<Vec<InstanceRef>> {
        Ok(self
            .order
            .iter()
            .copied()
            .filter(|instance| {
                include_inactive
                    || self
                        .instances
                        .get(&instance.raw())
                        .map(|entry| entry.active)
                        .unwrap_or(false)
            })
            .collect())
    }

    fn node_of(&self, instance: InstanceRef) -> HostResult<NodeRef> {
        Ok(self.instance(instance)?.node)
    }

    fn parent_of(&self, node: NodeRef) -> HostResult<Option<NodeRef>> {
        self.check(node.raw())?;
        let owner = self.node_owner.get(&node.raw()).ok_or(HostError::Fault)?;
        Ok(self.instance(*owner)?.parent)
    }

    fn components_of(&self, instance: InstanceRef) -> HostResult<Vec<ComponentRef>> {
        Ok(self.instance(instance)?.components.clone())
    }

    fn instance_name(&self, instance: InstanceRef) -> HostResult<String> {
        Ok(self.instance(instance)?.name.clone())
    }

    fn class_of(&self, object: RawPtr) -> HostResult<ClassRef> {
        self.check(object.raw())?;
        self.object_class
            .get(&object.raw())
            .copied()
            .ok_or(HostError::Fault)
    }

    fn native_handle(&self, object: RawPtr) -> HostResult<RawPtr> {
        self.check(object.raw())?;
        Ok(self
            .native_handles
            .get(&object.raw())
            .copied()
            .unwrap_or(RawPtr::NULL))
    }

    fn has_instance_id(&self) -> bool {
        self.instance_id_available
    }

    fn instance_id(&self, object: RawPtr) -> HostResult<i32> {
        if !self.instance_id_available {
            return Err(HostError::Unavailable);
        }
        self.check(object.raw())?;
        self.instance_ids
            .get(&object.raw())
            .copied()
            .ok_or(HostError::Fault)
    }

    fn class_info(&self, class: ClassRef) -> HostResult<RawClassInfo> {
        self.check(class.raw())?;
        let entry = self.classes.get(&class.raw()).ok_or(HostError::Fault)?;
        Ok(RawClassInfo {
            name: entry.name.clone(),
            namespace: entry.namespace.clone(),
            parent: entry.parent,
        })
    }

    fn fields_of(&self, component: ComponentRef) -> HostResult<Vec<FieldRef>> {
        Ok(self.component(component)?.fields.clone())
    }

    fn field_info(&self, field: FieldRef) -> HostResult<RawFieldInfo> {
        self.check(field.raw())?;
        let entry = self.fields.get(&field.raw()).ok_or(HostError::Fault)?;
        Ok(RawFieldInfo {
            name: entry.name.clone(),
            ty: entry.ty,
            offset: entry.offset,
        })
    }

    fn methods_of(&self, component: ComponentRef) -> HostResult<Vec<MethodRef>> {
        Ok(self.component(component)?.methods.clone())
    }

    fn method_info(&self, method: MethodRef) -> HostResult<RawMethodInfo> {
        self.check(method.raw())?;
        let entry = self.methods.get(&method.raw()).ok_or(HostError::Fault)?;
        Ok(RawMethodInfo {
            name: entry.name.clone(),
            return_type: entry.return_type,
            arg_count: entry.params.len() as u32,
            flags: entry.flags,
        })
    }

    fn param_type(&self, method: MethodRef, index: u32) -> HostResult<TypeRef> {
        self.param_metadata_reads
            .set(self.param_metadata_reads.get() + 1);
        self.check(method.raw())?;
        let entry = self.methods.get(&method.raw()).ok_or(HostError::Fault)?;
        entry
            .params
            .get(index as usize)
            .map(|(ty, _)| *ty)
            .ok_or(HostError::Fault)
    }

    fn param_name(&self, method: MethodRef, index: u32) -> HostResult<Option<RawBytes>> {
        self.param_metadata_reads
            .set(self.param_metadata_reads.get() + 1);
        self.check(method.raw())?;
        let entry = self.methods.get(&method.raw()).ok_or(HostError::Fault)?;
        Ok(entry
            .params
            .get(index as usize)
            .and_then(|(_, name)| name.clone()))
    }

    fn type_code(&self, ty: TypeRef) -> HostResult<u32> {
        self.check(ty.raw())?;
        self.types
            .get(&ty.raw())
            .map(|entry| entry.raw_code)
            .ok_or(HostError::Fault)
    }

    fn type_class(&self, ty: TypeRef) -> HostResult<Option<ClassRef>> {
        self.check(ty.raw())?;
        self.types
            .get(&ty.raw())
            .map(|entry| entry.class)
            .ok_or(HostError::Fault)
    }

    fn read_static(&self, field: FieldRef, code: TypeCode) -> HostResult<Value> {
        self.check(field.raw())?;
        match self.statics.get(&field.raw()) {
            Some(value) => Ok(value.clone()),
            None => Self::zero_value(code),
        }
    }

    fn write_static(&mut self, field: FieldRef, value: &Value) -> HostResult<()> {
        self.check(field.raw())?;
        self.statics.insert(field.raw(), value.clone());
        Ok(())
    }

    fn read_instance(
        &self,
        component: ComponentRef,
        offset: u32,
        code: TypeCode,
    ) -> HostResult<Value> {
        match self.component(component)?.memory.get(&offset) {
            Some(value) => Ok(value.clone()),
            None => Self::zero_value(code),
        }
    }

    fn write_instance(
        &mut self,
        component: ComponentRef,
        offset: u32,
        value: &Value,
    ) -> HostResult<()> {
        self.check(component.raw())?;
        let entry = self
            .components
            .get_mut(&component.raw())
            .ok_or(HostError::Fault)?;
        entry.memory.insert(offset, value.clone());
        Ok(())
    }

    fn read_instance_raw(&self, component: ComponentRef, offset: u32) -> HostResult<RawPtr> {
        Ok(self
            .component(component)?
            .raw_memory
            .get(&offset)
            .copied()
            .unwrap_or(RawPtr::NULL))
    }

    fn read_static_raw(&self, field: FieldRef) -> HostResult<RawPtr> {
        self.check(field.raw())?;
        Ok(self
            .static_raw
            .get(&field.raw())
            .copied()
            .unwrap_or(RawPtr::NULL))
    }

    fn read_string(&self, object: RawPtr) -> HostResult<String> {
        self.check(object.raw())?;
        self.strings
            .get(&object.raw())
            .cloned()
            .ok_or(HostError::Fault)
    }

    fn can_invoke(&self) -> bool {
        self.invoke_available
    }

    fn runtime_invoke(
        &mut self,
        method: MethodRef,
        receiver: Option<ComponentRef>,
        args: &[ArgSlot],
    ) -> Result<RawPtr, InvokeError> {
        if !self.invoke_available {
            return Err(InvokeError::Unavailable);
        }
        if self.faulted.contains(&method.raw()) {
            return Err(InvokeError::Fault);
        }
        let behavior = self
            .methods
            .get(&method.raw())
            .map(|entry| entry.behavior.clone())
            .ok_or(InvokeError::Fault)?;
        self.invocations.push((method, receiver, args.to_vec()));
        match behavior {
            InvokeBehavior::Return(value) => {
                let ptr = match &value {
                    Value::Text(text) => {
                        let text = text.clone();
                        self.add_string(&text)
                    }
                    _ => self.box_value(value),
                };
                Ok(ptr)
            }
            InvokeBehavior::ReturnObject(ptr) => Ok(ptr),
            InvokeBehavior::ReturnNull => Ok(RawPtr::NULL),
            InvokeBehavior::Throw => Err(InvokeError::Exception),
            InvokeBehavior::Fault => Err(InvokeError::Fault),
        }
    }

    fn unbox(&self, object: RawPtr, code: TypeCode) -> HostResult<Value> {
        self.check(object.raw())?;
        let value = self.boxed.get(&object.raw()).ok_or(HostError::Fault)?;
        if value.code() != code {
            return Err(HostError::Fault);
        }
        Ok(value.clone())
    }

    fn instance_active(&self, instance: InstanceRef) -> HostResult<bool> {
        Ok(self.instance(instance)?.active)
    }

    fn set_instance_active(&mut self, instance: InstanceRef, active: bool) -> HostResult<()> {
        self.check(instance.raw())?;
        let entry = self
            .instances
            .get_mut(&instance.raw())
            .ok_or(HostError::Fault)?;
        entry.active = active;
        Ok(())
    }

    fn instance_layer(&self, instance: InstanceRef) -> HostResult<u32> {
        Ok(self.instance(instance)?.layer)
    }

    fn set_instance_layer(&mut self, instance: InstanceRef, layer: u32) -> HostResult<()> {
        self.check(instance.raw())?;
        let entry = self
            .instances
            .get_mut(&instance.raw())
            .ok_or(HostError::Fault)?;
        entry.layer = layer;
        Ok(())
    }

    fn node_local_position(&self, node: NodeRef) -> HostResult<[f32; 3]> {
        self.check(node.raw())?;
        let owner = self.node_owner.get(&node.raw()).ok_or(HostError::Fault)?;
        Ok(self.instance(*owner)?.position)
    }

    fn node_euler(&self, node: NodeRef) -> HostResult<[f32; 3]> {
        self.check(node.raw())?;
        let owner = self.node_owner.get(&node.raw()).ok_or(HostError::Fault)?;
        Ok(self.instance(*owner)?.euler)
    }

    fn node_local_scale(&self, node: NodeRef) -> HostResult<[f32; 3]> {
        self.check(node.raw())?;
        let owner = self.node_owner.get(&node.raw()).ok_or(HostError::Fault)?;
        Ok(self.instance(*owner)?.scale)
    }

    fn set_node_transform(
        &mut self,
        node: NodeRef,
        position: [f32; 3],
        euler: [f32; 3],
        scale: [f32; 3],
    ) -> HostResult<()> {
        self.check(node.raw())?;
        let owner = *self.node_owner.get(&node.raw()).ok_or(HostError::Fault)?;
        let entry = self
            .instances
            .get_mut(&owner.raw())
            .ok_or(HostError::Fault)?;
        entry.position = position;
        entry.euler = euler;
        entry.scale = scale;
        Ok(())
    }

    fn scene_handles(&self) -> HostResult<Vec<i32>> {
        Ok(self.scenes.clone())
    }

    fn load_scene(&mut self, name: &str, mode: LoadMode) -> HostResult<()> {
        self.loaded.push((name.to_string(), mode));
        Ok(())
    }

    fn instance_scene(&self, instance: InstanceRef) -> HostResult<i32> {
        self.check(instance.raw())?;
        Ok(self
            .instance_scenes
            .get(&instance.raw())
            .copied()
            .unwrap_or(0))
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
