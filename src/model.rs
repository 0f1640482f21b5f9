//! Device model: ownership, navigation, and mutation.
//!
//! The model owns the document behind its policy's lock. Every public
//! operation acquires the guard for its full duration; document and import
//! loading happen during construction, before the model is visible to any
//! concurrent caller, so fetch and decode latency never block a peer
//! request.

use crate::codec::DocumentCodec;
use crate::concurrency::{DocumentLock, Policy, Serialized};
use crate::config::ModelConfig;
use crate::constraint;
use crate::device::{Constraint, Device, ParamDescriptor, Value};
use crate::error::Error;
use crate::fetch::ContentFetcher;
use crate::import::Importer;
use crate::path::{Pointer, Segment};
use crate::types::ParamType;
use std::path::{Path, PathBuf};
use tracing::info;

/// Guard type of a model's document lock.
pub type DeviceGuard<'a, P: Policy> = <P::Lock<Device> as DocumentLock<Device>>::Guard<'a>;

/// Path-addressed store of typed device parameters.
pub struct DeviceModel<P: Policy = Serialized> {
    document: <P as Policy>::Lock<Device>,
}

impl<P: Policy> std::fmt::Debug for DeviceModel<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceModel").finish_non_exhaustive()
    }
}

impl<P: Policy> DeviceModel<P> {
    /// Load a device document, resolve its imports, and wrap the result in
    /// the policy's lock. Import resources come from the sibling `params`
    /// directory of `document_path`.
    pub fn load(
        document_path: &Path,
        codec: &dyn DocumentCodec,
        fetcher: &dyn ContentFetcher,
    ) -> Result<Self, Error> {
        let params_dir = document_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join("params");
        Self::load_with_params_dir(document_path, params_dir, codec, fetcher)
    }

    /// Load per configuration: the configured document path and optional
    /// import-directory override.
    pub fn from_config(
        config: &ModelConfig,
        codec: &dyn DocumentCodec,
        fetcher: &dyn ContentFetcher,
    ) -> Result<Self, Error> {
        match &config.params_dir {
            Some(dir) => {
                Self::load_with_params_dir(&config.device_file, dir.clone(), codec, fetcher)
            }
            None => Self::load(&config.device_file, codec, fetcher),
        }
    }

    fn load_with_params_dir(
        document_path: &Path,
        params_dir: PathBuf,
        codec: &dyn DocumentCodec,
        fetcher: &dyn ContentFetcher,
    ) -> Result<Self, Error> {
        let bytes = fetcher.fetch(document_path)?;
        let mut device = codec.decode_device(&bytes)?;
        Importer::new(codec, fetcher, params_dir).resolve(&mut device)?;
        info!(
            document = %document_path.display(),
            params = device.params.len(),
            "loaded device model"
        );
        Ok(Self::from_device(device))
    }

    /// Construct from an in-memory document. No import resolution runs.
    pub fn from_device(device: Device) -> Self {
        DeviceModel {
            document: <P::Lock<Device> as DocumentLock<Device>>::new(device),
        }
    }

    /// Navigate to the parameter addressed by `pointer_text` and return a
    /// handle bound to it.
    pub fn param(&self, pointer_text: &str) -> Result<ParamHandle<'_, P>, Error> {
        let mut pointer = Pointer::parse(pointer_text)?;
        let mut guard = self.document.lock();
        let doc: &mut Device = &mut *guard;

        let oid = match pointer.pop_front()? {
            Segment::Name(name) => name,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "expected oid, got {}",
                    other.kind_name()
                )))
            }
        };
        let mut route = vec![oid.clone()];
        let mut current = doc
            .params
            .get_mut(&oid)
            .ok_or_else(|| Error::NotFound(format!("param {:?}", oid)))?;
        while !pointer.is_empty() {
            let segment = pointer.pop_front()?;
            let (child, name) = sub_param(current, segment)?;
            route.push(name);
            current = child;
        }

        drop(guard);
        Ok(ParamHandle { model: self, route })
    }

    /// Insert a descriptor at the top level, overwriting any existing
    /// entry, and return a handle to it. The inserted descriptor's oid is
    /// stamped from the path segment so the mapping key and the oid field
    /// cannot diverge.
    pub fn add_param(
        &self,
        pointer_text: &str,
        mut descriptor: ParamDescriptor,
    ) -> Result<ParamHandle<'_, P>, Error> {
        let mut pointer = Pointer::parse(pointer_text)?;
        let mut guard = self.document.lock();
        let doc: &mut Device = &mut *guard;

        if pointer.len() > 1 {
            return Err(Error::NotImplemented(
                "adding params below the top level".to_string(),
            ));
        }
        if pointer.is_empty() {
            return Err(Error::InvalidArgument(
                "empty path is invalid in this context".to_string(),
            ));
        }
        let oid = match pointer.pop_front()? {
            Segment::Name(name) => name,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "invalid path {:?}: expected oid, got {}",
                    pointer_text,
                    other.kind_name()
                )))
            }
        };
        descriptor.oid = oid.clone();
        doc.params.insert(oid.clone(), descriptor);

        drop(guard);
        Ok(ParamHandle {
            model: self,
            route: vec![oid],
        })
    }

    /// Read view of the current document, for serialization or inspection
    /// by collaborators. The guard holds the model's lock until dropped.
    pub fn device(&self) -> DeviceGuard<'_, P> {
        self.document.lock()
    }

    /// Encode the current document through `codec`.
    pub fn encode(&self, codec: &dyn DocumentCodec) -> Result<Vec<u8>, Error> {
        let guard = self.document.lock();
        codec.encode_device(&*guard)
    }

    /// Consume the model and return its document.
    pub fn into_device(self) -> Device {
        DocumentLock::into_inner(self.document)
    }
}

/// One struct-navigation step: descend from `parent` into the child named
/// by `segment`.
fn sub_param(
    parent: &mut ParamDescriptor,
    segment: Segment,
) -> Result<(&mut ParamDescriptor, String), Error> {
    match parent.param_type {
        ParamType::Struct => {}
        ParamType::StructArray => {
            return Err(Error::NotImplemented(
                "sub-param navigation for STRUCT_ARRAY".to_string(),
            ))
        }
        other => {
            return Err(Error::InvalidArgument(format!(
                "cannot sub-param a parameter of type {}",
                other
            )))
        }
    }

    let value = parent
        .value
        .as_mut()
        .ok_or_else(|| Error::Schema("value field is missing".to_string()))?;
    let fields = match value {
        Value::Struct(s) => &mut s.fields,
        _ => return Err(Error::Schema("struct value field is missing".to_string())),
    };

    let name = match segment {
        Segment::Name(name) => name,
        other => {
            return Err(Error::InvalidArgument(format!(
                "expected field name, got {}",
                other.kind_name()
            )))
        }
    };
    let child = fields
        .get_mut(&name)
        .ok_or_else(|| Error::Schema(format!("field {:?} not found", name)))?;
    Ok((child, name))
}

/// Walk a previously validated route back to its descriptor.
fn walk<'d>(device: &'d mut Device, route: &[String]) -> Result<&'d mut ParamDescriptor, Error> {
    let (oid, rest) = route
        .split_first()
        .ok_or_else(|| Error::InvalidArgument("empty route".to_string()))?;
    let mut current = device
        .params
        .get_mut(oid)
        .ok_or_else(|| Error::NotFound(format!("param {:?}", oid)))?;
    for name in rest {
        let (child, _) = sub_param(current, Segment::Name(name.clone()))?;
        current = child;
    }
    Ok(current)
}

/// Non-owning, model-bound reference to one parameter.
///
/// A handle records the validated route to its node and re-walks it under
/// the model's guard on every operation. A structural mutation performed
/// after the handle was obtained (such as `add_param` overwriting the same
/// oid) is not coordinated with the handle; if the route no longer
/// resolves, the operation reports the walk's failure.
pub struct ParamHandle<'m, P: Policy> {
    model: &'m DeviceModel<P>,
    route: Vec<String>,
}

impl<'m, P: Policy> std::fmt::Debug for ParamHandle<'m, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamHandle")
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

impl<'m, P: Policy> ParamHandle<'m, P> {
    /// Oid of the bound descriptor.
    pub fn oid(&self) -> Result<String, Error> {
        let mut doc = self.model.document.lock();
        let descriptor = walk(&mut *doc, &self.route)?;
        Ok(descriptor.oid.clone())
    }

    /// Declared type of the bound descriptor.
    pub fn param_type(&self) -> Result<ParamType, Error> {
        let mut doc = self.model.document.lock();
        let descriptor = walk(&mut *doc, &self.route)?;
        Ok(descriptor.param_type)
    }

    /// Read the value as kind `V`.
    pub fn get_value<V: ParamValue>(&self) -> Result<V, Error> {
        let mut doc = self.model.document.lock();
        let descriptor = walk(&mut *doc, &self.route)?;
        if descriptor.param_type != V::param_type() {
            return Err(Error::Schema(format!(
                "expected param of {} type, found {}",
                V::param_type(),
                descriptor.param_type
            )));
        }
        let value = descriptor
            .value
            .as_ref()
            .ok_or_else(|| Error::Schema("value field is missing".to_string()))?;
        V::from_value(value).ok_or_else(|| {
            Error::Schema(format!(
                "stored value variant does not match declared type {}",
                descriptor.param_type
            ))
        })
    }

    /// Write a value, running it through the declared constraint first. A
    /// failing write never mutates the node.
    pub fn set_value<V: ParamValue>(&self, candidate: V) -> Result<(), Error> {
        let mut doc = self.model.document.lock();
        let descriptor = walk(&mut *doc, &self.route)?;
        if descriptor.param_type != V::param_type() {
            return Err(Error::Schema(format!(
                "expected param of {} type, found {}",
                V::param_type(),
                descriptor.param_type
            )));
        }
        let accepted = candidate.constrain(descriptor.constraint.as_ref())?;
        descriptor.value = Some(accepted.into_value());
        Ok(())
    }

    /// Write one element of an array value. The element runs through the
    /// declared constraint exactly like a scalar write; an index at or
    /// beyond the array length fails without mutating anything.
    pub fn set_value_at<E: ParamElement>(&self, candidate: E, index: usize) -> Result<(), Error> {
        let mut doc = self.model.document.lock();
        let descriptor = walk(&mut *doc, &self.route)?;
        if descriptor.param_type != E::array_type() {
            return Err(Error::Schema(format!(
                "expected param of {} type, found {}",
                E::array_type(),
                descriptor.param_type
            )));
        }
        let accepted = candidate.constrain(descriptor.constraint.as_ref())?;
        let declared = descriptor.param_type;
        let value = descriptor
            .value
            .as_mut()
            .ok_or_else(|| Error::Schema("value field is missing".to_string()))?;
        let elements = E::elements(value).ok_or_else(|| {
            Error::Schema(format!(
                "stored value variant does not match declared type {}",
                declared
            ))
        })?;
        if index >= elements.len() {
            return Err(Error::InvalidArgument(format!(
                "index {} out of range (len {})",
                index,
                elements.len()
            )));
        }
        elements[index] = accepted;
        Ok(())
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for String {}
    impl Sealed for Vec<i32> {}
    impl Sealed for Vec<f32> {}
    impl Sealed for Vec<String> {}
}

/// Rust-side kinds a handle can read and write.
///
/// Sealed: the supported set is fixed by the value model. Adding a variant
/// means adding an implementation here, and the compiler then walks every
/// match that must learn about it.
pub trait ParamValue: sealed::Sealed + Sized {
    /// Wire type this kind corresponds to.
    fn param_type() -> ParamType;
    /// Extract from a stored value; `None` on variant mismatch.
    fn from_value(value: &Value) -> Option<Self>;
    /// Wrap into a stored value.
    fn into_value(self) -> Value;
    /// Run a candidate through a declared constraint.
    fn constrain(self, constraint: Option<&Constraint>) -> Result<Self, Error>;
}

/// Scalar kinds that can address one element of an array value.
pub trait ParamElement: ParamValue {
    fn array_type() -> ParamType;
    fn elements(value: &mut Value) -> Option<&mut Vec<Self>>;
}

impl ParamValue for i32 {
    fn param_type() -> ParamType {
        ParamType::Int32
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int32(self)
    }

    fn constrain(self, constraint: Option<&Constraint>) -> Result<Self, Error> {
        constraint::apply_int(constraint, self)
    }
}

impl ParamElement for i32 {
    fn array_type() -> ParamType {
        ParamType::Int32Array
    }

    fn elements(value: &mut Value) -> Option<&mut Vec<Self>> {
        match value {
            Value::Int32Array(v) => Some(v),
            _ => None,
        }
    }
}

impl ParamValue for f32 {
    fn param_type() -> ParamType {
        ParamType::Float32
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Float32(self)
    }

    fn constrain(self, constraint: Option<&Constraint>) -> Result<Self, Error> {
        constraint::apply_float(constraint, self)
    }
}

impl ParamElement for f32 {
    fn array_type() -> ParamType {
        ParamType::Float32Array
    }

    fn elements(value: &mut Value) -> Option<&mut Vec<Self>> {
        match value {
            Value::Float32Array(v) => Some(v),
            _ => None,
        }
    }
}

impl ParamValue for String {
    fn param_type() -> ParamType {
        ParamType::String
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn constrain(self, constraint: Option<&Constraint>) -> Result<Self, Error> {
        constraint::apply_string(constraint, self)
    }
}

impl ParamElement for String {
    fn array_type() -> ParamType {
        ParamType::StringArray
    }

    fn elements(value: &mut Value) -> Option<&mut Vec<Self>> {
        match value {
            Value::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

impl ParamValue for Vec<i32> {
    fn param_type() -> ParamType {
        ParamType::Int32Array
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int32Array(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int32Array(self)
    }

    fn constrain(self, constraint: Option<&Constraint>) -> Result<Self, Error> {
        self.into_iter()
            .map(|v| constraint::apply_int(constraint, v))
            .collect()
    }
}

impl ParamValue for Vec<f32> {
    fn param_type() -> ParamType {
        ParamType::Float32Array
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float32Array(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Float32Array(self)
    }

    fn constrain(self, constraint: Option<&Constraint>) -> Result<Self, Error> {
        self.into_iter()
            .map(|v| constraint::apply_float(constraint, v))
            .collect()
    }
}

impl ParamValue for Vec<String> {
    fn param_type() -> ParamType {
        ParamType::StringArray
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringArray(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::StringArray(self)
    }

    fn constrain(self, constraint: Option<&Constraint>) -> Result<Self, Error> {
        self.into_iter()
            .map(|v| constraint::apply_string(constraint, v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StructValue;

    fn fixture() -> Device {
        let mut device = Device::default();
        device.params.insert(
            "x".to_string(),
            ParamDescriptor::new("x", ParamType::Int32)
                .with_constraint(Constraint::IntRange { min: 0, max: 10 })
                .with_value(Value::Int32(5)),
        );
        let mut fields = StructValue::default();
        fields.fields.insert(
            "b".to_string(),
            ParamDescriptor::new("b", ParamType::Float32).with_value(Value::Float32(1.5)),
        );
        device.params.insert(
            "a".to_string(),
            ParamDescriptor::new("a", ParamType::Struct).with_value(Value::Struct(fields)),
        );
        device.params.insert(
            "gains".to_string(),
            ParamDescriptor::new("gains", ParamType::Float32Array)
                .with_constraint(Constraint::FloatRange { min: 0.0, max: 1.0 })
                .with_value(Value::Float32Array(vec![0.1, 0.2, 0.3])),
        );
        device
    }

    fn model() -> DeviceModel<Serialized> {
        DeviceModel::from_device(fixture())
    }

    #[test]
    fn test_param_finds_top_level() {
        let model = model();
        let handle = model.param("/x").unwrap();
        assert_eq!(handle.oid().unwrap(), "x");
        assert_eq!(handle.get_value::<i32>().unwrap(), 5);
    }

    #[test]
    fn test_param_missing_oid_is_not_found() {
        let model = model();
        assert!(matches!(model.param("/missing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_param_index_in_oid_position_is_invalid() {
        let model = model();
        assert!(matches!(
            model.param("/3"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_struct_navigation() {
        let model = model();
        let handle = model.param("/a/b").unwrap();
        assert_eq!(handle.oid().unwrap(), "b");
        assert_eq!(handle.get_value::<f32>().unwrap(), 1.5);
    }

    #[test]
    fn test_sub_param_of_scalar_is_invalid() {
        let model = model();
        assert!(matches!(
            model.param("/x/y"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sub_param_of_struct_array_is_not_implemented() {
        let mut device = fixture();
        device.params.insert(
            "rows".to_string(),
            ParamDescriptor::new("rows", ParamType::StructArray)
                .with_value(Value::StructArray(vec![])),
        );
        let model: DeviceModel<Serialized> = DeviceModel::from_device(device);
        assert!(matches!(
            model.param("/rows/0"),
            Err(Error::NotImplemented(_))
        ));
    }

    #[test]
    fn test_missing_struct_field_is_schema_error() {
        let model = model();
        assert!(matches!(model.param("/a/zz"), Err(Error::Schema(_))));
    }

    #[test]
    fn test_set_value_clamps_through_constraint() {
        let model = model();
        let handle = model.param("/x").unwrap();
        handle.set_value(15).unwrap();
        assert_eq!(handle.get_value::<i32>().unwrap(), 10);
        handle.set_value(-5).unwrap();
        assert_eq!(handle.get_value::<i32>().unwrap(), 0);
        handle.set_value(5).unwrap();
        assert_eq!(handle.get_value::<i32>().unwrap(), 5);
    }

    #[test]
    fn test_get_value_type_mismatch_is_schema_error() {
        let model = model();
        let handle = model.param("/a/b").unwrap();
        assert!(matches!(handle.get_value::<i32>(), Err(Error::Schema(_))));
    }

    #[test]
    fn test_set_value_type_mismatch_is_schema_error() {
        let model = model();
        let handle = model.param("/x").unwrap();
        assert!(matches!(handle.set_value(1.0f32), Err(Error::Schema(_))));
        // the failed write left the node untouched
        assert_eq!(handle.get_value::<i32>().unwrap(), 5);
    }

    #[test]
    fn test_add_param_top_level() {
        let model = model();
        let handle = model
            .add_param(
                "/newOid",
                ParamDescriptor::new("", ParamType::Int32).with_value(Value::Int32(1)),
            )
            .unwrap();
        assert_eq!(handle.oid().unwrap(), "newOid");
        assert_eq!(model.param("/newOid").unwrap().oid().unwrap(), "newOid");
    }

    #[test]
    fn test_add_param_below_top_level_is_not_implemented() {
        let model = model();
        let err = model
            .add_param("/a/b", ParamDescriptor::new("b", ParamType::Int32))
            .unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)));
    }

    #[test]
    fn test_add_param_empty_path_is_invalid() {
        let model = model();
        let err = model
            .add_param("", ParamDescriptor::new("p", ParamType::Int32))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_add_param_overwrites_existing() {
        let model = model();
        model
            .add_param(
                "/x",
                ParamDescriptor::new("", ParamType::Float32).with_value(Value::Float32(2.0)),
            )
            .unwrap();
        let handle = model.param("/x").unwrap();
        assert_eq!(handle.get_value::<f32>().unwrap(), 2.0);
    }

    #[test]
    fn test_handle_survives_compatible_overwrite_reports_otherwise() {
        let model = model();
        let handle = model.param("/x").unwrap();
        model
            .add_param("/x", ParamDescriptor::new("", ParamType::String))
            .unwrap();
        // route still resolves, but the overwritten node has a new type
        assert!(matches!(handle.get_value::<i32>(), Err(Error::Schema(_))));
    }

    #[test]
    fn test_array_whole_write_clamps_elements() {
        let model = model();
        let handle = model.param("/gains").unwrap();
        handle.set_value(vec![-1.0f32, 0.5, 2.0]).unwrap();
        assert_eq!(
            handle.get_value::<Vec<f32>>().unwrap(),
            vec![0.0, 0.5, 1.0]
        );
    }

    #[test]
    fn test_array_element_write() {
        let model = model();
        let handle = model.param("/gains").unwrap();
        handle.set_value_at(9.0f32, 1).unwrap();
        assert_eq!(
            handle.get_value::<Vec<f32>>().unwrap(),
            vec![0.1, 1.0, 0.3]
        );
    }

    #[test]
    fn test_array_element_write_out_of_range() {
        let model = model();
        let handle = model.param("/gains").unwrap();
        let err = handle.set_value_at(0.5f32, 3).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(
            handle.get_value::<Vec<f32>>().unwrap(),
            vec![0.1, 0.2, 0.3]
        );
    }

    #[test]
    fn test_device_view_exposes_document() {
        let model = model();
        let doc = model.device();
        assert!(doc.params.contains_key("x"));
        assert!(doc.params.contains_key("a"));
    }

    #[test]
    fn test_unsynchronized_policy_works_single_owner() {
        let model: DeviceModel<crate::concurrency::Unsynchronized> =
            DeviceModel::from_device(fixture());
        let handle = model.param("/x").unwrap();
        handle.set_value(7).unwrap();
        assert_eq!(handle.get_value::<i32>().unwrap(), 7);
        assert!(model.into_device().params.contains_key("x"));
    }
}
