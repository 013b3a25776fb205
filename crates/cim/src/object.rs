//! Classes, instances and the object body they share
//!
//! An [`Object`] is a handle to a body holding the identity path, the
//! object's qualifiers and its ordered property set. [`Class`] and
//! [`Instance`] are thin wrappers that add the class-only parts (superclass
//! and methods) and instance-only operations. Both dereference to
//! [`Object`], so the common property and qualifier API is shared.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::trace;

use crate::error::{CimError, Result};
use crate::method::Method;
use crate::name::CimName;
use crate::ordered_set::{OrderedSet, PROPERTY_BUCKETS, SMALL_BUCKETS};
use crate::path::{KeyBinding, ObjectPath};
use crate::property::Property;
use crate::property_list::PropertyList;
use crate::qualifier::{Qualifier, QualifierList};
use crate::raw::RawObject;

#[derive(Debug)]
enum ObjectKind {
    Class {
        super_class_name: Option<CimName>,
        methods: OrderedSet<Method, SMALL_BUCKETS>,
    },
    Instance,
}

/// Body of an [`Object`]
#[derive(Debug)]
pub struct ObjectRep {
    path: ObjectPath,
    qualifiers: QualifierList,
    properties: OrderedSet<Property, PROPERTY_BUCKETS>,
    kind: ObjectKind,
}

impl RawObject for ObjectRep {
    fn class_name(&self) -> &CimName {
        self.path.class_name()
    }

    fn path(&self) -> &ObjectPath {
        &self.path
    }

    fn is_class(&self) -> bool {
        matches!(self.kind, ObjectKind::Class { .. })
    }

    fn super_class_name(&self) -> Option<&CimName> {
        match &self.kind {
            ObjectKind::Class {
                super_class_name, ..
            } => super_class_name.as_ref(),
            ObjectKind::Instance => None,
        }
    }

    fn qualifiers(&self) -> &QualifierList {
        &self.qualifiers
    }

    fn properties(&self) -> Box<dyn Iterator<Item = &Property> + '_> {
        Box::new(self.properties.iter())
    }

    fn find_property(&self, name: &CimName) -> Option<&Property> {
        let index = self.properties.find(name)?;
        self.properties.get(index).ok()
    }

    fn methods(&self) -> Box<dyn Iterator<Item = &Method> + '_> {
        match &self.kind {
            ObjectKind::Class { methods, .. } => Box::new(methods.iter()),
            ObjectKind::Instance => Box::new(std::iter::empty()),
        }
    }
}

/// Shared handle to a class or an instance
#[derive(Debug, Clone, Default)]
pub struct Object {
    rep: Option<Arc<RwLock<ObjectRep>>>,
}

impl Object {
    fn from_rep(rep: ObjectRep) -> Self {
        Self {
            rep: Some(Arc::new(RwLock::new(rep))),
        }
    }

    pub fn is_uninitialized(&self) -> bool {
        self.rep.is_none()
    }

    fn rep(&self) -> Result<&Arc<RwLock<ObjectRep>>> {
        self.rep.as_ref().ok_or(CimError::UninitializedObject)
    }

    #[doc(hidden)]
    pub fn raw(&self) -> Result<RwLockReadGuard<'_, ObjectRep>> {
        Ok(self.rep()?.read())
    }

    pub fn is_class(&self) -> Result<bool> {
        Ok(self.rep()?.read().is_class())
    }

    pub fn is_instance(&self) -> Result<bool> {
        Ok(!self.is_class()?)
    }

    pub fn class_name(&self) -> Result<CimName> {
        Ok(self.rep()?.read().path.class_name().clone())
    }

    pub fn path(&self) -> Result<ObjectPath> {
        Ok(self.rep()?.read().path.clone())
    }

    /// Replace the identity path; its class name must not change
    pub fn set_path(&self, path: ObjectPath) -> Result<()> {
        let mut rep = self.rep()?.write();
        if rep.path.class_name() != path.class_name() {
            return Err(CimError::type_mismatch(format!(
                "cannot change class name {} to {} through the object path",
                rep.path.class_name(),
                path.class_name()
            )));
        }
        rep.path = path;
        Ok(())
    }

    pub fn add_qualifier(&self, qualifier: Qualifier) -> Result<()> {
        if qualifier.is_uninitialized() {
            return Err(CimError::UninitializedObject);
        }
        self.rep()?.write().qualifiers.add(qualifier)
    }

    pub fn find_qualifier(&self, name: &CimName) -> Result<Option<usize>> {
        Ok(self.rep()?.read().qualifiers.find(name))
    }

    pub fn get_qualifier(&self, index: usize) -> Result<Qualifier> {
        self.rep()?.read().qualifiers.get(index)
    }

    pub fn remove_qualifier(&self, index: usize) -> Result<Qualifier> {
        self.rep()?.write().qualifiers.remove(index)
    }

    pub fn qualifier_count(&self) -> Result<usize> {
        Ok(self.rep()?.read().qualifiers.len())
    }

    /// Value of a boolean qualifier on the object itself
    pub fn bool_qualifier(&self, name: &str) -> Result<Option<bool>> {
        Ok(self.rep()?.read().qualifiers.bool_value(name))
    }

    /// Append a property; a duplicate name leaves the object unchanged
    pub fn add_property(&self, property: Property) -> Result<()> {
        if property.is_uninitialized() {
            return Err(CimError::UninitializedObject);
        }
        let mut rep = self.rep()?.write();
        rep.properties.insert(property)
    }

    pub fn find_property(&self, name: &CimName) -> Result<Option<usize>> {
        Ok(self.rep()?.read().properties.find(name))
    }

    pub fn get_property(&self, index: usize) -> Result<Property> {
        self.rep()?.read().properties.get(index).cloned()
    }

    /// Property handle by name, if present
    pub fn property(&self, name: &CimName) -> Result<Option<Property>> {
        let rep = self.rep()?.read();
        Ok(rep
            .properties
            .find(name)
            .and_then(|i| rep.properties.get(i).ok().cloned()))
    }

    pub fn remove_property(&self, index: usize) -> Result<Property> {
        self.rep()?.write().properties.remove(index)
    }

    /// Rename the property at `index` while keeping its position
    pub fn rename_property(&self, index: usize, name: CimName) -> Result<()> {
        self.rep()?
            .write()
            .properties
            .rename(index, name, |p, n| p.set_name(n))
    }

    pub fn property_count(&self) -> Result<usize> {
        Ok(self.rep()?.read().properties.len())
    }

    /// Handles to every property in insertion order
    pub fn properties(&self) -> Result<Vec<Property>> {
        Ok(self.rep()?.read().properties.iter().cloned().collect())
    }

    /// Project the object in place for a request's include flags and
    /// property list
    pub fn instance_filter(
        &self,
        include_qualifiers: bool,
        include_class_origin: bool,
        property_list: &PropertyList,
    ) -> Result<()> {
        let mut rep = self.rep()?.write();
        if !include_qualifiers {
            rep.qualifiers.clear();
        }
        let mut failure = None;
        rep.properties.retain(|property| {
            let name = match property.name() {
                Ok(name) => name,
                Err(e) => {
                    failure.get_or_insert(e);
                    return true;
                }
            };
            if !property_list.contains(&name) {
                trace!(property = %name, "filtered out of object");
                return false;
            }
            if let Err(e) = project_property(property, include_qualifiers, include_class_origin) {
                failure.get_or_insert(e);
            }
            true
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// New handle over an independent copy of the whole object
    pub fn deep_clone(&self) -> Result<Self> {
        let rep = self.rep()?.read();
        let kind = match &rep.kind {
            ObjectKind::Class {
                super_class_name,
                methods,
            } => ObjectKind::Class {
                super_class_name: super_class_name.clone(),
                methods: methods.deep_clone()?,
            },
            ObjectKind::Instance => ObjectKind::Instance,
        };
        Ok(Self::from_rep(ObjectRep {
            path: rep.path.clone(),
            qualifiers: rep.qualifiers.deep_clone()?,
            properties: rep.properties.deep_clone()?,
            kind,
        }))
    }

    /// Deep comparison of path, qualifiers and properties in order
    pub fn identical(&self, other: &Object) -> bool {
        match (&self.rep, &other.rep) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            (Some(a), Some(b)) => {
                let (a, b) = (a.read(), b.read());
                let kind_matches = match (&a.kind, &b.kind) {
                    (
                        ObjectKind::Class {
                            super_class_name: sa,
                            methods: ma,
                        },
                        ObjectKind::Class {
                            super_class_name: sb,
                            methods: mb,
                        },
                    ) => sa == sb && ma.identical(mb),
                    (ObjectKind::Instance, ObjectKind::Instance) => true,
                    _ => false,
                };
                kind_matches
                    && a.path.identical(&b.path)
                    && a.qualifiers.identical(&b.qualifiers)
                    && a.properties.identical(&b.properties)
            }
            (None, None) => true,
            _ => false,
        }
    }
}

fn project_property(
    property: &Property,
    include_qualifiers: bool,
    include_class_origin: bool,
) -> Result<()> {
    if !include_class_origin {
        property.set_class_origin(None)?;
    }
    if !include_qualifiers {
        property.clear_qualifiers()?;
    }
    Ok(())
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

/// A class declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Class(Object);

impl Class {
    pub fn new(class_name: CimName, super_class_name: Option<CimName>) -> Self {
        Self(Object::from_rep(ObjectRep {
            path: ObjectPath::new(class_name),
            qualifiers: QualifierList::new(),
            properties: OrderedSet::new(),
            kind: ObjectKind::Class {
                super_class_name,
                methods: OrderedSet::new(),
            },
        }))
    }

    fn with_class<T>(
        &self,
        f: impl FnOnce(&Option<CimName>, &OrderedSet<Method, SMALL_BUCKETS>) -> T,
    ) -> Result<T> {
        let rep = self.0.rep()?.read();
        match &rep.kind {
            ObjectKind::Class {
                super_class_name,
                methods,
            } => Ok(f(super_class_name, methods)),
            ObjectKind::Instance => Err(CimError::type_mismatch("object is not a class")),
        }
    }

    fn with_class_mut<T>(
        &self,
        f: impl FnOnce(&mut Option<CimName>, &mut OrderedSet<Method, SMALL_BUCKETS>) -> T,
    ) -> Result<T> {
        let mut rep = self.0.rep()?.write();
        match &mut rep.kind {
            ObjectKind::Class {
                super_class_name,
                methods,
            } => Ok(f(super_class_name, methods)),
            ObjectKind::Instance => Err(CimError::type_mismatch("object is not a class")),
        }
    }

    pub fn super_class_name(&self) -> Result<Option<CimName>> {
        self.with_class(|s, _| s.clone())
    }

    pub fn set_super_class_name(&self, name: Option<CimName>) -> Result<()> {
        self.with_class_mut(|s, _| *s = name)
    }

    pub fn add_method(&self, method: Method) -> Result<()> {
        if method.is_uninitialized() {
            return Err(CimError::UninitializedObject);
        }
        self.with_class_mut(|_, methods| methods.insert(method))?
    }

    pub fn find_method(&self, name: &CimName) -> Result<Option<usize>> {
        self.with_class(|_, methods| methods.find(name))
    }

    pub fn get_method(&self, index: usize) -> Result<Method> {
        self.with_class(|_, methods| methods.get(index).cloned())?
    }

    pub fn remove_method(&self, index: usize) -> Result<Method> {
        self.with_class_mut(|_, methods| methods.remove(index))?
    }

    pub fn method_count(&self) -> Result<usize> {
        self.with_class(|_, methods| methods.len())
    }

    /// True when the class carries `Association(true)`
    pub fn is_association(&self) -> Result<bool> {
        Ok(self.bool_qualifier("Association")?.unwrap_or(false))
    }

    /// True when the class carries `Abstract(true)`
    pub fn is_abstract(&self) -> Result<bool> {
        Ok(self.bool_qualifier("Abstract")?.unwrap_or(false))
    }

    /// Names of properties qualified `Key(true)`, in declaration order
    pub fn key_names(&self) -> Result<Vec<CimName>> {
        let rep = self.0.rep()?.read();
        let mut names = Vec::new();
        for property in rep.properties.iter() {
            if property.bool_qualifier("Key")? == Some(true) {
                names.push(property.name()?);
            }
        }
        Ok(names)
    }

    pub fn deep_clone(&self) -> Result<Self> {
        Ok(Self(self.0.deep_clone()?))
    }

    pub fn as_object(&self) -> &Object {
        &self.0
    }
}

impl Deref for Class {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

impl From<Class> for Object {
    fn from(class: Class) -> Self {
        class.0
    }
}

impl TryFrom<Object> for Class {
    type Error = CimError;

    fn try_from(object: Object) -> Result<Self> {
        if object.is_class()? {
            Ok(Self(object))
        } else {
            Err(CimError::type_mismatch("object is not a class"))
        }
    }
}

/// An instance of a class
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance(Object);

impl Instance {
    pub fn new(class_name: CimName) -> Self {
        Self(Object::from_rep(ObjectRep {
            path: ObjectPath::new(class_name),
            qualifiers: QualifierList::new(),
            properties: OrderedSet::new(),
            kind: ObjectKind::Instance,
        }))
    }

    /// Instance name built from the key properties `class` declares
    ///
    /// The result carries neither host nor namespace. A key the instance
    /// does not set is reported as not found.
    pub fn build_path(&self, class: &Class) -> Result<ObjectPath> {
        let class_name = self.class_name()?;
        let mut bindings = Vec::new();
        for key in class.key_names()? {
            let property = self
                .property(&key)?
                .ok_or_else(|| CimError::not_found(format!("key property {key} of {class_name}")))?;
            bindings.push(KeyBinding::from_value(key, &property.value()?)?);
        }
        Ok(ObjectPath::new(class_name).with_key_bindings(bindings))
    }

    pub fn deep_clone(&self) -> Result<Self> {
        Ok(Self(self.0.deep_clone()?))
    }

    pub fn as_object(&self) -> &Object {
        &self.0
    }
}

impl Deref for Instance {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

impl From<Instance> for Object {
    fn from(instance: Instance) -> Self {
        instance.0
    }
}

impl TryFrom<Object> for Instance {
    type Error = CimError;

    fn try_from(object: Object) -> Result<Self> {
        if object.is_instance()? {
            Ok(Self(object))
        } else {
            Err(CimError::type_mismatch("object is not an instance"))
        }
    }
}
