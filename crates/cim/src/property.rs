//! Properties
//!
//! A [`Property`] is a cheap handle over a shared [`PropertyRep`]. Copies
//! of the handle see each other's changes; [`Property::deep_clone`] gives
//! an independent copy. A default-constructed handle is uninitialized and
//! every accessor on it fails.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::{CimError, Result};
use crate::name::CimName;
use crate::ordered_set::Member;
use crate::qualifier::{Qualifier, QualifierList};
use crate::raw::RawProperty;
use crate::types::CimType;
use crate::value::CimValue;

/// Body of a [`Property`]
#[derive(Debug)]
pub struct PropertyRep {
    name: CimName,
    value: CimValue,
    array_size: u32,
    reference_class_name: Option<CimName>,
    class_origin: Option<CimName>,
    propagated: bool,
    qualifiers: QualifierList,
    /// Number of containers indexing this property by name
    owners: u32,
}

impl RawProperty for PropertyRep {
    fn name(&self) -> &CimName {
        &self.name
    }

    fn value(&self) -> &CimValue {
        &self.value
    }

    fn array_size(&self) -> u32 {
        self.array_size
    }

    fn reference_class_name(&self) -> Option<&CimName> {
        self.reference_class_name.as_ref()
    }

    fn class_origin(&self) -> Option<&CimName> {
        self.class_origin.as_ref()
    }

    fn propagated(&self) -> bool {
        self.propagated
    }

    fn qualifiers(&self) -> &QualifierList {
        &self.qualifiers
    }
}

/// Shared handle to a named, typed property
#[derive(Debug, Clone, Default)]
pub struct Property {
    rep: Option<Arc<RwLock<PropertyRep>>>,
}

impl Property {
    /// Property with no array size, class origin or reference class
    pub fn new(name: CimName, value: impl Into<CimValue>) -> Result<Self> {
        Self::with_details(name, value.into(), 0, None, None, false)
    }

    /// Reference-typed property pointing at instances of `reference_class`
    pub fn reference(name: CimName, value: CimValue, reference_class: CimName) -> Result<Self> {
        Self::with_details(name, value, 0, Some(reference_class), None, false)
    }

    /// Fully specified property
    ///
    /// Fails with [`CimError::TypeMismatch`] when a fixed array size is
    /// given for a scalar (or an array longer than that size), or when a
    /// reference class name is present without a reference type or
    /// missing with one.
    pub fn with_details(
        name: CimName,
        value: CimValue,
        array_size: u32,
        reference_class_name: Option<CimName>,
        class_origin: Option<CimName>,
        propagated: bool,
    ) -> Result<Self> {
        if array_size > 0 && (!value.is_array() || value.array_size() > array_size) {
            return Err(CimError::type_mismatch(format!(
                "property {name}: value does not fit array size {array_size}"
            )));
        }
        let is_reference = value.cim_type() == CimType::Reference;
        match (&reference_class_name, is_reference) {
            (Some(_), false) => {
                return Err(CimError::type_mismatch(format!(
                    "property {name}: reference class given for {} value",
                    value.cim_type()
                )))
            }
            (None, true) => {
                return Err(CimError::type_mismatch(format!(
                    "property {name}: reference without a reference class"
                )))
            }
            _ => {}
        }
        Ok(Self {
            rep: Some(Arc::new(RwLock::new(PropertyRep {
                name,
                value,
                array_size,
                reference_class_name,
                class_origin,
                propagated,
                qualifiers: QualifierList::new(),
                owners: 0,
            }))),
        })
    }

    pub fn is_uninitialized(&self) -> bool {
        self.rep.is_none()
    }

    fn rep(&self) -> Result<&Arc<RwLock<PropertyRep>>> {
        self.rep.as_ref().ok_or(CimError::UninitializedObject)
    }

    /// Read access for serializers
    #[doc(hidden)]
    pub fn raw(&self) -> Result<RwLockReadGuard<'_, PropertyRep>> {
        Ok(self.rep()?.read())
    }

    pub fn name(&self) -> Result<CimName> {
        Ok(self.rep()?.read().name.clone())
    }

    /// Rename a free-standing property
    ///
    /// A property held by an object must be renamed through
    /// [`crate::Object::rename_property`].
    pub fn set_name(&self, name: CimName) -> Result<()> {
        let mut rep = self.rep()?.write();
        if rep.owners > 0 {
            return Err(CimError::InContainer(rep.name.to_string()));
        }
        rep.name = name;
        Ok(())
    }

    pub fn value(&self) -> Result<CimValue> {
        Ok(self.rep()?.read().value.clone())
    }

    /// Replace the value; type and array-ness must match the current value
    pub fn set_value(&self, value: impl Into<CimValue>) -> Result<()> {
        let value = value.into();
        let mut rep = self.rep()?.write();
        if !rep.value.type_compatible(&value) {
            return Err(CimError::type_mismatch(format!(
                "property {} is {}{}, got {}{}",
                rep.name,
                rep.value.cim_type(),
                if rep.value.is_array() { "[]" } else { "" },
                value.cim_type(),
                if value.is_array() { "[]" } else { "" },
            )));
        }
        rep.value = value;
        Ok(())
    }

    pub fn cim_type(&self) -> Result<CimType> {
        Ok(self.rep()?.read().value.cim_type())
    }

    pub fn is_array(&self) -> Result<bool> {
        Ok(self.rep()?.read().value.is_array())
    }

    pub fn array_size(&self) -> Result<u32> {
        Ok(self.rep()?.read().array_size)
    }

    pub fn reference_class_name(&self) -> Result<Option<CimName>> {
        Ok(self.rep()?.read().reference_class_name.clone())
    }

    pub fn class_origin(&self) -> Result<Option<CimName>> {
        Ok(self.rep()?.read().class_origin.clone())
    }

    pub fn set_class_origin(&self, class_origin: Option<CimName>) -> Result<()> {
        self.rep()?.write().class_origin = class_origin;
        Ok(())
    }

    pub fn propagated(&self) -> Result<bool> {
        Ok(self.rep()?.read().propagated)
    }

    pub fn set_propagated(&self, propagated: bool) -> Result<()> {
        self.rep()?.write().propagated = propagated;
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

    pub(crate) fn clear_qualifiers(&self) -> Result<()> {
        self.rep()?.write().qualifiers.clear();
        Ok(())
    }

    /// Boolean qualifier lookup, e.g. `Key`
    pub fn bool_qualifier(&self, name: &str) -> Result<Option<bool>> {
        Ok(self.rep()?.read().qualifiers.bool_value(name))
    }

    /// New handle over an independent copy, qualifiers included
    pub fn deep_clone(&self) -> Result<Self> {
        let rep = self.rep()?.read();
        Ok(Self {
            rep: Some(Arc::new(RwLock::new(PropertyRep {
                name: rep.name.clone(),
                value: rep.value.deep_clone()?,
                array_size: rep.array_size,
                reference_class_name: rep.reference_class_name.clone(),
                class_origin: rep.class_origin.clone(),
                propagated: rep.propagated,
                qualifiers: rep.qualifiers.deep_clone()?,
                owners: 0,
            }))),
        })
    }

    /// Copy without qualifiers, class origin kept
    pub fn clone_without_qualifiers(&self) -> Result<Self> {
        let rep = self.rep()?.read();
        Self::with_details(
            rep.name.clone(),
            rep.value.deep_clone()?,
            rep.array_size,
            rep.reference_class_name.clone(),
            rep.class_origin.clone(),
            rep.propagated,
        )
    }

    /// Structural equality; handles sharing a body are trivially identical
    pub fn identical(&self, other: &Property) -> bool {
        match (&self.rep, &other.rep) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            (Some(a), Some(b)) => {
                let (a, b) = (a.read(), b.read());
                a.name == b.name
                    && a.value == b.value
                    && a.array_size == b.array_size
                    && a.reference_class_name == b.reference_class_name
                    && a.class_origin == b.class_origin
                    && a.propagated == b.propagated
                    && a.qualifiers.identical(&b.qualifiers)
            }
            (None, None) => true,
            _ => false,
        }
    }

    /// True when both handles share one body
    pub fn same_rep(&self, other: &Property) -> bool {
        matches!((&self.rep, &other.rep), (Some(a), Some(b)) if Arc::ptr_eq(a, b))
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl Member for Property {
    fn member_name(&self) -> Result<CimName> {
        self.name()
    }

    fn attach(&self) {
        if let Some(rep) = &self.rep {
            rep.write().owners += 1;
        }
    }

    fn detach(&self) {
        if let Some(rep) = &self.rep {
            let mut rep = rep.write();
            rep.owners = rep.owners.saturating_sub(1);
        }
    }

    fn deep_clone_member(&self) -> Result<Self> {
        self.deep_clone()
    }

    fn identical_member(&self, other: &Self) -> bool {
        self.identical(other)
    }
}
