//! Qualifiers and qualifier lists

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::{CimError, Result};
use crate::flavor::Flavor;
use crate::name::CimName;
use crate::ordered_set::{Member, OrderedSet, SMALL_BUCKETS};
use crate::raw::RawQualifier;
use crate::value::CimValue;

/// Body of a [`Qualifier`]
#[derive(Debug)]
pub struct QualifierRep {
    name: CimName,
    value: CimValue,
    flavor: Flavor,
    propagated: bool,
}

impl RawQualifier for QualifierRep {
    fn name(&self) -> &CimName {
        &self.name
    }

    fn value(&self) -> &CimValue {
        &self.value
    }

    fn flavor(&self) -> Flavor {
        self.flavor
    }

    fn propagated(&self) -> bool {
        self.propagated
    }
}

/// Shared handle to a named, flavored qualifier value
#[derive(Debug, Clone, Default)]
pub struct Qualifier {
    rep: Option<Arc<RwLock<QualifierRep>>>,
}

impl Qualifier {
    pub fn new(name: CimName, value: impl Into<CimValue>, flavor: Flavor) -> Self {
        Self::with_propagated(name, value, flavor, false)
    }

    pub fn with_propagated(
        name: CimName,
        value: impl Into<CimValue>,
        flavor: Flavor,
        propagated: bool,
    ) -> Self {
        Self {
            rep: Some(Arc::new(RwLock::new(QualifierRep {
                name,
                value: value.into(),
                flavor,
                propagated,
            }))),
        }
    }

    pub fn is_uninitialized(&self) -> bool {
        self.rep.is_none()
    }

    fn rep(&self) -> Result<&Arc<RwLock<QualifierRep>>> {
        self.rep.as_ref().ok_or(CimError::UninitializedObject)
    }

    /// Read access for serializers
    #[doc(hidden)]
    pub fn raw(&self) -> Result<RwLockReadGuard<'_, QualifierRep>> {
        Ok(self.rep()?.read())
    }

    pub fn name(&self) -> Result<CimName> {
        Ok(self.rep()?.read().name.clone())
    }

    pub fn value(&self) -> Result<CimValue> {
        Ok(self.rep()?.read().value.clone())
    }

    pub fn set_value(&self, value: impl Into<CimValue>) -> Result<()> {
        self.rep()?.write().value = value.into();
        Ok(())
    }

    pub fn flavor(&self) -> Result<Flavor> {
        Ok(self.rep()?.read().flavor)
    }

    /// Merge `flavor` into the bits already set
    pub fn add_flavor(&self, flavor: Flavor) -> Result<()> {
        self.rep()?.write().flavor.insert(flavor);
        Ok(())
    }

    pub fn unset_flavor(&self, flavor: Flavor) -> Result<()> {
        self.rep()?.write().flavor.remove(flavor);
        Ok(())
    }

    pub fn propagated(&self) -> Result<bool> {
        Ok(self.rep()?.read().propagated)
    }

    pub fn set_propagated(&self, propagated: bool) -> Result<()> {
        self.rep()?.write().propagated = propagated;
        Ok(())
    }

    /// New handle over a copy of this qualifier
    pub fn deep_clone(&self) -> Result<Self> {
        let rep = self.rep()?.read();
        Ok(Self::with_propagated(
            rep.name.clone(),
            rep.value.deep_clone()?,
            rep.flavor,
            rep.propagated,
        ))
    }

    pub fn identical(&self, other: &Qualifier) -> bool {
        match (&self.rep, &other.rep) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            (Some(a), Some(b)) => {
                let (a, b) = (a.read(), b.read());
                a.name == b.name
                    && a.value == b.value
                    && a.flavor == b.flavor
                    && a.propagated == b.propagated
            }
            (None, None) => true,
            _ => false,
        }
    }

    /// Boolean value of this qualifier, `None` if it is not a boolean
    pub fn as_bool(&self) -> Result<Option<bool>> {
        Ok(self.rep()?.read().value.as_bool())
    }
}

impl PartialEq for Qualifier {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl Member for Qualifier {
    fn member_name(&self) -> Result<CimName> {
        self.name()
    }

    fn deep_clone_member(&self) -> Result<Self> {
        self.deep_clone()
    }

    fn identical_member(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

/// Ordered, name-unique list of qualifiers
#[derive(Debug)]
pub struct QualifierList {
    set: OrderedSet<Qualifier, SMALL_BUCKETS>,
}

impl Default for QualifierList {
    fn default() -> Self {
        Self::new()
    }
}

impl QualifierList {
    pub fn new() -> Self {
        Self {
            set: OrderedSet::new(),
        }
    }

    /// Append a qualifier; fails if one with the same name is present
    pub fn add(&mut self, qualifier: Qualifier) -> Result<()> {
        self.set.insert(qualifier)
    }

    pub fn find(&self, name: &CimName) -> Option<usize> {
        self.set.find(name)
    }

    /// Find by plain string; an illegal name simply is not found
    pub fn find_str(&self, name: &str) -> Option<usize> {
        CimName::new(name).ok().and_then(|n| self.find(&n))
    }

    pub fn get(&self, index: usize) -> Result<Qualifier> {
        self.set.get(index).cloned()
    }

    pub fn remove(&mut self, index: usize) -> Result<Qualifier> {
        self.set.remove(index)
    }

    pub fn clear(&mut self) {
        self.set.retain(|_| false);
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Qualifier> {
        self.set.iter()
    }

    /// Value of a boolean qualifier, if present and boolean
    pub fn bool_value(&self, name: &str) -> Option<bool> {
        let q = self.set.get(self.find_str(name)?).ok()?;
        q.as_bool().ok().flatten()
    }

    pub fn deep_clone(&self) -> Result<Self> {
        Ok(Self {
            set: self.set.deep_clone()?,
        })
    }

    pub fn identical(&self, other: &QualifierList) -> bool {
        self.set.identical(&other.set)
    }
}
