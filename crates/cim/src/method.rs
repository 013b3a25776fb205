//! Methods

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::{CimError, Result};
use crate::name::CimName;
use crate::ordered_set::{Member, OrderedSet, SMALL_BUCKETS};
use crate::parameter::Parameter;
use crate::qualifier::{Qualifier, QualifierList};
use crate::raw::RawMethod;
use crate::types::CimType;

/// Body of a [`Method`]
#[derive(Debug)]
pub struct MethodRep {
    name: CimName,
    return_type: CimType,
    class_origin: Option<CimName>,
    propagated: bool,
    qualifiers: QualifierList,
    parameters: OrderedSet<Parameter, SMALL_BUCKETS>,
    owners: u32,
}

impl RawMethod for MethodRep {
    fn name(&self) -> &CimName {
        &self.name
    }

    fn return_type(&self) -> CimType {
        self.return_type
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

    fn parameters(&self) -> Box<dyn Iterator<Item = &Parameter> + '_> {
        Box::new(self.parameters.iter())
    }
}

/// Shared handle to a method declaration
#[derive(Debug, Clone, Default)]
pub struct Method {
    rep: Option<Arc<RwLock<MethodRep>>>,
}

impl Method {
    pub fn new(name: CimName, return_type: CimType) -> Self {
        Self::with_details(name, return_type, None, false)
    }

    pub fn with_details(
        name: CimName,
        return_type: CimType,
        class_origin: Option<CimName>,
        propagated: bool,
    ) -> Self {
        Self {
            rep: Some(Arc::new(RwLock::new(MethodRep {
                name,
                return_type,
                class_origin,
                propagated,
                qualifiers: QualifierList::new(),
                parameters: OrderedSet::new(),
                owners: 0,
            }))),
        }
    }

    pub fn is_uninitialized(&self) -> bool {
        self.rep.is_none()
    }

    fn rep(&self) -> Result<&Arc<RwLock<MethodRep>>> {
        self.rep.as_ref().ok_or(CimError::UninitializedObject)
    }

    #[doc(hidden)]
    pub fn raw(&self) -> Result<RwLockReadGuard<'_, MethodRep>> {
        Ok(self.rep()?.read())
    }

    pub fn name(&self) -> Result<CimName> {
        Ok(self.rep()?.read().name.clone())
    }

    /// Rename a method that no class currently holds
    pub fn set_name(&self, name: CimName) -> Result<()> {
        let mut rep = self.rep()?.write();
        if rep.owners > 0 {
            return Err(CimError::InContainer(rep.name.to_string()));
        }
        rep.name = name;
        Ok(())
    }

    pub fn return_type(&self) -> Result<CimType> {
        Ok(self.rep()?.read().return_type)
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

    pub fn qualifier_count(&self) -> Result<usize> {
        Ok(self.rep()?.read().qualifiers.len())
    }

    /// Append a parameter; duplicate names are rejected
    pub fn add_parameter(&self, parameter: Parameter) -> Result<()> {
        if parameter.is_uninitialized() {
            return Err(CimError::UninitializedObject);
        }
        self.rep()?.write().parameters.insert(parameter)
    }

    pub fn find_parameter(&self, name: &CimName) -> Result<Option<usize>> {
        Ok(self.rep()?.read().parameters.find(name))
    }

    pub fn get_parameter(&self, index: usize) -> Result<Parameter> {
        self.rep()?.read().parameters.get(index).cloned()
    }

    pub fn remove_parameter(&self, index: usize) -> Result<Parameter> {
        self.rep()?.write().parameters.remove(index)
    }

    pub fn parameter_count(&self) -> Result<usize> {
        Ok(self.rep()?.read().parameters.len())
    }

    /// Rename the parameter at `index`, re-keying it in place
    pub fn rename_parameter(&self, index: usize, name: CimName) -> Result<()> {
        self.rep()?
            .write()
            .parameters
            .rename(index, name, |p, n| p.set_name(n))
    }

    pub fn deep_clone(&self) -> Result<Self> {
        let rep = self.rep()?.read();
        Ok(Self {
            rep: Some(Arc::new(RwLock::new(MethodRep {
                name: rep.name.clone(),
                return_type: rep.return_type,
                class_origin: rep.class_origin.clone(),
                propagated: rep.propagated,
                qualifiers: rep.qualifiers.deep_clone()?,
                parameters: rep.parameters.deep_clone()?,
                owners: 0,
            }))),
        })
    }

    pub fn identical(&self, other: &Method) -> bool {
        match (&self.rep, &other.rep) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            (Some(a), Some(b)) => {
                let (a, b) = (a.read(), b.read());
                a.name == b.name
                    && a.return_type == b.return_type
                    && a.class_origin == b.class_origin
                    && a.propagated == b.propagated
                    && a.qualifiers.identical(&b.qualifiers)
                    && a.parameters.identical(&b.parameters)
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl Member for Method {
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
