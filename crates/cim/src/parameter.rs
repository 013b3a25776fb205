//! Method parameters
//!
//! Parameters declare the type of a method argument; they carry no value.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::{CimError, Result};
use crate::name::CimName;
use crate::ordered_set::Member;
use crate::qualifier::{Qualifier, QualifierList};
use crate::raw::RawParameter;
use crate::types::CimType;

/// Body of a [`Parameter`]
#[derive(Debug)]
pub struct ParameterRep {
    name: CimName,
    cim_type: CimType,
    is_array: bool,
    array_size: u32,
    reference_class_name: Option<CimName>,
    qualifiers: QualifierList,
    owners: u32,
}

impl RawParameter for ParameterRep {
    fn name(&self) -> &CimName {
        &self.name
    }

    fn cim_type(&self) -> CimType {
        self.cim_type
    }

    fn is_array(&self) -> bool {
        self.is_array
    }

    fn array_size(&self) -> u32 {
        self.array_size
    }

    fn reference_class_name(&self) -> Option<&CimName> {
        self.reference_class_name.as_ref()
    }

    fn qualifiers(&self) -> &QualifierList {
        &self.qualifiers
    }
}

/// Shared handle to a method parameter declaration
#[derive(Debug, Clone, Default)]
pub struct Parameter {
    rep: Option<Arc<RwLock<ParameterRep>>>,
}

impl Parameter {
    pub fn new(
        name: CimName,
        cim_type: CimType,
        is_array: bool,
        array_size: u32,
        reference_class_name: Option<CimName>,
    ) -> Result<Self> {
        if array_size > 0 && !is_array {
            return Err(CimError::type_mismatch(format!(
                "parameter {name}: array size on a scalar"
            )));
        }
        match (&reference_class_name, cim_type == CimType::Reference) {
            (Some(_), false) => {
                return Err(CimError::type_mismatch(format!(
                    "parameter {name}: reference class given for {cim_type}"
                )))
            }
            (None, true) => {
                return Err(CimError::type_mismatch(format!(
                    "parameter {name}: reference without a reference class"
                )))
            }
            _ => {}
        }
        Ok(Self {
            rep: Some(Arc::new(RwLock::new(ParameterRep {
                name,
                cim_type,
                is_array,
                array_size,
                reference_class_name,
                qualifiers: QualifierList::new(),
                owners: 0,
            }))),
        })
    }

    /// Scalar parameter of a non-reference type
    pub fn scalar(name: CimName, cim_type: CimType) -> Result<Self> {
        Self::new(name, cim_type, false, 0, None)
    }

    pub fn is_uninitialized(&self) -> bool {
        self.rep.is_none()
    }

    fn rep(&self) -> Result<&Arc<RwLock<ParameterRep>>> {
        self.rep.as_ref().ok_or(CimError::UninitializedObject)
    }

    #[doc(hidden)]
    pub fn raw(&self) -> Result<RwLockReadGuard<'_, ParameterRep>> {
        Ok(self.rep()?.read())
    }

    pub fn name(&self) -> Result<CimName> {
        Ok(self.rep()?.read().name.clone())
    }

    /// Rename a parameter that no method currently holds
    pub fn set_name(&self, name: CimName) -> Result<()> {
        let mut rep = self.rep()?.write();
        if rep.owners > 0 {
            return Err(CimError::InContainer(rep.name.to_string()));
        }
        rep.name = name;
        Ok(())
    }

    pub fn cim_type(&self) -> Result<CimType> {
        Ok(self.rep()?.read().cim_type)
    }

    pub fn is_array(&self) -> Result<bool> {
        Ok(self.rep()?.read().is_array)
    }

    pub fn array_size(&self) -> Result<u32> {
        Ok(self.rep()?.read().array_size)
    }

    pub fn reference_class_name(&self) -> Result<Option<CimName>> {
        Ok(self.rep()?.read().reference_class_name.clone())
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

    pub fn deep_clone(&self) -> Result<Self> {
        let rep = self.rep()?.read();
        Ok(Self {
            rep: Some(Arc::new(RwLock::new(ParameterRep {
                name: rep.name.clone(),
                cim_type: rep.cim_type,
                is_array: rep.is_array,
                array_size: rep.array_size,
                reference_class_name: rep.reference_class_name.clone(),
                qualifiers: rep.qualifiers.deep_clone()?,
                owners: 0,
            }))),
        })
    }

    pub fn identical(&self, other: &Parameter) -> bool {
        match (&self.rep, &other.rep) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            (Some(a), Some(b)) => {
                let (a, b) = (a.read(), b.read());
                a.name == b.name
                    && a.cim_type == b.cim_type
                    && a.is_array == b.is_array
                    && a.array_size == b.array_size
                    && a.reference_class_name == b.reference_class_name
                    && a.qualifiers.identical(&b.qualifiers)
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl Member for Parameter {
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
