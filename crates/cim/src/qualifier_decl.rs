//! Qualifier declarations

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::{CimError, Result};
use crate::flavor::{Flavor, Scope};
use crate::name::CimName;
use crate::raw::RawQualifierDecl;
use crate::types::CimType;
use crate::value::CimValue;

/// Body of a [`QualifierDecl`]
#[derive(Debug)]
pub struct QualifierDeclRep {
    name: CimName,
    value: CimValue,
    scope: Scope,
    flavor: Flavor,
    array_size: u32,
}

impl RawQualifierDecl for QualifierDeclRep {
    fn name(&self) -> &CimName {
        &self.name
    }

    fn value(&self) -> &CimValue {
        &self.value
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    fn flavor(&self) -> Flavor {
        self.flavor
    }

    fn array_size(&self) -> u32 {
        self.array_size
    }
}

/// Shared handle to a qualifier type declaration
///
/// The declaration fixes the qualifier's type (through its default
/// value), where it may appear, and its default flavor.
#[derive(Debug, Clone, Default)]
pub struct QualifierDecl {
    rep: Option<Arc<RwLock<QualifierDeclRep>>>,
}

impl QualifierDecl {
    pub fn new(
        name: CimName,
        value: CimValue,
        scope: Scope,
        flavor: Flavor,
        array_size: u32,
    ) -> Result<Self> {
        if array_size > 0 && !value.is_array() {
            return Err(CimError::type_mismatch(format!(
                "qualifier {name} has an array size but a scalar type"
            )));
        }
        Ok(Self {
            rep: Some(Arc::new(RwLock::new(QualifierDeclRep {
                name,
                value,
                scope,
                flavor,
                array_size,
            }))),
        })
    }

    pub fn is_uninitialized(&self) -> bool {
        self.rep.is_none()
    }

    fn rep(&self) -> Result<&Arc<RwLock<QualifierDeclRep>>> {
        self.rep.as_ref().ok_or(CimError::UninitializedObject)
    }

    #[doc(hidden)]
    pub fn raw(&self) -> Result<RwLockReadGuard<'_, QualifierDeclRep>> {
        Ok(self.rep()?.read())
    }

    pub fn name(&self) -> Result<CimName> {
        Ok(self.rep()?.read().name.clone())
    }

    pub fn value(&self) -> Result<CimValue> {
        Ok(self.rep()?.read().value.clone())
    }

    pub fn cim_type(&self) -> Result<CimType> {
        Ok(self.rep()?.read().value.cim_type())
    }

    pub fn is_array(&self) -> Result<bool> {
        Ok(self.rep()?.read().value.is_array())
    }

    pub fn set_value(&self, value: CimValue) -> Result<()> {
        let mut rep = self.rep()?.write();
        if !rep.value.type_compatible(&value) {
            return Err(CimError::type_mismatch(format!(
                "qualifier {} is declared {}",
                rep.name,
                rep.value.cim_type()
            )));
        }
        rep.value = value;
        Ok(())
    }

    pub fn scope(&self) -> Result<Scope> {
        Ok(self.rep()?.read().scope)
    }

    pub fn flavor(&self) -> Result<Flavor> {
        Ok(self.rep()?.read().flavor)
    }

    pub fn array_size(&self) -> Result<u32> {
        Ok(self.rep()?.read().array_size)
    }

    pub fn deep_clone(&self) -> Result<Self> {
        let rep = self.rep()?.read();
        Self::new(
            rep.name.clone(),
            rep.value.deep_clone()?,
            rep.scope,
            rep.flavor,
            rep.array_size,
        )
    }

    pub fn identical(&self, other: &QualifierDecl) -> bool {
        match (&self.rep, &other.rep) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            (Some(a), Some(b)) => {
                let (a, b) = (a.read(), b.read());
                a.name == b.name
                    && a.value == b.value
                    && a.scope == b.scope
                    && a.flavor == b.flavor
                    && a.array_size == b.array_size
            }
            (None, None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration() {
        let decl = QualifierDecl::new(
            CimName::new("Key").unwrap(),
            CimValue::from(false),
            Scope::PROPERTY | Scope::REFERENCE,
            Flavor::DISABLEOVERRIDE | Flavor::TOSUBCLASS,
            0,
        )
        .unwrap();
        assert_eq!(decl.cim_type().unwrap(), CimType::Boolean);
        assert!(decl.scope().unwrap().contains(Scope::REFERENCE));
        assert!(decl.set_value(CimValue::from("x")).is_err());
        assert!(decl.set_value(CimValue::from(true)).is_ok());
    }

    #[test]
    fn test_array_size_requires_array() {
        let err = QualifierDecl::new(
            CimName::new("Values").unwrap(),
            CimValue::from("x"),
            Scope::ANY,
            Flavor::DEFAULTS,
            3,
        );
        assert!(matches!(err, Err(CimError::TypeMismatch(_))));
    }

    #[test]
    fn test_uninitialized() {
        let decl = QualifierDecl::default();
        assert!(decl.is_uninitialized());
        assert_eq!(decl.scope().unwrap_err(), CimError::UninitializedObject);
    }
}
