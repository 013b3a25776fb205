//! Repository interface
//!
//! The compiler hands finished declarations to a [`Repository`] and reads
//! qualifier declarations and classes back from it. Failures are reported
//! as [`CimError`]s carrying a standard status code, so the compiler can
//! tell "already exists" apart from real errors.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use cim::{CimError, CimName, Class, Instance, NamespaceName, ObjectPath, QualifierDecl, Result, StatusCode};

/// Sink and source of schema objects for one compilation
pub trait Repository: Send + Sync {
    fn create_namespace(&self, namespace: &NamespaceName) -> Result<()>;

    /// Add or replace a qualifier declaration
    fn add_qualifier(&self, namespace: &NamespaceName, decl: &QualifierDecl) -> Result<()>;

    fn get_qualifier_decl(&self, namespace: &NamespaceName, name: &CimName) -> Result<QualifierDecl>;

    /// Add a class whose superclass, if any, is already present
    fn add_class(&self, namespace: &NamespaceName, class: &Class) -> Result<()>;

    /// Replace an existing class
    fn modify_class(&self, namespace: &NamespaceName, class: &Class) -> Result<()>;

    fn get_class(&self, namespace: &NamespaceName, name: &CimName) -> Result<Class>;

    /// Add an instance and return its path
    fn add_instance(&self, namespace: &NamespaceName, instance: &Instance) -> Result<ObjectPath>;

    /// Called once after the last file compiled
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: Repository + ?Sized> Repository for Arc<T> {
    fn create_namespace(&self, namespace: &NamespaceName) -> Result<()> {
        (**self).create_namespace(namespace)
    }

    fn add_qualifier(&self, namespace: &NamespaceName, decl: &QualifierDecl) -> Result<()> {
        (**self).add_qualifier(namespace, decl)
    }

    fn get_qualifier_decl(&self, namespace: &NamespaceName, name: &CimName) -> Result<QualifierDecl> {
        (**self).get_qualifier_decl(namespace, name)
    }

    fn add_class(&self, namespace: &NamespaceName, class: &Class) -> Result<()> {
        (**self).add_class(namespace, class)
    }

    fn modify_class(&self, namespace: &NamespaceName, class: &Class) -> Result<()> {
        (**self).modify_class(namespace, class)
    }

    fn get_class(&self, namespace: &NamespaceName, name: &CimName) -> Result<Class> {
        (**self).get_class(namespace, name)
    }

    fn add_instance(&self, namespace: &NamespaceName, instance: &Instance) -> Result<ObjectPath> {
        (**self).add_instance(namespace, instance)
    }

    fn finish(&self) -> Result<()> {
        (**self).finish()
    }
}

impl<T: Repository + ?Sized> Repository for &T {
    fn create_namespace(&self, namespace: &NamespaceName) -> Result<()> {
        (**self).create_namespace(namespace)
    }

    fn add_qualifier(&self, namespace: &NamespaceName, decl: &QualifierDecl) -> Result<()> {
        (**self).add_qualifier(namespace, decl)
    }

    fn get_qualifier_decl(&self, namespace: &NamespaceName, name: &CimName) -> Result<QualifierDecl> {
        (**self).get_qualifier_decl(namespace, name)
    }

    fn add_class(&self, namespace: &NamespaceName, class: &Class) -> Result<()> {
        (**self).add_class(namespace, class)
    }

    fn modify_class(&self, namespace: &NamespaceName, class: &Class) -> Result<()> {
        (**self).modify_class(namespace, class)
    }

    fn get_class(&self, namespace: &NamespaceName, name: &CimName) -> Result<Class> {
        (**self).get_class(namespace, name)
    }

    fn add_instance(&self, namespace: &NamespaceName, instance: &Instance) -> Result<ObjectPath> {
        (**self).add_instance(namespace, instance)
    }

    fn finish(&self) -> Result<()> {
        (**self).finish()
    }
}

/// Stamp local properties with their class origin and copy in the
/// properties the class inherits from `super_class`
fn resolve(
    class: &Class,
    name: &CimName,
    super_class: Option<&CimName>,
    ns: &Namespace,
) -> Result<()> {
    for property in class.properties()? {
        if property.class_origin()?.is_none() {
            property.set_class_origin(Some(name.clone()))?;
        }
    }
    let Some(super_class) = super_class else {
        return Ok(());
    };
    let parent = ns.classes.get(super_class).ok_or_else(|| {
        CimError::status(
            StatusCode::InvalidSuperclass,
            format!("superclass {super_class} of {name}"),
        )
    })?;
    for property in parent.properties()? {
        if class.find_property(&property.name()?)?.is_none() {
            let inherited = property.deep_clone()?;
            inherited.set_propagated(true)?;
            class.add_property(inherited)?;
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Namespace {
    qualifiers: HashMap<CimName, QualifierDecl>,
    classes: HashMap<CimName, Class>,
    /// Insertion order
    instances: Vec<(ObjectPath, Instance)>,
}

/// Repository held entirely in memory
///
/// Objects are deep-cloned on the way in and out, so callers never share
/// a body with the stored copy.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    namespaces: RwLock<HashMap<NamespaceName, Namespace>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_namespace(&self, namespace: &NamespaceName) -> bool {
        self.namespaces.read().contains_key(namespace)
    }

    pub fn class_names(&self, namespace: &NamespaceName) -> Vec<CimName> {
        self.namespaces
            .read()
            .get(namespace)
            .map(|ns| ns.classes.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn qualifier_count(&self, namespace: &NamespaceName) -> usize {
        self.namespaces
            .read()
            .get(namespace)
            .map_or(0, |ns| ns.qualifiers.len())
    }

    /// Stored instances in the order they were added
    pub fn instances(&self, namespace: &NamespaceName) -> Result<Vec<Instance>> {
        let namespaces = self.namespaces.read();
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };
        ns.instances.iter().map(|(_, i)| i.deep_clone()).collect()
    }

    pub fn get_instance(&self, namespace: &NamespaceName, path: &ObjectPath) -> Result<Instance> {
        let namespaces = self.namespaces.read();
        namespaces
            .get(namespace)
            .and_then(|ns| ns.instances.iter().find(|(p, _)| p == path))
            .ok_or_else(|| CimError::status(StatusCode::NotFound, path.to_string()))?
            .1
            .deep_clone()
    }

    fn with_namespace<T>(
        &self,
        namespace: &NamespaceName,
        f: impl FnOnce(&Namespace) -> Result<T>,
    ) -> Result<T> {
        let namespaces = self.namespaces.read();
        let ns = namespaces
            .get(namespace)
            .ok_or_else(|| CimError::status(StatusCode::InvalidNamespace, namespace.to_string()))?;
        f(ns)
    }

    fn with_namespace_mut<T>(
        &self,
        namespace: &NamespaceName,
        f: impl FnOnce(&mut Namespace) -> Result<T>,
    ) -> Result<T> {
        let mut namespaces = self.namespaces.write();
        let ns = namespaces
            .get_mut(namespace)
            .ok_or_else(|| CimError::status(StatusCode::InvalidNamespace, namespace.to_string()))?;
        f(ns)
    }
}

impl Repository for MemoryRepository {
    fn create_namespace(&self, namespace: &NamespaceName) -> Result<()> {
        let mut namespaces = self.namespaces.write();
        if namespaces.contains_key(namespace) {
            return Err(CimError::status(StatusCode::AlreadyExists, namespace.to_string()));
        }
        debug!(namespace = %namespace, "created namespace");
        namespaces.insert(namespace.clone(), Namespace::default());
        Ok(())
    }

    fn add_qualifier(&self, namespace: &NamespaceName, decl: &QualifierDecl) -> Result<()> {
        let decl = decl.deep_clone()?;
        let name = decl.name()?;
        self.with_namespace_mut(namespace, |ns| {
            ns.qualifiers.insert(name, decl);
            Ok(())
        })
    }

    fn get_qualifier_decl(&self, namespace: &NamespaceName, name: &CimName) -> Result<QualifierDecl> {
        self.with_namespace(namespace, |ns| {
            ns.qualifiers
                .get(name)
                .ok_or_else(|| CimError::status(StatusCode::NotFound, format!("qualifier {name}")))?
                .deep_clone()
        })
    }

    fn add_class(&self, namespace: &NamespaceName, class: &Class) -> Result<()> {
        let class = class.deep_clone()?;
        let name = class.class_name()?;
        let super_class = class.super_class_name()?;
        self.with_namespace_mut(namespace, |ns| {
            if ns.classes.contains_key(&name) {
                return Err(CimError::status(StatusCode::AlreadyExists, format!("class {name}")));
            }
            resolve(&class, &name, super_class.as_ref(), ns)?;
            ns.classes.insert(name, class);
            Ok(())
        })
    }

    fn modify_class(&self, namespace: &NamespaceName, class: &Class) -> Result<()> {
        let class = class.deep_clone()?;
        let name = class.class_name()?;
        let super_class = class.super_class_name()?;
        self.with_namespace_mut(namespace, |ns| {
            if !ns.classes.contains_key(&name) {
                return Err(CimError::status(StatusCode::NotFound, format!("class {name}")));
            }
            resolve(&class, &name, super_class.as_ref(), ns)?;
            ns.classes.insert(name, class);
            Ok(())
        })
    }

    fn get_class(&self, namespace: &NamespaceName, name: &CimName) -> Result<Class> {
        self.with_namespace(namespace, |ns| {
            ns.classes
                .get(name)
                .ok_or_else(|| CimError::status(StatusCode::NotFound, format!("class {name}")))?
                .deep_clone()
        })
    }

    fn add_instance(&self, namespace: &NamespaceName, instance: &Instance) -> Result<ObjectPath> {
        let instance = instance.deep_clone()?;
        let class_name = instance.class_name()?;
        let class = self.get_class(namespace, &class_name).map_err(|e| match e.code() {
            StatusCode::NotFound => CimError::status(StatusCode::InvalidClass, class_name.to_string()),
            _ => e,
        })?;
        let path = instance.build_path(&class)?;
        self.with_namespace_mut(namespace, |ns| {
            if ns.instances.iter().any(|(p, _)| *p == path) {
                return Err(CimError::status(StatusCode::AlreadyExists, path.to_string()));
            }
            ns.instances.push((path.clone(), instance));
            Ok(path)
        })
    }
}
