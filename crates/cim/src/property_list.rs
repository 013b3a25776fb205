//! Property lists used to project instances

use crate::name::CimName;

/// Either "all properties" (null) or an explicit, ordered list of names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyList {
    names: Option<Vec<CimName>>,
}

impl PropertyList {
    /// A null list, selecting every property
    pub fn all() -> Self {
        Self { names: None }
    }

    pub fn new(names: Vec<CimName>) -> Self {
        Self { names: Some(names) }
    }

    pub fn is_null(&self) -> bool {
        self.names.is_none()
    }

    pub fn set(&mut self, names: Vec<CimName>) {
        self.names = Some(names);
    }

    pub fn clear(&mut self) {
        self.names = None;
    }

    /// True for every name when the list is null
    pub fn contains(&self, name: &CimName) -> bool {
        match &self.names {
            Some(names) => names.contains(name),
            None => true,
        }
    }

    /// Names in request order; empty for a null list
    pub fn names(&self) -> &[CimName] {
        self.names.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

impl From<Vec<CimName>> for PropertyList {
    fn from(names: Vec<CimName>) -> Self {
        Self::new(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_versus_empty() {
        let name = CimName::new("Size").unwrap();
        assert!(PropertyList::all().contains(&name));
        assert!(!PropertyList::new(Vec::new()).contains(&name));
        assert!(PropertyList::new(Vec::new()).is_empty());
        assert!(!PropertyList::new(Vec::new()).is_null());
    }

    #[test]
    fn test_contains_ignores_case() {
        let list = PropertyList::new(vec![CimName::new("Size").unwrap()]);
        assert!(list.contains(&CimName::new("SIZE").unwrap()));
        assert_eq!(list.len(), 1);
    }
}
