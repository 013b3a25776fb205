//! Insertion-ordered, name-indexed member sets
//!
//! Members keep the order they were added in. A fixed number of buckets
//! indexed by the member's name tag gives near-constant lookups; the
//! bucket count is chosen per member kind.

use crate::error::{CimError, Result};
use crate::name::CimName;

/// Bucket count for property sets
pub(crate) const PROPERTY_BUCKETS: usize = 32;
/// Bucket count for qualifier, parameter and method sets
pub(crate) const SMALL_BUCKETS: usize = 16;

/// A value that can be stored in an [`OrderedSet`]
pub(crate) trait Member: Sized {
    fn member_name(&self) -> Result<CimName>;

    /// Called once the set indexes the member
    fn attach(&self) {}

    /// Called when the set stops indexing the member
    fn detach(&self) {}

    fn deep_clone_member(&self) -> Result<Self>;

    fn identical_member(&self, other: &Self) -> bool;
}

pub(crate) struct OrderedSet<T: Member, const N: usize> {
    names: Vec<CimName>,
    items: Vec<T>,
    buckets: [Vec<u32>; N],
}

impl<T: Member, const N: usize> OrderedSet<T, N> {
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            items: Vec::new(),
            buckets: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, name: &CimName) -> Option<usize> {
        let bucket = &self.buckets[name.tag() as usize % N];
        bucket
            .iter()
            .map(|&i| i as usize)
            .find(|&i| self.names[i] == *name)
    }

    /// Append a member; a duplicate name leaves the set unchanged
    pub fn insert(&mut self, item: T) -> Result<()> {
        let name = item.member_name()?;
        if self.find(&name).is_some() {
            return Err(CimError::already_exists(name.as_str()));
        }
        let index = self.items.len() as u32;
        self.buckets[name.tag() as usize % N].push(index);
        item.attach();
        self.names.push(name);
        self.items.push(item);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        self.items
            .get(index)
            .ok_or_else(|| CimError::out_of_bounds(index, self.items.len()))
    }

    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(CimError::out_of_bounds(index, self.items.len()));
        }
        self.names.remove(index);
        let item = self.items.remove(index);
        item.detach();
        self.reindex();
        Ok(item)
    }

    /// Rename the member at `index` in place by re-keying it
    ///
    /// `apply` performs the rename on the detached member; on failure the
    /// member is re-attached under its old name.
    pub fn rename(
        &mut self,
        index: usize,
        new_name: CimName,
        apply: impl FnOnce(&T, CimName) -> Result<()>,
    ) -> Result<()> {
        if index >= self.items.len() {
            return Err(CimError::out_of_bounds(index, self.items.len()));
        }
        if let Some(existing) = self.find(&new_name) {
            if existing != index {
                return Err(CimError::already_exists(new_name.as_str()));
            }
        }
        let item = &self.items[index];
        item.detach();
        let result = apply(item, new_name.clone());
        item.attach();
        result?;
        self.names[index] = new_name;
        self.reindex();
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Remove every member for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let mut i = 0;
        while i < self.items.len() {
            if keep(&self.items[i]) {
                i += 1;
            } else {
                self.names.remove(i);
                self.items.remove(i).detach();
            }
        }
        self.reindex();
    }

    pub fn deep_clone(&self) -> Result<Self> {
        let mut out = Self::new();
        for item in &self.items {
            out.insert(item.deep_clone_member()?)?;
        }
        Ok(out)
    }

    /// Same length and pairwise identical members, in order
    pub fn identical(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.identical_member(b))
    }

    fn reindex(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        for (i, name) in self.names.iter().enumerate() {
            self.buckets[name.tag() as usize % N].push(i as u32);
        }
    }
}

impl<T: Member, const N: usize> Drop for OrderedSet<T, N> {
    fn drop(&mut self) {
        for item in &self.items {
            item.detach();
        }
    }
}

impl<T: Member + std::fmt::Debug, const N: usize> std::fmt::Debug for OrderedSet<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
