//! Qualifier flavors and scopes

use bitflags::bitflags;

bitflags! {
    /// Propagation rules attached to a qualifier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flavor: u32 {
        /// Subclasses may override the value
        const OVERRIDABLE = 0x01;
        /// Propagates to subclasses
        const TOSUBCLASS = 0x02;
        /// Propagates to instances (deprecated)
        const TOINSTANCE = 0x04;
        /// Value may be localized
        const TRANSLATABLE = 0x08;
        /// Explicitly not overridable
        const DISABLEOVERRIDE = 0x10;
        /// Explicitly not propagated to subclasses
        const RESTRICTED = 0x20;

        const ENABLEOVERRIDE = Self::OVERRIDABLE.bits();
        const DEFAULTS = Self::OVERRIDABLE.bits() | Self::TOSUBCLASS.bits();
    }
}

impl Flavor {
    /// Combine flavors given at a use site with the declared flavor
    ///
    /// `DisableOverride`/`EnableOverride` and `Restricted`/`ToSubclass`
    /// given locally win over the declaration; `Translatable` only adds.
    pub fn resolve(self, declared: Flavor) -> Flavor {
        let mut out = declared & !(Flavor::DISABLEOVERRIDE | Flavor::RESTRICTED);
        if declared.contains(Flavor::DISABLEOVERRIDE) {
            out.remove(Flavor::OVERRIDABLE);
        }
        if declared.contains(Flavor::RESTRICTED) {
            out.remove(Flavor::TOSUBCLASS);
        }
        if self.contains(Flavor::DISABLEOVERRIDE) {
            out.remove(Flavor::OVERRIDABLE);
        } else if self.contains(Flavor::OVERRIDABLE) {
            out.insert(Flavor::OVERRIDABLE);
        }
        if self.contains(Flavor::RESTRICTED) {
            out.remove(Flavor::TOSUBCLASS);
        } else if self.contains(Flavor::TOSUBCLASS) {
            out.insert(Flavor::TOSUBCLASS);
        }
        out | (self & (Flavor::TRANSLATABLE | Flavor::TOINSTANCE))
    }
}

bitflags! {
    /// Schema elements a qualifier declaration may be applied to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Scope: u32 {
        const CLASS = 0x01;
        const ASSOCIATION = 0x02;
        const INDICATION = 0x04;
        const PROPERTY = 0x08;
        const REFERENCE = 0x10;
        const METHOD = 0x20;
        const PARAMETER = 0x40;
        const ANY = 0x7f;
    }
}
