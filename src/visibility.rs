//! Classification of declared accessibility against an access modifier mask.
//!
//! ECMA-335 knows seven member access levels and eight type visibilities; a reference
//! surface is described with four: private, protected, internal and public. The mapping
//! happens in two steps. [`MemberAccess`] is the declared level as stored in the flags,
//! [`fold`] turns it into an [`Accessibility`] under a [`FoldPolicy`].

use std::{fmt, str::FromStr};

use bitflags::bitflags;
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{
    model::{Module, TableId, Token, TypeAttributes, TypeSignature, METHOD_ACCESS_MASK},
    Error, Result,
};

/// Declared access level, one per ECMA-335 encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum MemberAccess {
    /// Member not referenceable
    CompilerControlled,
    /// Accessible only by the parent type
    Private,
    /// Accessible by sub-types only in this assembly
    FamAndAssem,
    /// Accessible by anyone in the assembly
    Assembly,
    /// Accessible only by type and sub-types
    Family,
    /// Accessible by sub-types anywhere, plus anyone in the assembly
    FamOrAssem,
    /// Accessible by anyone
    Public,
}

impl MemberAccess {
    /// Decodes the access bits of method or field flags
    #[must_use]
    pub fn from_member_flags(flags: u32) -> Self {
        match flags & METHOD_ACCESS_MASK {
            0 => MemberAccess::CompilerControlled,
            1 => MemberAccess::Private,
            2 => MemberAccess::FamAndAssem,
            3 => MemberAccess::Assembly,
            4 => MemberAccess::Family,
            5 => MemberAccess::FamOrAssem,
            _ => MemberAccess::Public,
        }
    }

    /// Decodes the visibility bits of type flags
    #[must_use]
    pub fn from_type_flags(flags: u32) -> Self {
        match flags & TypeAttributes::VISIBILITY_MASK {
            TypeAttributes::NOT_PUBLIC | TypeAttributes::NESTED_ASSEMBLY => MemberAccess::Assembly,
            TypeAttributes::PUBLIC | TypeAttributes::NESTED_PUBLIC => MemberAccess::Public,
            TypeAttributes::NESTED_PRIVATE => MemberAccess::Private,
            TypeAttributes::NESTED_FAMILY => MemberAccess::Family,
            TypeAttributes::NESTED_FAM_AND_ASSEM => MemberAccess::FamAndAssem,
            _ => MemberAccess::FamOrAssem,
        }
    }
}

/// The four accessibility classes a surface is described with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Accessibility {
    /// Visible inside the declaring type only
    Private,
    /// Visible to derived types
    Protected,
    /// Visible inside the assembly
    Internal,
    /// Visible everywhere
    Public,
}

impl Accessibility {
    /// The mask bit for this class
    #[must_use]
    pub fn modifier(self) -> AccessModifiers {
        match self {
            Accessibility::Private => AccessModifiers::PRIVATE,
            Accessibility::Protected => AccessModifiers::PROTECTED,
            Accessibility::Internal => AccessModifiers::INTERNAL,
            Accessibility::Public => AccessModifiers::PUBLIC,
        }
    }
}

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
    /// A set of [`Accessibility`] classes to retain
    pub struct AccessModifiers: u8 {
        /// Keep private entities
        const PRIVATE = 0x01;
        /// Keep protected entities
        const PROTECTED = 0x02;
        /// Keep internal entities
        const INTERNAL = 0x04;
        /// Keep public entities
        const PUBLIC = 0x08;
    }
}

impl Default for AccessModifiers {
    fn default() -> Self {
        AccessModifiers::PROTECTED | AccessModifiers::INTERNAL | AccessModifiers::PUBLIC
    }
}

impl AccessModifiers {
    /// Returns true if `accessibility` is part of the set
    #[must_use]
    pub fn retains(self, accessibility: Accessibility) -> bool {
        self.contains(accessibility.modifier())
    }
}

impl FromStr for AccessModifiers {
    type Err = Error;

    /// Parses a `+` separated, case-insensitive list such as `protected+Public`
    fn from_str(value: &str) -> Result<Self> {
        value.split('+').try_fold(AccessModifiers::empty(), |mask, name| {
            let class = Accessibility::iter()
                .find(|class| class.to_string().eq_ignore_ascii_case(name.trim()))
                .ok_or_else(|| Error::InvalidAccessModifier(name.to_string()))?;
            Ok(mask | class.modifier())
        })
    }
}

impl fmt::Display for AccessModifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = Accessibility::iter()
            .filter(|class| self.retains(*class))
            .map(|class| class.to_string())
            .collect();
        write!(f, "{}", names.join("+"))
    }
}

/// How the two combined family/assembly levels are folded into four classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum FoldPolicy {
    /// `protected internal` counts as protected, `private protected` as internal
    #[default]
    Split,
    /// Both count as protected
    Protected,
    /// Both count as internal
    Internal,
}

/// Folds a declared access level into one of the four classes.
///
/// Compiler controlled members are treated as private.
#[must_use]
pub fn fold(access: MemberAccess, policy: FoldPolicy) -> Accessibility {
    match (access, policy) {
        (MemberAccess::CompilerControlled | MemberAccess::Private, _) => Accessibility::Private,
        (MemberAccess::Assembly, _) => Accessibility::Internal,
        (MemberAccess::Family, _) => Accessibility::Protected,
        (MemberAccess::Public, _) => Accessibility::Public,
        (MemberAccess::FamOrAssem, FoldPolicy::Split | FoldPolicy::Protected) => {
            Accessibility::Protected
        }
        (MemberAccess::FamAndAssem, FoldPolicy::Split | FoldPolicy::Internal) => {
            Accessibility::Internal
        }
        (MemberAccess::FamOrAssem, FoldPolicy::Internal) => Accessibility::Internal,
        (MemberAccess::FamAndAssem, FoldPolicy::Protected) => Accessibility::Protected,
    }
}

/// Answers "is this entity part of the surface" for one mask and policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityClassifier {
    mask: AccessModifiers,
    policy: FoldPolicy,
}

impl VisibilityClassifier {
    /// Creates a classifier
    #[must_use]
    pub fn new(mask: AccessModifiers, policy: FoldPolicy) -> Self {
        VisibilityClassifier { mask, policy }
    }

    /// The mask entities are tested against
    #[must_use]
    pub fn mask(&self) -> AccessModifiers {
        self.mask
    }

    /// Classifies raw type flags
    #[must_use]
    pub fn classify_type_flags(&self, flags: u32) -> Accessibility {
        fold(MemberAccess::from_type_flags(flags), self.policy)
    }

    /// Classifies raw method or field flags
    #[must_use]
    pub fn classify_member_flags(&self, flags: u32) -> Accessibility {
        fold(MemberAccess::from_member_flags(flags), self.policy)
    }

    /// Classifies a live type definition
    #[must_use]
    pub fn classify_type(&self, module: &Module, token: Token) -> Option<Accessibility> {
        module
            .type_defs
            .get(token)
            .map(|def| self.classify_type_flags(def.flags))
    }

    /// Classifies a live method or field
    #[must_use]
    pub fn classify_member(&self, module: &Module, token: Token) -> Option<Accessibility> {
        match token.table_id()? {
            TableId::MethodDef => module
                .methods
                .get(token)
                .map(|m| self.classify_member_flags(m.flags)),
            TableId::Field => module
                .fields
                .get(token)
                .map(|f| self.classify_member_flags(f.flags)),
            _ => None,
        }
    }

    /// Returns true if `accessibility` is in the mask
    #[must_use]
    pub fn is_retained(&self, accessibility: Accessibility) -> bool {
        self.mask.retains(accessibility)
    }

    /// Returns true if the type and every type enclosing it are live and in the mask
    #[must_use]
    pub fn is_type_retained(&self, module: &Module, token: Token) -> bool {
        module.declaring_chain(token).into_iter().all(|link| {
            self.classify_type(module, link)
                .is_some_and(|class| self.is_retained(class))
        })
    }

    /// Returns true if the method or field is live, in the mask, and its declaring type is
    /// retained
    #[must_use]
    pub fn is_member_retained(&self, module: &Module, token: Token) -> bool {
        let Some(class) = self.classify_member(module, token) else {
            return false;
        };
        self.is_retained(class)
            && module
                .member_declaring_type(token)
                .is_some_and(|owner| self.is_type_retained(module, owner))
    }

    /// Tests a type token found in a signature or attribute.
    ///
    /// Types of other assemblies are always retained. Types of this module are retained
    /// if they resolve to a retained definition.
    #[must_use]
    pub fn is_type_token_retained(&self, module: &Module, token: Token) -> bool {
        if !module.targets_module(token) {
            return true;
        }
        module
            .resolve_type(token)
            .is_some_and(|def| self.is_type_retained(module, def))
    }

    /// Returns true if every type token in `sig` is retained
    #[must_use]
    pub fn is_signature_retained(&self, module: &Module, sig: &TypeSignature) -> bool {
        sig.tokens()
            .into_iter()
            .all(|token| self.is_type_token_retained(module, token))
    }
}

impl Default for VisibilityClassifier {
    fn default() -> Self {
        VisibilityClassifier::new(AccessModifiers::default(), FoldPolicy::default())
    }
}
