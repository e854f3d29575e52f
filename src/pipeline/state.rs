use strum::{Display, EnumIter};

/// Where a pipeline run stands.
///
/// Runs move strictly forward through the states in declaration order. A run ends in
/// either [`PipelineState::Committed`] or [`PipelineState::Aborted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
pub enum PipelineState {
    /// The module was loaded and nothing has run yet
    Loaded,
    /// Every body is a throw stub
    BodiesStripped,
    /// Hidden top-level types are gone
    TypesPruned,
    /// Hidden nested types are gone
    NestedTypesPruned,
    /// Base types and interfaces only name retained types
    BasesPruned,
    /// Hidden methods and fields are gone
    MembersPruned,
    /// Hidden accessors and empty properties are gone
    PropertiesPruned,
    /// Attributes naming hidden types are gone
    AttributesPruned,
    /// Non-constant field initial values are gone
    InitializersPruned,
    /// Embedded resources are gone
    ResourcesPruned,
    /// Build-describing assembly and module attributes are gone
    CommonAttributesPruned,
    /// The consistency check passed
    Validated,
    /// The module was handed over for serialization
    Committed,
    /// The consistency check failed; nothing may be written
    Aborted,
}

impl PipelineState {
    /// The state the next pass moves to, `None` once the passes are done
    #[must_use]
    pub fn next(self) -> Option<PipelineState> {
        use PipelineState::{
            AttributesPruned, BasesPruned, BodiesStripped, CommonAttributesPruned,
            InitializersPruned, Loaded, MembersPruned, NestedTypesPruned, PropertiesPruned,
            ResourcesPruned, TypesPruned, Validated,
        };
        match self {
            Loaded => Some(BodiesStripped),
            BodiesStripped => Some(TypesPruned),
            TypesPruned => Some(NestedTypesPruned),
            NestedTypesPruned => Some(BasesPruned),
            BasesPruned => Some(MembersPruned),
            MembersPruned => Some(PropertiesPruned),
            PropertiesPruned => Some(AttributesPruned),
            AttributesPruned => Some(InitializersPruned),
            InitializersPruned => Some(ResourcesPruned),
            ResourcesPruned => Some(CommonAttributesPruned),
            CommonAttributesPruned => Some(Validated),
            Validated | PipelineState::Committed | PipelineState::Aborted => None,
        }
    }

    /// Returns true for [`PipelineState::Committed`] and [`PipelineState::Aborted`]
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(self, PipelineState::Committed | PipelineState::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn states_chain_in_declaration_order() {
        let mut state = PipelineState::Loaded;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            assert!(next > state);
            visited.push(next);
            state = next;
        }
        assert_eq!(state, PipelineState::Validated);
        assert_eq!(visited.len(), 12);
        assert_eq!(PipelineState::iter().count(), 14);
    }

    #[test]
    fn display_uses_variant_names() {
        assert_eq!(PipelineState::NestedTypesPruned.to_string(), "NestedTypesPruned");
        assert!(PipelineState::Aborted.is_final());
        assert!(!PipelineState::Validated.is_final());
    }
}
