//! The check that gates serialization.
//!
//! After pruning, every reference to a type declared in this module must still resolve
//! to a live definition. Anything else would produce a module the runtime or a compiler
//! refuses to load. References to removed members are reported separately: they are
//! warnings unless the configuration asks for them to fail the run.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, error, warn};

use crate::{
    error::UnresolvedReference,
    model::{Module, Referrer, TableId, Token},
};

const TARGET: &str = "refasm::consistency";

/// Outcome of a consistency check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// In-module type references that no longer resolve
    pub unresolved: Vec<UnresolvedReference>,
    /// References to methods, fields, properties or member references that are gone
    pub dangling: Vec<UnresolvedReference>,
}

impl ConsistencyReport {
    /// Returns true if every in-module type reference resolved
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Returns true if nothing at all was found
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.dangling.is_empty()
    }
}

/// Validates the type references of a pruned module
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyChecker {
    fail_on_dangling: bool,
}

impl ConsistencyChecker {
    /// Creates a checker; with `fail_on_dangling` set, dangling member references count
    /// as unresolved
    #[must_use]
    pub fn new(fail_on_dangling: bool) -> Self {
        ConsistencyChecker { fail_on_dangling }
    }

    /// Walks every reference of the module and reports the ones that do not resolve.
    ///
    /// Each finding is logged: unresolved type references at error level, dangling member
    /// references at warn level.
    #[must_use]
    pub fn check(&self, module: &Module) -> ConsistencyReport {
        let index = module.type_index();
        let mut seen = BTreeSet::new();
        let mut findings: Vec<(bool, Referrer, Token)> = Vec::new();
        module.visit_references(&mut |referrer, token| {
            let Some(is_type) = classify(module, &index, token) else {
                return;
            };
            if seen.insert((referrer, token)) {
                findings.push((is_type, referrer, token));
            }
        });

        let mut report = ConsistencyReport::default();
        for (is_type, referrer, target) in findings {
            let reference = UnresolvedReference {
                referrer: module.referrer_name(referrer),
                target,
                target_name: module.entity_name(target),
            };
            if is_type || self.fail_on_dangling {
                error!(target: TARGET, "unresolved reference {reference}");
                report.unresolved.push(reference);
            } else {
                warn!(target: TARGET, "dangling reference {reference}");
                report.dangling.push(reference);
            }
        }
        debug!(
            target: TARGET,
            "{} unresolved, {} dangling",
            report.unresolved.len(),
            report.dangling.len()
        );
        report
    }
}

/// `Some(true)` for an in-module type reference that does not resolve, `Some(false)` for
/// a reference to a member that is gone, `None` if the reference is fine
fn classify(module: &Module, index: &BTreeMap<String, Token>, token: Token) -> Option<bool> {
    match token.table_id()? {
        TableId::TypeDef | TableId::TypeRef => (module.targets_module(token)
            && module.resolve_type_in(index, token).is_none())
        .then_some(true),
        TableId::MethodDef | TableId::Field | TableId::Property | TableId::MemberRef => {
            (!module.contains(token)).then_some(false)
        }
        TableId::AssemblyRef => None,
    }
}
