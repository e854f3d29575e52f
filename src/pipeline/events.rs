//! Event logging for the reduction pipeline.
//!
//! Every pass records what it did into an [`EventLog`]: one event per stripped body,
//! removed entity or diagnostic. [`PipelineStats`] are derived from the events rather than
//! tracked separately.
//!
//! # Example
//!
//! ```rust
//! use refasm::pipeline::{EventKind, EventLog};
//! use refasm::model::Token;
//!
//! let mut log = EventLog::new();
//! log.record(EventKind::TypeRemoved)
//!     .subject(Token::new(0x02000002))
//!     .message("Acme.Hidden");
//! log.record(EventKind::Warning)
//!     .message("no accessible base constructor for Acme.Derived::.ctor");
//!
//! assert_eq!(log.count_kind(EventKind::TypeRemoved), 1);
//! assert_eq!(log.warnings().count(), 1);
//! ```

use std::{collections::HashMap, fmt};

use crate::model::Token;

/// Categories of events that can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A method body was replaced by a throw stub.
    BodyStripped,
    /// A stripped constructor kept its call to a base constructor.
    ConstructorChainPreserved,
    /// A top-level type was removed.
    TypeRemoved,
    /// A nested type was removed.
    NestedTypeRemoved,
    /// A base type was replaced by the universal base.
    BaseTypeRerooted,
    /// An interface edge was removed.
    InterfaceRemoved,
    /// A method was removed.
    MethodRemoved,
    /// A field was removed.
    FieldRemoved,
    /// A property accessor reference was cleared.
    AccessorRemoved,
    /// A property was removed.
    PropertyRemoved,
    /// A custom attribute was removed.
    AttributeRemoved,
    /// A non-constant field initial value was removed.
    InitialValueRemoved,
    /// An embedded resource was removed.
    ResourceRemoved,
    /// A common assembly or module attribute was removed.
    CommonAttributeRemoved,
    /// Unused type or member references were dropped before writing.
    ReferencesCompacted,

    /// A live entity still references a removed one.
    DanglingReference,
    /// An in-module type reference does not resolve.
    UnresolvedReference,

    /// A pass started.
    PassStarted,
    /// A pass completed.
    PassCompleted,

    /// Something unexpected but recoverable.
    Warning,
}

impl EventKind {
    /// Returns a human-readable description of this event kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::BodyStripped => "body stripped",
            Self::ConstructorChainPreserved => "constructor chain preserved",
            Self::TypeRemoved => "type removed",
            Self::NestedTypeRemoved => "nested type removed",
            Self::BaseTypeRerooted => "base type rerooted",
            Self::InterfaceRemoved => "interface removed",
            Self::MethodRemoved => "method removed",
            Self::FieldRemoved => "field removed",
            Self::AccessorRemoved => "accessor removed",
            Self::PropertyRemoved => "property removed",
            Self::AttributeRemoved => "attribute removed",
            Self::InitialValueRemoved => "initial value removed",
            Self::ResourceRemoved => "resource removed",
            Self::CommonAttributeRemoved => "common attribute removed",
            Self::ReferencesCompacted => "references compacted",
            Self::DanglingReference => "dangling reference",
            Self::UnresolvedReference => "unresolved reference",
            Self::PassStarted => "pass started",
            Self::PassCompleted => "pass completed",
            Self::Warning => "warning",
        }
    }

    /// Returns true if this event represents a change to the module.
    #[must_use]
    pub fn is_transformation(&self) -> bool {
        !self.is_diagnostic() && !matches!(self, Self::PassStarted | Self::PassCompleted)
    }

    /// Returns true if this is a diagnostic event.
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            Self::DanglingReference | Self::UnresolvedReference | Self::Warning
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A single logged event.
#[derive(Debug, Clone)]
pub struct Event {
    /// The type of event.
    pub kind: EventKind,
    /// The entity the event is about (if applicable).
    pub subject: Option<Token>,
    /// Human-readable description.
    pub message: String,
    /// Associated pass name (if from a pass).
    pub pass: Option<&'static str>,
}

impl Event {
    fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: None,
            message: message.into(),
            pass: None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pass {
            Some(pass) => write!(f, "[{}] {}: {}", self.kind, pass, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Builder for creating events with a fluent API.
///
/// Created by [`EventLog::record`]. The event is added to the log when the builder is
/// dropped.
pub struct EventBuilder<'a> {
    log: &'a mut EventLog,
    kind: EventKind,
    subject: Option<Token>,
    message: Option<String>,
    pass: Option<&'static str>,
}

impl EventBuilder<'_> {
    /// Sets the entity the event is about.
    pub fn subject(mut self, token: Token) -> Self {
        self.subject = Some(token);
        self
    }

    /// Sets a custom message describing the event.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Associates this event with a specific pass.
    pub fn pass(mut self, pass_name: &'static str) -> Self {
        self.pass = Some(pass_name);
        self
    }
}

impl Drop for EventBuilder<'_> {
    fn drop(&mut self) {
        let message = self
            .message
            .take()
            .unwrap_or_else(|| self.kind.description().to_string());
        let event = Event {
            kind: self.kind,
            subject: self.subject.take(),
            message,
            pass: self.pass.or(self.log.current_pass),
        };
        self.log.events.push(event);
    }
}

/// Collection of events from one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
    current_pass: Option<&'static str>,
}

impl EventLog {
    /// Creates an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no events have been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the total number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Starts building a new event of the given kind.
    pub fn record(&mut self, kind: EventKind) -> EventBuilder<'_> {
        EventBuilder {
            log: self,
            kind,
            subject: None,
            message: None,
            pass: None,
        }
    }

    /// Attributes subsequent events to `pass` until [`EventLog::leave_pass`].
    pub(crate) fn enter_pass(&mut self, pass: &'static str) {
        self.current_pass = Some(pass);
    }

    pub(crate) fn leave_pass(&mut self) {
        self.current_pass = None;
    }

    /// Returns true if any event of the given kind exists.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }

    /// Counts events of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.filter_kind(kind).count()
    }

    /// Returns an iterator over all events.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Returns an iterator over events of a specific kind.
    pub fn filter_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Returns an iterator over warnings, including dangling references.
    pub fn warnings(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Warning | EventKind::DanglingReference))
    }

    /// Counts events grouped by kind.
    #[must_use]
    pub fn count_by_kind(&self) -> HashMap<EventKind, usize> {
        let mut counts = HashMap::new();
        for event in &self.events {
            *counts.entry(event.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the number of transformation events.
    #[must_use]
    pub fn transformation_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind.is_transformation())
            .count()
    }

    /// Statistics derived from the recorded events.
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        PipelineStats::from_events(self)
    }
}

/// What a pipeline run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Bodies replaced with throw stubs
    pub bodies_stripped: usize,
    /// Stripped constructors that kept a base constructor call
    pub constructor_chains_preserved: usize,
    /// Top-level types removed
    pub types_removed: usize,
    /// Nested types removed
    pub nested_types_removed: usize,
    /// Base types replaced by the universal base
    pub bases_rerooted: usize,
    /// Interface edges removed
    pub interfaces_removed: usize,
    /// Methods removed
    pub methods_removed: usize,
    /// Fields removed
    pub fields_removed: usize,
    /// Property accessors cleared
    pub accessors_removed: usize,
    /// Properties removed
    pub properties_removed: usize,
    /// Custom attributes removed
    pub attributes_removed: usize,
    /// Field initial values removed
    pub initial_values_removed: usize,
    /// Resources removed
    pub resources_removed: usize,
    /// Common assembly and module attributes removed
    pub common_attributes_removed: usize,
    /// References left pointing at removed entities
    pub dangling_references: usize,
}

impl PipelineStats {
    /// Counts the events of `log`.
    #[must_use]
    pub fn from_events(log: &EventLog) -> Self {
        let counts = log.count_by_kind();
        let count = |kind| counts.get(&kind).copied().unwrap_or(0);
        Self {
            bodies_stripped: count(EventKind::BodyStripped),
            constructor_chains_preserved: count(EventKind::ConstructorChainPreserved),
            types_removed: count(EventKind::TypeRemoved),
            nested_types_removed: count(EventKind::NestedTypeRemoved),
            bases_rerooted: count(EventKind::BaseTypeRerooted),
            interfaces_removed: count(EventKind::InterfaceRemoved),
            methods_removed: count(EventKind::MethodRemoved),
            fields_removed: count(EventKind::FieldRemoved),
            accessors_removed: count(EventKind::AccessorRemoved),
            properties_removed: count(EventKind::PropertyRemoved),
            attributes_removed: count(EventKind::AttributeRemoved),
            initial_values_removed: count(EventKind::InitialValueRemoved),
            resources_removed: count(EventKind::ResourceRemoved),
            common_attributes_removed: count(EventKind::CommonAttributeRemoved),
            dangling_references: count(EventKind::DanglingReference),
        }
    }

    /// Total number of removed entities of any kind.
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.types_removed
            + self.nested_types_removed
            + self.interfaces_removed
            + self.methods_removed
            + self.fields_removed
            + self.properties_removed
            + self.attributes_removed
            + self.initial_values_removed
            + self.resources_removed
            + self.common_attributes_removed
    }

    /// Returns true if the run changed anything.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.total_removed() > 0
            || self.bodies_stripped > 0
            || self.bases_rerooted > 0
            || self.accessors_removed > 0
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() {
            return write!(f, "no changes");
        }
        let parts = [
            (self.bodies_stripped, "bodies stripped"),
            (self.constructor_chains_preserved, "constructor chains kept"),
            (self.types_removed, "types"),
            (self.nested_types_removed, "nested types"),
            (self.bases_rerooted, "bases rerooted"),
            (self.interfaces_removed, "interfaces"),
            (self.methods_removed, "methods"),
            (self.fields_removed, "fields"),
            (self.accessors_removed, "accessors"),
            (self.properties_removed, "properties"),
            (self.attributes_removed, "attributes"),
            (self.initial_values_removed, "initial values"),
            (self.resources_removed, "resources"),
            (self.common_attributes_removed, "common attributes"),
        ];
        let rendered: Vec<String> = parts
            .iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, label)| format!("{count} {label}"))
            .collect();
        write!(f, "{}", rendered.join(", "))?;
        if self.dangling_references > 0 {
            write!(f, " ({} dangling references)", self.dangling_references)?;
        }
        Ok(())
    }
}
