//! In-memory module model.
//!
//! A [`Module`] is an arena of tables addressed by [`Token`]s, modelled on the ECMA-335
//! metadata tables: type definitions and references, methods, fields, properties, member
//! references and assembly references. Custom attributes are owned inline by whatever
//! they are applied to.
//!
//! # Key Types
//! - [`Module`] - The arena itself, plus removal with tombstones
//! - [`Token`] / [`TableId`] - Stable handles
//! - [`TypeSignature`] - Signature trees, the main carrier of type references
//! - [`MethodBody`] - Instruction level bodies
//! - [`ModuleBuilder`] - Fluent construction

mod attribute;
mod body;
mod builder;
mod field;
mod method;
mod module;
mod property;
mod references;
mod refs;
mod signature;
mod table;
mod token;
mod types;

pub use attribute::{CustomAttribute, CustomAttributeArgument, CustomAttributeNamedArgument};
pub use body::{DefaultValue, ExceptionHandler, Instruction, MethodBody, OpCode, Operand};
pub use builder::ModuleBuilder;
pub use field::{Constant, Field, FieldAttributes};
pub use method::{MethodAccessFlags, MethodDef, MethodModifiers, Param, METHOD_ACCESS_MASK};
pub use module::{AssemblyIdentity, Module, ModuleFlags, ModuleKind, Tombstone, CORLIB_NAMES};
pub use property::Property;
pub use references::Referrer;
pub use refs::{AssemblyRef, MemberRef, MemberRefSignature, Resource};
pub use signature::{SignatureMethod, TypeSignature};
pub use table::Table;
pub use token::{TableId, Token};
pub use types::{GenericParam, ResolutionScope, TypeAttributes, TypeDef, TypeRef};
