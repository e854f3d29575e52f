use serde::{Deserialize, Serialize};

use crate::model::{CustomAttribute, MethodAccessFlags, Token, TypeSignature, METHOD_ACCESS_MASK};

#[allow(non_snake_case)]
/// Flags describing a `Field`, as defined by ECMA-335 II.23.1.5
pub mod FieldAttributes {
    /// Mask for the access bits, shared with methods
    pub const FIELD_ACCESS_MASK: u32 = 0x0007;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Field can only be initialized, not written to after init
    pub const INIT_ONLY: u32 = 0x0020;
    /// Value is compile time constant
    pub const LITERAL: u32 = 0x0040;
    /// Reserved (to indicate this field should not be serialized when type is remoted)
    pub const NOT_SERIALIZED: u32 = 0x0080;
    /// Field has RVA
    pub const HAS_FIELD_RVA: u32 = 0x0100;
    /// Field is special
    pub const SPECIAL_NAME: u32 = 0x0200;
    /// Runtime(metadata internal) should check name encoding
    pub const RT_SPECIAL_NAME: u32 = 0x0400;
    /// Field has marshalling information
    pub const HAS_FIELD_MARSHAL: u32 = 0x1000;
    /// Field has default
    pub const HAS_DEFAULT: u32 = 0x8000;
}

/// A compile time constant, stored in the `Constant` table of a real image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    /// bool
    Boolean(bool),
    /// char
    Char(u16),
    /// signed 8bit integer
    I1(i8),
    /// unsigned 8bit integer
    U1(u8),
    /// signed 16bit integer
    I2(i16),
    /// unsigned 16bit integer
    U2(u16),
    /// signed 32bit integer
    I4(i32),
    /// unsigned 32bit integer
    U4(u32),
    /// signed 64bit integer
    I8(i64),
    /// unsigned 64bit integer
    U8(u64),
    /// 32bit floating-point
    R4(f32),
    /// 64bit floating-point
    R8(f64),
    /// string
    String(String),
    /// null reference
    Null,
}

/// A field declared in this module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// [`FieldAttributes`]
    pub flags: u32,
    /// Field type
    pub signature: TypeSignature,
    /// Owning type
    pub declaring_type: Token,
    /// Compile time constant, for literal fields
    pub constant: Option<Constant>,
    /// Initial data blob mapped through the field's RVA
    pub initial_value: Option<Vec<u8>>,
    /// Custom attributes applied to the field
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Field {
    /// Access bits of this field, which share their encoding with methods
    #[must_use]
    pub fn access(&self) -> MethodAccessFlags {
        MethodAccessFlags::from_bits_truncate(self.flags & METHOD_ACCESS_MASK)
    }

    /// Returns true for a compile time constant
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.flags & FieldAttributes::LITERAL != 0
    }

    /// Returns true for a static field
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & FieldAttributes::STATIC != 0
    }
}
