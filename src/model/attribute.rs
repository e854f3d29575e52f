//! Custom attributes as they hang off types, members, the assembly and the module.

use serde::{Deserialize, Serialize};

use crate::model::{Token, TypeSignature};

/// Represents a fixed or named argument value of a custom attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// Character value (16-bit Unicode)
    Char(u16),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// String
    String(String),
    /// `typeof(T)` value
    Type(TypeSignature),
    /// Array of arguments
    Array(Vec<CustomAttributeArgument>),
    /// Enum value (enum type + underlying value)
    Enum(TypeSignature, Box<CustomAttributeArgument>),
    /// Null string, type or array
    Null,
}

impl CustomAttributeArgument {
    /// Calls `visit` for every type token the argument mentions, either as a `typeof`
    /// value or as the type of an enum value, descending into arrays
    pub fn visit_type_tokens(&self, visit: &mut impl FnMut(Token)) {
        match self {
            CustomAttributeArgument::Type(sig) => sig.visit_tokens(visit),
            CustomAttributeArgument::Enum(sig, value) => {
                sig.visit_tokens(visit);
                value.visit_type_tokens(visit);
            }
            CustomAttributeArgument::Array(values) => {
                for value in values {
                    value.visit_type_tokens(visit);
                }
            }
            _ => {}
        }
    }
}

/// Represents a named argument (field or property) in a custom attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttributeNamedArgument {
    /// Whether this is a field (true) or property (false)
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// Value of the argument
    pub value: CustomAttributeArgument,
}

/// An applied custom attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttribute {
    /// Attribute constructor, a `MethodDef` or `MemberRef`; the attribute type is its parent
    pub constructor: Token,
    /// Positional constructor arguments
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Field and property assignments
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

impl CustomAttribute {
    /// An attribute applied without arguments
    #[must_use]
    pub fn new(constructor: Token) -> Self {
        CustomAttribute {
            constructor,
            fixed_args: Vec::new(),
            named_args: Vec::new(),
        }
    }

    /// Every type token mentioned by fixed or named arguments
    #[must_use]
    pub fn argument_type_tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut push = |token| tokens.push(token);
        for arg in &self.fixed_args {
            arg.visit_type_tokens(&mut push);
        }
        for named in &self.named_args {
            named.value.visit_type_tokens(&mut push);
        }
        tokens
    }
}
