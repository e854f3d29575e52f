use serde::{Deserialize, Serialize};

use crate::model::Token;

/// Element-type based type signature.
///
/// Class and value types point at a `TypeDef` or `TypeRef` row. Everything the pruning
/// passes need to know about a signature is which tokens it mentions, see
/// [`TypeSignature::tokens`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSignature {
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// System.String
    String,
    /// System.Object
    Object,
    /// Type is referenced during runtime
    TypedByRef,
    /// CIL class, `TypeDef` or `TypeRef`
    Class(Token),
    /// CIL value-type, `TypeDef` or `TypeRef`
    ValueType(Token),
    /// Single dimension, zero based array
    SzArray(Box<TypeSignature>),
    /// Multi dimensional array
    Array {
        /// Element type
        element: Box<TypeSignature>,
        /// Number of dimensions
        rank: u32,
    },
    /// Unmanaged pointer
    Ptr(Box<TypeSignature>),
    /// Managed reference
    ByRef(Box<TypeSignature>),
    /// Generic type and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Generic parameter of the enclosing type
    GenericParamType(u32),
    /// Generic parameter of the enclosing method
    GenericParamMethod(u32),
    /// Function pointer
    FnPtr(Box<SignatureMethod>),
}

impl TypeSignature {
    /// Convenience constructor for a class signature
    #[must_use]
    pub fn class(token: Token) -> Self {
        TypeSignature::Class(token)
    }

    /// Convenience constructor for a single dimension array of `element`
    #[must_use]
    pub fn sz_array(element: TypeSignature) -> Self {
        TypeSignature::SzArray(Box::new(element))
    }

    /// Convenience constructor for a managed reference to `inner`
    #[must_use]
    pub fn by_ref(inner: TypeSignature) -> Self {
        TypeSignature::ByRef(Box::new(inner))
    }

    /// Convenience constructor for a generic instantiation
    #[must_use]
    pub fn generic_inst(generic: TypeSignature, args: Vec<TypeSignature>) -> Self {
        TypeSignature::GenericInst(Box::new(generic), args)
    }

    /// The type token this signature names at its head.
    ///
    /// `Class(t)` and `ValueType(t)` yield `t`; a generic instantiation yields the token of
    /// its generic type definition. Everything else yields `None`.
    #[must_use]
    pub fn head_token(&self) -> Option<Token> {
        match self {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => Some(*token),
            TypeSignature::GenericInst(generic, _) => generic.head_token(),
            _ => None,
        }
    }

    /// Calls `visit` for every type token mentioned anywhere in this signature
    pub fn visit_tokens(&self, visit: &mut impl FnMut(Token)) {
        match self {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => visit(*token),
            TypeSignature::SzArray(inner)
            | TypeSignature::Ptr(inner)
            | TypeSignature::ByRef(inner)
            | TypeSignature::Array { element: inner, .. } => inner.visit_tokens(visit),
            TypeSignature::GenericInst(generic, args) => {
                generic.visit_tokens(visit);
                for arg in args {
                    arg.visit_tokens(visit);
                }
            }
            TypeSignature::FnPtr(method) => method.visit_tokens(visit),
            _ => {}
        }
    }

    /// Collects every type token mentioned in this signature, in visit order
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.visit_tokens(&mut |token| tokens.push(token));
        tokens
    }

    /// Rewrites every type token through `map`
    pub fn map_tokens(&mut self, map: &mut impl FnMut(Token) -> Token) {
        match self {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => *token = map(*token),
            TypeSignature::SzArray(inner)
            | TypeSignature::Ptr(inner)
            | TypeSignature::ByRef(inner)
            | TypeSignature::Array { element: inner, .. } => inner.map_tokens(map),
            TypeSignature::GenericInst(generic, args) => {
                generic.map_tokens(map);
                for arg in args {
                    arg.map_tokens(map);
                }
            }
            TypeSignature::FnPtr(method) => {
                method.return_type.map_tokens(map);
                for param in &mut method.params {
                    param.map_tokens(map);
                }
            }
            _ => {}
        }
    }

    /// Returns true for generic parameters of either kind
    #[must_use]
    pub fn is_generic_param(&self) -> bool {
        matches!(
            self,
            TypeSignature::GenericParamType(_) | TypeSignature::GenericParamMethod(_)
        )
    }
}

/// Method signature: calling convention, return type and parameter types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureMethod {
    /// Instance method, the `this` pointer is passed implicitly
    pub has_this: bool,
    /// Number of generic parameters declared by the method
    pub generic_param_count: u32,
    /// Return type
    pub return_type: TypeSignature,
    /// Parameter types, without `this`
    pub params: Vec<TypeSignature>,
}

impl SignatureMethod {
    /// An instance method signature
    #[must_use]
    pub fn instance(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            has_this: true,
            generic_param_count: 0,
            return_type,
            params,
        }
    }

    /// A static method signature
    #[must_use]
    pub fn static_method(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            has_this: false,
            generic_param_count: 0,
            return_type,
            params,
        }
    }

    /// Calls `visit` for every type token mentioned in return and parameter types
    pub fn visit_tokens(&self, visit: &mut impl FnMut(Token)) {
        self.return_type.visit_tokens(visit);
        for param in &self.params {
            param.visit_tokens(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_token_of_generic_instance() {
        let generic = TypeSignature::generic_inst(
            TypeSignature::Class(Token(0x02000003)),
            vec![TypeSignature::I4, TypeSignature::Class(Token(0x01000001))],
        );
        assert_eq!(generic.head_token(), Some(Token(0x02000003)));
        assert_eq!(TypeSignature::I4.head_token(), None);
        assert_eq!(
            TypeSignature::sz_array(TypeSignature::Class(Token(0x02000001))).head_token(),
            None
        );
    }

    #[test]
    fn tokens_walk_nested_signatures() {
        let sig = TypeSignature::by_ref(TypeSignature::sz_array(TypeSignature::generic_inst(
            TypeSignature::ValueType(Token(0x01000002)),
            vec![TypeSignature::Class(Token(0x02000004))],
        )));
        assert_eq!(sig.tokens(), vec![Token(0x01000002), Token(0x02000004)]);
    }

    #[test]
    fn fn_ptr_tokens_include_return_and_params() {
        let sig = TypeSignature::FnPtr(Box::new(SignatureMethod::static_method(
            TypeSignature::Class(Token(0x02000001)),
            vec![TypeSignature::ValueType(Token(0x02000002))],
        )));
        assert_eq!(sig.tokens(), vec![Token(0x02000001), Token(0x02000002)]);
    }

    #[test]
    fn map_tokens_rewrites_everything() {
        let mut sig = TypeSignature::generic_inst(
            TypeSignature::Class(Token(0x02000001)),
            vec![TypeSignature::Class(Token(0x02000001))],
        );
        sig.map_tokens(&mut |_| Token(0x01000009));
        assert_eq!(sig.tokens(), vec![Token(0x01000009), Token(0x01000009)]);
    }

    #[test]
    fn generic_params_are_detected() {
        assert!(TypeSignature::GenericParamType(0).is_generic_param());
        assert!(TypeSignature::GenericParamMethod(1).is_generic_param());
        assert!(!TypeSignature::Object.is_generic_param());
    }
}
