//! Method bodies.
//!
//! Bodies are kept at instruction granularity. Only the opcodes that reference
//! generation inspects or emits are named; everything else is carried as
//! [`OpCode::Other`] with its raw ECMA-335 value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Token, TypeSignature};

/// CIL opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpCode {
    /// `nop`
    Nop,
    /// `ldarg.0`
    Ldarg0,
    /// `ldarg` with an explicit index
    Ldarg,
    /// `ldloc`
    Ldloc,
    /// `stloc`
    Stloc,
    /// `ldnull`
    Ldnull,
    /// `ldc.i4`
    LdcI4,
    /// `ldc.i8`
    LdcI8,
    /// `ldc.r4`
    LdcR4,
    /// `ldc.r8`
    LdcR8,
    /// `ldstr`
    Ldstr,
    /// `ldfld`
    Ldfld,
    /// `stfld`
    Stfld,
    /// `ldsfld`
    Ldsfld,
    /// `stsfld`
    Stsfld,
    /// `call`
    Call,
    /// `callvirt`
    Callvirt,
    /// `newobj`
    Newobj,
    /// `ret`
    Ret,
    /// `throw`
    Throw,
    /// `conv.i`
    ConvI,
    /// `conv.i8`
    ConvI8,
    /// `conv.u`
    ConvU,
    /// `br`
    Br,
    /// `brtrue`
    Brtrue,
    /// `brfalse`
    Brfalse,
    /// Any other opcode, by raw value
    Other(u16),
}

impl OpCode {
    /// The assembler mnemonic
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Nop => "nop",
            OpCode::Ldarg0 => "ldarg.0",
            OpCode::Ldarg => "ldarg",
            OpCode::Ldloc => "ldloc",
            OpCode::Stloc => "stloc",
            OpCode::Ldnull => "ldnull",
            OpCode::LdcI4 => "ldc.i4",
            OpCode::LdcI8 => "ldc.i8",
            OpCode::LdcR4 => "ldc.r4",
            OpCode::LdcR8 => "ldc.r8",
            OpCode::Ldstr => "ldstr",
            OpCode::Ldfld => "ldfld",
            OpCode::Stfld => "stfld",
            OpCode::Ldsfld => "ldsfld",
            OpCode::Stsfld => "stsfld",
            OpCode::Call => "call",
            OpCode::Callvirt => "callvirt",
            OpCode::Newobj => "newobj",
            OpCode::Ret => "ret",
            OpCode::Throw => "throw",
            OpCode::ConvI => "conv.i",
            OpCode::ConvI8 => "conv.i8",
            OpCode::ConvU => "conv.u",
            OpCode::Br => "br",
            OpCode::Brtrue => "brtrue",
            OpCode::Brfalse => "brfalse",
            OpCode::Other(_) => "<other>",
        }
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// No operand
    None,
    /// 32bit immediate
    Int32(i32),
    /// 64bit immediate
    Int64(i64),
    /// 32bit floating-point immediate
    Float32(f32),
    /// 64bit floating-point immediate
    Float64(f64),
    /// Metadata token (method, field, type)
    Token(Token),
    /// String literal
    String(String),
    /// Branch target, as an instruction index
    Branch(u32),
    /// Undecoded operand bytes
    Raw(Vec<u8>),
}

/// A single instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Opcode
    pub opcode: OpCode,
    /// Operand
    pub operand: Operand,
}

impl Instruction {
    /// An instruction without operand
    #[must_use]
    pub fn simple(opcode: OpCode) -> Self {
        Instruction {
            opcode,
            operand: Operand::None,
        }
    }

    /// An instruction with a token operand
    #[must_use]
    pub fn with_token(opcode: OpCode, token: Token) -> Self {
        Instruction {
            opcode,
            operand: Operand::Token(token),
        }
    }

    /// The token operand, if any
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self.operand {
            Operand::Token(token) => Some(token),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Operand::None => write!(f, "{}", self.opcode.mnemonic()),
            Operand::Int32(value) => write!(f, "{} {}", self.opcode.mnemonic(), value),
            Operand::Int64(value) => write!(f, "{} {}", self.opcode.mnemonic(), value),
            Operand::Float32(value) => write!(f, "{} {:?}", self.opcode.mnemonic(), value),
            Operand::Float64(value) => write!(f, "{} {:?}", self.opcode.mnemonic(), value),
            Operand::Token(token) => write!(f, "{} {}", self.opcode.mnemonic(), token),
            Operand::String(value) => write!(f, "{} {:?}", self.opcode.mnemonic(), value),
            Operand::Branch(target) => write!(f, "{} IL_{:04}", self.opcode.mnemonic(), target),
            Operand::Raw(bytes) => write!(f, "{} <{} bytes>", self.opcode.mnemonic(), bytes.len()),
        }
    }
}

/// An exception handling region, with offsets expressed as instruction indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionHandler {
    /// ECMA-335 clause flags (catch, filter, finally, fault)
    pub flags: u16,
    /// First instruction of the protected block
    pub try_start: u32,
    /// Instruction count of the protected block
    pub try_length: u32,
    /// First instruction of the handler
    pub handler_start: u32,
    /// Instruction count of the handler
    pub handler_length: u32,
    /// Caught exception type for catch clauses
    pub catch_type: Option<Token>,
}

/// Zero value loaded for a parameter when a constructor call is re-emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultValue {
    /// `ldc.i4.0`
    I4Zero,
    /// `ldc.i4.0; conv.i8`
    I8Zero,
    /// `ldc.i4.0; conv.i`
    NativeZero,
    /// `ldc.r4 0.0`
    R4Zero,
    /// `ldc.r8 0.0`
    R8Zero,
    /// `ldnull`
    Null,
}

/// The body of a method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    /// Maximum evaluation stack depth
    pub max_stack: u16,
    /// Zero-initialize locals on entry
    pub init_locals: bool,
    /// Local variable types
    pub locals: Vec<TypeSignature>,
    /// Instructions
    pub instructions: Vec<Instruction>,
    /// Exception handling regions
    pub exception_handlers: Vec<ExceptionHandler>,
}

impl Default for MethodBody {
    fn default() -> Self {
        MethodBody {
            max_stack: 8,
            init_locals: false,
            locals: Vec::new(),
            instructions: Vec::new(),
            exception_handlers: Vec::new(),
        }
    }
}

impl MethodBody {
    /// A body consisting of `instructions`
    #[must_use]
    pub fn with_instructions(instructions: Vec<Instruction>) -> Self {
        MethodBody {
            instructions,
            ..MethodBody::default()
        }
    }

    /// Drops every instruction, local and exception region, and clears `init_locals`
    pub fn clear(&mut self) {
        self.instructions.clear();
        self.locals.clear();
        self.exception_handlers.clear();
        self.init_locals = false;
    }

    /// Appends one instruction
    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Appends `newobj <exception_ctor>; throw`
    pub fn emit_throw_stub(&mut self, exception_ctor: Token) {
        self.emit(Instruction::with_token(OpCode::Newobj, exception_ctor));
        self.emit(Instruction::simple(OpCode::Throw));
    }

    /// Appends `ldarg.0`, one zero value per parameter and `call <target>`.
    ///
    /// A `None` entry loads nothing for that parameter.
    pub fn emit_constructor_call(&mut self, target: Token, defaults: &[Option<DefaultValue>]) {
        self.emit(Instruction::simple(OpCode::Ldarg0));
        for default in defaults.iter().flatten() {
            self.emit_default(*default);
        }
        self.emit(Instruction::with_token(OpCode::Call, target));
        let depth = 1 + defaults.iter().flatten().count();
        self.max_stack = self.max_stack.max(u16::try_from(depth).unwrap_or(u16::MAX));
    }

    fn emit_default(&mut self, default: DefaultValue) {
        let ldc_zero = Instruction {
            opcode: OpCode::LdcI4,
            operand: Operand::Int32(0),
        };
        match default {
            DefaultValue::I4Zero => self.emit(ldc_zero),
            DefaultValue::I8Zero => {
                self.emit(ldc_zero);
                self.emit(Instruction::simple(OpCode::ConvI8));
            }
            DefaultValue::NativeZero => {
                self.emit(ldc_zero);
                self.emit(Instruction::simple(OpCode::ConvI));
            }
            DefaultValue::R4Zero => self.emit(Instruction {
                opcode: OpCode::LdcR4,
                operand: Operand::Float32(0.0),
            }),
            DefaultValue::R8Zero => self.emit(Instruction {
                opcode: OpCode::LdcR8,
                operand: Operand::Float64(0.0),
            }),
            DefaultValue::Null => self.emit(Instruction::simple(OpCode::Ldnull)),
        }
    }

    /// The first `call` instruction of the body
    #[must_use]
    pub fn first_call(&self) -> Option<&Instruction> {
        self.instructions
            .iter()
            .find(|instruction| instruction.opcode == OpCode::Call)
    }

    /// Returns true if the body is exactly `newobj <exception_ctor>; throw`
    #[must_use]
    pub fn is_throw_stub(&self, exception_ctor: Token) -> bool {
        self.instructions.len() == 2 && self.ends_with_throw_stub(exception_ctor)
    }

    /// Returns true if the body ends with `newobj <exception_ctor>; throw`
    #[must_use]
    pub fn ends_with_throw_stub(&self, exception_ctor: Token) -> bool {
        match self.instructions.as_slice() {
            [.., newobj, throw] => {
                newobj.opcode == OpCode::Newobj
                    && newobj.token() == Some(exception_ctor)
                    && throw.opcode == OpCode::Throw
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTOR: Token = Token(0x0A000001);

    fn sample_body() -> MethodBody {
        MethodBody {
            max_stack: 2,
            init_locals: true,
            locals: vec![TypeSignature::I4],
            instructions: vec![
                Instruction {
                    opcode: OpCode::Ldstr,
                    operand: Operand::String("secret".into()),
                },
                Instruction::with_token(OpCode::Call, Token(0x06000004)),
                Instruction::simple(OpCode::Ret),
            ],
            exception_handlers: vec![ExceptionHandler {
                flags: 0,
                try_start: 0,
                try_length: 2,
                handler_start: 2,
                handler_length: 1,
                catch_type: None,
            }],
        }
    }

    #[test]
    fn clear_drops_everything() {
        let mut body = sample_body();
        body.clear();
        assert!(body.instructions.is_empty());
        assert!(body.locals.is_empty());
        assert!(body.exception_handlers.is_empty());
        assert!(!body.init_locals);
    }

    #[test]
    fn throw_stub_shape() {
        let mut body = sample_body();
        body.clear();
        body.emit_throw_stub(CTOR);
        assert!(body.is_throw_stub(CTOR));
        assert_eq!(body.instructions[0].to_string(), "newobj 0x0a000001");
        assert_eq!(body.instructions[1].to_string(), "throw");
    }

    #[test]
    fn constructor_call_loads_defaults() {
        let mut body = MethodBody::default();
        body.emit_constructor_call(
            Token(0x06000002),
            &[
                Some(DefaultValue::I8Zero),
                Some(DefaultValue::Null),
                None,
                Some(DefaultValue::R8Zero),
            ],
        );
        let opcodes: Vec<OpCode> = body.instructions.iter().map(|i| i.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                OpCode::Ldarg0,
                OpCode::LdcI4,
                OpCode::ConvI8,
                OpCode::Ldnull,
                OpCode::LdcR8,
                OpCode::Call,
            ]
        );
        assert_eq!(body.instructions[5].token(), Some(Token(0x06000002)));
    }

    #[test]
    fn first_call_skips_other_instructions() {
        let body = sample_body();
        assert_eq!(
            body.first_call().and_then(Instruction::token),
            Some(Token(0x06000004))
        );
        assert!(MethodBody::default().first_call().is_none());
    }

    #[test]
    fn stub_preceded_by_call_is_not_a_bare_stub() {
        let mut body = MethodBody::default();
        body.emit_constructor_call(Token(0x06000002), &[]);
        body.emit_throw_stub(CTOR);
        assert!(!body.is_throw_stub(CTOR));
        assert!(body.ends_with_throw_stub(CTOR));
    }
}
