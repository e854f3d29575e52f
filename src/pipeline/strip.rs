//! Replacing method bodies with throw stubs.
//!
//! Every body becomes `newobj System.NotImplementedException::.ctor(); throw`. Instance
//! constructors of types whose base lacks an accessible parameterless constructor keep a
//! call into the base, with zero values for every argument, so the stub still describes a
//! constructible type.

use log::{debug, trace};

use crate::{
    model::{
        DefaultValue, MemberRef, MemberRefSignature, Module, SignatureMethod, TableId, Token,
        TypeSignature,
    },
    pipeline::{EventKind, ModulePass, PassContext, PipelineState},
    visibility::Accessibility,
    Result,
};

const TARGET: &str = "refasm::strip";

/// A constructor call to emit in front of the stub
#[derive(Debug, Clone, PartialEq)]
struct ChainedCall {
    target: Token,
    defaults: Vec<Option<DefaultValue>>,
}

/// Replaces every body with a throw stub, keeping base constructor calls where needed
pub struct BodyStripper;

impl ModulePass for BodyStripper {
    fn name(&self) -> &'static str {
        "strip-bodies"
    }

    fn state(&self) -> PipelineState {
        PipelineState::BodiesStripped
    }

    fn description(&self) -> &'static str {
        "Replaces method bodies with NotImplementedException stubs"
    }

    fn run(&self, module: &mut Module, ctx: &mut PassContext) -> Result<usize> {
        if !ctx.config.strip_bodies {
            debug!(target: TARGET, "body stripping disabled");
            return Ok(0);
        }

        let methods: Vec<Token> = module
            .methods
            .iter()
            .filter(|(_, method)| method.body.is_some())
            .map(|(token, _)| token)
            .collect();
        if methods.is_empty() {
            return Ok(0);
        }

        let stub_ctor = not_implemented_ctor(module);
        for token in &methods {
            let chained = plan_chained_call(module, ctx, *token);
            let name = module.entity_name(*token);
            let Some(body) = module
                .methods
                .get_mut(*token)
                .and_then(|method| method.body.as_mut())
            else {
                continue;
            };

            body.clear();
            if let Some(call) = &chained {
                body.emit_constructor_call(call.target, &call.defaults);
                ctx.events
                    .record(EventKind::ConstructorChainPreserved)
                    .subject(*token)
                    .message(format!("{name} -> {}", call.target));
            }
            body.emit_throw_stub(stub_ctor);

            trace!(target: TARGET, "stubbed {name}");
            ctx.events
                .record(EventKind::BodyStripped)
                .subject(*token)
                .message(name);
        }
        Ok(methods.len())
    }
}

/// Finds or imports `System.NotImplementedException::.ctor()`
pub(crate) fn not_implemented_ctor(module: &mut Module) -> Token {
    let exception = module.import_corlib_type("System", "NotImplementedException");
    module.import_member_ref(MemberRef {
        parent: TypeSignature::Class(exception),
        name: ".ctor".to_string(),
        signature: MemberRefSignature::Method(SignatureMethod::instance(
            TypeSignature::Void,
            vec![],
        )),
    })
}

/// Zero value for a parameter of type `sig`.
///
/// Enums declared in this module load their underlying type's zero. Other value types and
/// generic parameters have no supported zero value.
fn default_value(module: &Module, sig: &TypeSignature) -> Option<DefaultValue> {
    match sig {
        TypeSignature::Boolean
        | TypeSignature::Char
        | TypeSignature::I1
        | TypeSignature::U1
        | TypeSignature::I2
        | TypeSignature::U2
        | TypeSignature::I4
        | TypeSignature::U4 => Some(DefaultValue::I4Zero),
        TypeSignature::I8 | TypeSignature::U8 => Some(DefaultValue::I8Zero),
        TypeSignature::I | TypeSignature::U => Some(DefaultValue::NativeZero),
        TypeSignature::R4 => Some(DefaultValue::R4Zero),
        TypeSignature::R8 => Some(DefaultValue::R8Zero),
        TypeSignature::String
        | TypeSignature::Object
        | TypeSignature::Class(_)
        | TypeSignature::SzArray(_)
        | TypeSignature::Array { .. }
        | TypeSignature::Ptr(_)
        | TypeSignature::ByRef(_)
        | TypeSignature::FnPtr(_) => Some(DefaultValue::Null),
        TypeSignature::GenericInst(generic, _) => match generic.as_ref() {
            TypeSignature::Class(_) => Some(DefaultValue::Null),
            _ => None,
        },
        TypeSignature::ValueType(token) => module
            .resolve_type(*token)
            .and_then(|def| module.enum_underlying_type(def))
            .and_then(|underlying| default_value(module, underlying)),
        TypeSignature::Void
        | TypeSignature::TypedByRef
        | TypeSignature::GenericParamType(_)
        | TypeSignature::GenericParamMethod(_) => None,
    }
}

/// Decides which constructor call, if any, a stripped instance constructor keeps
fn plan_chained_call(module: &mut Module, ctx: &mut PassContext, token: Token) -> Option<ChainedCall> {
    let method = module.methods.get(token)?;
    if !method.is_instance_constructor() {
        return None;
    }
    let owner = method.declaring_type;
    let first_call = method
        .body
        .as_ref()
        .and_then(|body| body.first_call())
        .and_then(|call| call.token());
    let base_sig = module.type_defs.get(owner)?.extends.clone()?;
    let base_head = base_sig.head_token()?;

    match module.resolve_type(base_head) {
        Some(base) => plan_in_module_base(module, ctx, token, owner, base, &base_sig, first_call),
        None => plan_external_base(module, ctx, token, base_head, first_call),
    }
}

fn is_accessible(ctx: &PassContext, flags: u32) -> bool {
    matches!(
        ctx.classifier.classify_member_flags(flags),
        Accessibility::Public | Accessibility::Protected
    )
}

/// A parameterless base constructor only spares the chain if it survives the mask
fn has_accessible_default_ctor(module: &Module, ctx: &PassContext, base: Token) -> bool {
    module.type_defs.get(base).is_some_and(|def| {
        def.methods.iter().any(|m| {
            module.methods.get(*m).is_some_and(|ctor| {
                ctor.is_instance_constructor()
                    && ctor.signature.params.is_empty()
                    && is_accessible(ctx, ctor.flags)
            }) && ctx.classifier.is_member_retained(module, *m)
        })
    })
}

/// The `MethodDef` a constructor call lands on, following member references into types
/// of this module
fn resolve_constructor(module: &Module, call: Token) -> Option<Token> {
    if call.is_table(TableId::MethodDef) {
        return module
            .methods
            .get(call)
            .filter(|m| m.is_instance_constructor())
            .map(|_| call);
    }
    let reference = module.member_refs.get(call)?;
    if !reference.is_constructor() {
        return None;
    }
    let signature = reference.method_signature()?;
    let def = module.resolve_type(reference.parent.head_token()?)?;
    module.type_defs.get(def)?.methods.iter().copied().find(|m| {
        module.methods.get(*m).is_some_and(|ctor| {
            ctor.is_instance_constructor() && ctor.signature.params == signature.params
        })
    })
}

fn is_constructor_call(module: &Module, call: Token) -> bool {
    module
        .methods
        .get(call)
        .is_some_and(|m| m.is_instance_constructor())
        || module
            .member_refs
            .get(call)
            .is_some_and(|r| r.is_constructor())
}

fn call_params(module: &Module, call: Token) -> Vec<TypeSignature> {
    module
        .methods
        .get(call)
        .map(|m| m.signature.params.clone())
        .or_else(|| {
            module
                .member_refs
                .get(call)
                .and_then(|r| r.method_signature())
                .map(|sig| sig.params.clone())
        })
        .unwrap_or_default()
}

fn build_call(
    module: &Module,
    ctx: &mut PassContext,
    ctor: Token,
    target: Token,
    params: &[TypeSignature],
) -> ChainedCall {
    let defaults = params
        .iter()
        .map(|param| {
            let value = default_value(module, param);
            if value.is_none() {
                ctx.warn(
                    TARGET,
                    Some(ctor),
                    format!(
                        "no default value for parameter of type {} in call from {}",
                        module.signature_name(param),
                        module.entity_name(ctor)
                    ),
                );
            }
            value
        })
        .collect();
    ChainedCall { target, defaults }
}

fn plan_in_module_base(
    module: &mut Module,
    ctx: &mut PassContext,
    ctor: Token,
    owner: Token,
    base: Token,
    base_sig: &TypeSignature,
    first_call: Option<Token>,
) -> Option<ChainedCall> {
    if has_accessible_default_ctor(module, ctx, base) {
        return None;
    }
    let call = first_call.filter(|call| is_constructor_call(module, *call));
    let Some(call) = call else {
        debug!(
            target: TARGET,
            "{} does not start with a constructor call",
            module.entity_name(ctor)
        );
        return None;
    };

    if let Some(resolved) = resolve_constructor(module, call) {
        let declared_by = module.member_declaring_type(resolved);
        if resolved != ctor
            && (declared_by == Some(base) || declared_by == Some(owner))
            && ctx.classifier.is_member_retained(module, resolved)
        {
            let params = call_params(module, call);
            return Some(build_call(module, ctx, ctor, call, &params));
        }
    }

    let candidate = module.type_defs.get(base).and_then(|def| {
        def.methods
            .iter()
            .copied()
            .filter(|m| {
                module.methods.get(*m).is_some_and(|candidate| {
                    candidate.is_instance_constructor() && is_accessible(ctx, candidate.flags)
                })
            })
            .filter(|m| ctx.classifier.is_member_retained(module, *m))
            .min_by_key(|m| {
                module
                    .methods
                    .get(*m)
                    .map_or(usize::MAX, |c| c.signature.params.len())
            })
    });
    let Some(candidate) = candidate else {
        ctx.warn(
            TARGET,
            Some(ctor),
            format!(
                "no accessible constructor on {} for {}",
                module.type_name(base),
                module.entity_name(ctor)
            ),
        );
        return None;
    };

    let signature = module.methods.get(candidate)?.signature.clone();
    let target = match base_sig {
        TypeSignature::GenericInst(..) => module.import_member_ref(MemberRef {
            parent: base_sig.clone(),
            name: ".ctor".to_string(),
            signature: MemberRefSignature::Method(signature.clone()),
        }),
        _ => candidate,
    };
    Some(build_call(module, ctx, ctor, target, &signature.params))
}

/// Bases of other assemblies cannot be inspected; a call to one of their constructors
/// that takes arguments is kept as it is
fn plan_external_base(
    module: &Module,
    ctx: &mut PassContext,
    ctor: Token,
    base_head: Token,
    first_call: Option<Token>,
) -> Option<ChainedCall> {
    let call = first_call?;
    let reference = module.member_refs.get(call)?;
    let params = reference.method_signature()?.params.clone();
    if !reference.is_constructor()
        || reference.parent.head_token() != Some(base_head)
        || params.is_empty()
    {
        return None;
    }
    Some(build_call(module, ctx, ctor, call, &params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GeneratorConfig,
        model::{
            FieldAttributes, Instruction, MethodAccessFlags, MethodModifiers, ModuleBuilder,
            OpCode, TypeAttributes,
        },
    };

    fn run(module: &mut Module) -> PassContext {
        run_with(GeneratorConfig::default(), module)
    }

    fn run_with(config: GeneratorConfig, module: &mut Module) -> PassContext {
        let mut ctx = PassContext::new(config, module);
        BodyStripper.run(module, &mut ctx).unwrap();
        ctx
    }

    fn opcodes(module: &Module, method: Token) -> Vec<OpCode> {
        module
            .methods
            .get(method)
            .and_then(|m| m.body.as_ref())
            .map(|b| b.instructions.iter().map(|i| i.opcode).collect())
            .unwrap_or_default()
    }

    #[test]
    fn plain_methods_become_stubs() {
        let mut builder = ModuleBuilder::library("Acme");
        let class = builder.class("Acme", "Widget", TypeAttributes::PUBLIC);
        let method = builder.method(class, "Run", MethodAccessFlags::PUBLIC.bits());
        builder.set_body(
            method,
            vec![
                Instruction::with_token(OpCode::Call, Token(0x06000009)),
                Instruction::simple(OpCode::Ret),
            ],
        );
        let mut module = builder.build();
        let ctx = run(&mut module);

        assert_eq!(opcodes(&module, method), vec![OpCode::Newobj, OpCode::Throw]);
        let body = module.methods.get(method).and_then(|m| m.body.as_ref()).unwrap();
        assert!(!body.init_locals);
        assert_eq!(ctx.events.count_kind(EventKind::BodyStripped), 1);
    }

    #[test]
    fn abstract_methods_are_untouched() {
        let mut builder = ModuleBuilder::library("Acme");
        let class = builder.class("Acme", "Shape", TypeAttributes::PUBLIC | TypeAttributes::ABSTRACT);
        let area = builder.method(
            class,
            "Area",
            MethodAccessFlags::PUBLIC.bits() | MethodModifiers::ABSTRACT.bits(),
        );
        let mut module = builder.build();
        run(&mut module);
        assert!(module.methods.get(area).is_some_and(|m| m.body.is_none()));
    }

    #[test]
    fn chaining_to_protected_two_argument_base() {
        let mut builder = ModuleBuilder::library("Acme");
        let base = builder.class("Acme", "E", TypeAttributes::PUBLIC);
        let base_ctor = builder.constructor(
            base,
            MethodAccessFlags::FAMILY,
            vec![TypeSignature::I4, TypeSignature::String],
        );
        let derived = builder.class("Acme", "D", TypeAttributes::PUBLIC);
        builder.extends(derived, TypeSignature::Class(base));
        let ctor = builder.constructor(derived, MethodAccessFlags::PUBLIC, vec![]);
        builder.set_body(
            ctor,
            vec![
                Instruction::simple(OpCode::Ldarg0),
                Instruction::simple(OpCode::LdcI4),
                Instruction::simple(OpCode::Ldnull),
                Instruction::with_token(OpCode::Call, base_ctor),
                Instruction::simple(OpCode::Ret),
            ],
        );
        let mut module = builder.build();
        let ctx = run(&mut module);

        assert_eq!(
            opcodes(&module, ctor),
            vec![
                OpCode::Ldarg0,
                OpCode::LdcI4,
                OpCode::Ldnull,
                OpCode::Call,
                OpCode::Newobj,
                OpCode::Throw,
            ]
        );
        assert_eq!(ctx.events.count_kind(EventKind::ConstructorChainPreserved), 1);
    }

    #[test]
    fn hidden_target_falls_back_to_fewest_parameters() {
        let mut builder = ModuleBuilder::library("Acme");
        let base = builder.class("Acme", "E", TypeAttributes::PUBLIC);
        let private_ctor = builder.constructor(base, MethodAccessFlags::PRIVATE, vec![TypeSignature::I8]);
        builder.constructor(
            base,
            MethodAccessFlags::PUBLIC,
            vec![TypeSignature::R4, TypeSignature::R8],
        );
        let smallest = builder.constructor(base, MethodAccessFlags::FAMILY, vec![TypeSignature::U8]);
        let derived = builder.class("Acme", "D", TypeAttributes::PUBLIC);
        builder.extends(derived, TypeSignature::Class(base));
        let ctor = builder.constructor(derived, MethodAccessFlags::PUBLIC, vec![]);
        builder.set_body(
            ctor,
            vec![
                Instruction::simple(OpCode::Ldarg0),
                Instruction::with_token(OpCode::Call, private_ctor),
            ],
        );
        let mut module = builder.build();
        run(&mut module);

        let body = module.methods.get(ctor).and_then(|m| m.body.as_ref()).unwrap();
        assert_eq!(body.first_call().and_then(Instruction::token), Some(smallest));
        assert_eq!(
            opcodes(&module, ctor)[..3],
            [OpCode::Ldarg0, OpCode::LdcI4, OpCode::ConvI8]
        );
    }

    #[test]
    fn accessible_default_constructor_needs_no_chain() {
        let mut builder = ModuleBuilder::library("Acme");
        let base = builder.class("Acme", "E", TypeAttributes::PUBLIC);
        let default_ctor = builder.constructor(base, MethodAccessFlags::PUBLIC, vec![]);
        builder.constructor(base, MethodAccessFlags::PUBLIC, vec![TypeSignature::I4]);
        let derived = builder.class("Acme", "D", TypeAttributes::PUBLIC);
        builder.extends(derived, TypeSignature::Class(base));
        let ctor = builder.constructor(derived, MethodAccessFlags::PUBLIC, vec![]);
        builder.set_body(ctor, vec![Instruction::with_token(OpCode::Call, default_ctor)]);
        let mut module = builder.build();
        run(&mut module);
        assert_eq!(opcodes(&module, ctor), vec![OpCode::Newobj, OpCode::Throw]);
    }

    #[test]
    fn masked_out_default_constructor_still_needs_a_chain() {
        let mut builder = ModuleBuilder::library("Acme");
        let base = builder.class("Acme", "E", TypeAttributes::PUBLIC);
        let protected_default = builder.constructor(base, MethodAccessFlags::FAMILY, vec![]);
        let public_ctor =
            builder.constructor(base, MethodAccessFlags::PUBLIC, vec![TypeSignature::I4]);
        let derived = builder.class("Acme", "D", TypeAttributes::PUBLIC);
        builder.extends(derived, TypeSignature::Class(base));
        let ctor = builder.constructor(derived, MethodAccessFlags::PUBLIC, vec![]);
        builder.set_body(
            ctor,
            vec![
                Instruction::simple(OpCode::Ldarg0),
                Instruction::with_token(OpCode::Call, protected_default),
                Instruction::simple(OpCode::Ret),
            ],
        );
        let mut module = builder.build();
        let ctx = run_with(GeneratorConfig::public_only(), &mut module);

        assert_eq!(
            opcodes(&module, ctor),
            vec![
                OpCode::Ldarg0,
                OpCode::LdcI4,
                OpCode::Call,
                OpCode::Newobj,
                OpCode::Throw,
            ]
        );
        let body = module.methods.get(ctor).and_then(|m| m.body.as_ref()).unwrap();
        assert_eq!(body.instructions[2].token(), Some(public_ctor));
        assert_eq!(ctx.events.count_kind(EventKind::ConstructorChainPreserved), 1);
    }

    #[test]
    fn missing_base_constructor_only_warns() {
        let mut builder = ModuleBuilder::library("Acme");
        let base = builder.class("Acme", "E", TypeAttributes::PUBLIC);
        let hidden = builder.constructor(base, MethodAccessFlags::ASSEM, vec![TypeSignature::I4]);
        let derived = builder.class("Acme", "D", TypeAttributes::PUBLIC);
        builder.extends(derived, TypeSignature::Class(base));
        let ctor = builder.constructor(derived, MethodAccessFlags::PUBLIC, vec![]);
        builder.set_body(ctor, vec![Instruction::with_token(OpCode::Call, hidden)]);
        let mut module = builder.build();

        let mut ctx = PassContext::new(GeneratorConfig::public_only(), &module);
        BodyStripper.run(&mut module, &mut ctx).unwrap();
        assert_eq!(opcodes(&module, ctor), vec![OpCode::Newobj, OpCode::Throw]);
        assert_eq!(ctx.events.count_kind(EventKind::Warning), 1);
    }

    #[test]
    fn enum_parameters_use_the_underlying_type() {
        let mut builder = ModuleBuilder::library("Acme");
        let enum_base = builder.corlib_type("System", "Enum");
        let kind = builder.class("Acme", "Kind", TypeAttributes::PUBLIC | TypeAttributes::SEALED);
        builder.extends(kind, TypeSignature::Class(enum_base));
        builder.field(
            kind,
            "value__",
            MethodAccessFlags::PUBLIC.bits() | FieldAttributes::RT_SPECIAL_NAME,
            TypeSignature::I8,
        );
        let module = builder.build();
        assert_eq!(
            default_value(&module, &TypeSignature::ValueType(kind)),
            Some(DefaultValue::I8Zero)
        );
        assert_eq!(default_value(&module, &TypeSignature::GenericParamType(0)), None);
        assert_eq!(
            default_value(&module, &TypeSignature::by_ref(TypeSignature::I4)),
            Some(DefaultValue::Null)
        );
        assert_eq!(default_value(&module, &TypeSignature::U), Some(DefaultValue::NativeZero));
    }

    #[test]
    fn external_base_keeps_argument_call() {
        let mut builder = ModuleBuilder::library("Acme");
        let exception = builder.corlib_type("System", "Exception");
        let base_ctor = builder.external_constructor(exception, vec![TypeSignature::String]);
        let derived = builder.class("Acme", "AcmeException", TypeAttributes::PUBLIC);
        builder.extends(derived, TypeSignature::Class(exception));
        let ctor = builder.constructor(derived, MethodAccessFlags::PUBLIC, vec![TypeSignature::String]);
        builder.set_body(
            ctor,
            vec![
                Instruction::simple(OpCode::Ldarg0),
                Instruction::simple(OpCode::Ldarg),
                Instruction::with_token(OpCode::Call, base_ctor),
            ],
        );
        let mut module = builder.build();
        run(&mut module);
        assert_eq!(
            opcodes(&module, ctor),
            vec![
                OpCode::Ldarg0,
                OpCode::Ldnull,
                OpCode::Call,
                OpCode::Newobj,
                OpCode::Throw
            ]
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut builder = ModuleBuilder::library("Acme");
        let base = builder.class("Acme", "E", TypeAttributes::PUBLIC);
        let base_ctor = builder.constructor(base, MethodAccessFlags::FAMILY, vec![TypeSignature::R4]);
        let derived = builder.class("Acme", "D", TypeAttributes::PUBLIC);
        builder.extends(derived, TypeSignature::Class(base));
        let ctor = builder.constructor(derived, MethodAccessFlags::PUBLIC, vec![]);
        builder.set_body(ctor, vec![Instruction::with_token(OpCode::Call, base_ctor)]);
        let mut module = builder.build();
        run(&mut module);
        let once = module.clone();
        run(&mut module);
        assert_eq!(module, once);
    }
}
