//! End to end reductions of small hand built modules.

use std::{cell::Cell, fs, io};

use refasm::prelude::*;
use tempfile::NamedTempFile;

fn access(flags: MethodAccessFlags) -> u32 {
    flags.bits()
}

/// `PublicA` with a private nested `PrivateC`, an internal `InternalB`, and an attribute on
/// `PublicA` naming `PrivateC` through `typeof`
fn nested_surface() -> (Module, Token, Token, Token) {
    let mut builder = ModuleBuilder::library("Acme");
    let public_a = builder.class("Acme", "PublicA", TypeAttributes::PUBLIC);
    builder.constructor(public_a, MethodAccessFlags::PUBLIC, vec![]);
    let private_c = builder.nested_class(public_a, "PrivateC", TypeAttributes::NESTED_PRIVATE);
    builder.method(private_c, "Work", access(MethodAccessFlags::PUBLIC));
    let internal_b = builder.class("Acme", "InternalB", TypeAttributes::NOT_PUBLIC);
    builder.method(internal_b, "Work", access(MethodAccessFlags::PUBLIC));

    let debugger = builder.corlib_type("System.Diagnostics", "DebuggerTypeProxyAttribute");
    let system_type = builder.corlib_type("System", "Type");
    let proxy_ctor =
        builder.external_constructor(debugger, vec![TypeSignature::Class(system_type)]);
    builder.attribute(
        public_a,
        proxy_ctor,
        vec![CustomAttributeArgument::Type(TypeSignature::Class(private_c))],
    );
    (builder.build(), public_a, internal_b, private_c)
}

#[test]
fn public_mask_keeps_only_the_public_type() {
    let (module, public_a, internal_b, private_c) = nested_surface();
    let pipeline = Pipeline::new(GeneratorConfig::public_only());
    let mut run = pipeline.run(module).unwrap();
    assert_eq!(run.state(), PipelineState::Validated);
    assert!(run.report().is_clean());

    let module = run.commit().unwrap();
    assert_eq!(module.types, vec![public_a]);
    assert!(!module.contains(internal_b));
    assert!(!module.contains(private_c));

    let def = module.type_defs.get(public_a).unwrap();
    assert!(def.nested_types.is_empty());
    assert!(def.custom_attributes.is_empty());

    let mut dangling = Vec::new();
    module.visit_references(&mut |referrer, token| {
        if module.targets_module(token) && module.resolve_type(token).is_none() {
            dangling.push((referrer, token));
        }
    });
    assert!(dangling.is_empty());
}

#[test]
fn protected_two_argument_base_constructor_is_still_called() {
    let mut builder = ModuleBuilder::library("Acme");
    let e = builder.class("Acme", "E", TypeAttributes::PUBLIC);
    let base_ctor = builder.constructor(
        e,
        MethodAccessFlags::FAMILY,
        vec![TypeSignature::I4, TypeSignature::String],
    );
    let d = builder.class("Acme", "D", TypeAttributes::PUBLIC);
    builder.extends(d, TypeSignature::Class(e));
    let ctor = builder.constructor(d, MethodAccessFlags::PUBLIC, vec![]);
    builder.set_body(
        ctor,
        vec![
            Instruction::simple(OpCode::Ldarg0),
            Instruction::simple(OpCode::LdcI4),
            Instruction::simple(OpCode::Ldstr),
            Instruction::with_token(OpCode::Call, base_ctor),
            Instruction::simple(OpCode::Ret),
        ],
    );

    let mut run = Pipeline::new(GeneratorConfig::default())
        .run(builder.build())
        .unwrap();
    assert_eq!(run.stats().constructor_chains_preserved, 1);
    let module = run.commit().unwrap();

    let body = module.methods.get(ctor).and_then(|m| m.body.as_ref()).unwrap();
    let opcodes: Vec<OpCode> = body.instructions.iter().map(|i| i.opcode).collect();
    assert_eq!(
        opcodes,
        vec![
            OpCode::Ldarg0,
            OpCode::LdcI4,
            OpCode::Ldnull,
            OpCode::Call,
            OpCode::Newobj,
            OpCode::Throw,
        ]
    );
    assert_eq!(body.instructions[3].token(), Some(base_ctor));
    assert!(module.contains(base_ctor));
}

#[test]
fn chain_skips_a_default_constructor_the_mask_removes() {
    let mut builder = ModuleBuilder::library("Acme");
    let e = builder.class("Acme", "E", TypeAttributes::PUBLIC);
    let protected_default = builder.constructor(e, MethodAccessFlags::FAMILY, vec![]);
    let public_ctor = builder.constructor(e, MethodAccessFlags::PUBLIC, vec![TypeSignature::I4]);
    let d = builder.class("Acme", "D", TypeAttributes::PUBLIC);
    builder.extends(d, TypeSignature::Class(e));
    let ctor = builder.constructor(d, MethodAccessFlags::PUBLIC, vec![]);
    builder.set_body(
        ctor,
        vec![
            Instruction::simple(OpCode::Ldarg0),
            Instruction::with_token(OpCode::Call, protected_default),
            Instruction::simple(OpCode::Ret),
        ],
    );

    let mut run = Pipeline::new(GeneratorConfig::public_only())
        .run(builder.build())
        .unwrap();
    assert_eq!(run.state(), PipelineState::Validated);
    let module = run.commit().unwrap();
    assert!(!module.contains(protected_default));

    let body = module.methods.get(ctor).and_then(|m| m.body.as_ref()).unwrap();
    let opcodes: Vec<OpCode> = body.instructions.iter().map(|i| i.opcode).collect();
    assert_eq!(
        opcodes,
        vec![
            OpCode::Ldarg0,
            OpCode::LdcI4,
            OpCode::Call,
            OpCode::Newobj,
            OpCode::Throw,
        ]
    );
    assert_eq!(body.instructions[2].token(), Some(public_ctor));
}

struct Failing(Cell<usize>);

impl TempAllocator for Failing {
    fn allocate(&self, _suffix: &str) -> io::Result<NamedTempFile> {
        self.0.set(self.0.get() + 1);
        Err(io::Error::new(io::ErrorKind::AlreadyExists, "in use"))
    }
}

#[test]
fn three_failed_temp_allocations_stop_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (module, ..) = nested_surface();
    let input = dir.path().join(&module.name);
    ImageProvider.write(&module, &input).unwrap();
    let output = dir.path().join("ref").join("Acme.dll");

    let allocator = Failing(Cell::new(0));
    let generator = ReferenceGenerator::new(GeneratorConfig::default());
    let result = ScopedTempCopy::create(&input, &allocator);
    assert!(matches!(result, Err(Error::RetriesExhausted { attempts: 3, .. })));
    assert_eq!(allocator.0.get(), 3);

    let result = generator
        .with_temp_allocator(Failing(Cell::new(0)))
        .generate(&input, &output);
    assert!(matches!(result, Err(Error::RetriesExhausted { .. })));
    assert!(!output.exists());
    assert!(!dir.path().join("ref").exists());
}

#[test]
fn reducing_twice_changes_nothing() {
    let (module, ..) = nested_surface();
    let pipeline = Pipeline::new(GeneratorConfig::public_only());

    let mut first = pipeline.run(module).unwrap();
    let once = first.commit().unwrap().clone();

    let mut second = pipeline.run(once.clone()).unwrap();
    assert_eq!(second.stats().total_removed(), 0);
    let twice = second.commit().unwrap();
    assert_eq!(twice.types, once.types);
    assert_eq!(twice.methods, once.methods);
    assert_eq!(twice.fields, once.fields);
}

/// One type and one member for every access level, without cross references
fn every_access_level() -> Module {
    let mut builder = ModuleBuilder::library("Levels");
    let type_levels = [
        ("Public", TypeAttributes::PUBLIC),
        ("Internal", TypeAttributes::NOT_PUBLIC),
    ];
    let nested_levels = [
        ("NestedPublic", TypeAttributes::NESTED_PUBLIC),
        ("NestedPrivate", TypeAttributes::NESTED_PRIVATE),
        ("NestedFamily", TypeAttributes::NESTED_FAMILY),
        ("NestedAssembly", TypeAttributes::NESTED_ASSEMBLY),
        ("NestedFamAndAssem", TypeAttributes::NESTED_FAM_AND_ASSEM),
        ("NestedFamOrAssem", TypeAttributes::NESTED_FAM_OR_ASSEM),
    ];
    let member_levels = [
        ("Private", MethodAccessFlags::PRIVATE),
        ("FamAndAssem", MethodAccessFlags::FAM_AND_ASSEM),
        ("Assem", MethodAccessFlags::ASSEM),
        ("Family", MethodAccessFlags::FAMILY),
        ("FamOrAssem", MethodAccessFlags::FAM_OR_ASSEM),
        ("Public", MethodAccessFlags::PUBLIC),
    ];

    for (name, flags) in type_levels {
        let outer = builder.class("Levels", name, flags);
        let mut owners = vec![outer];
        for (nested, nested_flags) in nested_levels {
            owners.push(builder.nested_class(outer, nested, nested_flags));
        }
        for owner in owners {
            for (member, member_flags) in member_levels {
                builder.method(owner, &format!("M{member}"), member_flags.bits());
                builder.field(owner, &format!("f{member}"), member_flags.bits(), TypeSignature::I4);
            }
        }
    }
    builder.build()
}

#[test]
fn survivors_always_fall_inside_the_mask() {
    for bits in 0..16u8 {
        let mask = AccessModifiers::from_bits_truncate(bits);
        for policy in [FoldPolicy::Split, FoldPolicy::Protected, FoldPolicy::Internal] {
            let config = GeneratorConfig {
                fold_policy: policy,
                ..GeneratorConfig::default().with_modifiers(mask)
            };
            let classifier = config.classifier();
            let mut run = Pipeline::new(config).run(every_access_level()).unwrap();
            let module = run.commit().unwrap();

            for token in module.all_types() {
                assert!(
                    classifier.is_type_retained(module, token),
                    "{} survived mask {mask} ({policy})",
                    module.type_name(token)
                );
            }
            for token in module.methods.tokens().into_iter().chain(module.fields.tokens()) {
                assert!(
                    classifier.is_member_retained(module, token),
                    "{} survived mask {mask} ({policy})",
                    module.entity_name(token)
                );
            }
        }
    }
}

#[test]
fn full_mask_keeps_every_declaration() {
    let original = every_access_level();
    let mut run = Pipeline::new(GeneratorConfig::full_surface())
        .run(original.clone())
        .unwrap();
    let module = run.commit().unwrap();
    assert_eq!(module.all_types(), original.all_types());
    assert_eq!(module.methods.len(), original.methods.len());
    assert_eq!(module.fields.len(), original.fields.len());
}

#[test]
fn generator_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let (module, public_a, ..) = nested_surface();
    let input = dir.path().join(&module.name);
    ImageProvider.write(&module, &input).unwrap();
    let before = fs::read(&input).unwrap();

    let output = dir.path().join("out").join("Acme.dll");
    let summary = ReferenceGenerator::new(GeneratorConfig::public_only())
        .with_decompiler(OutlineDecompiler::new(ImageProvider), dir.path().join("outline"))
        .generate(&input, &output)
        .unwrap();

    assert_eq!(fs::read(&input).unwrap(), before);
    let reference = ImageProvider.load(&output).unwrap();
    assert_eq!(reference.types, vec![public_a]);
    assert_eq!(reference.mvid(), summary.mvid);
    assert_ne!(reference.mvid(), module.mvid());
    assert_eq!(summary.outlines.len(), 1);

    let outline = fs::read_to_string(&summary.outlines[0]).unwrap();
    assert!(outline.contains("PublicA"));
    assert!(!outline.contains("PrivateC"));
}
