//! Human-readable outlines of a committed reference module.
//!
//! The [`Decompiler`] runs after the reference image has been written. It is a
//! convenience for reviewing the surface that survived; a failure is reported but never
//! undoes the commit.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    file::{ImageProvider, ModuleProvider},
    model::{Module, Property, Token, TypeAttributes},
    visibility::MemberAccess,
    Error, Result,
};

const TARGET: &str = "refasm::decompiler";
const INDENT: &str = "    ";

/// Turns a written module into source-like files
pub trait Decompiler {
    /// Decompiles the module at `module_path` into `output_dir`, returning the files written.
    ///
    /// # Errors
    /// Returns an error if the module cannot be loaded or a file cannot be written.
    fn decompile(&self, module_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Writes one C#-like declaration outline per top-level type, `<Namespace>.<Name>.cs`
#[derive(Debug, Clone, Default)]
pub struct OutlineDecompiler<P: ModuleProvider = ImageProvider> {
    provider: P,
}

impl<P: ModuleProvider> OutlineDecompiler<P> {
    /// Creates a decompiler loading modules through `provider`
    pub fn new(provider: P) -> Self {
        OutlineDecompiler { provider }
    }
}

impl<P: ModuleProvider> Decompiler for OutlineDecompiler<P> {
    fn decompile(&self, module_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let module = self.provider.load(module_path)?;
        fs::create_dir_all(output_dir)?;

        let mut written = Vec::with_capacity(module.types.len());
        for token in &module.types {
            let Some(def) = module.type_defs.get(*token) else {
                continue;
            };
            let text = outline(&module, *token)?;
            let path = output_dir.join(format!("{}.cs", def.qualified_name()));
            fs::write(&path, text)?;
            debug!(target: TARGET, "wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// The outline of one top-level type, wrapped in its namespace
///
/// # Errors
/// Returns [`Error::TokenNotFound`] if `token` is not a live type.
pub fn outline(module: &Module, token: Token) -> Result<String> {
    let def = module
        .type_defs
        .get(token)
        .ok_or(Error::TokenNotFound(token))?;

    let mut out = format!("// {} reference outline\n", module.name);
    if def.namespace.is_empty() {
        write_type(module, token, 0, &mut out)?;
    } else {
        writeln!(out, "namespace {}\n{{", def.namespace).map_err(fmt_error)?;
        write_type(module, token, 1, &mut out)?;
        out.push_str("}\n");
    }
    Ok(out)
}

fn fmt_error(error: std::fmt::Error) -> Error {
    Error::Decompile(error.to_string())
}

fn keyword(access: MemberAccess) -> &'static str {
    match access {
        MemberAccess::Public => "public",
        MemberAccess::Family => "protected",
        MemberAccess::Assembly => "internal",
        MemberAccess::FamOrAssem => "protected internal",
        MemberAccess::FamAndAssem => "private protected",
        MemberAccess::Private | MemberAccess::CompilerControlled => "private",
    }
}

fn write_type(module: &Module, token: Token, depth: usize, out: &mut String) -> Result<()> {
    let def = module
        .type_defs
        .get(token)
        .ok_or(Error::TokenNotFound(token))?;
    let pad = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);

    let kind = if def.is_interface() {
        "interface"
    } else if module.is_enum(token) {
        "enum"
    } else if def.flags & TypeAttributes::SEALED != 0 && def.flags & TypeAttributes::ABSTRACT != 0
    {
        "static class"
    } else if def.flags & TypeAttributes::ABSTRACT != 0 {
        "abstract class"
    } else if def.flags & TypeAttributes::SEALED != 0 {
        "sealed class"
    } else {
        "class"
    };

    let mut bases: Vec<String> = Vec::new();
    if let Some(base) = &def.extends {
        let name = module.signature_name(base);
        if name != "System.Object" && !module.is_enum(token) {
            bases.push(name);
        }
    }
    bases.extend(def.interfaces.iter().map(|i| module.signature_name(i)));
    let generics = if def.generic_params.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = def.generic_params.iter().map(|p| p.name.as_str()).collect();
        format!("<{}>", names.join(", "))
    };

    let w = |out: &mut String, line: String| {
        out.push_str(&line);
        out.push('\n');
    };
    let access = keyword(MemberAccess::from_type_flags(def.flags));
    if bases.is_empty() {
        w(out, format!("{pad}{access} {kind} {}{generics}", def.name));
    } else {
        w(
            out,
            format!("{pad}{access} {kind} {}{generics} : {}", def.name, bases.join(", ")),
        );
    }
    w(out, format!("{pad}{{"));

    for field in def
        .fields
        .iter()
        .filter_map(|f| module.fields.get(*f))
        .filter(|f| f.name != "value__")
    {
        let mut modifiers = keyword(MemberAccess::from_member_flags(field.flags)).to_string();
        if field.is_literal() {
            modifiers.push_str(" const");
        } else if field.is_static() {
            modifiers.push_str(" static");
        }
        w(
            out,
            format!(
                "{inner}{modifiers} {} {};",
                module.signature_name(&field.signature),
                field.name
            ),
        );
    }

    for property in def.properties.iter().filter_map(|p| module.properties.get(*p)) {
        w(out, format!("{inner}{}", property_line(module, property)));
    }

    let accessors: Vec<Token> = def
        .properties
        .iter()
        .filter_map(|p| module.properties.get(*p))
        .flat_map(|p| [p.getter, p.setter])
        .flatten()
        .collect();
    for method_token in def.methods.iter().filter(|m| !accessors.contains(m)) {
        let Some(method) = module.methods.get(*method_token) else {
            continue;
        };
        if method.name == ".cctor" {
            continue;
        }
        let mut modifiers = keyword(MemberAccess::from_member_flags(method.flags)).to_string();
        if method.is_static() {
            modifiers.push_str(" static");
        } else if method.is_abstract() && !def.is_interface() {
            modifiers.push_str(" abstract");
        }
        let params: Vec<String> = method
            .signature
            .params
            .iter()
            .zip(&method.params)
            .map(|(sig, param)| format!("{} {}", module.signature_name(sig), param.name))
            .collect();
        let line = if method.is_constructor() {
            format!("{inner}{modifiers} {}({});", def.name, params.join(", "))
        } else {
            format!(
                "{inner}{modifiers} {} {}({});",
                module.signature_name(&method.signature.return_type),
                method.name,
                params.join(", ")
            )
        };
        w(out, line);
    }

    for nested in &def.nested_types {
        write_type(module, *nested, depth + 1, out)?;
    }
    w(out, format!("{pad}}}"));
    Ok(())
}

fn property_line(module: &Module, property: &Property) -> String {
    let access_of = |accessor: Option<Token>| {
        accessor
            .and_then(|a| module.methods.get(a))
            .map(|m| MemberAccess::from_member_flags(m.flags))
    };
    let access = [access_of(property.getter), access_of(property.setter)]
        .into_iter()
        .flatten()
        .max_by_key(|access| *access as u8)
        .unwrap_or(MemberAccess::Private);
    let mut accessors = Vec::new();
    if property.getter.is_some() {
        accessors.push("get;");
    }
    if property.setter.is_some() {
        accessors.push("set;");
    }
    format!(
        "{} {} {} {{ {} }}",
        keyword(access),
        module.signature_name(&property.signature.return_type),
        property.name,
        accessors.join(" ")
    )
}
