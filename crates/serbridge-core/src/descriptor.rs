//! Class descriptors: the data contract produced by class discovery.
//!
//! A [`ClassDescriptor`] is a plain, serializable description of one source
//! class. Every type position is carried as text in the type expression
//! grammar and parsed by the resolver once the class's generic scope is known.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{ClassRef, QualifiedName};

/// The kind of a source class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    /// A regular (possibly abstract) class.
    #[default]
    Class,
    /// An interface.
    Interface,
    /// An enum class.
    Enum,
    /// A builtin primitive such as `int`.
    Primitive,
}

bitflags! {
    /// Class modifiers relevant to code generation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        /// Cannot be instantiated directly.
        const ABSTRACT = 1 << 0;
        /// Cannot be subclassed.
        const FINAL = 1 << 1;
    }
}

/// Visibility of a generated member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// A class-level generic parameter and its declared upper bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericParamDecl {
    pub name: String,
    #[serde(default)]
    pub bounds: Vec<String>,
}

/// A serializable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Transient fields are modelled but skipped by the wire protocol.
    #[serde(default)]
    pub transient: bool,
}

/// A method-level generic parameter with its bound expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodGenericDecl {
    pub name: String,
    /// Bound expression, e.g. `? extends java.lang.Number`. Bare names are
    /// treated as an upper bound.
    #[serde(rename = "type")]
    pub ty: String,
}

fn default_return_type() -> String {
    "void".to_string()
}

fn default_true() -> bool {
    true
}

/// A member declaration contributed by the descriptor or by configuration.
///
/// `body` is opaque text; only the type expressions are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<MethodGenericDecl>,
    #[serde(default)]
    pub argument_names: Vec<String>,
    #[serde(default)]
    pub argument_types: Vec<String>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default = "default_true")]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_static: bool,
    /// Tag class for covariant-return overrides.
    #[serde(default)]
    pub covariant_tag: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl MemberDecl {
    /// A virtual, non-const method with no arguments.
    pub fn method(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generics: Vec::new(),
            argument_names: Vec::new(),
            argument_types: Vec::new(),
            return_type: return_type.into(),
            body: None,
            is_const: false,
            is_virtual: true,
            is_static: false,
            covariant_tag: None,
            visibility: Visibility::Public,
            includes: Vec::new(),
            doc: None,
        }
    }

    pub fn arg(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.argument_names.push(name.into());
        self.argument_types.push(ty.into());
        self
    }

    pub fn generic(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.generics.push(MethodGenericDecl {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn non_virtual(mut self) -> Self {
        self.is_virtual = false;
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.covariant_tag = Some(tag.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The structural description of one source class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: QualifiedName,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub generics: Vec<GenericParamDecl>,
    /// Direct super class; `None` means the top type.
    #[serde(default)]
    pub super_class: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub serial_version_uid: Option<i64>,
    #[serde(default)]
    pub enum_constants: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

impl ClassDescriptor {
    /// Describe an empty class of the given kind.
    pub fn new(name: impl Into<QualifiedName>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Modifiers::empty(),
            generics: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            serial_version_uid: None,
            enum_constants: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn class(name: impl Into<QualifiedName>) -> Self {
        Self::new(name, ClassKind::Class)
    }

    pub fn interface(name: impl Into<QualifiedName>) -> Self {
        Self::new(name, ClassKind::Interface)
    }

    pub fn with_generic<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        bounds: impl IntoIterator<Item = S>,
    ) -> Self {
        self.generics.push(GenericParamDecl {
            name: name.into(),
            bounds: bounds.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn extends(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            ty: ty.into(),
            transient: false,
        });
        self
    }

    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Declared generic parameter names, in declaration order.
    pub fn generic_names(&self) -> Vec<String> {
        self.generics.iter().map(|g| g.name.clone()).collect()
    }

    /// The class reference this descriptor registers as.
    pub fn class_ref(&self) -> ClassRef {
        ClassRef::new(self.name.clone(), self.kind, self.generic_names())
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT) || self.kind == ClassKind::Interface
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.contains(Modifiers::FINAL)
    }

    /// All type expressions appearing in the descriptor, with a short label.
    pub fn type_expressions(&self) -> Vec<(String, &str)> {
        let mut exprs = Vec::new();
        for generic in &self.generics {
            for bound in &generic.bounds {
                exprs.push((format!("bound of {}", generic.name), bound.as_str()));
            }
        }
        if let Some(super_class) = &self.super_class {
            exprs.push(("super class".to_string(), super_class.as_str()));
        }
        for interface in &self.interfaces {
            exprs.push(("interface".to_string(), interface.as_str()));
        }
        for field in &self.fields {
            exprs.push((format!("field {}", field.name), field.ty.as_str()));
        }
        for member in &self.members {
            for generic in &member.generics {
                exprs.push((
                    format!("generic {} of {}", generic.name, member.name),
                    generic.ty.as_str(),
                ));
            }
            for (i, ty) in member.argument_types.iter().enumerate() {
                exprs.push((format!("argument {i} of {}", member.name), ty.as_str()));
            }
            exprs.push((format!("return of {}", member.name), member.return_type.as_str()));
            if let Some(tag) = &member.covariant_tag {
                exprs.push((format!("tag of {}", member.name), tag.as_str()));
            }
        }
        exprs
    }
}
