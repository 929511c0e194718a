//! Declaration nodes as produced by the type-checking front end.
//!
//! A declaration is kept as a flat list of [`Segment`]s: verbatim text, the slot
//! where the declaration's own binding name goes, and reference slots for every
//! identifier that resolves to another symbol. Later stages only ever substitute
//! the contents of those slots; the surrounding type syntax is never touched.

mod template;

use serde::{Deserialize, Serialize};

pub use template::TemplateError;

/// Closed set of top-level declaration kinds found in declaration artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Class,
    Interface,
    Function,
    TypeAlias,
    Enum,
    Namespace,
    Variable,
    /// `declare global { ... }` or `declare module "x" { ... }`.
    ModuleAugmentation,
}

impl DeclarationKind {
    /// Kinds that must carry the `declare` modifier at the top level of a
    /// declaration file.
    pub fn needs_declare_keyword(&self) -> bool {
        match self {
            Self::Class
            | Self::Function
            | Self::Enum
            | Self::Namespace
            | Self::Variable
            | Self::ModuleAugmentation => true,
            Self::Interface | Self::TypeAlias => false,
        }
    }
}

/// Why a declaration references another symbol.
///
/// Every kind is followed identically by reachability and rewriting; the tag is
/// kept for diagnostics and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Plain type reference (`x: Foo`).
    Type,
    /// `extends` / `implements` clause of a class or interface.
    Heritage,
    /// Generic parameter constraint or default (`<T extends Foo = Bar>`).
    Constraint,
    /// Computed property or index key (`[KEY]: string`).
    ComputedKey,
    /// `typeof x` query.
    TypeQuery,
    /// Qualified access through a namespace (`ns.Member`).
    NamespaceMember,
}

/// An identifier occurrence that points at another symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Root identifier as written in the module (`ns` in `ns.Member`).
    pub name: String,
    /// Member path after the root, rendered verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifier: Vec<String>,
    pub kind: ReferenceKind,
}

impl Reference {
    pub fn new(name: impl Into<String>, kind: ReferenceKind) -> Self {
        Self {
            name: name.into(),
            qualifier: Vec::new(),
            kind,
        }
    }

    pub fn qualified<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            qualifier: members.into_iter().map(Into::into).collect(),
            kind: ReferenceKind::NamespaceMember,
        }
    }

    /// Render the reference with `root` substituted for the root identifier.
    pub fn render_with(&self, root: &str) -> String {
        let mut out = String::from(root);
        for member in &self.qualifier {
            out.push('.');
            out.push_str(member);
        }
        out
    }
}

/// One piece of a declaration's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Text(String),
    /// The declaration's own binding name.
    Name,
    Ref(Reference),
}

/// A top-level declaration node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    /// Binding name. `None` for an anonymous `export default` declaration.
    /// For module augmentations this holds the augmented target (`global` or the
    /// quoted module specifier).
    pub name: Option<String>,
    pub segments: Vec<Segment>,
    /// Leading documentation comment, verbatim including delimiters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Symbol-table key used for anonymous default declarations. `default` is a
/// reserved word, so it never clashes with a real binding.
pub(crate) const ANONYMOUS_DEFAULT_KEY: &str = "default";

impl Declaration {
    pub fn builder(kind: DeclarationKind, name: Option<&str>) -> DeclarationBuilder {
        DeclarationBuilder {
            declaration: Self {
                kind,
                name: name.map(str::to_string),
                segments: Vec::new(),
                doc: None,
            },
        }
    }

    /// Build a declaration from template notation.
    ///
    /// `%` marks the declaration's own name and `@Ident` (optionally dotted) marks
    /// a reference; `%%` and `@@` produce literal characters.
    ///
    /// ```
    /// use fob_dts::{Declaration, DeclarationKind};
    ///
    /// let decl = Declaration::from_template(
    ///     DeclarationKind::Interface,
    ///     Some("Props"),
    ///     "interface % extends @Base { size: @Size; }",
    /// )?;
    /// assert_eq!(decl.references().count(), 2);
    /// # Ok::<(), fob_dts::TemplateError>(())
    /// ```
    pub fn from_template(
        kind: DeclarationKind,
        name: Option<&str>,
        template: &str,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            kind,
            name: name.map(str::to_string),
            segments: template::parse(template)?,
            doc: None,
        })
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Ref(reference) => Some(reference),
            _ => None,
        })
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self.kind, DeclarationKind::ModuleAugmentation)
    }

    /// Local name under which this declaration is registered in the symbol table.
    pub fn binding_key(&self) -> String {
        match (&self.kind, &self.name) {
            (DeclarationKind::ModuleAugmentation, Some(target)) => format!("declare {target}"),
            (DeclarationKind::ModuleAugmentation, None) => "declare global".to_string(),
            (_, Some(name)) => name.clone(),
            (_, None) => ANONYMOUS_DEFAULT_KEY.to_string(),
        }
    }
}

/// Builder for [`Declaration`] when segments are produced programmatically.
pub struct DeclarationBuilder {
    declaration: Declaration,
}

impl DeclarationBuilder {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if let Some(Segment::Text(last)) = self.declaration.segments.last_mut() {
            last.push_str(&text);
        } else {
            self.declaration.segments.push(Segment::Text(text));
        }
        self
    }

    pub fn name(mut self) -> Self {
        self.declaration.segments.push(Segment::Name);
        self
    }

    pub fn reference(mut self, name: impl Into<String>, kind: ReferenceKind) -> Self {
        self.declaration
            .segments
            .push(Segment::Ref(Reference::new(name, kind)));
        self
    }

    pub fn qualified_reference<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declaration
            .segments
            .push(Segment::Ref(Reference::qualified(name, members)));
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.declaration.doc = Some(doc.into());
        self
    }

    pub fn build(self) -> Declaration {
        self.declaration
    }
}
