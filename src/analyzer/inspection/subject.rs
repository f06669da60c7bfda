use crate::analyzer::elements::{ConstElement, PropertyElement};
use crate::analyzer::signature::{FunctionParam, FunctionSignature};
use crate::analyzer::types::{Type, TypeKind};

const PLACEHOLDER: &str = ":subject:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Param,
    Return,
    Property,
    Constant,
}

/// One declaration site with both of its types, collecting the warnings
/// raised for it.
#[derive(Debug, Clone)]
pub struct TypeSubject {
    /// `parameter $x`, `return value`, `property $x`, `NAME constant`.
    pub name: String,
    pub kind: SubjectKind,
    /// Type of the doc tag; `None` when there is no tag.
    pub doc_type: Option<Type>,
    pub fn_type: Type,
    pub value_type: Option<Type>,
    pub doc_line: Option<usize>,
    pub fn_line: usize,
    pub has_doc_block: bool,
    doc_warnings: Vec<String>,
    fn_warnings: Vec<String>,
}

impl TypeSubject {
    pub fn new(name: impl Into<String>, kind: SubjectKind, fn_type: Type, fn_line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            doc_type: None,
            fn_type,
            value_type: None,
            doc_line: None,
            fn_line,
            has_doc_block: false,
            doc_warnings: Vec::new(),
            fn_warnings: Vec::new(),
        }
    }

    /// Attaches the doc tag's type and line.
    pub fn with_tag(mut self, ty: &Type, line: usize) -> Self {
        self.doc_type = Some(ty.clone());
        self.doc_line = Some(line);
        self
    }

    pub fn with_doc_block(mut self, has_doc_block: bool) -> Self {
        self.has_doc_block = has_doc_block;
        self
    }

    /// A parameter whose default is `null` is implicitly nullable.
    pub fn param(param: &FunctionParam) -> Self {
        let fn_type = match &param.default_type {
            Some(Type::Null) if param.fn_type.is_defined() => Type::nullable(param.fn_type.clone()),
            _ => param.fn_type.clone(),
        };

        let mut subject = Self::new(
            format!("parameter ${}", param.name),
            SubjectKind::Param,
            fn_type,
            param.line,
        );
        subject.value_type = param.default_type.clone();
        subject
    }

    pub fn return_value(signature: &FunctionSignature) -> Self {
        Self::new(
            "return value",
            SubjectKind::Return,
            signature.return_type.clone(),
            signature.return_line,
        )
    }

    pub fn property(property: &PropertyElement) -> Self {
        let mut subject = Self::new(
            format!("property ${}", property.name),
            SubjectKind::Property,
            property.fn_type.clone(),
            property.line,
        );
        subject.value_type = property.value_type.clone();
        subject
    }

    /// Constant warnings are all placed on the constant's line.
    pub fn constant(constant: &ConstElement) -> Self {
        let mut subject = Self::new(
            format!("{} constant", constant.name),
            SubjectKind::Constant,
            Type::Undefined,
            constant.line,
        );
        subject.value_type = Some(constant.value_type.clone());
        subject
    }

    pub fn has_doc_tag(&self) -> bool {
        self.doc_type.is_some()
    }

    /// The tag's type, when a tag exists and it names a type.
    pub fn defined_doc_type(&self) -> Option<&Type> {
        self.doc_type.as_ref().filter(|ty| ty.is_defined())
    }

    pub fn doc_contains(&self, kind: TypeKind) -> bool {
        self.doc_type.as_ref().is_some_and(|ty| ty.contains(kind))
    }

    pub fn is_return(&self) -> bool {
        self.kind == SubjectKind::Return
    }

    pub fn add_doc_warning(&mut self, message: impl Into<String>) {
        self.doc_warnings.push(message.into());
    }

    pub fn add_fn_warning(&mut self, message: impl Into<String>) {
        self.fn_warnings.push(message.into());
    }

    pub fn has_warnings(&self) -> bool {
        !self.doc_warnings.is_empty() || !self.fn_warnings.is_empty()
    }

    /// `(line, message)` pairs: signature warnings on the declaration line,
    /// then doc warnings on the tag line.
    pub fn take_warnings(&mut self) -> Vec<(usize, String)> {
        let fn_line = self.fn_line;
        let doc_line = self.doc_line.unwrap_or(fn_line);
        let fn_warnings = std::mem::take(&mut self.fn_warnings);
        let doc_warnings = std::mem::take(&mut self.doc_warnings);

        fn_warnings
            .into_iter()
            .map(|message| (fn_line, message))
            .chain(doc_warnings.into_iter().map(|message| (doc_line, message)))
            .map(|(line, message)| (line, message.replace(PLACEHOLDER, &self.name)))
            .collect()
    }
}
