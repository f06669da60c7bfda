use std::collections::BTreeMap;

use crate::analyzer::types::Type;

/// @param tag
#[derive(Debug, Clone, PartialEq)]
pub struct ParamTag {
    pub line: usize,
    pub ty: Type,
    /// Parameter name without `$`.
    pub name: String,
    pub description: Option<String>,
}

/// @return tag
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTag {
    pub line: usize,
    pub ty: Type,
    pub description: Option<String>,
}

/// @var tag
#[derive(Debug, Clone, PartialEq)]
pub struct VarTag {
    pub line: usize,
    pub ty: Type,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Any other tag, kept with its raw content.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericTag {
    pub line: usize,
    /// Lowercased, without `@`.
    pub name: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocTag {
    Param(ParamTag),
    Return(ReturnTag),
    Var(VarTag),
    Generic(GenericTag),
}

impl DocTag {
    pub fn name(&self) -> &str {
        match self {
            DocTag::Param(_) => "param",
            DocTag::Return(_) => "return",
            DocTag::Var(_) => "var",
            DocTag::Generic(tag) => &tag.name,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            DocTag::Param(tag) => tag.line,
            DocTag::Return(tag) => tag.line,
            DocTag::Var(tag) => tag.line,
            DocTag::Generic(tag) => tag.line,
        }
    }

    /// Type carried by the tag, if it is a typed tag.
    pub fn ty(&self) -> Option<&Type> {
        match self {
            DocTag::Param(tag) => Some(&tag.ty),
            DocTag::Return(tag) => Some(&tag.ty),
            DocTag::Var(tag) => Some(&tag.ty),
            DocTag::Generic(_) => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            DocTag::Param(tag) => tag.description.as_deref(),
            DocTag::Return(tag) => tag.description.as_deref(),
            DocTag::Var(tag) => tag.description.as_deref(),
            DocTag::Generic(tag) => tag.content.as_deref(),
        }
    }
}

/// A parsed doc comment. [`DocBlock::undefined`] stands for "no comment at
/// all", which is different from a comment without tags.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocBlock {
    description: BTreeMap<usize, String>,
    tags: Vec<DocTag>,
    defined: bool,
}

impl DocBlock {
    pub fn new(description: BTreeMap<usize, String>, tags: Vec<DocTag>) -> Self {
        Self {
            description,
            tags,
            defined: true,
        }
    }

    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn is_undefined(&self) -> bool {
        !self.defined
    }

    pub fn tags(&self) -> &[DocTag] {
        &self.tags
    }

    /// Description lines keyed by source line, in line order.
    pub fn description_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.description
            .iter()
            .map(|(line, text)| (*line, text.as_str()))
    }

    pub fn has_description(&self) -> bool {
        self.description.values().any(|text| !text.trim().is_empty())
    }

    pub fn description(&self) -> String {
        self.description
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.name().eq_ignore_ascii_case(name))
    }

    pub fn tags_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DocTag> {
        self.tags
            .iter()
            .filter(move |tag| tag.name().eq_ignore_ascii_case(name))
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(DocTag::name).collect()
    }

    pub fn param_tags(&self) -> impl Iterator<Item = &ParamTag> {
        self.tags.iter().filter_map(|tag| match tag {
            DocTag::Param(param) => Some(param),
            _ => None,
        })
    }

    pub fn param_tag(&self, name: &str) -> Option<&ParamTag> {
        self.param_tags().find(|param| param.name == name)
    }

    pub fn return_tag(&self) -> Option<&ReturnTag> {
        self.tags.iter().find_map(|tag| match tag {
            DocTag::Return(tag) => Some(tag),
            _ => None,
        })
    }

    pub fn var_tag(&self) -> Option<&VarTag> {
        self.tags.iter().find_map(|tag| match tag {
            DocTag::Var(tag) => Some(tag),
            _ => None,
        })
    }
}
