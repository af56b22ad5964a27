//! Return descriptions.

use crate::decl::{ArrayItems, GroupRef, ReturnDecl};
use crate::error::{Error, Result};
use crate::group::{GroupKind, Scope};
use crate::param::{ParamDoc, ParameterDescription};
use crate::query::DocContext;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReturnShape {
    ObjectOf(String),
    ArrayOf(ArrayItems),
    OneOf(Vec<Value>),
    ParamGroup(String),
}

impl ReturnShape {
    pub fn tag(&self) -> &'static str {
        match self {
            ReturnShape::ObjectOf(_) => "object_of",
            ReturnShape::ArrayOf(_) => "array_of",
            ReturnShape::OneOf(_) => "one_of",
            ReturnShape::ParamGroup(_) => "param_group",
        }
    }

    /// Class name shown in docs.
    pub fn return_class(&self) -> &str {
        match self {
            ReturnShape::ObjectOf(name) => name,
            ReturnShape::ArrayOf(_) => "Array",
            ReturnShape::OneOf(_) | ReturnShape::ParamGroup(_) => "Object",
        }
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnShape::ObjectOf(name) => write!(f, "object_of {name}"),
            ReturnShape::ArrayOf(items) => write!(f, "array_of {items}"),
            ReturnShape::OneOf(values) => write!(f, "one_of {}", Value::Array(values.clone())),
            ReturnShape::ParamGroup(name) => write!(f, "param_group {name}"),
        }
    }
}

#[derive(Debug)]
pub struct ReturnDescription {
    shape: ReturnShape,
    description: String,
    /// Inline block or expanded group.
    params: Vec<ParameterDescription>,
}

impl ReturnDescription {
    /// What a method without a `returns` entry returns.
    pub fn object() -> Self {
        Self {
            shape: ReturnShape::ObjectOf("Object".to_string()),
            description: String::new(),
            params: Vec::new(),
        }
    }

    pub fn build(decl: &ReturnDecl, scope: &Scope<'_>) -> Result<Self> {
        let mut given: Vec<(&'static str, ReturnShape)> = Vec::new();
        if let Some(name) = &decl.object_of {
            given.push(("object_of", ReturnShape::ObjectOf(name.clone())));
        }
        if let Some(items) = &decl.array_of {
            given.push(("array_of", ReturnShape::ArrayOf(items.clone())));
        }
        if let Some(values) = &decl.one_of {
            given.push(("one_of", ReturnShape::OneOf(values.clone())));
        }
        if let Some(name) = &decl.param_group {
            given.push(("param_group", ReturnShape::ParamGroup(name.clone())));
        }
        if given.len() > 1 {
            return Err(Error::ReturnShapeConflict {
                shapes: given.iter().map(|(tag, _)| *tag).collect(),
            });
        }
        let shape = given
            .pop()
            .map(|(_, shape)| shape)
            .unwrap_or_else(|| ReturnShape::ObjectOf("Object".to_string()));

        let params = match (&shape, &decl.params) {
            (ReturnShape::ObjectOf(name), Some(block)) if name == "Hash" => {
                ParameterDescription::unify(scope.evaluate(block)?)?
            }
            (_, Some(_)) => {
                return Err(Error::ReturnBlockRequiresHash {
                    found: shape.to_string(),
                })
            }
            (ReturnShape::ParamGroup(name), None) => scope.expand(
                GroupKind::Param,
                &GroupRef {
                    name: name.clone(),
                    scope: decl.scope.clone(),
                },
            )?,
            _ => Vec::new(),
        };

        Ok(Self {
            shape,
            description: decl
                .desc
                .as_deref()
                .map(|text| scope.markup().to_html(text))
                .unwrap_or_default(),
            params,
        })
    }

    pub fn shape(&self) -> &ReturnShape {
        &self.shape
    }

    pub fn params(&self) -> &[ParameterDescription] {
        &self.params
    }

    /// `from` names the owning method in reference errors.
    pub(crate) fn docs(&self, cx: &DocContext<'_>, from: &str) -> Result<ReturnDoc> {
        let data = match &self.shape {
            ReturnShape::OneOf(values) => ReturnData::Raw(Value::Array(values.clone())),
            ReturnShape::ParamGroup(_) => params_data(cx, &self.params)?,
            ReturnShape::ObjectOf(_) if !self.params.is_empty() => params_data(cx, &self.params)?,
            ReturnShape::ObjectOf(name) => match cx.registry().find_class(cx.version(), name) {
                // documented class: its properties describe the object
                Some(class) => params_data(cx, class.properties())?,
                None => {
                    ensure_known(cx, name, from)?;
                    ReturnData::Raw(Value::Null)
                }
            },
            ReturnShape::ArrayOf(ArrayItems::Type(name)) => {
                if cx.registry().find_class(cx.version(), name).is_none() {
                    ensure_known(cx, name, from)?;
                }
                ReturnData::Raw(Value::String(name.clone()))
            }
            ReturnShape::ArrayOf(ArrayItems::Values(values)) => {
                ReturnData::Raw(Value::Array(values.clone()))
            }
        };
        Ok(ReturnDoc {
            description: cx.translate(&self.description),
            object: ReturnObjectDoc {
                meta: self.shape.tag(),
                class: self.shape.return_class().to_string(),
                data,
            },
        })
    }
}

fn ensure_known(cx: &DocContext<'_>, name: &str, from: &str) -> Result<()> {
    if cx.registry().engine().resolve_type(name).is_some() {
        Ok(())
    } else {
        Err(Error::UnresolvedReference {
            from: from.to_string(),
            link: name.to_string(),
        })
    }
}

fn params_data(cx: &DocContext<'_>, params: &[ParameterDescription]) -> Result<ReturnData> {
    if params.is_empty() {
        Ok(ReturnData::Raw(Value::Null))
    } else {
        Ok(ReturnData::Params(
            params.iter().map(|p| p.docs(cx)).collect::<Result<_>>()?,
        ))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnDoc {
    pub description: String,
    pub object: ReturnObjectDoc,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnObjectDoc {
    pub meta: &'static str,
    pub class: String,
    pub data: ReturnData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReturnData {
    Params(Vec<ParamDoc>),
    Raw(Value),
}
