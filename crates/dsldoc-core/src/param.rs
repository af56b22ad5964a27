//! Parameter descriptions and the parameter tree.
//!
//! A parameter may own nested parameters through its validator (hash and
//! array-of-hash). Children hold a shared link to their parent's name so
//! `full_name` can be computed without a back pointer into the tree.

use crate::decl::{ParamDecl, ParamKind, ValidatorSpec};
use crate::error::{Error, Result};
use crate::group::Scope;
use crate::query::DocContext;
use crate::validator::{BoxedValidator, BuildRequest, Deferred, ExpectedKind, Validator};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Name and visibility of an enclosing parameter.
#[derive(Debug)]
pub struct ParentLink {
    name: String,
    show: bool,
    parent: Option<Arc<ParentLink>>,
}

impl ParentLink {
    pub fn new(name: impl Into<String>, show: bool, parent: Option<Arc<ParentLink>>) -> Self {
        Self {
            name: name.into(),
            show,
            parent,
        }
    }
}

#[derive(Debug)]
pub enum ValidatorSlot {
    Ready(BoxedValidator),
    Deferred(Deferred),
    Unconstrained,
}

#[derive(Debug)]
pub struct ParameterDescription {
    name: String,
    description: String,
    kind: ParamKind,
    default: Option<Value>,
    metadata: Option<Value>,
    show: bool,
    schema: Option<Value>,
    missing_message: Option<String>,
    parent: Option<Arc<ParentLink>>,
    validator: ValidatorSlot,
}

impl ParameterDescription {
    /// Build from a declaration. The scope supplies the engine, the group
    /// store, and the enclosing parameter (if any).
    pub fn build(decl: &ParamDecl, scope: &Scope<'_>) -> Result<Self> {
        let show = decl.show.unwrap_or(true);
        let parent = scope.parent().cloned();
        let validator = match decl.effective_validator() {
            None => ValidatorSlot::Unconstrained,
            Some(ValidatorSpec::Lazy(_)) => ValidatorSlot::Deferred(Deferred::new(
                Arc::clone(scope.engine()),
                decl.name.clone(),
                decl.clone(),
            )),
            Some(spec) => {
                let link = Arc::new(ParentLink::new(decl.name.clone(), show, parent.clone()));
                let child = scope.child(link);
                let req = BuildRequest {
                    engine: scope.engine(),
                    spec: &spec,
                    decl,
                    scope: Some(&child),
                };
                ValidatorSlot::Ready(scope.engine().find(&req)?)
            }
        };
        let description = decl
            .desc
            .as_deref()
            .map(|text| scope.markup().to_html(text))
            .unwrap_or_default();

        Ok(Self {
            name: decl.name.clone(),
            description,
            kind: decl.kind,
            default: decl.default.clone(),
            metadata: decl.meta.clone(),
            show,
            schema: decl.schema.clone(),
            missing_message: decl.missing_message.clone(),
            parent,
            validator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.kind == ParamKind::Required
    }

    pub fn show(&self) -> bool {
        self.show
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn missing_message(&self) -> Option<&str> {
        self.missing_message.as_deref()
    }

    /// Nesting path, e.g. `user[address][city]`. Hidden ancestors are left
    /// out; a fully hidden chain falls back to the bare name.
    pub fn full_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut link = self.parent.as_deref();
        while let Some(current) = link {
            if current.show {
                parts.push(&current.name);
            }
            link = current.parent.as_deref();
        }
        parts.reverse();
        if self.show {
            parts.push(&self.name);
        }
        match parts.split_first() {
            None => self.name.clone(),
            Some((head, rest)) => {
                let mut name = head.to_string();
                for part in rest {
                    name.push('[');
                    name.push_str(part);
                    name.push(']');
                }
                name
            }
        }
    }

    /// Current validator. A deferred one is resolved on the way.
    pub fn validator(&self) -> Option<&dyn Validator> {
        match &self.validator {
            ValidatorSlot::Ready(v) => Some(v.as_ref()),
            ValidatorSlot::Deferred(d) => d.resolve(),
            ValidatorSlot::Unconstrained => None,
        }
    }

    pub fn sub_params(&self) -> &[ParameterDescription] {
        self.validator()
            .and_then(|v| v.sub_params())
            .unwrap_or_default()
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        match &self.validator {
            ValidatorSlot::Ready(v) => v.check(&self.full_name(), value),
            ValidatorSlot::Deferred(d) => d.check(&self.full_name(), value),
            ValidatorSlot::Unconstrained => Ok(()),
        }
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        match &self.validator {
            ValidatorSlot::Ready(v) => v.validate(value),
            ValidatorSlot::Deferred(d) => d.validate(value),
            ValidatorSlot::Unconstrained => true,
        }
    }

    /// Fold a same-named description into this one. Only the validators
    /// combine; every other attribute of `self` wins.
    pub fn merge_with(&mut self, other: ParameterDescription) -> Result<()> {
        let mine = std::mem::replace(&mut self.validator, ValidatorSlot::Unconstrained);
        self.validator = match (mine, other.validator) {
            (slot, ValidatorSlot::Unconstrained) => slot,
            (ValidatorSlot::Unconstrained, slot) => slot,
            (ValidatorSlot::Ready(mut left), ValidatorSlot::Ready(right)) => {
                left.merge_with(right)?;
                ValidatorSlot::Ready(left)
            }
            (ValidatorSlot::Deferred(left), ValidatorSlot::Deferred(right)) => {
                if left.type_name() != right.type_name() {
                    return Err(Error::IncompatibleMerge {
                        left: format!("deferred ({})", left.type_name()),
                        right: format!("deferred ({})", right.type_name()),
                    });
                }
                ValidatorSlot::Deferred(left)
            }
            (ValidatorSlot::Ready(mut ready), ValidatorSlot::Deferred(deferred)) => {
                ready.merge_with(settle(deferred)?)?;
                ValidatorSlot::Ready(ready)
            }
            (ValidatorSlot::Deferred(deferred), ValidatorSlot::Ready(ready)) => {
                let mut settled = settle(deferred)?;
                settled.merge_with(ready)?;
                ValidatorSlot::Ready(settled)
            }
        };
        Ok(())
    }

    /// Collapse same-named entries, keeping first-seen order.
    pub fn unify(params: Vec<ParameterDescription>) -> Result<Vec<ParameterDescription>> {
        let mut out: Vec<ParameterDescription> = Vec::with_capacity(params.len());
        for param in params {
            match out.iter_mut().find(|p| p.name == param.name) {
                Some(existing) => existing.merge_with(param)?,
                None => out.push(param),
            }
        }
        Ok(out)
    }

    /// Merge `source` into `target` in place: names already in `target` are
    /// merged, the rest are appended in their original order.
    pub fn merge(target: &mut Vec<ParameterDescription>, source: Vec<ParameterDescription>) -> Result<()> {
        let (to_merge, to_add): (Vec<_>, Vec<_>) = source
            .into_iter()
            .partition(|s| target.iter().any(|t| t.name == s.name));
        for param in to_merge {
            if let Some(existing) = target.iter_mut().find(|t| t.name == param.name) {
                existing.merge_with(param)?;
            }
        }
        target.extend(to_add);
        Ok(())
    }

    /// Whether the parameter shows up in docs: anything with a validator,
    /// resolved or not.
    pub fn is_documented(&self) -> bool {
        !matches!(self.validator, ValidatorSlot::Unconstrained)
    }

    /// Fails with `UnresolvedType` when a deferred type is still unknown.
    pub(crate) fn docs(&self, cx: &DocContext<'_>) -> Result<ParamDoc> {
        let validator = match &self.validator {
            ValidatorSlot::Deferred(d) => Some(d.resolve().ok_or_else(|| Error::UnresolvedType {
                param: self.full_name(),
                type_name: d.type_name().to_string(),
            })?),
            _ => self.validator(),
        };
        let default = match self.kind {
            ParamKind::Required => None,
            _ => Some(self.default.clone().unwrap_or(Value::Null)),
        };
        let params = match validator.and_then(|v| v.sub_params()) {
            Some(subs) => Some(subs.iter().map(|p| p.docs(cx)).collect::<Result<Vec<_>>>()?),
            None => None,
        };
        Ok(ParamDoc {
            name: self.name.clone(),
            full_name: self.full_name(),
            description: cx.translate(&self.description),
            kind: self.kind,
            default,
            validator_description: validator.map(|v| v.description()).unwrap_or_default(),
            expected_kind: validator.map(|v| v.expected_kind()),
            metadata: self.metadata.clone(),
            show: self.show,
            schema: match self.kind {
                ParamKind::Block => Some(self.schema.clone().unwrap_or(Value::Null)),
                _ => None,
            },
            params,
        })
    }
}

fn settle(deferred: Deferred) -> Result<BoxedValidator> {
    deferred.into_resolved().ok_or_else(|| Error::IncompatibleMerge {
        left: "resolved validator".to_string(),
        right: "unresolvable deferred validator".to_string(),
    })
}

/// Serialized form of one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamDoc {
    pub name: String,
    pub full_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub validator_description: String,
    pub expected_kind: Option<ExpectedKind>,
    pub metadata: Option<Value>,
    pub show: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<ParamDoc>>,
}
