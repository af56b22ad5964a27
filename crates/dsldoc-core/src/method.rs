//! Method descriptions.

use crate::class::ClassDescription;
use crate::decl::{ExampleDecl, MethodDecl, MethodUpdate, ParamKind, RaiseDecl, SeeDecl};
use crate::error::{Error, Result};
use crate::group::Scope;
use crate::param::{ParamDoc, ParameterDescription};
use crate::query::DocContext;
use crate::returns::{ReturnDescription, ReturnDoc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionDescription {
    pub error: String,
    pub description: Option<String>,
    pub metadata: Option<Value>,
}

impl From<&RaiseDecl> for ExceptionDescription {
    fn from(decl: &RaiseDecl) -> Self {
        Self {
            error: decl.error.clone(),
            description: decl.desc.clone(),
            metadata: decl.meta.clone(),
        }
    }
}

/// Cross-reference to another method, resolved when docs are produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SeeDescription {
    pub link: String,
    pub description: Option<String>,
    /// Class the link is relative to.
    pub scope: Option<String>,
}

impl From<&SeeDecl> for SeeDescription {
    fn from(decl: &SeeDecl) -> Self {
        Self {
            link: decl.link.clone(),
            // a bare link describes itself
            description: decl.desc.clone().or_else(|| Some(decl.link.clone())),
            scope: decl.scope.clone(),
        }
    }
}

#[derive(Debug)]
pub struct MethodDescription {
    name: String,
    class_name: String,
    class_id: String,
    version: String,
    short_description: String,
    full_description: String,
    deprecated: bool,
    show: bool,
    metadata: Option<Value>,
    tags: Vec<String>,
    params: Vec<ParameterDescription>,
    returns: ReturnDescription,
    raises: Vec<ExceptionDescription>,
    see: Vec<SeeDescription>,
    examples: Vec<ExampleDecl>,
    aliases: Vec<String>,
    signature: Option<Vec<String>>,
}

impl MethodDescription {
    pub fn build(owner: &ClassDescription, decl: &MethodDecl, scope: &Scope<'_>) -> Result<Self> {
        let id = format!("{}#{}", owner.id(), decl.name);
        if decl.returns.len() > 1 {
            return Err(Error::DuplicateReturn { method: id });
        }
        let params = ParameterDescription::unify(scope.evaluate(&decl.params)?)?;
        check_single_block(&id, &params)?;
        let returns = match decl.returns.first() {
            Some(ret) => ReturnDescription::build(ret, scope)?,
            None => ReturnDescription::object(),
        };
        let markup = scope.markup();

        Ok(Self {
            name: decl.name.clone(),
            class_name: owner.class_name().to_string(),
            class_id: owner.id().to_string(),
            version: owner.version().to_string(),
            short_description: decl.short_description.clone().unwrap_or_default(),
            full_description: decl
                .description
                .as_deref()
                .map(|text| markup.to_html(text))
                .unwrap_or_default(),
            deprecated: decl.deprecated.unwrap_or(false),
            show: decl.show.unwrap_or(true),
            metadata: decl.meta.clone(),
            tags: decl.tags.clone(),
            params,
            returns,
            raises: decl.raises.iter().map(ExceptionDescription::from).collect(),
            see: decl.see.iter().map(SeeDescription::from).collect(),
            examples: decl.examples.clone(),
            aliases: decl.aliases.clone(),
            signature: decl.signature.clone(),
        })
    }

    /// Apply an extension block to an already built method. Descriptions
    /// and flags are overridden when given, raises are appended and
    /// parameters merged.
    pub fn update(&mut self, update: &MethodUpdate, scope: &Scope<'_>) -> Result<()> {
        let params = scope.evaluate(&update.params)?;
        ParameterDescription::merge(&mut self.params, params)?;
        check_single_block(&self.id(), &self.params)?;
        if let Some(short) = &update.short_description {
            self.short_description = short.clone();
        }
        if let Some(text) = &update.description {
            self.full_description = scope.markup().to_html(text);
        }
        if let Some(meta) = &update.meta {
            match (&mut self.metadata, meta) {
                (Some(Value::Object(current)), Value::Object(extra)) => {
                    current.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                (current, _) => *current = Some(meta.clone()),
            }
        }
        if let Some(show) = update.show {
            self.show = show;
        }
        self.raises
            .extend(update.raises.iter().map(ExceptionDescription::from));
        Ok(())
    }

    pub fn id(&self) -> String {
        format!("{}#{}", self.class_id, self.name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn full_description(&self) -> &str {
        &self.full_description
    }

    pub fn show(&self) -> bool {
        self.show
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    pub fn params(&self) -> &[ParameterDescription] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParameterDescription> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// Parameters that carry a validator; only those are documented.
    pub fn param_descriptions(&self) -> impl Iterator<Item = &ParameterDescription> {
        self.params.iter().filter(|p| p.is_documented())
    }

    pub fn returns(&self) -> &ReturnDescription {
        &self.returns
    }

    pub fn raises(&self) -> &[ExceptionDescription] {
        &self.raises
    }

    pub fn see(&self) -> &[SeeDescription] {
        &self.see
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub(crate) fn doc_url(&self, cx: &DocContext<'_>) -> String {
        let mut crumbs: Vec<&str> = Vec::new();
        if cx.config().version_in_url {
            crumbs.push(&self.version);
        }
        crumbs.push(&self.class_id);
        crumbs.push(&self.name);
        cx.full_url(&crumbs.join("/")).replace('?', "%3F")
    }

    pub(crate) fn docs(&self, cx: &DocContext<'_>) -> Result<MethodDoc> {
        let id = self.id();
        let see = self
            .see
            .iter()
            .map(|see| {
                let target = cx
                    .registry()
                    .resolve_see(&self.version, &self.class_id, &id, see)?;
                Ok(SeeDoc {
                    link: target.doc_url(cx),
                    description: see.description.as_deref().map(|d| cx.translate(d)),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodDoc {
            doc_url: self.doc_url(cx),
            name: self.name.clone(),
            full_description: cx.translate(&self.full_description),
            short_description: cx.translate(&self.short_description),
            deprecated: self.deprecated,
            params: self
                .param_descriptions()
                .map(|p| p.docs(cx))
                .collect::<Result<_>>()?,
            raises: self.raises.clone(),
            returns: self.returns.docs(cx, &id)?,
            metadata: self.metadata.clone(),
            see,
            show: self.show,
            examples: self.examples.clone(),
            aliases: self.aliases.clone(),
            signature: self.signature.clone(),
            tags: cx
                .registry()
                .method_tags(&self.version, &self.class_name, &self.tags),
        })
    }
}

fn check_single_block(method: &str, params: &[ParameterDescription]) -> Result<()> {
    let mut blocks = params.iter().filter(|p| p.kind() == ParamKind::Block);
    if let (Some(first), Some(second)) = (blocks.next(), blocks.next()) {
        return Err(Error::DuplicateBlock {
            method: method.to_string(),
            first: first.name().to_string(),
            second: second.name().to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct SeeDoc {
    pub link: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDoc {
    pub doc_url: String,
    pub name: String,
    pub full_description: String,
    pub short_description: String,
    pub deprecated: bool,
    pub params: Vec<ParamDoc>,
    pub raises: Vec<ExceptionDescription>,
    pub returns: ReturnDoc,
    pub metadata: Option<Value>,
    pub see: Vec<SeeDoc>,
    pub show: bool,
    pub examples: Vec<ExampleDecl>,
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<String>>,
    pub tags: Vec<String>,
}
