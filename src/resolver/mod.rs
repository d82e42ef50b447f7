//! Per-field resolution.
//!
//! [`FieldResolver::resolve`] is the visit callback a query walker invokes for
//! every field, parent before children. It answers informational leaves from
//! the parent's [`Envelope`] or the [`VisitContext`], performs exactly one store
//! write for fields carrying a mutation directive, and otherwise passes values
//! through so nested selections mirror what was written.

mod context;

pub use context::VisitContext;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::directive::{DirectiveSet, MutationDirective, MutationKind};
use crate::envelope::{Envelope, ResolvedValue};
use crate::error::ResolveResult;

/// Field call arguments.
pub type Arguments = Map<String, Value>;

/// Per-field metadata supplied by the walker.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo<'a> {
    /// Name under which the value lands in the output (alias or field name).
    pub result_key: &'a str,
    /// Directives on this field.
    pub directives: &'a DirectiveSet,
    /// True if the field has no child selections.
    pub is_leaf: bool,
}

impl<'a> FieldInfo<'a> {
    /// Metadata for a leaf field.
    #[must_use]
    pub const fn leaf(result_key: &'a str, directives: &'a DirectiveSet) -> Self {
        Self {
            result_key,
            directives,
            is_leaf: true,
        }
    }

    /// Metadata for a field with child selections.
    #[must_use]
    pub const fn branch(result_key: &'a str, directives: &'a DirectiveSet) -> Self {
        Self {
            result_key,
            directives,
            is_leaf: false,
        }
    }
}

/// Decision taken for one visit. Variants are listed in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule<'a> {
    PushKey,
    Key,
    TypeName,
    ReadBack,
    Mutate(&'a MutationDirective),
    Narrow(&'a str),
    PassThrough,
}

impl Rule<'_> {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::PushKey => "push_key",
            Self::Key => "key",
            Self::TypeName => "typename",
            Self::ReadBack => "read_back",
            Self::Mutate(_) => "mutate",
            Self::Narrow(_) => "narrow",
            Self::PassThrough => "pass_through",
        }
    }
}

/// Directive-driven field resolver.
#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    config: ResolverConfig,
}

impl FieldResolver {
    /// Create a resolver with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with an explicit configuration.
    #[must_use]
    pub const fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn classify<'a>(&self, root: &ResolvedValue, info: &FieldInfo<'a>) -> Rule<'a> {
        let directives = info.directives;
        if info.is_leaf {
            if directives.has_push_key() {
                return Rule::PushKey;
            }
            if directives.has_key() {
                return Rule::Key;
            }
            if info.result_key == self.config.typename_field {
                return Rule::TypeName;
            }
            if root.payload().is_some() {
                return Rule::ReadBack;
            }
        }
        if let Some(mutation) = directives.mutation() {
            return Rule::Mutate(mutation);
        }
        if !info.is_leaf && root.payload().is_some() {
            if let Some(type_name) = directives.type_name() {
                return Rule::Narrow(type_name);
            }
        }
        Rule::PassThrough
    }

    fn input(&self, args: &Arguments) -> Value {
        args.get(&self.config.input_argument)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Resolve one field visit.
    ///
    /// `root` is the value the parent visit returned ([`ResolvedValue::Null`]
    /// at the top level).
    ///
    /// # Errors
    /// - `Path` if a templated mutation path cannot be bound from `args`
    /// - `Store` carrying the store's failure unchanged
    pub async fn resolve(
        &self,
        field_name: &str,
        root: &ResolvedValue,
        args: &Arguments,
        ctx: &mut VisitContext,
        info: &FieldInfo<'_>,
    ) -> ResolveResult<ResolvedValue> {
        let rule = self.classify(root, info);
        debug!(field = field_name, result_key = info.result_key, rule = rule.as_str(), "resolve");

        let value = match rule {
            Rule::PushKey => ResolvedValue::string(root.generated_key()),
            Rule::Key => ResolvedValue::string(ctx.last_key()),
            Rule::TypeName => {
                ResolvedValue::string(info.directives.type_name().or_else(|| root.type_tag()))
            }
            Rule::ReadBack => match root.as_envelope() {
                Some(envelope) => ResolvedValue::scalar(envelope.slice(info.result_key)),
                None => ResolvedValue::Null,
            },
            Rule::Mutate(mutation) => self.mutate(mutation, args, ctx, info.directives).await?,
            Rule::Narrow(type_name) => {
                let payload = root
                    .as_envelope()
                    .map_or(Value::Null, |e| e.slice(info.result_key));
                Envelope::new(payload)
                    .with_type_tag(Some(type_name.to_string()))
                    .into()
            }
            Rule::PassThrough => ResolvedValue::scalar(self.input(args)),
        };
        Ok(value)
    }

    async fn mutate(
        &self,
        mutation: &MutationDirective,
        args: &Arguments,
        ctx: &mut VisitContext,
        directives: &DirectiveSet,
    ) -> ResolveResult<ResolvedValue> {
        let payload = self.input(args);
        let path = mutation.path.resolve(args, &self.config.input_argument)?;
        let type_tag = directives
            .type_name()
            .map(str::to_string)
            .or_else(|| mutation.type_name.clone());

        ctx.record_path(path.clone());
        let store = ctx.store();

        let envelope = match mutation.kind {
            MutationKind::Update => {
                store.update(&path, payload.clone()).await?;
                Envelope::new(payload).with_type_tag(type_tag)
            }
            MutationKind::Set => {
                store.set(&path, payload.clone()).await?;
                Envelope::new(payload).with_type_tag(type_tag)
            }
            MutationKind::Remove => {
                store.remove(&path).await?;
                Envelope::empty()
            }
            MutationKind::Push => {
                let pushed = store.push(&path).await?;
                store.set(&pushed.path(), payload.clone()).await?;
                Envelope::new(payload)
                    .with_generated_key(pushed.key())
                    .with_type_tag(type_tag)
            }
        };

        info!(op = mutation.kind.directive_name(), path = %path, "store write committed");
        Ok(envelope.into())
    }
}
