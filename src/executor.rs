//! Reference query walker.
//!
//! Real deployments plug [`FieldResolver`] into their own GraphQL executor.
//! [`Executor`] is a minimal depth-first walker over an already-parsed
//! [`Selection`] tree: it visits parents before children, threads one
//! [`VisitContext`] through a single execution, and assembles the result
//! object in the shape of the selection.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ResolverConfig;
use crate::directive::{Directive, DirectiveSet};
use crate::envelope::ResolvedValue;
use crate::error::{DirectiveError, ResolveError, ResolveResult};
use crate::resolver::{Arguments, FieldInfo, FieldResolver, VisitContext};
use crate::storage::TreeStore;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One field of a parsed query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Field name.
    pub name: String,
    /// Output alias.
    pub alias: Option<String>,
    /// Call arguments, already bound to variable values.
    pub arguments: Arguments,
    /// Field directives.
    pub directives: DirectiveSet,
    /// Child selections; empty for leaves.
    pub selections: Vec<Selection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSelection {
    name: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    arguments: Map<String, Value>,
    #[serde(default)]
    directives: Map<String, Value>,
    #[serde(default)]
    selections: Vec<RawSelection>,
}

impl TryFrom<RawSelection> for Selection {
    type Error = DirectiveError;

    fn try_from(raw: RawSelection) -> Result<Self, Self::Error> {
        Ok(Self {
            name: raw.name,
            alias: raw.alias,
            arguments: raw.arguments,
            directives: DirectiveSet::from_map(&raw.directives)?,
            selections: raw
                .selections
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl Selection {
    /// A field with no arguments, directives or children.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the output alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add an argument.
    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    /// Attach a directive.
    ///
    /// # Errors
    /// `ConflictingMutations` if a second mutation directive is attached.
    pub fn directive(mut self, directive: Directive) -> Result<Self, DirectiveError> {
        self.directives.insert(directive)?;
        Ok(self)
    }

    /// Add a child selection.
    #[must_use]
    pub fn select(mut self, child: Self) -> Self {
        self.selections.push(child);
        self
    }

    /// Output key: the alias if set, else the field name.
    #[must_use]
    pub fn result_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// True if there are no child selections.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.selections.is_empty()
    }

    /// Build a selection from its JSON description:
    /// `{"name", "alias"?, "arguments"?, "directives"?, "selections"?}`.
    ///
    /// # Errors
    /// - `InvalidSelection` if the JSON does not have that shape
    /// - `Directive` if a directive mapping is malformed
    pub fn from_json(value: &Value) -> ResolveResult<Self> {
        let raw = RawSelection::deserialize(value).map_err(|e| ResolveError::InvalidSelection {
            message: e.to_string(),
        })?;
        Ok(Self::try_from(raw)?)
    }

    /// Build a list of selections from a JSON array.
    ///
    /// # Errors
    /// As [`Self::from_json`], plus `InvalidSelection` if `value` is not an array.
    pub fn list_from_json(value: &Value) -> ResolveResult<Vec<Self>> {
        let items = value.as_array().ok_or_else(|| ResolveError::InvalidSelection {
            message: "expected an array of selections".to_string(),
        })?;
        items.iter().map(Self::from_json).collect()
    }
}

/// Depth-first executor driving a [`FieldResolver`].
#[derive(Clone)]
pub struct Executor {
    resolver: FieldResolver,
    store: Arc<dyn TreeStore>,
}

impl Executor {
    /// Create an executor writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self {
            resolver: FieldResolver::new(),
            store,
        }
    }

    /// Replace the resolver configuration.
    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.resolver = FieldResolver::with_config(config);
        self
    }

    /// The resolver used for every visit.
    #[must_use]
    pub const fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    /// Execute a top-level selection set with a fresh [`VisitContext`].
    ///
    /// # Errors
    /// The first error raised by any visit; later fields are not visited.
    pub async fn execute(&self, selections: &[Selection]) -> ResolveResult<Value> {
        let mut ctx = VisitContext::new(Arc::clone(&self.store));
        debug!(fields = selections.len(), "execute");
        self.resolve_set(selections, &ResolvedValue::Null, &mut ctx).await
    }

    fn resolve_set<'a>(
        &'a self,
        selections: &'a [Selection],
        root: &'a ResolvedValue,
        ctx: &'a mut VisitContext,
    ) -> BoxFuture<'a, ResolveResult<Value>> {
        Box::pin(async move {
            let mut out = Map::with_capacity(selections.len());
            for selection in selections {
                let info = FieldInfo {
                    result_key: selection.result_key(),
                    directives: &selection.directives,
                    is_leaf: selection.is_leaf(),
                };
                let value = self
                    .resolver
                    .resolve(&selection.name, root, &selection.arguments, ctx, &info)
                    .await?;

                let json = if selection.is_leaf() {
                    value.to_json()
                } else {
                    match value {
                        ResolvedValue::Null => Value::Null,
                        ResolvedValue::Scalar(Value::Array(items)) => {
                            let mut list = Vec::with_capacity(items.len());
                            for item in items {
                                let item = ResolvedValue::scalar(item);
                                list.push(if item.is_null() {
                                    Value::Null
                                } else {
                                    self.resolve_set(&selection.selections, &item, ctx).await?
                                });
                            }
                            Value::Array(list)
                        }
                        ResolvedValue::Scalar(scalar) if !scalar.is_object() => scalar,
                        nested => self.resolve_set(&selection.selections, &nested, ctx).await?,
                    }
                };
                out.insert(selection.result_key().to_string(), json);
            }
            Ok(Value::Object(out))
        })
    }
}
