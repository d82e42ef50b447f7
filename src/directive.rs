//! Directives attached to query fields.
//!
//! The walker hands over directives as a mapping from name to parameters.
//! [`DirectiveSet::from_map`] classifies that mapping once into a closed set of
//! typed variants; the resolver then dispatches on variants only.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DirectiveError;
use crate::path::PathTemplate;

/// Name of the type-tag override directive.
pub const TYPE: &str = "type";
/// Name of the directive requesting an ancestor's generated key.
pub const PUSH_KEY: &str = "pushKey";
/// Name of the directive requesting the trailing segment of the last mutation path.
pub const KEY: &str = "key";

/// Store operation requested by a mutation directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Partial merge-write (`@rtdbUpdate`).
    Update,
    /// Full overwrite (`@rtdbSet`).
    Set,
    /// Subtree delete (`@rtdbRemove`).
    Remove,
    /// Append under a generated key (`@rtdbPush`).
    Push,
}

impl MutationKind {
    /// All mutation kinds.
    pub const ALL: [Self; 4] = [Self::Update, Self::Set, Self::Remove, Self::Push];

    /// Directive name as written in queries.
    #[must_use]
    pub const fn directive_name(self) -> &'static str {
        match self {
            Self::Update => "rtdbUpdate",
            Self::Set => "rtdbSet",
            Self::Remove => "rtdbRemove",
            Self::Push => "rtdbPush",
        }
    }

    /// Look up a kind by directive name.
    #[must_use]
    pub fn from_directive_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.directive_name() == name)
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.directive_name())
    }
}

/// A mutation directive with its typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationDirective {
    /// Store operation.
    pub kind: MutationKind,
    /// Target path, possibly templated.
    pub path: PathTemplate,
    /// Declared type tag for the written value.
    pub type_name: Option<String>,
}

impl MutationDirective {
    /// Create a mutation directive targeting `path`.
    ///
    /// # Errors
    /// `InvalidParameters` if the path template cannot be parsed.
    pub fn new(kind: MutationKind, path: &str) -> Result<Self, DirectiveError> {
        let path = PathTemplate::parse(path).map_err(|e| DirectiveError::InvalidParameters {
            directive: kind.directive_name().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            kind,
            path,
            type_name: None,
        })
    }

    /// Attach a declared type tag.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

/// One recognized directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `@type(name: ..)`: explicit type-tag override.
    Type {
        /// Declared type name.
        name: String,
    },
    /// `@pushKey`: surface the generated key of an ancestor push.
    PushKey,
    /// `@key`: surface the trailing segment of the last mutation path.
    Key,
    /// `@rtdbUpdate` / `@rtdbSet` / `@rtdbRemove` / `@rtdbPush`.
    Mutation(MutationDirective),
    /// Any directive this resolver does not act on (e.g. `@client`).
    Other {
        /// Directive name.
        name: String,
    },
}

impl Directive {
    /// Shorthand for a `@type` directive.
    #[must_use]
    pub fn type_tag(name: impl Into<String>) -> Self {
        Self::Type { name: name.into() }
    }

    /// Name as written in queries.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Type { .. } => TYPE,
            Self::PushKey => PUSH_KEY,
            Self::Key => KEY,
            Self::Mutation(m) => m.kind.directive_name(),
            Self::Other { name } => name,
        }
    }

    /// Classify one raw `(name, parameters)` entry.
    ///
    /// # Errors
    /// - `MissingParameter` if a required parameter is absent
    /// - `InvalidParameters` if parameters have the wrong shape
    pub fn from_raw(name: &str, params: &Value) -> Result<Self, DirectiveError> {
        if let Some(kind) = MutationKind::from_directive_name(name) {
            let raw: RawMutationParams = parse_params(name, params)?;
            let path = raw.path.ok_or_else(|| DirectiveError::MissingParameter {
                directive: name.to_string(),
                parameter: "ref".to_string(),
            })?;
            let mut directive = MutationDirective::new(kind, &path)?;
            directive.type_name = raw.type_name;
            return Ok(Self::Mutation(directive));
        }

        match name {
            TYPE => {
                let raw: RawTypeParams = parse_params(name, params)?;
                let name = raw.name.ok_or_else(|| DirectiveError::MissingParameter {
                    directive: TYPE.to_string(),
                    parameter: "name".to_string(),
                })?;
                Ok(Self::Type { name })
            }
            PUSH_KEY => Ok(Self::PushKey),
            KEY => Ok(Self::Key),
            other => Ok(Self::Other {
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMutationParams {
    #[serde(rename = "ref")]
    path: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTypeParams {
    name: Option<String>,
}

fn parse_params<T>(directive: &str, params: &Value) -> Result<T, DirectiveError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if params.is_null() {
        return Ok(T::default());
    }
    T::deserialize(params).map_err(|e| DirectiveError::InvalidParameters {
        directive: directive.to_string(),
        message: e.to_string(),
    })
}

/// The directives attached to one field, in declaration order.
///
/// Holds at most one mutation directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet {
    directives: Vec<Directive>,
}

impl DirectiveSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a raw `name -> parameters` mapping.
    ///
    /// # Errors
    /// Any [`Directive::from_raw`] error, or `ConflictingMutations` when two
    /// mutation directives are present.
    pub fn from_map(raw: &Map<String, Value>) -> Result<Self, DirectiveError> {
        let mut set = Self::new();
        for (name, params) in raw {
            set.insert(Directive::from_raw(name, params)?)?;
        }
        Ok(set)
    }

    /// Add a directive, keeping the single-mutation invariant.
    ///
    /// # Errors
    /// `ConflictingMutations` if a mutation directive is already present.
    pub fn insert(&mut self, directive: Directive) -> Result<(), DirectiveError> {
        if let (Directive::Mutation(new), Some(existing)) = (&directive, self.mutation()) {
            return Err(DirectiveError::ConflictingMutations {
                first: existing.kind.directive_name().to_string(),
                second: new.kind.directive_name().to_string(),
            });
        }
        self.directives.push(directive);
        Ok(())
    }

    /// Builder form of [`Self::insert`].
    ///
    /// # Errors
    /// `ConflictingMutations` if a mutation directive is already present.
    pub fn with(mut self, directive: Directive) -> Result<Self, DirectiveError> {
        self.insert(directive)?;
        Ok(self)
    }

    /// Declared `@type` name, if any. The first one wins.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.directives.iter().find_map(|d| match d {
            Directive::Type { name } => Some(name.as_str()),
            _ => None,
        })
    }

    /// True if `@pushKey` is present.
    #[must_use]
    pub fn has_push_key(&self) -> bool {
        self.directives.iter().any(|d| matches!(d, Directive::PushKey))
    }

    /// True if `@key` is present.
    #[must_use]
    pub fn has_key(&self) -> bool {
        self.directives.iter().any(|d| matches!(d, Directive::Key))
    }

    /// The mutation directive, if any.
    #[must_use]
    pub fn mutation(&self) -> Option<&MutationDirective> {
        self.directives.iter().find_map(|d| match d {
            Directive::Mutation(m) => Some(m),
            _ => None,
        })
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.directives.iter()
    }

    /// Number of directives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// True if no directives are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

impl<'a> IntoIterator for &'a DirectiveSet {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
