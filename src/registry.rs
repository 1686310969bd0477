//! Declarative resource registry.
//!
//! Every content type is described by a [`ResourceSpec`]: its field table,
//! supported methods, uniqueness invariant, and sort rule. The generic
//! handlers consume these specs instead of hand-written per-resource code.

use axum::http::Method;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArray,
    Bool,
    Int,
    Object,
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::TextArray => "an array of strings",
            FieldKind::Bool => "a boolean",
            FieldKind::Int => "an integer",
            FieldKind::Object => "an object",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::TextArray => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Int => value.as_i64().is_some(),
            FieldKind::Object => value.is_object(),
        }
    }

    fn empty_value(&self) -> Value {
        match self {
            FieldKind::Text => Value::String(String::new()),
            FieldKind::TextArray => Value::Array(Vec::new()),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Int => Value::from(0),
            FieldKind::Object => Value::Object(Map::new()),
        }
    }
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<&'static str>,
    pub allowed: Option<&'static [&'static str]>,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false, default: None, allowed: None }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    /// Value substituted when the field is omitted on create.
    pub fn default_value(&self) -> Value {
        match self.default {
            Some(text) => Value::String(text.to_string()),
            None => self.kind.empty_value(),
        }
    }
}

/// Sort rule applied to collection reads.
#[derive(Debug, Clone, Copy)]
pub enum Ordering {
    /// Newest first by insertion timestamp
    CreatedAtDesc,
    /// Descending over document fields, in table order
    FieldsDesc(&'static [SortField]),
}

#[derive(Debug, Clone, Copy)]
pub struct SortField {
    pub name: &'static str,
    /// Compare as a number rather than text
    pub numeric: bool,
}

#[derive(Debug)]
pub struct ResourceSpec {
    /// Route segment and table name ("skills" serves /api/skills)
    pub name: &'static str,
    /// Singular label used in client-facing messages
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
    pub methods: &'static [Method],
    /// Field pair that must be unique across documents
    pub unique_key: Option<(&'static str, &'static str)>,
    pub ordering: Ordering,
    /// Query parameters honored as equality filters on GET
    pub filterable: &'static [&'static str],
    /// At most one document; GET creates the default lazily
    pub singleton: bool,
    /// POST acknowledged but deliberately unimplemented
    pub create_stubbed: bool,
}

impl ResourceSpec {
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Value for the Allow header on the collection path.
    pub fn allow_header(&self) -> String {
        self.methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Mutating methods reachable on the item path.
    pub fn item_methods(&self) -> Vec<&'static Method> {
        [&Method::PUT, &Method::DELETE]
            .into_iter()
            .filter(|m| self.allows(m))
            .collect()
    }

    pub fn item_allow_header(&self) -> String {
        self.item_methods()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

pub const CATEGORY_TYPES: &[&str] = &["skill", "project", "service"];
pub const SKILL_LEVELS: &[&str] = &["Beginner", "Intermediate", "Advanced", "Expert"];
pub const JOURNEY_TYPES: &[&str] = &["work", "education"];

const ALL_METHODS: &[Method] = &[Method::GET, Method::POST, Method::PUT, Method::DELETE];

pub static RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        name: "about",
        label: "about",
        fields: &[
            FieldSpec::new("title", FieldKind::Text).default("About Me"),
            FieldSpec::new("subtitle", FieldKind::Text),
            FieldSpec::new("content", FieldKind::Text),
            FieldSpec::new("contactInfo", FieldKind::Object),
        ],
        methods: &[Method::GET, Method::POST, Method::PUT],
        unique_key: None,
        ordering: Ordering::CreatedAtDesc,
        filterable: &[],
        singleton: true,
        create_stubbed: false,
    },
    ResourceSpec {
        name: "categories",
        label: "category",
        fields: &[
            FieldSpec::new("name", FieldKind::Text).required(),
            FieldSpec::new("type", FieldKind::Text).required().one_of(CATEGORY_TYPES),
            FieldSpec::new("color", FieldKind::Text).default("#6366F1"),
            FieldSpec::new("icon", FieldKind::Text),
        ],
        methods: ALL_METHODS,
        unique_key: Some(("name", "type")),
        ordering: Ordering::CreatedAtDesc,
        filterable: &["type"],
        singleton: false,
        create_stubbed: false,
    },
    ResourceSpec {
        name: "skills",
        label: "skill",
        fields: &[
            FieldSpec::new("name", FieldKind::Text).required(),
            FieldSpec::new("icon", FieldKind::Text),
            FieldSpec::new("category", FieldKind::Text).required(),
            FieldSpec::new("level", FieldKind::Text)
                .default("Intermediate")
                .one_of(SKILL_LEVELS),
        ],
        methods: ALL_METHODS,
        unique_key: Some(("name", "category")),
        ordering: Ordering::CreatedAtDesc,
        filterable: &[],
        singleton: false,
        create_stubbed: false,
    },
    ResourceSpec {
        name: "services",
        label: "service",
        fields: &[
            FieldSpec::new("title", FieldKind::Text).required(),
            FieldSpec::new("description", FieldKind::Text).required(),
            FieldSpec::new("icon", FieldKind::Text),
            FieldSpec::new("price", FieldKind::Text),
            FieldSpec::new("features", FieldKind::TextArray),
        ],
        methods: ALL_METHODS,
        unique_key: None,
        ordering: Ordering::CreatedAtDesc,
        filterable: &[],
        singleton: false,
        create_stubbed: false,
    },
    ResourceSpec {
        name: "projects",
        label: "project",
        fields: &[
            FieldSpec::new("title", FieldKind::Text).required(),
            FieldSpec::new("description", FieldKind::Text).required(),
            FieldSpec::new("images", FieldKind::TextArray),
            FieldSpec::new("technologies", FieldKind::TextArray),
            FieldSpec::new("category", FieldKind::Text),
            FieldSpec::new("liveUrl", FieldKind::Text),
            FieldSpec::new("githubUrl", FieldKind::Text),
            FieldSpec::new("featured", FieldKind::Bool),
        ],
        methods: ALL_METHODS,
        unique_key: None,
        ordering: Ordering::CreatedAtDesc,
        filterable: &[],
        singleton: false,
        create_stubbed: false,
    },
    ResourceSpec {
        name: "journey",
        label: "journey entry",
        fields: &[
            FieldSpec::new("title", FieldKind::Text).required(),
            FieldSpec::new("company", FieldKind::Text).required(),
            FieldSpec::new("location", FieldKind::Text),
            FieldSpec::new("year", FieldKind::Text).required(),
            FieldSpec::new("period", FieldKind::Text),
            FieldSpec::new("description", FieldKind::Text),
            FieldSpec::new("achievements", FieldKind::TextArray),
            FieldSpec::new("technologies", FieldKind::TextArray),
            FieldSpec::new("type", FieldKind::Text).default("work").one_of(JOURNEY_TYPES),
            FieldSpec::new("order", FieldKind::Int),
        ],
        methods: ALL_METHODS,
        unique_key: None,
        ordering: Ordering::FieldsDesc(&[
            SortField { name: "year", numeric: false },
            SortField { name: "order", numeric: true },
        ]),
        filterable: &[],
        singleton: false,
        create_stubbed: false,
    },
    ResourceSpec {
        name: "certifications",
        label: "certification",
        fields: &[
            FieldSpec::new("title", FieldKind::Text).required(),
            FieldSpec::new("issuer", FieldKind::Text).required(),
            FieldSpec::new("date", FieldKind::Text),
            FieldSpec::new("credentialId", FieldKind::Text),
            FieldSpec::new("verificationUrl", FieldKind::Text),
            FieldSpec::new("image", FieldKind::Text),
        ],
        methods: &[Method::GET, Method::POST],
        unique_key: None,
        ordering: Ordering::FieldsDesc(&[SortField { name: "date", numeric: false }]),
        filterable: &[],
        singleton: false,
        create_stubbed: true,
    },
];

static BY_NAME: Lazy<HashMap<&'static str, &'static ResourceSpec>> =
    Lazy::new(|| RESOURCES.iter().map(|spec| (spec.name, spec)).collect());

pub fn find(name: &str) -> Option<&'static ResourceSpec> {
    BY_NAME.get(name).copied()
}

/// Validation failures for request payloads
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("request body must be a JSON object")]
    ExpectedObject,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("field '{field}' must be {expected}")]
    WrongKind { field: &'static str, expected: &'static str },
    #[error("field '{field}' must be one of: {allowed}")]
    NotAllowed { field: &'static str, allowed: String },
}

/// Keep only declared fields. System fields (id, createdAt, updatedAt) and
/// anything the schema does not know about are dropped, not rejected.
pub fn sanitize(spec: &ResourceSpec, body: Map<String, Value>) -> Map<String, Value> {
    body.into_iter()
        .filter(|(key, _)| spec.field(key).is_some())
        .collect()
}

/// Validate a sanitized create payload: required fields present and
/// non-empty, every present field of the declared kind and allowed set.
pub fn validate_create(spec: &ResourceSpec, input: &Map<String, Value>) -> Result<(), SchemaError> {
    for field in spec.fields {
        match input.get(field.name) {
            Some(value) => check_field(field, value)?,
            None if field.required => return Err(SchemaError::MissingField(field.name)),
            None => {}
        }
    }
    Ok(())
}

/// Validate a sanitized update payload: only the fields named in the body
/// are checked; omitted fields keep their stored values.
pub fn validate_update(spec: &ResourceSpec, input: &Map<String, Value>) -> Result<(), SchemaError> {
    for field in spec.fields {
        if let Some(value) = input.get(field.name) {
            check_field(field, value)?;
        }
    }
    Ok(())
}

fn check_field(field: &FieldSpec, value: &Value) -> Result<(), SchemaError> {
    if !field.kind.matches(value) {
        return Err(SchemaError::WrongKind {
            field: field.name,
            expected: field.kind.expected(),
        });
    }

    if field.required {
        if let Some(text) = value.as_str() {
            if text.trim().is_empty() {
                return Err(SchemaError::EmptyField(field.name));
            }
        }
    }

    if let Some(allowed) = field.allowed {
        let ok = value.as_str().map(|v| allowed.contains(&v)).unwrap_or(false);
        if !ok {
            return Err(SchemaError::NotAllowed {
                field: field.name,
                allowed: allowed.join(", "),
            });
        }
    }

    Ok(())
}

/// Fill omitted fields with their declared defaults.
pub fn apply_defaults(spec: &ResourceSpec, mut input: Map<String, Value>) -> Map<String, Value> {
    for field in spec.fields {
        if !input.contains_key(field.name) {
            input.insert(field.name.to_string(), field.default_value());
        }
    }
    input
}
