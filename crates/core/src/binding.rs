//! Binding registry model
//!
//! A server declares what it can do as a list of [`ResourceBinding`]s plus
//! server-level [`MethodBinding`]s. The registry is plain data: it can be built
//! in code or loaded from a JSON document.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::capability::{SystemRestfulInteraction, TypeRestfulInteraction};
use crate::catalog::ResourceCatalog;
use crate::error::FhirError;

/// REST operations a method binding can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestOperationType {
    Read,
    Vread,
    Update,
    Patch,
    Delete,
    HistoryInstance,
    HistoryType,
    HistorySystem,
    Create,
    SearchType,
    SearchSystem,
    Transaction,
    Batch,
    Validate,
    Metadata,
    ExtendedOperationServer,
    ExtendedOperationType,
    ExtendedOperationInstance,
}

impl RestOperationType {
    /// The resource-level interaction advertised for this operation, if any
    pub fn type_interaction(self) -> Option<TypeRestfulInteraction> {
        match self {
            RestOperationType::Read => Some(TypeRestfulInteraction::Read),
            RestOperationType::Vread => Some(TypeRestfulInteraction::Vread),
            RestOperationType::Update => Some(TypeRestfulInteraction::Update),
            RestOperationType::Patch => Some(TypeRestfulInteraction::Patch),
            RestOperationType::Delete => Some(TypeRestfulInteraction::Delete),
            RestOperationType::HistoryInstance => Some(TypeRestfulInteraction::HistoryInstance),
            RestOperationType::HistoryType => Some(TypeRestfulInteraction::HistoryType),
            RestOperationType::Create => Some(TypeRestfulInteraction::Create),
            RestOperationType::SearchType => Some(TypeRestfulInteraction::SearchType),
            _ => None,
        }
    }

    /// The server-level interaction advertised for this operation, if any
    pub fn system_interaction(self) -> Option<SystemRestfulInteraction> {
        match self {
            RestOperationType::Transaction => Some(SystemRestfulInteraction::Transaction),
            RestOperationType::Batch => Some(SystemRestfulInteraction::Batch),
            RestOperationType::HistorySystem => Some(SystemRestfulInteraction::HistorySystem),
            RestOperationType::SearchSystem => Some(SystemRestfulInteraction::SearchSystem),
            _ => None,
        }
    }
}

/// Search parameter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchParamType {
    Number,
    Date,
    String,
    Token,
    Reference,
    Composite,
    Quantity,
    Uri,
    Special,
}

/// A plain interaction (read, create, transaction, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionBinding {
    pub interaction: RestOperationType,
    #[serde(default)]
    pub supports_conditional: bool,
}

/// A parameter accepted by a search method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameter {
    /// Parameter name, optionally chained (`subject.name`)
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub param_type: Option<SearchParamType>,
    #[serde(default)]
    pub required: bool,
    /// Resource types a reference parameter may point to
    #[serde(default)]
    pub targets: Vec<String>,
}

impl SearchParameter {
    pub fn new(name: impl Into<String>, param_type: SearchParamType) -> Self {
        Self {
            name: name.into(),
            description: None,
            param_type: Some(param_type),
            required: false,
            targets: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Split a chained name into `(name, chain)` at the first `.`
    pub fn split_chain(&self) -> (&str, Option<&str>) {
        match self.name.split_once('.') {
            Some((name, chain)) => (name, Some(chain).filter(|c| !c.trim().is_empty())),
            None => (self.name.as_str(), None),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMethodBinding {
    #[serde(default)]
    pub description: Option<String>,
    /// `_include` values this search accepts
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<SearchParameter>,
}

/// An input or output parameter of an extended operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationParameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: Option<String>,
    #[serde(default)]
    pub min: u32,
    /// Maximum cardinality; `None` is unbounded
    #[serde(default = "default_max")]
    pub max: Option<u32>,
}

fn default_max() -> Option<u32> {
    Some(1)
}

impl OperationParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: None,
            min: 0,
            max: default_max(),
        }
    }

    pub fn of_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = Some(param_type.into());
        self
    }

    pub fn cardinality(mut self, min: u32, max: Option<u32>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Maximum cardinality as written in an OperationDefinition
    pub fn max_code(&self) -> String {
        match self.max {
            Some(max) => max.to_string(),
            None => "*".to_string(),
        }
    }
}

/// An extended operation (`$everything`, `$validate`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMethodBinding {
    /// Operation name including the leading `$`
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub idempotent: bool,
    #[serde(default)]
    pub instance: bool,
    #[serde(default, rename = "type")]
    pub type_level: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub parameters: Vec<OperationParameter>,
    #[serde(default)]
    pub return_params: Vec<OperationParameter>,
}

impl OperationMethodBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            idempotent: false,
            instance: false,
            type_level: false,
            system: false,
            parameters: Vec::new(),
            return_params: Vec::new(),
        }
    }

    /// Operation name without the leading `$`
    pub fn operation_name(&self) -> &str {
        self.name.strip_prefix('$').unwrap_or(&self.name)
    }
}

/// A single method registered on the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MethodBinding {
    Interaction(InteractionBinding),
    Search(SearchMethodBinding),
    Operation(OperationMethodBinding),
}

impl MethodBinding {
    pub fn interaction(interaction: RestOperationType) -> Self {
        MethodBinding::Interaction(InteractionBinding {
            interaction,
            supports_conditional: false,
        })
    }

    pub fn conditional(interaction: RestOperationType) -> Self {
        MethodBinding::Interaction(InteractionBinding {
            interaction,
            supports_conditional: true,
        })
    }

    /// The REST operation this binding serves.
    ///
    /// Searches are type-level when registered against a resource and
    /// system-level otherwise.
    pub fn rest_operation(&self, resource_level: bool) -> RestOperationType {
        match self {
            MethodBinding::Interaction(binding) => binding.interaction,
            MethodBinding::Search(_) if resource_level => RestOperationType::SearchType,
            MethodBinding::Search(_) => RestOperationType::SearchSystem,
            MethodBinding::Operation(op) if op.instance => {
                RestOperationType::ExtendedOperationInstance
            }
            MethodBinding::Operation(op) if op.type_level => RestOperationType::ExtendedOperationType,
            MethodBinding::Operation(_) => RestOperationType::ExtendedOperationServer,
        }
    }

    pub fn supports_conditional(&self) -> bool {
        matches!(
            self,
            MethodBinding::Interaction(InteractionBinding {
                supports_conditional: true,
                ..
            })
        )
    }
}

/// All methods registered for one resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBinding {
    pub resource: String,
    /// Profile override; relative values resolve against the server base
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodBinding>,
}

impl ResourceBinding {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            profile: None,
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: MethodBinding) -> Self {
        self.methods.push(method);
        self
    }
}

/// Everything the server has registered, plus descriptive metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfiguration {
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default)]
    pub server_version: Option<String>,
    #[serde(default)]
    pub implementation_description: Option<String>,
    /// Statement date; falls back to the current time when absent or invalid
    #[serde(default)]
    pub conformance_date: Option<String>,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceBinding>,
    #[serde(default)]
    pub server_methods: Vec<MethodBinding>,
}

fn default_server_name() -> String {
    "fhir-server".to_string()
}

fn default_formats() -> Vec<String> {
    vec!["application/fhir+json".to_string()]
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            server_version: None,
            implementation_description: None,
            conformance_date: None,
            formats: default_formats(),
            resources: Vec::new(),
            server_methods: Vec::new(),
        }
    }
}

impl ServerConfiguration {
    pub fn from_json_str(json: &str) -> Result<Self, FhirError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FhirError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FhirError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_resource(mut self, binding: ResourceBinding) -> Self {
        self.resources.push(binding);
        self
    }

    pub fn with_server_method(mut self, method: MethodBinding) -> Self {
        self.server_methods.push(method);
        self
    }

    /// Check the registry against the known resource types
    pub fn validate(&self, catalog: &ResourceCatalog) -> Result<(), FhirError> {
        for binding in &self.resources {
            if !catalog.is_resource_type(&binding.resource) {
                return Err(FhirError::Invalid(format!(
                    "unknown resource type '{}'",
                    binding.resource
                )));
            }
            for method in &binding.methods {
                validate_method(method, Some(&binding.resource))?;
            }
        }
        for method in &self.server_methods {
            validate_method(method, None)?;
        }
        Ok(())
    }
}

fn validate_method(method: &MethodBinding, resource: Option<&str>) -> Result<(), FhirError> {
    let location = resource.unwrap_or("server");
    match method {
        MethodBinding::Interaction(_) => Ok(()),
        MethodBinding::Search(search) => {
            if search.parameters.iter().any(|p| p.name.trim().is_empty()) {
                return Err(FhirError::Invalid(format!(
                    "{location}: search parameter with blank name"
                )));
            }
            Ok(())
        }
        MethodBinding::Operation(op) => {
            if !op.name.starts_with('$') || op.operation_name().trim().is_empty() {
                return Err(FhirError::Invalid(format!(
                    "{location}: operation name '{}' must start with '$'",
                    op.name
                )));
            }
            if !(op.instance || op.type_level || op.system) {
                return Err(FhirError::Invalid(format!(
                    "{location}: operation {} declares no invocation level",
                    op.name
                )));
            }
            if resource.is_none() && (op.instance || op.type_level) {
                return Err(FhirError::Invalid(format!(
                    "server: operation {} cannot be instance or type level",
                    op.name
                )));
            }
            Ok(())
        }
    }
}
