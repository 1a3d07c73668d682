//! Capability statement provider
//!
//! Walks the server's binding registry and projects it into a
//! CapabilityStatement, and serves an OperationDefinition for every
//! extended operation that was registered.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use fhir_core::capability::{
    CapabilityImplementation, CapabilitySoftware, statement_date,
};
use fhir_core::catalog::CORE_PROFILE_BASE;
use fhir_core::{
    CapabilityOperation, CapabilityResource, CapabilityRest, CapabilitySearchParam,
    CapabilityStatement, ConditionalDeleteStatus, FhirError, MethodBinding, OperationDefinition,
    OperationDefinitionParameter, OperationMethodBinding, OperationParameter,
    OperationParameterUse, ResourceCatalog, ResourceInteraction, SearchMethodBinding,
    ServerConfiguration, SystemInteraction, SystemRestfulInteraction, TypeRestfulInteraction,
};

/// Publisher used when none is configured
pub const DEFAULT_PUBLISHER: &str = "Not provided";

/// Bindings registered for one resource name (empty name = server level)
struct BindingGroup<'a> {
    profile: Option<&'a str>,
    methods: Vec<&'a MethodBinding>,
}

/// Group all bindings by resource name, sorted by name.
///
/// Server-level bindings are grouped under the empty name, so they come first.
/// A resource only gets a group once it has at least one method.
fn collect_method_bindings(config: &ServerConfiguration) -> BTreeMap<&str, BindingGroup<'_>> {
    let mut groups: BTreeMap<&str, BindingGroup<'_>> = BTreeMap::new();
    for binding in config.resources.iter().filter(|b| !b.methods.is_empty()) {
        let group = groups
            .entry(binding.resource.as_str())
            .or_insert_with(|| BindingGroup {
                profile: None,
                methods: Vec::new(),
            });
        if group.profile.is_none() {
            group.profile = binding.profile.as_deref();
        }
        group.methods.extend(binding.methods.iter());
    }
    if !config.server_methods.is_empty() {
        groups.insert(
            "",
            BindingGroup {
                profile: None,
                methods: config.server_methods.iter().collect(),
            },
        );
    }
    groups
}

/// An operation binding together with the resource it was registered on
#[derive(Debug, Clone)]
struct IndexedOperation {
    resource: Option<String>,
    binding: OperationMethodBinding,
}

/// Serves the capability statement and operation definitions for a server
pub struct CapabilityStatementProvider {
    configuration: ServerConfiguration,
    catalog: ResourceCatalog,
    publisher: Option<String>,
    cache: bool,
    cached: RwLock<Option<Arc<CapabilityStatement>>>,
    operations: HashMap<String, Vec<IndexedOperation>>,
}

impl CapabilityStatementProvider {
    /// Validate the registry and index its operations by name
    pub fn new(
        configuration: ServerConfiguration,
        catalog: ResourceCatalog,
    ) -> Result<Self, FhirError> {
        configuration.validate(&catalog)?;
        let operations = index_operations(&configuration);

        tracing::debug!(
            resources = configuration.resources.len(),
            server_methods = configuration.server_methods.len(),
            operations = operations.len(),
            "Indexed server bindings"
        );

        Ok(Self {
            configuration,
            catalog,
            publisher: Some(DEFAULT_PUBLISHER.to_string()),
            cache: true,
            cached: RwLock::new(None),
            operations,
        })
    }

    /// When enabled (the default) the first statement built is reused for
    /// every later request.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Publisher placed in the statement; `None` omits the element.
    pub fn with_publisher(mut self, publisher: Option<String>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Names of all registered operations, sorted
    pub fn operation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of distinct resource types with at least one method
    pub fn resource_count(&self) -> usize {
        self.configuration
            .resources
            .iter()
            .filter(|b| !b.methods.is_empty())
            .map(|b| b.resource.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Return the capability statement, building it unless a cached one exists
    pub fn capability_statement(&self, server_base: &str) -> Arc<CapabilityStatement> {
        if self.cache {
            let cached = self
                .cached
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(statement) = cached.as_ref() {
                tracing::trace!("Serving cached capability statement");
                return Arc::clone(statement);
            }
        }

        let statement = Arc::new(self.build(server_base));
        if self.cache {
            *self
                .cached
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&statement));
        }
        statement
    }

    fn build(&self, server_base: &str) -> CapabilityStatement {
        let config = &self.configuration;
        let server_base = server_base.trim_end_matches('/');

        let mut statement = CapabilityStatement::new(statement_date(
            config.conformance_date.as_deref(),
        ));
        statement.publisher = self.publisher.clone();
        statement.software = CapabilitySoftware {
            name: config.server_name.clone(),
            version: config.server_version.clone(),
        };
        statement.implementation = CapabilityImplementation {
            description: config.implementation_description.clone(),
            url: Some(server_base.to_string()),
        };
        statement.format = config.formats.clone();

        let mut rest = CapabilityRest::default();
        let mut system_ops: BTreeSet<SystemRestfulInteraction> = BTreeSet::new();
        let mut operation_names: HashSet<String> = HashSet::new();

        for (resource_name, group) in collect_method_bindings(config) {
            if resource_name.is_empty() {
                for binding in group.methods {
                    if let Some(op) = binding.rest_operation(false).system_interaction() {
                        system_ops.insert(op);
                    }
                    if let MethodBinding::Operation(op) = binding {
                        add_operation(op, server_base, &mut operation_names, &mut rest.operation);
                    }
                }
                continue;
            }

            let mut resource = CapabilityResource::new(resource_name);
            resource.profile = Some(self.resolve_profile(resource_name, group.profile, server_base));

            let mut interactions: BTreeSet<TypeRestfulInteraction> = BTreeSet::new();
            let mut includes: BTreeSet<String> = BTreeSet::new();

            for binding in group.methods {
                let rest_operation = binding.rest_operation(true);

                if let Some(interaction) = rest_operation.type_interaction() {
                    interactions.insert(interaction);
                    if interaction == TypeRestfulInteraction::Vread {
                        interactions.insert(TypeRestfulInteraction::Read);
                    }
                    if binding.supports_conditional() {
                        match interaction {
                            TypeRestfulInteraction::Create => {
                                resource.conditional_create = Some(true)
                            }
                            TypeRestfulInteraction::Update => {
                                resource.conditional_update = Some(true)
                            }
                            TypeRestfulInteraction::Delete => {
                                resource.conditional_delete = Some(ConditionalDeleteStatus::Single)
                            }
                            _ => {}
                        }
                    }
                }
                if let Some(op) = rest_operation.system_interaction() {
                    system_ops.insert(op);
                }

                match binding {
                    MethodBinding::Search(search) => {
                        self.add_search_params(resource_name, search, &mut resource.search_param);
                        includes.extend(search.includes.iter().cloned());
                    }
                    MethodBinding::Operation(op) => {
                        add_operation(op, server_base, &mut operation_names, &mut rest.operation);
                    }
                    MethodBinding::Interaction(_) => {}
                }
            }

            resource.interaction = interactions
                .into_iter()
                .map(|code| ResourceInteraction { code })
                .collect();
            resource.search_include = includes.into_iter().collect();
            rest.resource.push(resource);
        }

        rest.interaction = system_ops
            .into_iter()
            .map(|code| SystemInteraction { code })
            .collect();

        tracing::debug!(
            resources = rest.resource.len(),
            system_interactions = rest.interaction.len(),
            operations = rest.operation.len(),
            "Built capability statement"
        );

        statement.rest.push(rest);
        statement
    }

    fn resolve_profile(&self, resource: &str, profile: Option<&str>, server_base: &str) -> String {
        match profile {
            Some(profile) if profile.contains("://") => profile.to_string(),
            Some(profile) => format!("{}/{}", server_base, profile.trim_start_matches('/')),
            None => self
                .catalog
                .profile(resource)
                .unwrap_or_else(|| format!("{}/{}", CORE_PROFILE_BASE, resource)),
        }
    }

    /// Append a search binding's parameters, required first then by name.
    ///
    /// Parameters sharing an unchained name are merged into one entry.
    fn add_search_params(
        &self,
        resource: &str,
        search: &SearchMethodBinding,
        params: &mut Vec<CapabilitySearchParam>,
    ) {
        let mut declared: Vec<_> = search.parameters.iter().collect();
        declared.sort_by(|a, b| b.required.cmp(&a.required).then_with(|| a.name.cmp(&b.name)));

        for parameter in declared {
            let (name, chain) = parameter.split_chain();

            let documentation = parameter
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .or_else(|| self.catalog.search_param_description(resource, name))
                .map(str::to_string);

            let targets = parameter
                .targets
                .iter()
                .filter(|t| self.catalog.is_resource_type(t))
                .cloned();

            let entry = match params.iter().position(|p| p.name == name) {
                Some(index) => &mut params[index],
                None => {
                    params.push(CapabilitySearchParam {
                        name: name.to_string(),
                        param_type: parameter.param_type,
                        documentation,
                        chain: Vec::new(),
                        target: Vec::new(),
                    });
                    let last = params.len() - 1;
                    &mut params[last]
                }
            };

            if let Some(chain) = chain {
                if !entry.chain.iter().any(|c| c == chain) {
                    entry.chain.push(chain.to_string());
                }
            }
            for target in targets {
                if !entry.target.contains(&target) {
                    entry.target.push(target);
                }
            }
        }
    }

    /// Build the OperationDefinition for `id` (operation name without `$`).
    ///
    /// All bindings registered under that name contribute to one definition.
    pub fn read_operation_definition(&self, id: &str) -> Result<OperationDefinition, FhirError> {
        let id = id.trim();
        let shared = self
            .operations
            .get(id)
            .filter(|bindings| !bindings.is_empty())
            .ok_or_else(|| {
                tracing::debug!(operation = id, "Unknown operation definition requested");
                FhirError::NotFound(format!("OperationDefinition/{}", id))
            })?;

        let mut definition = OperationDefinition::new(id);
        let mut in_params: HashSet<&str> = HashSet::new();
        let mut out_params: HashSet<&str> = HashSet::new();

        for IndexedOperation { resource, binding } in shared {
            if let Some(description) = binding
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
            {
                definition.description = Some(description.to_string());
            }
            if !binding.idempotent {
                definition.affects_state = true;
            }
            definition.instance |= binding.instance;
            definition.type_level |= binding.type_level;
            definition.system |= binding.system;

            if let Some(resource) = resource {
                if !definition.resource.contains(resource) {
                    definition.resource.push(resource.clone());
                }
            }

            for param in &binding.parameters {
                if in_params.insert(param.name.as_str()) {
                    definition
                        .parameter
                        .push(definition_parameter(param, OperationParameterUse::In));
                }
            }
            for param in &binding.return_params {
                if out_params.insert(param.name.as_str()) {
                    definition
                        .parameter
                        .push(definition_parameter(param, OperationParameterUse::Out));
                }
            }
        }

        Ok(definition)
    }
}

fn index_operations(config: &ServerConfiguration) -> HashMap<String, Vec<IndexedOperation>> {
    let mut operations: HashMap<String, Vec<IndexedOperation>> = HashMap::new();
    for (resource_name, group) in collect_method_bindings(config) {
        for binding in group.methods {
            if let MethodBinding::Operation(op) = binding {
                operations
                    .entry(op.operation_name().to_string())
                    .or_default()
                    .push(IndexedOperation {
                        resource: Some(resource_name)
                            .filter(|r| !r.is_empty())
                            .map(str::to_string),
                        binding: op.clone(),
                    });
            }
        }
    }
    operations
}

/// Add an operation to the statement once per operation name
fn add_operation(
    op: &OperationMethodBinding,
    server_base: &str,
    seen: &mut HashSet<String>,
    operations: &mut Vec<CapabilityOperation>,
) {
    let name = op.operation_name();
    if seen.insert(name.to_string()) {
        operations.push(CapabilityOperation {
            name: name.to_string(),
            definition: format!("{}/OperationDefinition/{}", server_base, name),
        });
    }
}

fn definition_parameter(
    param: &OperationParameter,
    param_use: OperationParameterUse,
) -> OperationDefinitionParameter {
    OperationDefinitionParameter {
        name: param.name.clone(),
        param_use,
        min: param.min,
        max: param.max_code(),
        param_type: param.param_type.clone(),
    }
}
