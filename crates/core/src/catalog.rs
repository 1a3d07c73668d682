//! Resource definitions known to the server
//!
//! Resource type names are checked against the R4B resource model. The base
//! profile of each type and default documentation for well-known search
//! parameters are layered on top.

use std::collections::{BTreeMap, HashMap};

use fhir_sdk::r4b::resources::ResourceType;

/// Canonical base for core resource profiles
pub const CORE_PROFILE_BASE: &str = "http://hl7.org/fhir/StructureDefinition";

const COMMON_SEARCH_PARAMS: &[(&str, &str)] = &[
    ("_id", "Logical id of this artifact"),
    ("_lastUpdated", "When the resource version last changed"),
];

const PATIENT_SEARCH_PARAMS: &[(&str, &str)] = &[
    ("active", "Whether the patient record is active"),
    ("birthdate", "The patient's date of birth"),
    ("family", "A portion of the family name of the patient"),
    ("gender", "Gender of the patient"),
    ("given", "A portion of the given name of the patient"),
    ("identifier", "A patient identifier"),
    (
        "name",
        "A server defined search that may match any of the string fields in the HumanName",
    ),
    (
        "organization",
        "The organization that is the custodian of the patient record",
    ),
];

const OBSERVATION_SEARCH_PARAMS: &[(&str, &str)] = &[
    ("category", "The classification of the type of observation"),
    ("code", "The code of the observation type"),
    ("date", "Obtained date/time. If the obtained element is a period, a date that falls in the period"),
    ("encounter", "Encounter related to the observation"),
    ("patient", "The subject that the observation is about (if patient)"),
    ("status", "The status of the observation"),
    ("subject", "The subject that the observation is about"),
];

const ENCOUNTER_SEARCH_PARAMS: &[(&str, &str)] = &[
    ("class", "Classification of patient encounter"),
    ("date", "A date within the period the Encounter lasted"),
    ("patient", "The patient or group present at the encounter"),
    ("status", "planned | arrived | triaged | in-progress | onleave | finished | cancelled +"),
];

const PRACTITIONER_SEARCH_PARAMS: &[(&str, &str)] = &[
    ("family", "A portion of the family name"),
    ("given", "A portion of the given name"),
    ("identifier", "A practitioner's Identifier"),
    (
        "name",
        "A server defined search that may match any of the string fields in the HumanName",
    ),
];

const ORGANIZATION_SEARCH_PARAMS: &[(&str, &str)] = &[
    (
        "identifier",
        "Any identifier for the organization (not the accreditation issuer's identifier)",
    ),
    ("name", "A portion of the organization's name or alias"),
    ("type", "A code for the type of organization"),
];

const CONDITION_SEARCH_PARAMS: &[(&str, &str)] = &[
    ("clinical-status", "The clinical status of the condition"),
    ("code", "Code for the condition"),
    ("onset-date", "Date related onsets (dateTime and Period)"),
    ("patient", "Who has the condition?"),
];

/// Documentation overrides for one resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefinition {
    pub name: String,
    pub profile: String,
    /// Search parameter name to its documentation
    pub search_params: BTreeMap<String, String>,
}

impl ResourceDefinition {
    /// Core definition with the base profile and the common search parameters
    pub fn core(name: &str) -> Self {
        Self {
            name: name.to_string(),
            profile: core_profile(name),
            search_params: COMMON_SEARCH_PARAMS
                .iter()
                .map(|(code, doc)| (code.to_string(), doc.to_string()))
                .collect(),
        }
    }

    pub fn with_search_param(mut self, name: &str, description: &str) -> Self {
        self.search_params
            .insert(name.to_string(), description.to_string());
        self
    }
}

fn core_profile(name: &str) -> String {
    format!("{}/{}", CORE_PROFILE_BASE, name)
}

/// Parse an R4B resource type name
pub fn resource_type(name: &str) -> Option<ResourceType> {
    name.parse::<ResourceType>().ok()
}

/// Resource knowledge used when building a statement.
///
/// Type names come from the R4B resource model; registered definitions only
/// add profiles and search parameter documentation on top of it.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    definitions: HashMap<String, ResourceDefinition>,
}

impl ResourceCatalog {
    /// R4B catalog with documentation for the most common resources
    pub fn r4b() -> Self {
        let documented: [(&str, &[(&str, &str)]); 6] = [
            ("Patient", PATIENT_SEARCH_PARAMS),
            ("Observation", OBSERVATION_SEARCH_PARAMS),
            ("Encounter", ENCOUNTER_SEARCH_PARAMS),
            ("Practitioner", PRACTITIONER_SEARCH_PARAMS),
            ("Organization", ORGANIZATION_SEARCH_PARAMS),
            ("Condition", CONDITION_SEARCH_PARAMS),
        ];

        let mut catalog = Self::default();
        for (resource, params) in documented {
            let definition = params
                .iter()
                .fold(ResourceDefinition::core(resource), |def, (code, doc)| {
                    def.with_search_param(code, doc)
                });
            catalog.register(definition);
        }
        catalog
    }

    /// Add or replace a definition
    pub fn register(&mut self, definition: ResourceDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    pub fn is_resource_type(&self, resource: &str) -> bool {
        self.definitions.contains_key(resource) || resource_type(resource).is_some()
    }

    /// Profile of `resource`, or `None` for unknown types
    pub fn profile(&self, resource: &str) -> Option<String> {
        match self.definitions.get(resource) {
            Some(definition) => Some(definition.profile.clone()),
            None => resource_type(resource).map(|_| core_profile(resource)),
        }
    }

    pub fn search_param_description(&self, resource: &str, param: &str) -> Option<&str> {
        match self.definitions.get(resource) {
            Some(definition) => definition.search_params.get(param).map(String::as_str),
            None => {
                resource_type(resource)?;
                COMMON_SEARCH_PARAMS
                    .iter()
                    .find(|(code, _)| *code == param)
                    .map(|(_, doc)| *doc)
            }
        }
    }
}
