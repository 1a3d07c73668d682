use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::binding::SearchParamType;

/// FHIR version advertised by this server (R4B)
pub const FHIR_VERSION: &str = "4.3.0";

/// Resource-level interactions.
///
/// Declaration order is the order interactions appear in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeRestfulInteraction {
    Read,
    Vread,
    Update,
    Patch,
    Delete,
    HistoryInstance,
    HistoryType,
    Create,
    SearchType,
}

/// Server-level interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemRestfulInteraction {
    Transaction,
    Batch,
    HistorySystem,
    SearchSystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionalDeleteStatus {
    NotSupported,
    Single,
    Multiple,
}

/// FHIR CapabilityStatement resource (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityStatement {
    pub resource_type: String,
    pub status: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    pub kind: String,
    pub software: CapabilitySoftware,
    pub implementation: CapabilityImplementation,
    pub fhir_version: String,
    pub format: Vec<String>,
    pub rest: Vec<CapabilityRest>,
}

impl CapabilityStatement {
    /// Create an empty instance statement dated `date`
    pub fn new(date: String) -> Self {
        Self {
            resource_type: "CapabilityStatement".to_string(),
            status: "active".to_string(),
            date,
            publisher: None,
            kind: "instance".to_string(),
            software: CapabilitySoftware::default(),
            implementation: CapabilityImplementation::default(),
            fhir_version: FHIR_VERSION.to_string(),
            format: vec!["application/fhir+json".to_string()],
            rest: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilitySoftware {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityImplementation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// REST capability declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRest {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<CapabilityResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interaction: Vec<SystemInteraction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operation: Vec<CapabilityOperation>,
}

impl Default for CapabilityRest {
    fn default() -> Self {
        Self {
            mode: "server".to_string(),
            resource: Vec::new(),
            interaction: Vec::new(),
            operation: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInteraction {
    pub code: TypeRestfulInteraction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInteraction {
    pub code: SystemRestfulInteraction,
}

/// Per-resource capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interaction: Vec<ResourceInteraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_create: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_delete: Option<ConditionalDeleteStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_param: Vec<CapabilitySearchParam>,
}

impl CapabilityResource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            profile: None,
            interaction: Vec::new(),
            conditional_create: None,
            conditional_update: None,
            conditional_delete: None,
            search_include: Vec::new(),
            search_param: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySearchParam {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<SearchParamType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<String>,
}

/// Reference from the statement to an OperationDefinition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityOperation {
    pub name: String,
    pub definition: String,
}

/// Resolve the statement date.
///
/// A configured value is accepted as an RFC 3339 timestamp or a FHIR partial
/// date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`). Anything else (or nothing) falls
/// back to now.
pub fn statement_date(configured: Option<&str>) -> String {
    if let Some(value) = configured.map(str::trim).filter(|v| !v.is_empty()) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return parsed.to_rfc3339_opts(SecondsFormat::Secs, true);
        }
        if let Some(date) = partial_date(value) {
            return date;
        }
    }
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn partial_date(value: &str) -> Option<String> {
    let padded = match value.len() {
        4 => format!("{value}-01-01"),
        7 => format!("{value}-01"),
        10 => value.to_string(),
        _ => return None,
    };
    if !value.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .ok()
        .filter(|date| date.format("%Y-%m-%d").to_string() == padded)
        .map(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactions_order_by_declaration() {
        let mut codes = vec![
            TypeRestfulInteraction::SearchType,
            TypeRestfulInteraction::Create,
            TypeRestfulInteraction::Read,
            TypeRestfulInteraction::Vread,
        ];
        codes.sort();
        assert_eq!(
            codes,
            vec![
                TypeRestfulInteraction::Read,
                TypeRestfulInteraction::Vread,
                TypeRestfulInteraction::Create,
                TypeRestfulInteraction::SearchType,
            ]
        );
    }

    #[test]
    fn interaction_codes_are_kebab_case() {
        let json = serde_json::to_value(ResourceInteraction {
            code: TypeRestfulInteraction::HistoryInstance,
        })
        .unwrap();
        assert_eq!(json["code"], "history-instance");

        let json = serde_json::to_value(ConditionalDeleteStatus::Single).unwrap();
        assert_eq!(json, "single");
    }

    #[test]
    fn empty_collections_are_omitted() {
        let json = serde_json::to_value(CapabilityResource::new("Patient")).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Patient" }));

        let statement = CapabilityStatement::new("2024-01-01".to_string());
        let json = serde_json::to_value(&statement).unwrap();
        assert_eq!(json["resourceType"], "CapabilityStatement");
        assert_eq!(json["fhirVersion"], FHIR_VERSION);
        assert!(json.get("publisher").is_none());
    }

    #[test]
    fn configured_date_is_used_when_valid() {
        assert_eq!(statement_date(Some("2015-07-01")), "2015-07-01");
        assert_eq!(
            statement_date(Some("2015-07-01T10:00:00+00:00")),
            "2015-07-01T10:00:00Z"
        );
    }

    #[test]
    fn partial_dates_are_kept_as_given() {
        assert_eq!(statement_date(Some("2015")), "2015");
        assert_eq!(statement_date(Some(" 2015-07 ")), "2015-07");

        for bad in ["2015-13", "15", "2015-7", "2015-02-30", "+201"] {
            let date = statement_date(Some(bad));
            assert!(DateTime::parse_from_rfc3339(&date).is_ok(), "{bad}");
        }
    }

    #[test]
    fn invalid_date_falls_back_to_now() {
        let date = statement_date(Some("yesterday-ish"));
        assert!(DateTime::parse_from_rfc3339(&date).is_ok());

        let date = statement_date(None);
        assert!(DateTime::parse_from_rfc3339(&date).is_ok());
    }
}
