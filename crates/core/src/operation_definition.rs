use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationParameterUse {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDefinitionParameter {
    pub name: String,
    #[serde(rename = "use")]
    pub param_use: OperationParameterUse,
    pub min: u32,
    pub max: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
}

/// FHIR OperationDefinition resource (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDefinition {
    pub resource_type: String,
    pub id: String,
    pub name: String,
    pub status: String,
    pub kind: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub affects_state: bool,
    pub system: bool,
    #[serde(rename = "type")]
    pub type_level: bool,
    pub instance: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<OperationDefinitionParameter>,
}

impl OperationDefinition {
    /// Empty active definition for the operation `code` (no leading `$`)
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            resource_type: "OperationDefinition".to_string(),
            id: code.clone(),
            name: code.clone(),
            status: "active".to_string(),
            kind: "operation".to_string(),
            code,
            description: None,
            affects_state: false,
            system: false,
            type_level: false,
            instance: false,
            resource: Vec::new(),
            parameter: Vec::new(),
        }
    }

    pub fn parameters(
        &self,
        param_use: OperationParameterUse,
    ) -> impl Iterator<Item = &OperationDefinitionParameter> {
        self.parameter
            .iter()
            .filter(move |p| p.param_use == param_use)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_fhir_field_names() {
        let mut op = OperationDefinition::new("everything");
        op.instance = true;
        op.resource.push("Patient".to_string());
        op.parameter.push(OperationDefinitionParameter {
            name: "start".to_string(),
            param_use: OperationParameterUse::In,
            min: 0,
            max: "1".to_string(),
            param_type: Some("date".to_string()),
        });

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["resourceType"], "OperationDefinition");
        assert_eq!(json["id"], "everything");
        assert_eq!(json["kind"], "operation");
        assert_eq!(json["affectsState"], false);
        assert_eq!(json["type"], false);
        assert_eq!(json["instance"], true);
        assert_eq!(json["resource"][0], "Patient");
        assert_eq!(json["parameter"][0]["use"], "in");
        assert_eq!(json["parameter"][0]["type"], "date");
        assert!(json.get("description").is_none());
    }
}
