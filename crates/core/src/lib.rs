//! fhir-core: Shared FHIR R4B types and utilities
//!
//! This crate provides the binding registry model, the resource catalog and
//! the resources served by the metadata endpoint: CapabilityStatement,
//! OperationDefinition and OperationOutcome.

pub mod binding;
pub mod capability;
pub mod catalog;
pub mod error;
pub mod operation_definition;
pub mod outcome;

pub use binding::{
    InteractionBinding, MethodBinding, OperationMethodBinding, OperationParameter,
    ResourceBinding, RestOperationType, SearchMethodBinding, SearchParamType, SearchParameter,
    ServerConfiguration,
};
pub use capability::{
    CapabilityOperation, CapabilityResource, CapabilityRest, CapabilitySearchParam,
    CapabilityStatement, ConditionalDeleteStatus, ResourceInteraction, SystemInteraction,
    SystemRestfulInteraction, TypeRestfulInteraction,
};
pub use catalog::{ResourceCatalog, ResourceDefinition, resource_type};
pub use error::FhirError;
pub use operation_definition::{
    OperationDefinition, OperationDefinitionParameter, OperationParameterUse,
};
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};

// Re-export the R4B resource type enum used for name validation
pub use fhir_sdk::r4b::resources::ResourceType;
