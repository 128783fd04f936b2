//! Data contracts for pipeline handoffs
//!
//! Typed schemas for the three stage handoffs and the delivery package, the
//! shared limits they are judged against, and the `ValidationResult` family
//! of types every validator produces.

pub mod delivery;
pub mod description;
pub mod handoff_type;
pub mod lenient;
pub mod limits;
pub mod payload;
pub mod result;

pub use delivery::{
    DeliveryPackage, Documentation, PackageFile, PackageFiles, PreviewFile, PreviewVariant,
};
pub use description::{contract_constraints, contract_description};
pub use handoff_type::{ContractKind, HandoffType, ParseHandoffTypeError};
pub use payload::{ContentHandoff, DesignHandoff, HandoffPayload, QualityHandoff};
pub use result::{
    CorrectionSuggestion, ErrorType, Priority, Severity, ValidationError, ValidationResult,
};
