//! Error kinds raised by the pure order logic.

use thiserror::Error;

/// An order record could not be turned into an [`Order`](crate::Order).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A field persisted as a JSON string did not contain valid JSON.
    #[error("field `{field}` holds malformed JSON: {source}")]
    MalformedField {
        /// Wire name of the field.
        field: &'static str,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The record is not a JSON object.
    #[error("order record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The record is an object but does not have the order shape.
    #[error("order record has an unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),

    /// A single-field patch carried a value of the wrong type.
    #[error("invalid value for field `{field}`: {source}")]
    FieldValue {
        /// Wire name of the field.
        field: String,
        /// Underlying conversion error.
        #[source]
        source: serde_json::Error,
    },
}

/// Input rejected before any backend call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Shipment metadata is incomplete.
    #[error("please fill all shipment fields before submitting (missing: {})", .0.join(", "))]
    IncompleteEditableFields(Vec<String>),

    /// The order has nothing to ship.
    #[error("order has no order lines")]
    NoOrderLines,

    /// The referenced order is not in the current view.
    #[error("order {0} is not in the current view")]
    UnknownOrder(String),
}
