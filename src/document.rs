//! Registry document schema.
//!
//! Field names follow the registry's wire format: snake_case throughout, except for the
//! nested [`Description`] object whose own fields are camelCase. Dates travel as ISO
//! `YYYY-MM-DD` strings. Absent optional fields are sent as `null`.

// crates.io
use time::Date;
// self
use crate::_prelude::*;

/// Document type used when introducing domestically produced goods into circulation.
pub const LP_INTRODUCE_GOODS: &str = "LP_INTRODUCE_GOODS";

/// Document submitted to the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Document {
	/// Participant description block.
	#[serde(default)]
	pub description: Option<Description>,
	/// Document identifier.
	pub doc_id: String,
	/// Document status.
	pub doc_status: String,
	/// Document type, e.g. [`LP_INTRODUCE_GOODS`].
	pub doc_type: String,
	/// Whether the goods are imported.
	pub import_request: bool,
	/// Taxpayer number of the goods owner.
	pub owner_inn: String,
	/// Taxpayer number of the submitting participant.
	pub participant_inn: String,
	/// Taxpayer number of the producer.
	pub producer_inn: String,
	/// Production date.
	pub production_date: Date,
	/// Production type.
	pub production_type: String,
	/// Goods covered by the document.
	pub products: Vec<Product>,
	/// Registration date.
	pub reg_date: Date,
	/// Registration number.
	pub reg_number: String,
}

/// Participant description, the one object whose fields are camelCase on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
	/// Taxpayer number of the participant.
	pub participant_inn: String,
}
impl Description {
	/// Creates a description for the provided participant.
	pub fn new(participant_inn: impl Into<String>) -> Self {
		Self { participant_inn: participant_inn.into() }
	}
}

/// Single product line of a [`Document`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Product {
	/// Conformity certificate kind.
	#[serde(default)]
	pub certificate_document: Option<String>,
	/// Conformity certificate date.
	#[serde(default)]
	pub certificate_document_date: Option<Date>,
	/// Conformity certificate number.
	#[serde(default)]
	pub certificate_document_number: Option<String>,
	/// Taxpayer number of the owner.
	pub owner_inn: String,
	/// Taxpayer number of the producer.
	pub producer_inn: String,
	/// Production date.
	pub production_date: Date,
	/// Commodity classification code.
	pub tnved_code: String,
	/// Unit identification code.
	#[serde(default)]
	pub uit_code: Option<String>,
	/// Package identification code.
	#[serde(default)]
	pub uitu_code: Option<String>,
}
