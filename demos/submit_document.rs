//! Submits the sample goods-introduction document a few times under a two-per-ten-seconds
//! budget and prints each registry response.
//!
//! Set `REGISTRY_BASE_URL` to target a staging or mock server instead of the public registry.

// std
use std::{env, time::Duration};
// crates.io
use color_eyre::Result;
use time::macros::date;
use tokio::time::Instant;
// self
use registry_client::{
	client::DocumentClient,
	config::{RateBudget, RegistryConfig},
	document::{Description, Document, LP_INTRODUCE_GOODS, Product},
	url::Url,
};

fn sample_document() -> Document {
	Document {
		description: Some(Description::new("string")),
		doc_id: "string".into(),
		doc_status: "string".into(),
		doc_type: LP_INTRODUCE_GOODS.into(),
		import_request: true,
		owner_inn: "string".into(),
		participant_inn: "string".into(),
		producer_inn: "string".into(),
		production_date: date!(2020 - 01 - 23),
		production_type: "string".into(),
		products: vec![Product {
			certificate_document: Some("string".into()),
			certificate_document_date: Some(date!(2020 - 01 - 23)),
			certificate_document_number: Some("string".into()),
			owner_inn: "string".into(),
			producer_inn: "string".into(),
			production_date: date!(2020 - 01 - 23),
			tnved_code: "string".into(),
			uit_code: Some("string".into()),
			uitu_code: Some("string".into()),
		}],
		reg_date: date!(2020 - 01 - 23),
		reg_number: "string".into(),
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let mut registry = RegistryConfig::default();

	if let Ok(base_url) = env::var("REGISTRY_BASE_URL") {
		registry = registry.with_base_url(Url::parse(&base_url)?);
	}

	let client = DocumentClient::new(&registry, RateBudget::new(Duration::from_secs(10), 2)?)?;
	let document = sample_document();
	let start = Instant::now();

	println!("Submitting to {}", client.endpoint());

	for attempt in 1..=3 {
		let result = client.submit_document(&document, "sign").await?;

		println!(
			"#{attempt} after {:.1?}: status {} body {}",
			start.elapsed(),
			result.status_code,
			result.body_text()
		);
	}

	Ok(())
}
