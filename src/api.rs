//! The product catalog: wire types, the [`Catalog`] data-provider seam and its implementations.

use crate::{
	error::{describe_js, ApiError},
	query::HomeQuery,
};
use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, rc::Rc};
use tracing::{debug, instrument};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
	#[serde(deserialize_with = "string_or_number")]
	pub product_id: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub image: String,
	/// Lowest price, as the API sends it (usually a decimal string).
	#[serde(default, deserialize_with = "string_or_number")]
	pub lprice: String,
	#[serde(default)]
	pub brand: String,
	#[serde(default)]
	pub mall_name: String,
	#[serde(default)]
	pub category1: String,
	#[serde(default)]
	pub category2: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub rating: Option<f64>,
	#[serde(default)]
	pub review_count: Option<u32>,
	#[serde(default)]
	pub stock: Option<u32>,
}
impl Product {
	/// [`lprice`](`Product::lprice`) as a number, 0 if it isn't one.
	#[must_use]
	pub fn price(&self) -> f64 {
		parse_number(&self.lprice)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
	#[serde(alias = "current")]
	pub page: u32,
	pub limit: u32,
	pub total: u64,
	pub has_next: bool,
	pub has_prev: bool,
}
impl Default for Pagination {
	fn default() -> Self {
		Self {
			page: 1,
			limit: 20,
			total: 0,
			has_next: false,
			has_prev: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
	pub search: String,
	pub category1: String,
	pub category2: String,
	pub sort: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPage {
	pub products: Vec<Product>,
	pub pagination: Pagination,
	pub filters: Filters,
}

/// Two-level category tree: top-level category to its sub-categories.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Categories(pub BTreeMap<String, Vec<String>>);
impl Categories {
	pub fn top_level(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	#[must_use]
	pub fn children(&self, category1: &str) -> Option<&[String]> {
		self.0.get(category1).map(Vec::as_slice)
	}
}
impl<'de> Deserialize<'de> for Categories {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let tree = BTreeMap::<String, BTreeMap<String, IgnoredAny>>::deserialize(deserializer)?;
		Ok(Self(tree.into_iter().map(|(category1, children)| (category1, children.into_keys().collect())).collect()))
	}
}

/// Where pages get their data from.
pub trait Catalog {
	fn products(&self, query: &HomeQuery) -> LocalBoxFuture<'static, Result<ProductPage, ApiError>>;
	fn product(&self, product_id: &str) -> LocalBoxFuture<'static, Result<Product, ApiError>>;
	fn categories(&self) -> LocalBoxFuture<'static, Result<Categories, ApiError>>;
}

/// Fetches JSON from `{base}/products`, `{base}/products/{id}` and `{base}/categories`.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
	base: Rc<str>,
}
impl HttpCatalog {
	#[must_use]
	pub fn new(base: &str) -> Self {
		Self {
			base: base.trim_end_matches('/').into(),
		}
	}
}
impl Catalog for HttpCatalog {
	fn products(&self, query: &HomeQuery) -> LocalBoxFuture<'static, Result<ProductPage, ApiError>> {
		get_json(format!("{}/products{}", self.base, query.to_api_search())).boxed_local()
	}

	fn product(&self, product_id: &str) -> LocalBoxFuture<'static, Result<Product, ApiError>> {
		let id: String = url::form_urlencoded::byte_serialize(product_id.as_bytes()).collect();
		get_json(format!("{}/products/{}", self.base, id)).boxed_local()
	}

	fn categories(&self) -> LocalBoxFuture<'static, Result<Categories, ApiError>> {
		get_json(format!("{}/categories", self.base)).boxed_local()
	}
}

#[instrument]
async fn get_json<T: for<'de> Deserialize<'de>>(url: String) -> Result<T, ApiError> {
	let network = |error: wasm_bindgen::JsValue| ApiError::Network {
		url: url.clone(),
		message: describe_js(&error),
	};

	let window = web_sys::window().ok_or(ApiError::NoWindow)?;
	let response: Response = JsFuture::from(window.fetch_with_str(&url)).await.map_err(network)?.dyn_into().map_err(network)?;
	if !response.ok() {
		return Err(ApiError::Status {
			url: url.clone(),
			status: response.status(),
		});
	}

	let body = JsFuture::from(response.text().map_err(network)?).await.map_err(network)?;
	let body = body.as_string().unwrap_or_default();
	debug!(bytes = body.len(), "Received response.");
	Ok(serde_json::from_str(&body)?)
}

/// Serves a fixed product list, filtered, sorted and paginated the way the HTTP API does it.
///
/// Useful without a backend and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
	products: Rc<Vec<Product>>,
}
impl MemoryCatalog {
	#[must_use]
	pub fn new(products: Vec<Product>) -> Self {
		Self { products: Rc::new(products) }
	}

	fn select(&self, query: &HomeQuery) -> ProductPage {
		let needle = query.search.to_lowercase();
		let mut matches: Vec<&Product> = self
			.products
			.iter()
			.filter(|product| needle.is_empty() || product.title.to_lowercase().contains(&needle) || product.brand.to_lowercase().contains(&needle))
			.filter(|product| query.category1.is_empty() || product.category1 == query.category1)
			.filter(|product| query.category2.is_empty() || product.category2 == query.category2)
			.collect();

		match query.sort.as_deref().unwrap_or("price_asc") {
			"price_desc" => matches.sort_by(|a, b| b.price().total_cmp(&a.price())),
			"name_asc" => matches.sort_by(|a, b| a.title.cmp(&b.title)),
			"name_desc" => matches.sort_by(|a, b| b.title.cmp(&a.title)),
			_ => matches.sort_by(|a, b| a.price().total_cmp(&b.price())),
		}

		let total = matches.len();
		let limit = query.limit.max(1) as usize;
		let start = (query.current.max(1) as usize - 1).saturating_mul(limit);
		let products = matches.into_iter().skip(start).take(limit).cloned().collect();
		ProductPage {
			products,
			pagination: Pagination {
				page: query.current.max(1),
				limit: query.limit,
				total: total as u64,
				has_next: start.saturating_add(limit) < total,
				has_prev: query.current > 1,
			},
			filters: Filters {
				search: query.search.clone(),
				category1: query.category1.clone(),
				category2: query.category2.clone(),
				sort: query.sort.clone().unwrap_or_default(),
			},
		}
	}
}
impl Catalog for MemoryCatalog {
	fn products(&self, query: &HomeQuery) -> LocalBoxFuture<'static, Result<ProductPage, ApiError>> {
		future::ready(Ok(self.select(query))).boxed_local()
	}

	fn product(&self, product_id: &str) -> LocalBoxFuture<'static, Result<Product, ApiError>> {
		let product = self
			.products
			.iter()
			.find(|product| product.product_id == product_id)
			.cloned()
			.ok_or_else(|| ApiError::NotFound(product_id.to_owned()));
		future::ready(product).boxed_local()
	}

	fn categories(&self) -> LocalBoxFuture<'static, Result<Categories, ApiError>> {
		let mut tree = BTreeMap::<String, Vec<String>>::new();
		for product in self.products.iter().filter(|product| !product.category1.is_empty()) {
			let children = tree.entry(product.category1.clone()).or_default();
			if !product.category2.is_empty() && !children.contains(&product.category2) {
				children.push(product.category2.clone());
			}
		}
		future::ready(Ok(Categories(tree))).boxed_local()
	}
}

/// Parses a JSON number or numeric string, 0 for anything else.
#[must_use]
pub fn number_of(value: &Value) -> f64 {
	match value {
		Value::Number(number) => number.as_f64().unwrap_or(0.0),
		Value::String(text) => parse_number(text),
		Value::Bool(true) => 1.0,
		_ => 0.0,
	}
}

/// Parses a decimal string, 0 if it isn't a finite number. Blank is 0.
#[must_use]
pub fn parse_number(text: &str) -> f64 {
	text.trim().parse::<f64>().ok().filter(|number| number.is_finite()).unwrap_or(0.0)
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::String(text) => text,
		Value::Number(number) => number.to_string(),
		_ => String::new(),
	})
}
