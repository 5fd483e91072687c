use crate::api::{number_of, Product};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One cart line, keyed by [`product_id`](`CartItem::product_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
	pub product_id: String,
	pub title: String,
	pub image: String,
	/// Unit price.
	pub price: f64,
	/// Always at least 1.
	pub quantity: u32,
	pub checked: bool,
}
impl CartItem {
	/// A new, unchecked line for `product`.
	#[must_use]
	pub fn from_product(product: &Product, quantity: u32) -> Self {
		Self {
			product_id: product.product_id.clone(),
			title: product.title.clone(),
			image: product.image.clone(),
			price: product.price(),
			quantity: quantity.max(1),
			checked: false,
		}
	}

	#[must_use]
	pub fn subtotal(&self) -> f64 {
		self.price * f64::from(self.quantity)
	}

	/// Rebuilds a line from untrusted persisted JSON.
	///
	/// Returns [`None`] without a usable product key. Missing text becomes empty,
	/// unparsable numbers become 0 (`price`, falling back to `lprice`) or 1 (`quantity`),
	/// and a missing `checked` flag counts as checked.
	#[must_use]
	pub fn from_stored(value: &Value) -> Option<Self> {
		let object = value.as_object()?;
		let product_id = match object.get("productId")? {
			Value::String(id) if !id.is_empty() => id.clone(),
			Value::Number(id) if id.as_f64() != Some(0.0) => id.to_string(),
			_ => return None,
		};

		let text = |key: &str| match object.get(key) {
			Some(Value::String(text)) => text.clone(),
			Some(Value::Number(number)) => number.to_string(),
			_ => String::new(),
		};
		let price = object
			.get("price")
			.filter(|price| !price.is_null())
			.or_else(|| object.get("lprice"))
			.map_or(0.0, number_of);
		let quantity = object.get("quantity").filter(|quantity| !quantity.is_null()).map_or(1, |quantity| sanitize_quantity(number_of(quantity)));

		Some(Self {
			product_id,
			title: text("title"),
			image: text("image"),
			price,
			quantity,
			checked: object.get("checked").and_then(Value::as_bool).unwrap_or(true),
		})
	}
}

/// Coerces a requested quantity: non-finite or non-positive becomes 1, fractions are floored.
#[must_use]
pub fn sanitize_quantity(quantity: f64) -> u32 {
	if !quantity.is_finite() || quantity <= 0.0 {
		return 1;
	}
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	let floored = quantity.floor().min(f64::from(u32::MAX)) as u32;
	floored.max(1)
}

/// Parses a persisted cart, dropping malformed lines. A JSON value other than an array is an empty cart.
pub fn load_items(stored: &str) -> Result<Vec<CartItem>, serde_json::Error> {
	let value: Value = serde_json::from_str(stored)?;
	Ok(value.as_array().map_or_else(Vec::new, |items| items.iter().filter_map(CartItem::from_stored).collect()))
}
