use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::Level;

/// Boot-time settings. Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// `id` of the element the router renders into.
	pub root_id: String,
	/// `localStorage` key of the persisted cart.
	pub storage_key: String,
	/// Prefix of the catalog endpoints, without trailing slash.
	pub api_base: String,
	/// Page size used when the URL doesn't carry a valid `limit`.
	pub default_limit: u32,
	/// How far below the viewport the infinite-scroll sentinel triggers.
	pub scroll_root_margin: String,
	/// Maximum log level, one of `trace`, `debug`, `info`, `warn` or `error`.
	pub log_level: String,
}
impl Default for Config {
	fn default() -> Self {
		Self {
			root_id: String::from("root"),
			storage_key: String::from("app-cart-items"),
			api_base: String::from("/api"),
			default_limit: 20,
			scroll_root_margin: String::from("200px"),
			log_level: String::from("info"),
		}
	}
}
impl Config {
	/// Parses a JSON configuration. Missing fields take their defaults.
	///
	/// # Errors
	///
	/// Iff `json` isn't a JSON object with fields of the right types.
	pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
		// Derived `Deserialize` would also take a sequence of fields.
		let object: Map<String, Value> = serde_json::from_str(json)?;
		serde_json::from_value(Value::Object(object))
	}

	#[must_use]
	pub fn max_level(&self) -> Level {
		self.log_level.parse().unwrap_or(Level::INFO)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_other_defaults() {
		let config = Config::parse(r#"{"rootId": "app", "defaultLimit": 10, "logLevel": "debug"}"#).unwrap();
		assert_eq!(config.root_id, "app");
		assert_eq!(config.default_limit, 10);
		assert_eq!(config.max_level(), Level::DEBUG);
		assert_eq!(config.storage_key, "app-cart-items");
	}

	#[test]
	fn only_well_typed_objects_parse() {
		assert_eq!(Config::parse("{}").unwrap(), Config::default());
		assert!(Config::parse("{").is_err());
		assert!(Config::parse(r#"{"defaultLimit": "many"}"#).is_err());
		assert!(Config::parse("[]").is_err());
		assert!(Config::parse(r#"["app", "cart"]"#).is_err());
		assert!(Config::parse("null").is_err());
	}

	#[test]
	fn unknown_level_is_info() {
		let config = Config {
			log_level: String::from("loud"),
			..Config::default()
		};
		assert_eq!(config.max_level(), Level::INFO);
	}
}
