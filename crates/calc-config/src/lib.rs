// calc-config/src/lib.rs

use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use calc_types::{
	Address, CalculatorConfig, ConfigSchema, Field, FieldType, Schema, ValidationError,
};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Schema error: {0}")]
	Schema(#[from] ValidationError),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Schema of the whole configuration file.
pub struct CalculatorConfigSchema;

impl CalculatorConfigSchema {
	fn engine() -> Schema {
		Schema::new(
			vec![Field::new("name", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some(name) if !name.trim().is_empty() => Ok(()),
					_ => Err("must not be empty".to_string()),
				}
			})],
			vec![
				Field::new("log_level", FieldType::String),
				Field::new(
					"max_price_age_secs",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
		)
	}

	fn strategies() -> Schema {
		Schema::new(
			vec![
				Field::new("phase_selector", FieldType::Address),
				Field::new("chunked_unlock", FieldType::Address),
				Field::new("linear_decay", FieldType::Address),
				Field::new("fixed_price_whitelist", FieldType::Address),
			],
			vec![Field::new("hybrid_ramp", FieldType::Address)],
		)
	}

	fn feed() -> Schema {
		Schema::new(
			vec![
				Field::new("answer", FieldType::Int),
				Field::new(
					"decimals",
					FieldType::Integer {
						min: Some(0),
						max: Some(77),
					},
				),
			],
			vec![Field::new(
				"updated_at",
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			)],
		)
	}
}

impl ConfigSchema for CalculatorConfigSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("engine", FieldType::Table(Self::engine())),
				Field::new("strategies", FieldType::Table(Self::strategies())),
			],
			vec![],
		);
		schema.validate(config)?;

		// Feed keys are addresses, so each entry is checked under its own path
		if let Some(oracles) = config.get("oracles") {
			let table = oracles
				.as_table()
				.ok_or_else(|| ValidationError::TypeMismatch {
					field: "oracles".to_string(),
					expected: "table".to_string(),
					actual: oracles.type_str().to_string(),
				})?;

			for (key, feed) in table {
				let path = format!("oracles.{}", key);
				if key.len() != 42 || !key.starts_with("0x") || Address::from_str(key).is_err() {
					return Err(ValidationError::InvalidValue {
						field: path,
						message: "feed key must be a 0x-prefixed 20-byte address".to_string(),
					});
				}
				Self::feed().validate_at(&path, feed)?;
			}
		}

		Ok(())
	}
}

/// Configuration loader with environment variable substitution
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "CALC_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<CalculatorConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		let mut config = self.load_from_file(file_path).await?;

		self.apply_env_overrides(&mut config)?;

		info!("Loaded configuration from {}", file_path);
		Ok(config)
	}

	/// Parses configuration text as if it had been read from a file.
	pub fn load_from_str(&self, content: &str) -> Result<CalculatorConfig, ConfigError> {
		let substituted_content = self.substitute_env_vars(content)?;

		let raw: toml::Value = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;
		CalculatorConfigSchema.validate(&raw)?;

		let config: CalculatorConfig = raw
			.try_into()
			.map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<CalculatorConfig, ConfigError> {
		let content = match tokio::fs::read_to_string(file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(file_path.to_string()))
			}
			Err(e) => return Err(e.into()),
		};

		self.load_from_str(&content)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = regex::Regex::new(r"\$\{([^}]+)\}")
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			debug!("Substituting ${{{}}}", var_name);
			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut CalculatorConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.engine.log_level = log_level;
		}

		if let Ok(max_age) = env::var(format!("{}MAX_PRICE_AGE_SECS", self.env_prefix)) {
			let secs: u64 = max_age.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid max price age: {}", e))
			})?;
			// zero switches the staleness check off
			config.engine.max_price_age_secs = (secs > 0).then_some(secs);
		}

		Ok(())
	}

	fn validate_config(&self, config: &CalculatorConfig) -> Result<(), ConfigError> {
		let s = &config.strategies;
		let mut references = vec![
			s.phase_selector,
			s.chunked_unlock,
			s.linear_decay,
			s.fixed_price_whitelist,
		];
		references.extend(s.hybrid_ramp);

		if references.contains(&Address::ZERO) {
			return Err(ConfigError::ValidationError(
				"Strategy references must not be the zero address".to_string(),
			));
		}

		let unique: HashSet<_> = references.iter().collect();
		if unique.len() != references.len() {
			return Err(ConfigError::ValidationError(
				"Each strategy must have its own reference".to_string(),
			));
		}

		Ok(())
	}
}
