use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Names of the source CSV columns the transform selects.
///
/// Defaults to the Deutsche Börse Xetra public data set headers. Any other
/// column in a source file is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceColumns {
    pub isin: String,
    pub date: String,
    pub time: String,
    pub start_price: String,
    pub max_price: String,
    pub min_price: String,
    pub end_price: String,
    pub traded_volume: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            isin: "ISIN".into(),
            date: "Date".into(),
            time: "Time".into(),
            start_price: "StartPrice".into(),
            max_price: "MaxPrice".into(),
            min_price: "MinPrice".into(),
            end_price: "EndPrice".into(),
            traded_volume: "TradedVolume".into(),
        }
    }
}

impl SourceColumns {
    /// Selected column names, in source order.
    pub fn names(&self) -> [&str; 8] {
        [
            self.isin.as_str(),
            self.date.as_str(),
            self.time.as_str(),
            self.start_price.as_str(),
            self.max_price.as_str(),
            self.min_price.as_str(),
            self.end_price.as_str(),
            self.traded_volume.as_str(),
        ]
    }
}

/// Column layout of the written daily report.
pub struct ReportSchema;

impl ReportSchema {
    pub const ISIN: &'static str = "ISIN";
    pub const DATE: &'static str = "Date";
    pub const OPENING_PRICE: &'static str = "opening_price_eur";
    pub const CLOSING_PRICE: &'static str = "closing_price_eur";
    pub const MINIMUM_PRICE: &'static str = "minimum_price_eur";
    pub const MAXIMUM_PRICE: &'static str = "maximum_price_eur";
    pub const TRADED_VOLUME: &'static str = "daily_traded_volume";
    pub const PREV_CLOSING_PRICE: &'static str = "prev_closing_price";

    /// Get the report schema
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(Self::ISIN.into(), DataType::String),
            Field::new(Self::DATE.into(), DataType::Date),
            Field::new(Self::OPENING_PRICE.into(), DataType::Float64),
            Field::new(Self::CLOSING_PRICE.into(), DataType::Float64),
            Field::new(Self::MINIMUM_PRICE.into(), DataType::Float64),
            Field::new(Self::MAXIMUM_PRICE.into(), DataType::Float64),
            Field::new(Self::TRADED_VOLUME.into(), DataType::Float64),
            Field::new(Self::PREV_CLOSING_PRICE.into(), DataType::Float64),
        ])
    }

    /// Validate DataFrame against schema
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema();
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}
