//! Structured output records for decoded readings

use crate::message::DecodedReading;

/// Output field keys, in emission order
pub const OUTPUT_FIELDS: &[&str] = &[
    "model",
    "id",
    "channel",
    "battery_ok",
    "temperature_C",
    "humidity",
    "wind_avg_m_s",
    "wind_dir_deg",
    "datetime_raw",
    "datetime_maybe",
    "mic",
];

/// A typed output value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataValue {
    /// Free text
    String(String),
    /// Integer
    Int(i64),
    /// Decimal printed with a fixed number of fractional digits
    Double {
        /// Value
        value: f64,
        /// Fractional digits
        precision: usize,
    },
    /// Zero-padded lowercase hex
    Hex {
        /// Value
        value: u32,
        /// Minimum digits
        width: usize,
    },
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Int(n) => write!(f, "{}", n),
            DataValue::Double { value, precision } => write!(f, "{:.*}", *precision, value),
            DataValue::Hex { value, width } => write!(f, "{:0width$x}", value, width = *width),
        }
    }
}

/// A named, labelled output value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataField {
    /// Machine key
    pub key: String,
    /// Human-readable label
    pub label: String,
    /// Value
    pub value: DataValue,
}

impl DataField {
    /// Create a new field
    pub fn new(key: impl Into<String>, label: impl Into<String>, value: DataValue) -> Self {
        DataField {
            key: key.into(),
            label: label.into(),
            value,
        }
    }
}

/// A flat record of output fields
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    fields: Vec<DataField>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    /// Append a field
    pub fn push(&mut self, field: DataField) {
        self.fields.push(field);
    }

    /// Get all fields in order
    pub fn fields(&self) -> &[DataField] {
        &self.fields
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| &field.value)
    }

    /// Render as a flat JSON object
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for field in &self.fields {
            let value = match &field.value {
                DataValue::String(s) => serde_json::Value::from(s.as_str()),
                DataValue::Int(n) => serde_json::Value::from(*n),
                DataValue::Double { value, precision } => {
                    let factor = 10f64.powi(*precision as i32);
                    serde_json::Value::from((value * factor).round() / factor)
                }
                DataValue::Hex { .. } => serde_json::Value::from(field.value.to_string()),
            };
            map.insert(field.key.clone(), value);
        }
        serde_json::Value::Object(map)
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for field in &self.fields {
            writeln!(f, "{:<16}: {}", field.key, field.value)?;
        }
        Ok(())
    }
}

impl From<&DecodedReading> for Record {
    fn from(reading: &DecodedReading) -> Self {
        let mut record = Record::new();
        let mut add = |key: &str, label: &str, value: DataValue| {
            record.push(DataField::new(key, label, value));
        };

        add("model", "", DataValue::String(reading.model().to_string()));
        add("id", "House Code", DataValue::Int(reading.id.into()));
        add("channel", "Channel", DataValue::Int(reading.channel.into()));
        add(
            "battery_ok",
            "Battery_OK",
            DataValue::Int(reading.battery_ok.into()),
        );
        add(
            "temperature_C",
            "Temperature_C",
            DataValue::Double {
                value: reading.temperature_c(),
                precision: 1,
            },
        );
        add("humidity", "Humidity", DataValue::Int(reading.humidity.into()));
        add(
            "wind_avg_m_s",
            "WindSpeed m_s",
            DataValue::Double {
                value: reading.wind_speed_m_s(),
                precision: 1,
            },
        );
        add(
            "wind_dir_deg",
            "Wind direction",
            DataValue::Double {
                value: reading.wind_dir_deg(),
                precision: 1,
            },
        );
        add(
            "datetime_raw",
            "Raw DCF77",
            DataValue::Hex {
                value: reading.datetime_raw,
                width: 8,
            },
        );
        add(
            "datetime_maybe",
            "Maybe DCF77",
            DataValue::String(reading.datetime_maybe().to_string()),
        );
        add("mic", "Integrity", DataValue::String(reading.mic().to_string()));

        record
    }
}

/// Consumer of decoded records
pub trait OutputSink {
    /// Accept one record
    fn emit(&mut self, record: Record);
}

impl OutputSink for Vec<Record> {
    fn emit(&mut self, record: Record) {
        self.push(record);
    }
}
