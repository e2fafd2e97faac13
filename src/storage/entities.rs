use std::collections::BTreeMap;

use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A single logged work session as it is stored on disk and sent over the API.
///
/// Every field is kept as raw text so that partially malformed records survive a round-trip. Date
/// and time parsing happens lazily in [crate::utils::time]. Fields the application doesn't know
/// about are kept in `extra` and written back untouched.
///
/// A known field holding something other than a string is read as an empty string. The original
/// value is remembered and written back for as long as the field stays empty.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct TimeEntry {
    pub id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time_in: String,
    /// `HH:MM`
    pub time_out: String,
    pub course_name: String,
    pub work_markdown: String,
    /// ISO-8601 timestamp
    pub created_at: String,
    pub extra: Map<String, Value>,
    pub(crate) non_text: Map<String, Value>,
}

const ID: &str = "id";
const DATE: &str = "date";
const TIME_IN: &str = "timeIn";
const TIME_OUT: &str = "timeOut";
const COURSE_NAME: &str = "courseName";
const WORK_MARKDOWN: &str = "workMarkdown";
const CREATED_AT: &str = "createdAt";

const TEXT_FIELDS: [&str; 7] = [
    ID,
    DATE,
    TIME_IN,
    TIME_OUT,
    COURSE_NAME,
    WORK_MARKDOWN,
    CREATED_AT,
];

impl TimeEntry {
    fn text_fields(&self) -> [(&'static str, &str); 7] {
        [
            (ID, self.id.as_str()),
            (DATE, self.date.as_str()),
            (TIME_IN, self.time_in.as_str()),
            (TIME_OUT, self.time_out.as_str()),
            (COURSE_NAME, self.course_name.as_str()),
            (WORK_MARKDOWN, self.work_markdown.as_str()),
            (CREATED_AT, self.created_at.as_str()),
        ]
    }
}

impl Serialize for TimeEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(TEXT_FIELDS.len() + self.extra.len()))?;
        for (key, text) in self.text_fields() {
            match self.non_text.get(key) {
                Some(original) if text.is_empty() => map.serialize_entry(key, original)?,
                _ => map.serialize_entry(key, text)?,
            }
        }
        for (key, value) in &self.extra {
            if !TEXT_FIELDS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TimeEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        let mut non_text = Map::new();
        let mut take = |key: &str| match extra.remove(key) {
            Some(Value::String(v)) => v,
            Some(other) => {
                non_text.insert(key.to_string(), other);
                String::new()
            }
            None => String::new(),
        };

        let id = take(ID);
        let date = take(DATE);
        let time_in = take(TIME_IN);
        let time_out = take(TIME_OUT);
        let course_name = take(COURSE_NAME);
        let work_markdown = take(WORK_MARKDOWN);
        let created_at = take(CREATED_AT);

        Ok(Self {
            id,
            date,
            time_in,
            time_out,
            course_name,
            work_markdown,
            created_at,
            extra,
            non_text,
        })
    }
}

impl TimeEntry {
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    pub fn with_date(self, date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..self
        }
    }

    pub fn with_times(self, time_in: impl Into<String>, time_out: impl Into<String>) -> Self {
        Self {
            time_in: time_in.into(),
            time_out: time_out.into(),
            ..self
        }
    }

    pub fn with_course(self, course_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            ..self
        }
    }

    pub fn with_created_at(self, created_at: impl Into<String>) -> Self {
        Self {
            created_at: created_at.into(),
            ..self
        }
    }
}

/// Hourly rate per trimmed course name.
pub type CourseRates = BTreeMap<String, f64>;

/// Rates as they are found on disk. Values that aren't usable rates are kept so that rewriting the
/// document doesn't lose them.
pub type StoredRates = BTreeMap<String, Value>;

/// Reads a rate given either as a json number or as a numeric string.
pub fn rate_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(v) => v.as_f64(),
        Value::String(v) => v.trim().parse::<f64>().ok(),
        _ => None,
    }
}
