//! ISS URL and query parameter construction.

use moexiss_types::ValidationError;

/// Base URL of the ISS API.
pub const BASE_URL: &str = "https://iss.moex.com/iss";

/// Response format suffix appended to every resource path.
pub const FORMAT_SUFFIX: &str = ".json";

/// Builds a resource URL from a base URL and an endpoint template.
///
/// Every `[name]` placeholder in `endpoint` is replaced by the matching
/// path parameter. The base and endpoint are joined with exactly one slash
/// and `.json` is appended when the path lacks it.
///
/// # Example
///
/// ```
/// use moexiss_fetch::url::build_url;
///
/// let url = build_url(
///     "https://iss.moex.com/iss",
///     "/engines/[engine]/markets/[market]/securities",
///     &[("engine", "stock"), ("market", "shares")],
/// )
/// .unwrap();
/// assert_eq!(url, "https://iss.moex.com/iss/engines/stock/markets/shares/securities.json");
/// ```
///
/// # Errors
///
/// Returns [`ValidationError::UnresolvedPlaceholder`] if a placeholder has no
/// matching parameter.
pub fn build_url<K, V>(base_url: &str, endpoint: &str, path_params: &[(K, V)]) -> Result<String, ValidationError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut path = endpoint.to_string();
    for (key, value) in path_params {
        path = path.replace(&format!("[{}]", key.as_ref()), value.as_ref());
    }

    if let Some(placeholder) = unresolved_placeholder(&path) {
        return Err(ValidationError::UnresolvedPlaceholder {
            placeholder: placeholder.to_string(),
            endpoint: endpoint.to_string(),
        });
    }

    let mut url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    if !url.ends_with(FORMAT_SUFFIX) {
        url.push_str(FORMAT_SUFFIX);
    }
    Ok(url)
}

fn unresolved_placeholder(path: &str) -> Option<&str> {
    let open = path.find('[')?;
    let rest = &path[open + 1..];
    let close = rest.find(']')?;
    Some(&rest[..close])
}

/// A query parameter value before string conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Sent as is.
    Text(String),
    /// Sent in decimal.
    Integer(i64),
    /// Sent as `"1"` or `"0"`.
    Bool(bool),
    /// Sent comma-joined.
    List(Vec<String>),
    /// Not sent at all.
    Absent,
}

impl ParamValue {
    /// Renders the value as the API expects it, or `None` for
    /// [`ParamValue::Absent`].
    #[must_use]
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::List(items) => Some(items.join(",")),
            Self::Absent => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u8> for ParamValue {
    fn from(value: u8) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sets a parameter, replacing any earlier value for the same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a parameter in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns true if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the parameters as string pairs, dropping absent values.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.render().map(|v| (name.clone(), v)))
            .collect()
    }
}
