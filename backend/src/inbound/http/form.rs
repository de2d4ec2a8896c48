//! Typed access to urlencoded request data.
//!
//! [`FormData`] merges the query string with an urlencoded body into a
//! multi-map. Missing fields read as the empty string, which is what the view
//! models expect from HTML forms.

use std::collections::HashMap;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

/// Multi-valued form fields. Query parameters come before body fields.
///
/// # Examples
/// ```
/// use recipebox::inbound::http::form::FormData;
///
/// let form = FormData::parse("search_text=eggs", b"i_name=spam&i_name=eggs");
/// assert_eq!(form.value("search_text"), "eggs");
/// assert_eq!(form.values("i_name"), ["spam", "eggs"]);
/// assert_eq!(form.value("missing"), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
}

impl FormData {
    /// Decode a query string and an urlencoded body.
    pub fn parse(query: &str, body: &[u8]) -> Self {
        Self::from_pairs(
            url::form_urlencoded::parse(query.as_bytes())
                .chain(url::form_urlencoded::parse(body))
                .map(|(key, value)| (key.into_owned(), value.into_owned())),
        )
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            fields.entry(key.into()).or_default().push(value.into());
        }
        Self { fields }
    }

    /// First value for `name`, or `""` when absent.
    pub fn value(&self, name: &str) -> &str {
        self.values(name).first().map_or("", String::as_str)
    }

    /// Every value for `name` in submission order.
    pub fn values(&self, name: &str) -> &[String] {
        self.fields.get(name).map_or(&[][..], Vec::as_slice)
    }

    /// Split a textarea into trimmed, non-blank lines.
    pub fn lines(&self, name: &str) -> Vec<String> {
        self.value(name)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Checkbox semantics: present and not an explicit "off" value.
    pub fn checked(&self, name: &str) -> bool {
        let value = self.value(name).trim();
        !value.is_empty() && !matches!(value.to_lowercase().as_str(), "off" | "false" | "0")
    }
}

impl FromRequest for FormData {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let query = req.query_string().to_owned();
        let body = web::Bytes::from_request(req, payload);
        Box::pin(async move {
            let body = body.await?;
            Ok(Self::parse(&query, &body))
        })
    }
}
