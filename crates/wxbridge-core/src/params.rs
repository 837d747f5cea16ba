//! Query parameters of a PWS upload.

use serde::Deserialize;

/// Query parameter carrying the station timestamp.
pub const DATEUTC: &str = "dateutc";
/// Station credential parameters, replaced before forwarding upstream.
pub const STATION_ID: &str = "ID";
pub const STATION_KEY: &str = "PASSWORD";

/// Ordered query parameters as sent by the station.
///
/// Duplicate keys keep their first occurrence, matching how the upload
/// format is read by the upstream service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct StationParams {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for StationParams {
    fn from(raw: Vec<(String, String)>) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            if !pairs.iter().any(|(k, _)| *k == key) {
                pairs.push((key, value));
            }
        }
        Self { pairs }
    }
}

impl<K, V> FromIterator<(K, V)> for StationParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Vec<_>>()
            .into()
    }
}

impl StationParams {
    /// Raw value of `key`, if the station sent it.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `key`, treating an empty value as not reported.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw(key).filter(|v| !v.trim().is_empty())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Replace `key` in place, or append it if missing.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    /// Copy with the station credentials substituted where configured.
    pub fn with_credentials(&self, station_id: Option<&str>, station_key: Option<&str>) -> Self {
        let mut out = self.clone();
        if let Some(id) = station_id.filter(|s| !s.is_empty()) {
            out.set(STATION_ID, id);
        }
        if let Some(key) = station_key.filter(|s| !s.is_empty()) {
            out.set(STATION_KEY, key);
        }
        out
    }
}
