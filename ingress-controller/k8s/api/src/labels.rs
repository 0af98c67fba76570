use std::collections::BTreeMap;

pub type Map = BTreeMap<String, String>;

/// Selects pods by label equality, as a Service's `spec.selector` does.
///
/// Every pair must match. Unlike a Kubernetes list selector, an empty selector matches no pods:
/// a Service without a selector must never attach every pod in its namespace.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Selector(Map);

// === impl Selector ===

impl Selector {
    pub fn from_map(map: Map) -> Self {
        Self(map)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, labels: &Map) -> bool {
        if self.0.is_empty() {
            return false;
        }

        self.0.iter().all(|(k, v)| labels.get(k) == Some(v))
    }

    /// Tests an object's optional label map.
    pub fn matches_labels(&self, labels: Option<&Map>) -> bool {
        match labels {
            Some(labels) => self.matches(labels),
            None => false,
        }
    }
}

/// Formats the selector as a Kubernetes label-selector query string, e.g. `app=demo,tier=web`.
impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

impl From<Map> for Selector {
    fn from(map: Map) -> Self {
        Self::from_map(map)
    }
}

impl std::iter::FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}
