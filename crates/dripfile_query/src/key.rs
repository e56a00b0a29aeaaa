use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn collection(resource: &str) -> Self {
        Self(vec![resource.to_string()])
    }

    pub fn record(resource: &str, id: &str) -> Self {
        Self(vec![resource.to_string(), id.to_string()])
    }

    /// Segment-wise prefix match; `["location"]` matches `["location", "x"]`
    /// but not `["locations"]`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{segment:?}")?;
        }
        f.write_str("]")
    }
}
