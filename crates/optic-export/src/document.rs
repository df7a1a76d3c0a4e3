//! The canonical wire document handed to the transport layer

use serde_json::{Map, Value as Json};
use sha2::{Digest, Sha256};
use std::fmt;

/// Key the operator tree is nested under
pub const ROOT_KEY: &str = "$optic";

/// `{"$optic": {"namespace":"op","operation":"operators","args":[...]}}`
#[derive(Debug, Clone, PartialEq)]
pub struct WireDocument {
    root: Json,
}

impl WireDocument {
    pub fn new(operators: Json) -> Self {
        let mut root = Map::new();
        root.insert(ROOT_KEY.to_string(), operators);
        Self {
            root: Json::Object(root),
        }
    }

    /// The `operators` node under the root key
    pub fn operators(&self) -> &Json {
        &self.root[ROOT_KEY]
    }

    pub fn as_json(&self) -> &Json {
        &self.root
    }

    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.root).expect("JSON values always serialize")
    }

    /// SHA-256 of the compact serialization, for deterministic caching
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Display for WireDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl From<WireDocument> for Json {
    fn from(doc: WireDocument) -> Self {
        doc.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_key() {
        let doc = WireDocument::new(json!({"namespace": "op", "operation": "operators", "args": []}));
        assert_eq!(doc.operators()["operation"], "operators");
        assert!(doc.as_json().get(ROOT_KEY).is_some());
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = WireDocument::new(json!({"namespace": "op", "operation": "operators", "args": [1]}));
        let b = a.clone();
        let c = WireDocument::new(json!({"namespace": "op", "operation": "operators", "args": [2]}));

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
