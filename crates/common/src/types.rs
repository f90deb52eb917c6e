use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stored document.
///
/// Wraps a UUID so that document keys cannot be confused with other
/// UUID-based values. Typed ids produced by [`document_id!`] convert into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new random document ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a document ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Derives a stable name-based ID (UUID v5) within `namespace`.
    ///
    /// The same namespace and name always yield the same ID.
    pub fn derived(namespace: DocumentId, name: &[u8]) -> Self {
        Self(Uuid::new_v5(&namespace.0, name))
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<DocumentId> for Uuid {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Declares a typed identifier backed by a [`DocumentId`].
///
/// The generated type is serde-transparent, so it serializes as a bare UUID
/// string. The invoking crate must depend on `serde`.
#[macro_export]
macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($crate::DocumentId);

        impl $name {
            /// Creates a new random ID.
            pub fn new() -> Self {
                Self($crate::DocumentId::new())
            }

            /// Creates an ID from an existing UUID.
            pub fn from_uuid(uuid: $crate::Uuid) -> Self {
                Self($crate::DocumentId::from_uuid(uuid))
            }

            /// Returns the underlying document ID.
            pub fn document_id(&self) -> $crate::DocumentId {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = <$crate::DocumentId as std::str::FromStr>::Err;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<$crate::DocumentId> for $name {
            fn from(id: $crate::DocumentId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $crate::DocumentId {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_new_creates_unique_ids() {
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn document_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = DocumentId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn document_id_derived_is_stable_per_name() {
        let namespace = DocumentId::new();
        let a = DocumentId::derived(namespace, b"alpha");

        assert_eq!(a, DocumentId::derived(namespace, b"alpha"));
        assert_ne!(a, DocumentId::derived(namespace, b"beta"));
        assert_ne!(a, DocumentId::derived(DocumentId::new(), b"alpha"));
    }

    #[test]
    fn document_id_parses_from_string() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn document_id_serializes_as_bare_uuid() {
        let id = DocumentId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }

    crate::document_id!(
        /// Test-only typed id.
        WidgetId
    );

    #[test]
    fn typed_id_converts_to_and_from_document_id() {
        let widget = WidgetId::new();
        let doc: DocumentId = widget.into();
        assert_eq!(WidgetId::from(doc), widget);
        assert_eq!(widget.to_string(), doc.to_string());
    }
}
