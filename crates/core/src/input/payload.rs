//! Wire payloads for `POST /instances/{id}/submit-data`.

/// A file attached to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field the file belongs to; becomes the multipart part name.
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Body of a submit-data request. The shape depends on the input kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitPayload {
    /// Signature, selection and validation inputs.
    Json(serde_json::Value),
    /// Generic forms: text parts plus one part per attached file.
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

impl SubmitPayload {
    /// Names of every part (multipart) or top-level key (JSON), in order.
    pub fn part_names(&self) -> Vec<&str> {
        match self {
            Self::Json(value) => value
                .as_object()
                .map(|m| m.keys().map(String::as_str).collect())
                .unwrap_or_default(),
            Self::Multipart { fields, files } => fields
                .iter()
                .map(|(name, _)| name.as_str())
                .chain(files.iter().map(|f| f.field.as_str()))
                .collect(),
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }
}
