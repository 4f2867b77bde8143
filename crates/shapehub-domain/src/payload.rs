//! Opaque shape payload

use std::fmt;
use std::sync::Arc;

/// The exportable content of a shape.
///
/// The catalog service hands this out as text and the host application
/// interprets it; nothing in shapehub looks inside. Clones share the buffer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Payload(Arc<str>);

impl Payload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether two payloads point at the same buffer
    pub fn ptr_eq(&self, other: &Payload) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for Payload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Payloads can be large XML blobs; keep Debug output readable.
impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_buffer() {
        let a = Payload::from("<Shape/>");
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(b.as_str(), "<Shape/>");
    }

    #[test]
    fn debug_hides_content() {
        let p = Payload::from("secret-ish");
        assert_eq!(format!("{:?}", p), "Payload(10 bytes)");
    }
}
