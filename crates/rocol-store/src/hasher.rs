use rocol_types::ObjectId;

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so file content and object-path digests can never collide
/// even when fed identical bytes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for file content blobs.
    pub const CONTENT: Self = Self {
        domain: "rocol-content-v1",
    };
    /// Hasher mapping object ids to storage directory names.
    pub const OBJECT_PATH: Self = Self {
        domain: "rocol-object-path-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(ContentHasher::CONTENT.hash(data), ContentHasher::CONTENT.hash(data));
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        assert_ne!(
            ContentHasher::CONTENT.hash(data),
            ContentHasher::OBJECT_PATH.hash(data)
        );
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::CONTENT.hash(b"original");
        assert!(ContentHasher::CONTENT.verify(b"original", &id));
        assert!(!ContentHasher::CONTENT.verify(b"tampered", &id));
    }

    #[test]
    fn domain_separated_from_raw_digest() {
        assert_ne!(ContentHasher::CONTENT.hash(b"x"), ObjectId::from_bytes(b"x"));
    }
}
