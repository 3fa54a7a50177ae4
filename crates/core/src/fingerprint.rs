//! Content fingerprints used for deduplication.
//!
//! A fingerprint is the lowercase hex MD5 digest of a payload. Collision
//! resistance against an adversary is not required here, only determinism.

/// Computes the fingerprint of a complete payload.
pub fn fingerprint(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Incremental fingerprinting for payloads that arrive in pieces.
pub struct Fingerprinter {
    context: md5::Context,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self {
            context: md5::Context::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    pub fn finish(self) -> String {
        format!("{:x}", self.context.compute())
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}
