use platform::middleware::correlation::{
    CorrelationId, CorrelationIdSource, UuidCorrelationIdSource,
};
use uuid::Uuid;

/// `<prefix>-<uuid>` ids, so traces started here are easy to spot in shared logs.
#[derive(Debug, Clone)]
pub struct PrefixedCorrelationIdSource {
    prefix: String,
}

impl PrefixedCorrelationIdSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl CorrelationIdSource for PrefixedCorrelationIdSource {
    fn generate(&self) -> CorrelationId {
        // A prefix that is not header-safe falls back to a plain UUID
        CorrelationId::parse(&format!("{}-{}", self.prefix, Uuid::new_v4().simple()))
            .unwrap_or_else(|| UuidCorrelationIdSource.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_the_prefix() {
        let id = PrefixedCorrelationIdSource::new("rs").generate();
        assert!(id.as_str().starts_with("rs-"));
        assert_eq!(id.as_str().len(), 3 + 32);
    }

    #[test]
    fn unusable_prefix_falls_back_to_uuid() {
        let id = PrefixedCorrelationIdSource::new("bad prefix").generate();
        assert_eq!(id.as_str().len(), 36);
    }
}
