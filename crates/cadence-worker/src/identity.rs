use uuid::Uuid;

/// Identity a worker presents as `lock_holder`.
///
/// Formed from a role prefix plus a fresh random token at construction, so
/// two worker instances are always distinguishable for lease-ownership
/// checks. A restarted process gets a new identity and can never resume a
/// previous instance's lease implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerIdentity(String);

impl ConsumerIdentity {
    pub fn new(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConsumerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
