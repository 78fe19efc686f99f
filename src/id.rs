use uuid::Uuid;

/// Source of tokens used as deduplication and grouping ids.
///
/// Implementations must return values that are unique with overwhelming
/// probability across calls unless the caller deliberately wants collisions
/// (for example to let the broker suppress duplicates).
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random UUID v4 tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_id(&self) -> String {
        (self)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_tokens_do_not_repeat() {
        let generator = UuidGenerator;
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn closures_can_act_as_generators() {
        let generator = || "fixed".to_string();
        assert_eq!(generator.next_id(), "fixed");
    }
}
