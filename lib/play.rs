use crate::arbiter::Arbiter;
use crate::game::Outcome;
use async_trait::async_trait;

/// Trait for types that observe the progress of a match.
///
/// Notifications are delivered outside the arbiter's mutual-exclusion
/// boundary, so handlers may call back into the arbiter's read-only
/// accessors without deadlocking.
pub trait Observer: Send + Sync {
    /// A move was executed, given in the game's notation.
    fn moved(&self, text: &str);

    /// The match ended.
    fn ended(&self, outcome: &Outcome);
}

/// Trait for types that produce moves for one side of a match.
#[async_trait]
#[cfg_attr(test, mockall::automock(type Error = String;))]
pub trait Actor: Send {
    /// The reason why no move could be produced.
    type Error;

    /// Produces the next move, in the game's notation.
    ///
    /// May block indefinitely; the arbiter cancels pending calls when the
    /// match is terminated.
    async fn act(&mut self, arbiter: &Arbiter) -> Result<String, Self::Error>;

    /// A move was executed.
    fn moved(&mut self, _text: &str) {}

    /// The match ended.
    fn ended(&mut self, _outcome: &Outcome) {}
}

#[cfg(test)]
mockall::mock! {
    pub Observer {}

    impl Observer for Observer {
        fn moved(&self, text: &str);
        fn ended(&self, outcome: &Outcome);
    }
}
