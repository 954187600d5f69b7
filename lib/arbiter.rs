use crate::board::{Board, Color, Move, Placement};
use crate::clock::{Clock, UNTIMED};
use crate::game::{Game, Outcome, PlayError};
use crate::play::{Actor, Observer};
use crate::setup::TimeControl;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, warn};

/// A plain-data image of a match for the persistence collaborator.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// The name of the ruleset the match is played by.
    pub rules: String,

    /// The canonical notation of every move played, in order.
    pub moves: Vec<String>,

    /// The side that played each move.
    pub turns: Vec<Color>,

    /// The time each executed move took.
    pub times: Vec<Duration>,

    /// The current arrangement of pieces.
    pub board: Placement,

    /// The termination verdict, if the match has ended.
    pub outcome: Option<Outcome>,
}

/// What became of one submitted move.
enum Step {
    Played,
    Finished(Outcome),
    Discarded,
    Stopped,
    Faulted,
}

struct Inner {
    game: Mutex<Game>,
    clocks: [Option<Clock>; 2],
    observers: Vec<Arc<dyn Observer>>,
    times: Mutex<Vec<Duration>>,
    outcome: OnceLock<Outcome>,
    over: AtomicBool,
    cycle: OnceLock<AbortHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn clock(&self, color: Color) -> Option<&Clock> {
        self.clocks[color.index()].as_ref()
    }

    fn halt(&self) {
        self.over.store(true, Ordering::Relaxed);

        if let Some(cycle) = self.cycle.get() {
            cycle.abort();
        }

        for clock in self.clocks.iter().flatten() {
            clock.cancel();
        }
    }

    /// The clock-expiry path.
    ///
    /// Runs on the clock's callback context, never under the game mutex; the
    /// outcome slot is write-once, so a racing move execution re-checks it
    /// instead of assuming freshness.
    fn forfeit(weak: &Weak<Inner>, loser: Color) {
        let Some(inner) = weak.upgrade() else { return };

        let outcome = Outcome::time_forfeit(loser);

        if inner.outcome.set(outcome.clone()).is_ok() {
            for observer in &inner.observers {
                observer.ended(&outcome);
            }

            inner.halt();
        }
    }
}

/// Orchestrates a live match between two independently paced actors.
///
/// Cheap to clone; all clones share the same match. The turn-cycle task is
/// the only writer of the match state, so every other accessor is read-only.
#[derive(Clone)]
pub struct Arbiter {
    inner: Arc<Inner>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Arbiter {
    /// Starts a match between `white` and `black`.
    ///
    /// Each timed side gets a [`Clock`] that is started and immediately
    /// paused, so no wall-clock time leaks before the first move; only the
    /// first mover's clock is then resumed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<W, B>(
        game: Game,
        control: TimeControl,
        white: W,
        black: B,
        observers: Vec<Arc<dyn Observer>>,
    ) -> Self
    where
        W: Actor + 'static,
        B: Actor + 'static,
        W::Error: Debug,
        B::Error: Debug,
    {
        let first = game.turn();

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| Inner {
            game: Mutex::new(game),
            clocks: Color::VARIANTS.map(|color| {
                control.budget(color).map(|budget| {
                    let weak = weak.clone();
                    let clock = Clock::start(budget, move || Inner::forfeit(&weak, color));
                    clock.pause();
                    clock
                })
            }),
            observers,
            times: Mutex::new(Vec::new()),
            outcome: OnceLock::new(),
            over: AtomicBool::new(false),
            cycle: OnceLock::new(),
        });

        let arbiter = Arbiter {
            inner,
            task: Arc::new(Mutex::new(None)),
        };

        let task = tokio::spawn(Arbiter::cycle(arbiter.clone(), white, black));
        let _ = arbiter.inner.cycle.set(task.abort_handle());
        *lock(&arbiter.task) = Some(task);

        if let Some(color) = first {
            if let Some(clock) = arbiter.inner.clock(color) {
                clock.resume();
            }
        }

        arbiter
    }

    /// The turn-cycle loop; the sole caller of move execution.
    ///
    /// An invalid move is discarded and the same actor is asked again;
    /// cancellation is a silent exit.
    async fn cycle<W, B>(arbiter: Arbiter, mut white: W, mut black: B)
    where
        W: Actor,
        B: Actor,
        W::Error: Debug,
        B::Error: Debug,
    {
        loop {
            let side = match arbiter.turn() {
                Some(side) if !arbiter.inner.over.load(Ordering::Relaxed) => side,
                _ => break,
            };

            let asked = Instant::now();

            let text = match side {
                Color::White => white.act(&arbiter).await.map_err(|e| format!("{:?}", e)),
                Color::Black => black.act(&arbiter).await.map_err(|e| format!("{:?}", e)),
            };

            let text = match text {
                Ok(text) => text,
                Err(e) => {
                    warn!("the {} player failed to act; {}", side, e);
                    arbiter.terminate();
                    break;
                }
            };

            match arbiter.step(side, &text, asked.elapsed()) {
                Step::Played => {
                    white.moved(&text);
                    black.moved(&text);
                }

                Step::Finished(outcome) => {
                    white.moved(&text);
                    black.moved(&text);
                    white.ended(&outcome);
                    black.ended(&outcome);
                    break;
                }

                Step::Discarded => {}

                Step::Stopped | Step::Faulted => break,
            }
        }
    }

    /// Executes one submitted move.
    ///
    /// Two phases: a guarded mutation under the game mutex producing a
    /// verdict, and an unguarded notification consuming it. The mutex is
    /// released before observers run, so their handlers may call back into
    /// this arbiter.
    fn step(&self, side: Color, text: &str, elapsed: Duration) -> Step {
        if let Some(clock) = self.inner.clock(side) {
            clock.pause();
        }

        let verdict = {
            let mut game = lock(&self.inner.game);

            // a clock may have flagged while the actor was thinking
            if self.inner.outcome.get().is_some() || self.inner.over.load(Ordering::Relaxed) {
                return Step::Stopped;
            }

            game.execute(text)
        };

        match verdict {
            Ok(()) => {
                lock(&self.inner.times).push(elapsed);

                for observer in &self.inner.observers {
                    observer.moved(text);
                }

                if let Some(next) = self.turn() {
                    if let Some(clock) = self.inner.clock(next) {
                        clock.resume();
                    }
                }

                Step::Played
            }

            Err(PlayError::Ended(outcome)) => {
                lock(&self.inner.times).push(elapsed);
                let published = self.inner.outcome.set(outcome.clone()).is_ok();

                for observer in &self.inner.observers {
                    observer.moved(text);
                }

                if published {
                    for observer in &self.inner.observers {
                        observer.ended(&outcome);
                    }
                }

                self.inner.halt();
                Step::Finished(outcome)
            }

            Err(PlayError::Rejected(_)) => {
                warn!("discarding invalid move '{}' by the {} player", text, side);

                if let Some(clock) = self.inner.clock(side) {
                    clock.resume();
                }

                Step::Discarded
            }

            Err(PlayError::Fault(e)) => {
                error!("aborting the match; {}", e);
                self.inner.halt();
                Step::Faulted
            }
        }
    }

    /// The side to move, if the match is still ongoing.
    pub fn turn(&self) -> Option<Color> {
        lock(&self.inner.game).turn()
    }

    /// A deep copy of the live board, for display or lookahead.
    pub fn board(&self) -> Board {
        lock(&self.inner.game).board().clone()
    }

    /// Every legal move in the current position.
    pub fn legal_moves(&self) -> Vec<Move> {
        lock(&self.inner.game).legal_moves().to_vec()
    }

    /// Resolves a move against the current legal set by similarity.
    pub fn validate(&self, m: &Move) -> Option<Move> {
        lock(&self.inner.game).validate(m).cloned()
    }

    /// The termination verdict, if the match has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner
            .outcome
            .get()
            .cloned()
            .or_else(|| lock(&self.inner.game).outcome().cloned())
    }

    /// The time left for the given side, or [`UNTIMED`] if it plays without
    /// a clock.
    pub fn remaining(&self, color: Color) -> Duration {
        self.inner.clock(color).map_or(UNTIMED, Clock::remaining)
    }

    /// Whether the match has been terminated.
    pub fn finished(&self) -> bool {
        self.inner.over.load(Ordering::Relaxed) || self.outcome().is_some()
    }

    /// A plain-data image of this match.
    pub fn snapshot(&self) -> Snapshot {
        let game = lock(&self.inner.game);

        Snapshot {
            rules: game.rules().name().to_string(),
            moves: game.moves().iter().map(|m| game.rules().encode(m)).collect(),
            turns: game.turns().to_vec(),
            times: lock(&self.inner.times).clone(),
            board: game.board().placement(),
            outcome: self
                .inner
                .outcome
                .get()
                .cloned()
                .or_else(|| game.outcome().cloned()),
        }
    }

    /// Terminates the match.
    ///
    /// Idempotent; cancels the turn-cycle task and both clocks, unblocking
    /// any pending actor. Safe to call at any point, including concurrently
    /// with an in-flight move execution.
    pub fn terminate(&self) {
        self.inner.halt();
    }

    /// Waits for the turn-cycle task to end.
    pub async fn wait(&self) {
        let task = lock(&self.task).take();

        if let Some(task) = task {
            // cancellation is a normal exit path
            let _ = task.await;
        }
    }
}

impl Debug for Arbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arbiter")
            .field("outcome", &self.inner.outcome.get())
            .field("over", &self.inner.over.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Cell, Move};
    use crate::play::{MockActor, MockObserver};
    use crate::rules::{Continuation, MockRules, ParseMoveError};
    use futures_util::FutureExt;
    use std::future::{pending, ready};
    use std::sync::atomic::AtomicUsize;
    use tokio::runtime;

    fn rt() -> runtime::Runtime {
        runtime::Builder::new_multi_thread()
            .enable_time()
            .build()
            .unwrap()
    }

    fn pass() -> Move {
        Move::from(vec![])
    }

    /// A ruleset whose only legal move is the empty move, for `plies` plies.
    fn scripted_rules(plies: usize, verdict: Outcome) -> MockRules {
        let mut rules = MockRules::new();
        rules.expect_name().return_const("scripted".to_string());

        rules
            .expect_decode()
            .returning(|_, text| match text {
                "pass" => Ok(pass()),
                _ => Err(ParseMoveError(text.to_string())),
            });

        rules.expect_encode().returning(|m| m.to_string());

        let calls = AtomicUsize::new(0);
        rules.expect_proceed().returning(move |_, turns| {
            if calls.fetch_add(1, Ordering::Relaxed) < plies {
                let turn = turns.last().map_or(Color::White, |last| !*last);
                Ok(Continuation::new(turn, vec![pass()], Vec::new()))
            } else {
                Err(verdict.clone())
            }
        });

        rules
    }

    fn scripted_game(plies: usize, verdict: Outcome) -> Game {
        let board = Board::new([Cell::new(0, 0)]);
        Game::new(Arc::new(scripted_rules(plies, verdict)), board).unwrap()
    }

    fn passive() -> MockActor {
        let mut actor = MockActor::new();
        actor.expect_moved().returning(|_| ());
        actor.expect_ended().returning(|_| ());
        actor
    }

    fn passer(moves: usize) -> MockActor {
        let mut actor = passive();
        actor
            .expect_act()
            .times(moves)
            .returning(|_| ready(Ok("pass".to_string())).boxed());
        actor
    }

    fn stuck() -> MockActor {
        let mut actor = passive();
        actor.expect_act().returning(|_| pending().boxed());
        actor
    }

    #[test]
    fn match_plays_to_the_verdict() {
        rt().block_on(async {
            let verdict = Outcome::Draw {
                reason: "exhaustion".to_string(),
            };

            let mut observer = MockObserver::new();
            observer.expect_moved().times(3).returning(|_| ());

            let seen = verdict.clone();
            observer
                .expect_ended()
                .once()
                .withf(move |o| *o == seen)
                .returning(|_| ());

            let arbiter = Arbiter::start(
                scripted_game(3, verdict.clone()),
                TimeControl::default(),
                passer(2),
                passer(1),
                vec![Arc::new(observer)],
            );

            arbiter.wait().await;

            assert_eq!(arbiter.outcome(), Some(verdict));
            assert_eq!(arbiter.turn(), None);
            assert!(arbiter.legal_moves().is_empty());
            assert!(arbiter.finished());

            let snapshot = arbiter.snapshot();
            assert_eq!(snapshot.rules, "scripted");
            assert_eq!(snapshot.moves, ["", "", ""]);
            assert_eq!(
                snapshot.turns,
                [Color::White, Color::Black, Color::White]
            );
            assert_eq!(snapshot.times.len(), 3);
        });
    }

    #[test]
    fn invalid_moves_are_discarded_and_the_actor_is_asked_again() {
        rt().block_on(async {
            let verdict = Outcome::Draw {
                reason: "exhaustion".to_string(),
            };

            let mut white = passive();
            let attempts = AtomicUsize::new(0);
            white
                .expect_act()
                .times(2)
                .returning(move |_| match attempts.fetch_add(1, Ordering::Relaxed) {
                    0 => ready(Ok("gibberish".to_string())).boxed(),
                    _ => ready(Ok("pass".to_string())).boxed(),
                });

            let arbiter = Arbiter::start(
                scripted_game(1, verdict.clone()),
                TimeControl::default(),
                white,
                passive(),
                Vec::new(),
            );

            arbiter.wait().await;

            assert_eq!(arbiter.outcome(), Some(verdict));
            assert_eq!(arbiter.snapshot().moves.len(), 1);
        });
    }

    #[test]
    fn terminate_is_idempotent_and_unblocks_pending_actors() {
        rt().block_on(async {
            let arbiter = Arbiter::start(
                scripted_game(9, Outcome::Draw {
                    reason: "exhaustion".to_string(),
                }),
                TimeControl::default(),
                stuck(),
                stuck(),
                Vec::new(),
            );

            arbiter.terminate();
            arbiter.terminate();
            arbiter.wait().await;

            assert_eq!(arbiter.outcome(), None);
            assert!(arbiter.finished());
        });
    }

    #[test]
    fn expired_clock_forfeits_the_match() {
        rt().block_on(async {
            let mut observer = MockObserver::new();
            observer.expect_moved().returning(|_| ());
            observer
                .expect_ended()
                .once()
                .withf(|o| *o == Outcome::time_forfeit(Color::White))
                .returning(|_| ());

            let control: TimeControl = "(white: Some(\"100ms\"))".parse().unwrap();

            let arbiter = Arbiter::start(
                scripted_game(9, Outcome::Draw {
                    reason: "exhaustion".to_string(),
                }),
                control,
                stuck(),
                passive(),
                vec![Arc::new(observer)],
            );

            arbiter.wait().await;

            assert_eq!(arbiter.outcome(), Some(Outcome::time_forfeit(Color::White)));
            assert_eq!(arbiter.remaining(Color::White), Duration::ZERO);
            assert_eq!(arbiter.remaining(Color::Black), UNTIMED);
            assert_eq!(arbiter.snapshot().outcome, Some(Outcome::time_forfeit(Color::White)));
        });
    }

    #[test]
    fn observers_may_reenter_the_arbiter_during_notification() {
        struct Nosy(OnceLock<Arbiter>);

        impl Observer for Nosy {
            fn moved(&self, text: &str) {
                if let Some(arbiter) = self.0.get() {
                    assert!(arbiter.validate(&pass()).is_some() || arbiter.turn().is_none());
                    assert_eq!(arbiter.remaining(Color::White), UNTIMED);
                }

                assert_eq!(text, "");
            }

            fn ended(&self, outcome: &Outcome) {
                if let Some(arbiter) = self.0.get() {
                    assert!(arbiter.legal_moves().is_empty());
                }

                assert!(outcome.is_draw());
            }
        }

        rt().block_on(async {
            let nosy = Arc::new(Nosy(OnceLock::new()));
            let gate = Arc::new(tokio::sync::Notify::new());

            let mut white = passive();
            let open = Arc::clone(&gate);
            white.expect_act().once().returning(move |_| {
                let open = Arc::clone(&open);
                async move {
                    open.notified().await;
                    Ok("pass".to_string())
                }
                .boxed()
            });

            let arbiter = Arbiter::start(
                scripted_game(1, Outcome::Draw {
                    reason: "exhaustion".to_string(),
                }),
                TimeControl::default(),
                white,
                passive(),
                vec![nosy.clone()],
            );

            nosy.0.set(arbiter.clone()).ok().unwrap();
            gate.notify_one();
            arbiter.wait().await;

            assert!(arbiter.finished());
        });
    }
}
