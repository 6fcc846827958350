//! Runtime module - the cooperative session loop
//!
//! One task owns the engine and multiplexes two inputs: the drop timer and
//! the command channel. Commands and gravity ticks are strictly serialized -
//! nothing observes or mutates the engine while a tick is being applied -
//! and the timer deadline is recomputed whenever the advertised interval
//! changes (level-up, soft-drop override, pause/resume), so two intervals
//! can never race.
//!
//! After every applied step a fresh snapshot is published on the observation
//! channel. On the transition into game over the final score is handed to
//! the score store exactly once, fire-and-forget: a slow or failing store
//! never stalls the loop or touches engine state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

use neon_blocks_core::{Game, GameSnapshot, InvalidBoardSize};
use neon_blocks_types::{Difficulty, GameCommand, GameStatus};

use crate::leaderboard::{HighScore, ScoreStore};

/// Request delivered to the session loop.
#[derive(Debug)]
pub enum SessionRequest {
    /// Begin a session; `player` tags the eventual leaderboard entry.
    Start {
        difficulty: Difficulty,
        rows: usize,
        cols: usize,
        player: String,
        reply: oneshot::Sender<Result<(), InvalidBoardSize>>,
    },
    /// A discrete gameplay command. `reply` (when present) reports whether
    /// the command changed anything, so callers can distinguish an applied
    /// move from a silently rejected one.
    Command {
        command: GameCommand,
        reply: Option<oneshot::Sender<bool>>,
    },
    /// Ranked top list for one difficulty.
    LeaderboardTop {
        difficulty: Difficulty,
        limit: usize,
        reply: oneshot::Sender<Vec<HighScore>>,
    },
    /// Stop the loop.
    Shutdown,
}

/// Drive a game until the request channel closes or `Shutdown` arrives.
pub async fn run_session(
    mut game: Game,
    mut requests: mpsc::Receiver<SessionRequest>,
    observations: mpsc::UnboundedSender<GameSnapshot>,
    store: Arc<dyn ScoreStore>,
) {
    let mut player = String::from("anonymous");
    let mut submitted = false;
    let mut next_tick = Instant::now() + tick_interval(&game);

    publish(&observations, &game);

    loop {
        let ticking = game.status() == GameStatus::Playing;

        tokio::select! {
            _ = sleep_until(next_tick), if ticking => {
                game.tick();
                next_tick = Instant::now() + tick_interval(&game);
                submit_on_game_over(&game, &store, &player, &mut submitted);
                publish(&observations, &game);
            }
            request = requests.recv() => {
                let Some(request) = request else { break };
                let interval_before = game.drop_interval_ms();
                let was_playing = ticking;

                match request {
                    SessionRequest::Start { difficulty, rows, cols, player: name, reply } => {
                        let result = game.start_session(difficulty, rows, cols);
                        if result.is_ok() && game.status() == GameStatus::Playing {
                            player = name;
                            submitted = false;
                        }
                        let _ = reply.send(result);
                    }
                    SessionRequest::Command { command, reply } => {
                        let changed = game.apply(command);
                        if command == GameCommand::Restart
                            && game.status() == GameStatus::Playing
                        {
                            submitted = false;
                        }
                        if let Some(reply) = reply {
                            let _ = reply.send(changed);
                        }
                    }
                    SessionRequest::LeaderboardTop { difficulty, limit, reply } => {
                        let entries = store.top_n(difficulty, limit).unwrap_or_else(|err| {
                            eprintln!("leaderboard query failed: {err:#}");
                            Vec::new()
                        });
                        let _ = reply.send(entries);
                    }
                    SessionRequest::Shutdown => break,
                }

                // Cancel-and-restart semantics: any change to the interval,
                // or entering Playing, re-arms the timer from now.
                let playing_now = game.status() == GameStatus::Playing;
                if game.drop_interval_ms() != interval_before || (playing_now && !was_playing) {
                    next_tick = Instant::now() + tick_interval(&game);
                }

                submit_on_game_over(&game, &store, &player, &mut submitted);
                publish(&observations, &game);
            }
        }
    }
}

fn tick_interval(game: &Game) -> Duration {
    Duration::from_millis(game.drop_interval_ms() as u64)
}

fn publish(observations: &mpsc::UnboundedSender<GameSnapshot>, game: &Game) {
    // A closed observation channel just means nobody is watching.
    let _ = observations.send(game.snapshot());
}

/// Hand the final score to the store on the transition into game over.
fn submit_on_game_over(
    game: &Game,
    store: &Arc<dyn ScoreStore>,
    player: &str,
    submitted: &mut bool,
) {
    if game.status() != GameStatus::GameOver || *submitted {
        return;
    }
    *submitted = true;

    let entry = HighScore {
        player: player.to_string(),
        score: game.score(),
        difficulty: game.session().difficulty,
    };
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        if let Err(err) = store.submit(entry) {
            eprintln!("leaderboard submission failed: {err:#}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::MemoryScoreStore;
    use anyhow::anyhow;
    use neon_blocks_core::ScriptedSource;
    use neon_blocks_types::PieceKind;

    struct FailingStore;

    impl ScoreStore for FailingStore {
        fn submit(&self, _entry: HighScore) -> anyhow::Result<()> {
            Err(anyhow!("backend unreachable"))
        }

        fn top_n(&self, _d: Difficulty, _l: usize) -> anyhow::Result<Vec<HighScore>> {
            Err(anyhow!("backend unreachable"))
        }
    }

    async fn start(
        requests: &mpsc::Sender<SessionRequest>,
        difficulty: Difficulty,
    ) -> Result<(), InvalidBoardSize> {
        let (reply, result) = oneshot::channel();
        requests
            .send(SessionRequest::Start {
                difficulty,
                rows: 20,
                cols: 10,
                player: "tester".to_string(),
                reply,
            })
            .await
            .unwrap();
        result.await.unwrap()
    }

    async fn drain_latest(observations: &mut mpsc::UnboundedReceiver<GameSnapshot>) -> GameSnapshot {
        let mut latest = observations.recv().await.expect("observation stream open");
        while let Ok(snapshot) = observations.try_recv() {
            latest = snapshot;
        }
        latest
    }

    #[tokio::test]
    async fn test_commands_and_ticks_serialize() {
        let (req_tx, req_rx) = mpsc::channel(16);
        let (obs_tx, mut obs_rx) = mpsc::unbounded_channel();
        let store: Arc<dyn ScoreStore> = Arc::new(MemoryScoreStore::new());
        let game = Game::new(Box::new(ScriptedSource::new(vec![PieceKind::O])));

        let loop_task = tokio::spawn(run_session(game, req_rx, obs_tx, store));

        // Idle engine publishes its Home snapshot immediately.
        let snapshot = drain_latest(&mut obs_rx).await;
        assert_eq!(snapshot.status, GameStatus::Home);

        start(&req_tx, Difficulty::Normal).await.unwrap();
        let snapshot = drain_latest(&mut obs_rx).await;
        assert_eq!(snapshot.status, GameStatus::Playing);
        assert_eq!(snapshot.level, 1);

        req_tx
            .send(SessionRequest::Command {
                command: GameCommand::MoveLeft,
                reply: None,
            })
            .await
            .unwrap();
        let snapshot = drain_latest(&mut obs_rx).await;
        assert_eq!(snapshot.status, GameStatus::Playing);

        req_tx.send(SessionRequest::Shutdown).await.unwrap();
        loop_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_session_params_fail_fast() {
        let (req_tx, req_rx) = mpsc::channel(16);
        let (obs_tx, _obs_rx) = mpsc::unbounded_channel();
        let store: Arc<dyn ScoreStore> = Arc::new(MemoryScoreStore::new());
        let loop_task = tokio::spawn(run_session(Game::with_seed(1), req_rx, obs_tx, store));

        let (reply, result) = oneshot::channel();
        req_tx
            .send(SessionRequest::Start {
                difficulty: Difficulty::Easy,
                rows: 0,
                cols: 10,
                player: "tester".to_string(),
                reply,
            })
            .await
            .unwrap();
        assert_eq!(
            result.await.unwrap(),
            Err(InvalidBoardSize { rows: 0, cols: 10 })
        );

        req_tx.send(SessionRequest::Shutdown).await.unwrap();
        loop_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_game_over_submits_once() {
        let (req_tx, req_rx) = mpsc::channel(16);
        let (obs_tx, mut obs_rx) = mpsc::unbounded_channel();
        let store = Arc::new(MemoryScoreStore::new());
        let store_dyn: Arc<dyn ScoreStore> = store.clone();

        // Vertical bars piled on one column never clear a line and top out
        // after a handful of pieces.
        let game = Game::new(Box::new(ScriptedSource::new(vec![PieceKind::I])));
        let loop_task = tokio::spawn(run_session(game, req_rx, obs_tx, store_dyn));

        start(&req_tx, Difficulty::Hard).await.unwrap();
        // Hard-drop until the stack tops out.
        for _ in 0..80 {
            req_tx
                .send(SessionRequest::Command {
                    command: GameCommand::HardDropStep,
                    reply: None,
                })
                .await
                .unwrap();
        }

        let mut over = false;
        for _ in 0..200 {
            let snapshot = drain_latest(&mut obs_rx).await;
            if snapshot.status == GameStatus::GameOver {
                over = true;
                break;
            }
        }
        assert!(over, "stack never topped out");

        req_tx.send(SessionRequest::Shutdown).await.unwrap();
        loop_task.await.unwrap();

        // The submission runs detached; give it a moment to land.
        let mut entries = Vec::new();
        for _ in 0..100 {
            entries = store.top_n(Difficulty::Hard, 10).unwrap();
            if !entries.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].player, "tester");
        assert_eq!(entries[0].difficulty, Difficulty::Hard);
    }

    #[tokio::test]
    async fn test_store_failure_never_reaches_the_engine() {
        let (req_tx, req_rx) = mpsc::channel(16);
        let (obs_tx, mut obs_rx) = mpsc::unbounded_channel();
        let store: Arc<dyn ScoreStore> = Arc::new(FailingStore);

        let game = Game::new(Box::new(ScriptedSource::new(vec![PieceKind::I])));
        let loop_task = tokio::spawn(run_session(game, req_rx, obs_tx, store));

        start(&req_tx, Difficulty::Normal).await.unwrap();
        for _ in 0..80 {
            req_tx
                .send(SessionRequest::Command {
                    command: GameCommand::HardDropStep,
                    reply: None,
                })
                .await
                .unwrap();
        }

        let mut over = false;
        for _ in 0..200 {
            let snapshot = drain_latest(&mut obs_rx).await;
            if snapshot.status == GameStatus::GameOver {
                over = true;
                break;
            }
        }
        assert!(over);

        // The loop is still serving requests after the failed submission.
        let (reply, result) = oneshot::channel();
        req_tx
            .send(SessionRequest::LeaderboardTop {
                difficulty: Difficulty::Normal,
                limit: 5,
                reply,
            })
            .await
            .unwrap();
        assert!(result.await.unwrap().is_empty());

        req_tx.send(SessionRequest::Shutdown).await.unwrap();
        loop_task.await.unwrap();
    }
}
