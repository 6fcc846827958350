//! Session lifecycle, gating, scoring and speed tests

use neon_blocks::core::{drop_interval_ms, Game, ScriptedSource, SessionState};
use neon_blocks::types::{
    Difficulty, GameCommand, GameStatus, PieceKind, DROP_INTERVAL_FLOOR_MS, FAST_DROP_MS,
};

fn playing(kinds: Vec<PieceKind>) -> Game {
    let mut game = Game::new(Box::new(ScriptedSource::new(kinds)));
    game.start_session(Difficulty::Normal, 20, 10).unwrap();
    game
}

/// Shift the falling piece and hard-drop it until it settles (a fresh piece
/// back at the spawn row means the old one merged).
fn drop_at(game: &mut Game, shift: i32) {
    let step = if shift < 0 {
        GameCommand::MoveLeft
    } else {
        GameCommand::MoveRight
    };
    for _ in 0..shift.abs() {
        game.apply(step);
    }
    for _ in 0..64 {
        game.apply(GameCommand::HardDropStep);
        if game.status() != GameStatus::Playing {
            return;
        }
        if game.active().map_or(true, |p| p.y == 0) {
            return;
        }
    }
    panic!("piece never settled");
}

#[test]
fn test_session_lifecycle() {
    let mut game = Game::with_seed(12345);
    assert_eq!(game.status(), GameStatus::Home);
    assert!(game.active().is_none());

    game.start_session(Difficulty::Easy, 20, 10).unwrap();
    assert_eq!(game.status(), GameStatus::Playing);
    assert!(game.active().is_some());
    assert_eq!(game.level(), 1);
    assert_eq!(game.drop_interval_ms(), drop_interval_ms(Difficulty::Easy, 1));
}

#[test]
fn test_start_session_fails_fast_on_bad_dimensions() {
    let mut game = Game::with_seed(1);
    assert!(game.start_session(Difficulty::Normal, 0, 0).is_err());
    assert!(game.start_session(Difficulty::Normal, 20, 0).is_err());
    assert!(game.start_session(Difficulty::Normal, 0, 10).is_err());
    // Nothing was created.
    assert_eq!(game.status(), GameStatus::Home);
    assert!(game.active().is_none());
}

#[test]
fn test_commands_are_noops_outside_playing() {
    let mut game = Game::with_seed(1);
    for command in [
        GameCommand::MoveLeft,
        GameCommand::MoveRight,
        GameCommand::Rotate,
        GameCommand::SoftDropStart,
        GameCommand::SoftDropStop,
        GameCommand::HardDropStep,
        GameCommand::Pause,
        GameCommand::Resume,
        GameCommand::Restart,
        GameCommand::QuitToHome,
    ] {
        assert!(!game.apply(command), "{:?} acted on the Home screen", command);
    }
}

#[test]
fn test_move_left_at_wall_is_silent() {
    let mut game = playing(vec![PieceKind::O]);
    while game.apply(GameCommand::MoveLeft) {}
    let x = game.active().unwrap().x;

    // Repeats change nothing and raise nothing.
    for _ in 0..5 {
        assert!(!game.apply(GameCommand::MoveLeft));
        assert_eq!(game.active().unwrap().x, x);
    }
    assert_eq!(game.status(), GameStatus::Playing);
}

#[test]
fn test_double_clear_scores_at_current_level() {
    // Five O pieces tile the bottom two rows exactly; the last one completes
    // both at once.
    let mut game = playing(vec![PieceKind::O]);
    for shift in [-3, -1, 1, 3] {
        drop_at(&mut game, shift);
        assert_eq!(game.lines_cleared(), 0);
    }
    drop_at(&mut game, 5);

    assert_eq!(game.lines_cleared(), 2);
    assert_eq!(game.score(), 100); // double at level 1
    assert!(game.board().cells().iter().all(|c| c.is_none()));
    assert_eq!(game.status(), GameStatus::Playing);
}

#[test]
fn test_scoring_table_at_level_three() {
    // The settle pass multiplies the 40/100/300/1200 table by the level.
    let mut session = SessionState::new(Difficulty::Normal);
    session.level = 3;
    assert_eq!(session.apply_clear(1).score, 120);
    assert_eq!(session.apply_clear(2).score, 300);
    assert_eq!(session.apply_clear(3).score, 900);
    assert_eq!(session.apply_clear(4).score, 3600);
}

#[test]
fn test_speed_floor_on_hard() {
    assert_eq!(drop_interval_ms(Difficulty::Hard, 100), DROP_INTERVAL_FLOOR_MS);
}

#[test]
fn test_difficulty_drives_the_curve() {
    assert!(
        drop_interval_ms(Difficulty::Easy, 1) > drop_interval_ms(Difficulty::Normal, 1)
    );
    assert!(
        drop_interval_ms(Difficulty::Normal, 1) > drop_interval_ms(Difficulty::Hard, 1)
    );
}

#[test]
fn test_soft_drop_pins_interval_until_settle() {
    let mut game = playing(vec![PieceKind::O]);
    assert!(game.apply(GameCommand::SoftDropStart));
    assert_eq!(game.drop_interval_ms(), FAST_DROP_MS);
    // Holding the key re-sends the command.
    assert!(!game.apply(GameCommand::SoftDropStart));

    // Run the piece into the floor; settling releases the override.
    for _ in 0..25 {
        game.tick();
    }
    assert!(!game.session().fast_drop);
    assert_eq!(
        game.drop_interval_ms(),
        drop_interval_ms(Difficulty::Normal, 1)
    );
}

#[test]
fn test_pause_retains_everything() {
    let mut game = playing(vec![PieceKind::T]);
    game.tick();
    let snapshot_before = game.snapshot();

    assert!(game.apply(GameCommand::Pause));
    assert!(!game.apply(GameCommand::Pause)); // already paused
    game.tick(); // stray timer fire
    assert!(game.apply(GameCommand::Resume));

    let snapshot_after = game.snapshot();
    assert_eq!(snapshot_before.row(0).to_vec(), snapshot_after.row(0).to_vec());
    assert_eq!(snapshot_before.score, snapshot_after.score);
    assert_eq!(game.status(), GameStatus::Playing);
}

#[test]
fn test_spawn_overflow_is_game_over() {
    // Vertical bars piled on one column never clear a line; the stack grows
    // to the top and the next piece cannot leave the spawn row.
    let mut game = playing(vec![PieceKind::I]);
    for _ in 0..8 {
        drop_at(&mut game, 0);
        if game.status() == GameStatus::GameOver {
            break;
        }
    }
    assert_eq!(game.status(), GameStatus::GameOver);
    assert_eq!(game.lines_cleared(), 0);

    // The session is dead, not wedged: gameplay is ignored, restart works.
    assert!(!game.apply(GameCommand::MoveLeft));
    assert!(game.apply(GameCommand::Restart));
    assert_eq!(game.status(), GameStatus::Playing);
    assert_eq!(game.score(), 0);
}

#[test]
fn test_quit_from_pause_goes_home() {
    let mut game = playing(vec![PieceKind::T]);
    assert!(!game.apply(GameCommand::QuitToHome)); // only from Paused/GameOver
    game.apply(GameCommand::Pause);
    assert!(game.apply(GameCommand::QuitToHome));
    assert_eq!(game.status(), GameStatus::Home);
    assert!(game.active().is_none());
}

#[test]
fn test_leaderboard_view_from_home_only() {
    let mut game = Game::with_seed(1);
    assert!(game.open_leaderboard());
    assert_eq!(game.status(), GameStatus::Leaderboard);
    assert!(game.close_leaderboard());

    game.start_session(Difficulty::Normal, 20, 10).unwrap();
    assert!(!game.open_leaderboard());
    assert_eq!(game.status(), GameStatus::Playing);
}

#[test]
fn test_restart_preserves_difficulty_and_size() {
    let mut game = Game::with_seed(1);
    game.start_session(Difficulty::Hard, 24, 12).unwrap();
    game.tick();
    game.apply(GameCommand::Pause);
    assert!(game.apply(GameCommand::Restart));

    assert_eq!(game.status(), GameStatus::Playing);
    assert_eq!(game.session().difficulty, Difficulty::Hard);
    assert_eq!(game.board().rows(), 24);
    assert_eq!(game.board().cols(), 12);
    assert_eq!(game.drop_interval_ms(), drop_interval_ms(Difficulty::Hard, 1));
}
