//! Tests for the game service over the in-memory store.

use std::sync::Barrier;
use std::thread;

use tictactoe::{
    ErrorKind, GameError, GameId, GameService, GameStatus, GameStore, MemoryGameStore,
    PermissionError, PlayerId, ServiceError, ValidationError,
};

const ANN: PlayerId = PlayerId(1);
const BEN: PlayerId = PlayerId(2);
const CAT: PlayerId = PlayerId(3);

fn setup() -> (GameService<MemoryGameStore>, GameId) {
    let service = GameService::new(MemoryGameStore::new());
    let id = *service.create_game(ANN, BEN).expect("Create failed").id();
    (service, id)
}

fn play(service: &GameService<MemoryGameStore>, id: GameId, moves: &[(i32, i32)]) -> GameStatus {
    let mut status = GameStatus::FirstToMove;
    for (n, &(x, y)) in moves.iter().enumerate() {
        let player = if n % 2 == 0 { ANN } else { BEN };
        status = *service
            .make_move(id, player, x, y, "")
            .expect("Move rejected")
            .status();
    }
    status
}

#[test]
fn test_first_player_column_win() {
    let (service, id) = setup();
    let status = play(&service, id, &[(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)]);
    assert_eq!(status, GameStatus::FirstWon);

    for player in [ANN, BEN] {
        let err = service
            .make_move(id, player, 2, 0, "")
            .expect_err("Move after win accepted");
        assert_eq!(err.kind(), ErrorKind::Permission);
    }
    let view = service.game_view(id, Some(ANN)).expect("View failed");
    assert!(!view.viewer_can_move());
    assert_eq!(view.moves().len(), 5);
}

#[test]
fn test_nine_moves_without_line_is_draw() {
    let (service, id) = setup();
    let status = play(
        &service,
        id,
        &[
            (0, 0),
            (1, 0),
            (2, 0),
            (1, 1),
            (0, 1),
            (2, 1),
            (1, 2),
            (0, 2),
            (2, 2),
        ],
    );
    assert_eq!(status, GameStatus::Draw);
    assert!(
        service
            .games_for_user(ANN, true)
            .expect("List failed")
            .is_empty()
    );
}

#[test]
fn test_turn_alternates_and_view_reports_mover() {
    let (service, id) = setup();
    assert!(*service.game_view(id, Some(ANN)).unwrap().viewer_can_move());
    assert!(!*service.game_view(id, Some(BEN)).unwrap().viewer_can_move());

    let outcome = service.make_move(id, ANN, 1, 1, "center").unwrap();
    assert_eq!(*outcome.status(), GameStatus::SecondToMove);
    assert_eq!(outcome.accepted().comment(), "center");

    assert!(!*service.game_view(id, Some(ANN)).unwrap().viewer_can_move());
    assert!(*service.game_view(id, Some(BEN)).unwrap().viewer_can_move());
    assert!(!*service.game_view(id, None).unwrap().viewer_can_move());
}

#[test]
fn test_out_of_turn_is_permission_error() {
    let (service, id) = setup();
    let err = service.make_move(id, BEN, 0, 0, "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert!(matches!(
        err,
        ServiceError::Permission(PermissionError::NotYourTurn {
            status: GameStatus::FirstToMove,
            ..
        })
    ));
}

#[test]
fn test_outsider_is_permission_error() {
    let (service, id) = setup();
    let err = service.make_move(id, CAT, 0, 0, "").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Permission(PermissionError::NotAParticipant { player: CAT, .. })
    ));
}

#[test]
fn test_unknown_game_is_not_found() {
    let (service, _) = setup();
    let err = service.make_move(GameId(99), ANN, 0, 0, "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = service.game_view(GameId(99), None).unwrap_err();
    assert!(matches!(err, ServiceError::GameNotFound(GameId(99))));
}

#[test]
fn test_validation_errors_leave_game_unchanged() {
    let (service, id) = setup();
    service.make_move(id, ANN, 0, 0, "").unwrap();

    let occupied = service.make_move(id, BEN, 0, 0, "").unwrap_err();
    assert_eq!(occupied.kind(), ErrorKind::Validation);

    let outside = service.make_move(id, BEN, 3, 0, "").unwrap_err();
    assert!(matches!(
        outside,
        ServiceError::Game(GameError::Invalid(ValidationError::OutOfBounds { x: 3, y: 0 }))
    ));

    let long = service
        .make_move(id, BEN, 1, 1, "x".repeat(301))
        .unwrap_err();
    assert!(matches!(
        long,
        ServiceError::Game(GameError::Invalid(ValidationError::CommentTooLong(301)))
    ));

    let view = service.game_view(id, Some(BEN)).unwrap();
    assert_eq!(view.moves().len(), 1);
    assert_eq!(*view.record().status(), GameStatus::SecondToMove);
    assert!(*view.viewer_can_move());
}

#[test]
fn test_same_player_cannot_play_themselves() {
    let service = GameService::new(MemoryGameStore::new());
    let err = service.create_game(ANN, ANN).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(service.store().is_empty());
}

#[test]
fn test_listing_filters_by_player() {
    let service = GameService::new(MemoryGameStore::new());
    let ann_ben = *service.create_game(ANN, BEN).unwrap().id();
    let ben_cat = *service.create_game(BEN, CAT).unwrap().id();

    let ann_games: Vec<GameId> = service
        .games_for_user(ANN, false)
        .unwrap()
        .iter()
        .map(|g| *g.id())
        .collect();
    assert_eq!(ann_games, vec![ann_ben]);
    assert_eq!(service.games_for_user(BEN, false).unwrap().len(), 2);

    let cat_games = service.games_for_user(CAT, true).unwrap();
    assert_eq!(cat_games.len(), 1);
    assert_eq!(*cat_games[0].id(), ben_cat);
    assert_eq!(service.all_games().unwrap().len(), 2);
}

#[test]
fn test_concurrent_moves_on_one_square_commit_once() {
    const RACERS: usize = 8;

    for _ in 0..20 {
        let (service, id) = setup();
        let barrier = Barrier::new(RACERS);

        let results: Vec<Result<GameStatus, ServiceError>> = thread::scope(|s| {
            let handles: Vec<_> = (0..RACERS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        service
                            .make_move(id, ANN, 1, 1, "")
                            .map(|outcome| *outcome.status())
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("Racer panicked"))
                .collect()
        });

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.kind(), ErrorKind::Permission);
        }

        let stored = service.store().load_game(id).unwrap().unwrap();
        assert_eq!(stored.state().move_count(), 1);
        assert_eq!(stored.state().status(), GameStatus::SecondToMove);
    }
}

#[test]
fn test_concurrent_games_do_not_interfere() {
    let service = GameService::new(MemoryGameStore::new());
    let ids: Vec<GameId> = (0..4)
        .map(|_| *service.create_game(ANN, BEN).unwrap().id())
        .collect();

    thread::scope(|s| {
        for &id in &ids {
            let service = &service;
            s.spawn(move || {
                for (n, (x, y)) in [(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)]
                    .into_iter()
                    .enumerate()
                {
                    let player = if n % 2 == 0 { ANN } else { BEN };
                    service.make_move(id, player, x, y, "").unwrap();
                }
            });
        }
    });

    for id in ids {
        let view = service.game_view(id, None).unwrap();
        assert_eq!(*view.record().status(), GameStatus::FirstWon);
    }
}
