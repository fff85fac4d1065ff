//! Rules-level scenarios and randomized invariant checks

use chess_engine::{
    Board, BoardSnapshot, CastlingRights, Color, Game, GameSnapshot, GameStatus, Identity,
    MatchId, Move, Piece, PieceKind, PromotionKind, Square, WinReason,
};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

fn sq(notation: &str) -> Square {
    Square::from_notation(notation).expect("valid square")
}

fn players() -> (Identity, Identity) {
    (Identity::new("white-player"), Identity::new("black-player"))
}

fn new_game() -> Game {
    let (white, black) = players();
    Game::new(MatchId::generate(), white, black).expect("Should create game")
}

#[test]
fn scenario_a_e2e4_flips_turn() {
    let (white, _) = players();
    let mut game = new_game();

    game.play(&white, &Move::new(sq("e2"), sq("e4")))
        .expect("e2e4 is legal");

    let board = game.board();
    assert_eq!(board.turn(), Color::Black);
    assert!(board.piece_at(sq("e2")).is_none());
    assert_eq!(
        board.piece_at(Square::at(3, 4)),
        Some(Piece::Pawn {
            color: Color::White,
            moved: true
        })
    );
}

#[test]
fn scenario_b_kingside_castle() {
    let board = Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq")
        .expect("valid FEN");
    let (white, black) = players();
    let mut game =
        Game::with_board(MatchId::from("castle"), white.clone(), black, board).expect("game");

    let record = game
        .play(&white, &Move::new(sq("e1"), sq("g1")))
        .expect("castling is legal");

    assert!(record.castle.is_some());
    let board = game.board();
    assert_eq!(board.piece_at(sq("g1")), Some(Piece::King(Color::White)));
    assert_eq!(board.piece_at(sq("f1")), Some(Piece::Rook(Color::White)));
    assert!(board.piece_at(sq("e1")).is_none());
    assert!(board.piece_at(sq("h1")).is_none());
    assert_eq!(board.castling_rights(Color::White), CastlingRights::NONE);
}

#[test]
fn scenario_c_black_promotion_by_capture() {
    let board = Board::from_fen("4k3/8/8/8/8/8/1p6/R3K3 b -").expect("valid FEN");
    let (white, black) = players();
    let mut game =
        Game::with_board(MatchId::from("promo"), white, black.clone(), board).expect("game");
    let before = game.clone();

    assert!(game.play(&black, &Move::new(sq("b2"), sq("a1"))).is_err());
    assert_eq!(game, before);

    game.play(
        &black,
        &Move::promoting(sq("b2"), sq("a1"), PromotionKind::Queen),
    )
    .expect("promotion with a choice is legal");
    assert_eq!(game.board().piece_at(sq("a1")), Some(Piece::Queen(Color::Black)));
}

#[test]
fn scenario_d_fools_mate() {
    let (white, black) = players();
    let mut game = new_game();

    for (who, from, to) in [
        (&white, "f2", "f3"),
        (&black, "e7", "e5"),
        (&white, "g2", "g4"),
    ] {
        game.play(who, &Move::new(sq(from), sq(to))).expect("legal");
        assert!(game.status().is_ongoing());
    }

    game.play(&black, &Move::new(sq("d8"), sq("h4")))
        .expect("mating move is legal");
    assert_eq!(
        game.status(),
        GameStatus::Win {
            winner: Color::Black,
            reason: WinReason::Checkmate
        }
    );
    assert!(game.has_won(&black));
}

#[test]
fn scenario_e_outsider_cannot_resign() {
    let mut game = new_game();
    assert!(game.resign(&Identity::new("spectator")).is_err());
    assert!(game.status().is_ongoing());
}

#[test]
fn castling_right_lost_when_rook_captured_at_home() {
    let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq").expect("valid FEN");
    let (white, black) = players();
    let mut game = Game::with_board(MatchId::from("rk"), white.clone(), black, board).expect("game");

    game.play(&white, &Move::new(sq("a1"), sq("a8"))).expect("rook trade");
    assert!(!game.board().castling_rights(Color::White).queenside);
    assert!(game.board().castling_rights(Color::White).kingside);
    assert!(!game.board().castling_rights(Color::Black).queenside);
    assert!(game.board().castling_rights(Color::Black).kingside);
}

/// All legal `(from, to)` pairs for the side to move
fn all_moves(board: &Board) -> Vec<(Square, Square)> {
    board
        .pieces(board.turn())
        .flat_map(|(from, _)| board.legal_moves(from).into_iter().map(move |to| (from, to)))
        .collect()
}

fn count_kings(board: &Board, color: Color) -> usize {
    board
        .pieces(color)
        .filter(|(_, piece)| piece.is_kind(PieceKind::King))
        .count()
}

#[test]
fn random_games_keep_invariants_and_round_trip() {
    for seed in 0..12u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (white, black) = players();
        let mut game = new_game();

        for _ in 0..160 {
            let board = game.board();
            for color in Color::ALL {
                assert_eq!(count_kings(board, color), 1, "seed {seed}");
            }

            let snapshot = BoardSnapshot::from(board);
            let restored = Board::try_from(snapshot).expect("snapshot restores");
            assert_eq!(&restored, board, "seed {seed}");
            assert_eq!(
                &Board::from_fen(&board.to_fen()).expect("FEN restores"),
                board,
                "seed {seed}"
            );

            let moves = all_moves(board);
            if moves.is_empty() {
                let to_move = board.turn();
                if board.in_check(to_move) {
                    assert_eq!(game.status().winner(), Some(to_move.opposite()));
                } else {
                    assert!(matches!(game.status(), GameStatus::Draw { .. }));
                }
                break;
            }
            assert!(game.status().is_ongoing());

            let &(from, to) = moves.choose(&mut rng).expect("non-empty");
            let promotion = game.forced_promotions(from, to).choose(&mut rng).copied();
            let mover = match board.turn() {
                Color::White => &white,
                Color::Black => &black,
            };
            let before = board.turn();
            game.play(mover, &Move { from, to, promotion })
                .expect("generated move is legal");
            assert_eq!(game.board().turn(), before.opposite());
        }

        let json = serde_json::to_string(&game.snapshot()).expect("serialize");
        let parsed: GameSnapshot = serde_json::from_str(&json).expect("deserialize");
        let restored = Game::from_snapshot(parsed).expect("restore");
        assert_eq!(restored.board(), game.board());
        assert_eq!(restored.history(), game.history());
        assert_eq!(restored.status(), game.status());
    }
}

#[test]
fn illegal_moves_never_change_the_board() {
    let mut rng = StdRng::seed_from_u64(99);
    let (white, black) = players();
    let mut game = new_game();

    for _ in 0..40 {
        let board = game.board().clone();
        let mover = if board.turn() == Color::White { &white } else { &black };

        for row in 0..8 {
            for col in 0..8 {
                let from = Square::at(row, col);
                let to = Square::at(7 - row, col);
                if board.can_move(from, to) {
                    continue;
                }
                assert!(game.play(mover, &Move::new(from, to)).is_err());
                assert_eq!(game.board(), &board);
            }
        }

        let moves = all_moves(&board);
        let Some(&(from, to)) = moves.choose(&mut rng) else {
            break;
        };
        let promotion = game.forced_promotions(from, to).first().copied();
        game.play(mover, &Move { from, to, promotion }).expect("legal");
    }
}
