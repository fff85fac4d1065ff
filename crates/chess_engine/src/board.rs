//! Board state and rules
//!
//! The [`Board`] owns an 8×8 grid of optional pieces, the side to move,
//! per-color castling rights and the two king squares (kept in sync so check
//! detection never scans for kings).
//!
//! ## Mutation
//!
//! [`Board::apply_move`] is the only mutation. It does **not** re-validate
//! legality; callers check [`Board::can_move`] first. Applying a move:
//! 1. relocates the piece (capturing whatever stood on the destination)
//! 2. replaces it with a fresh piece if a promotion was chosen
//! 3. hops the rook when the king castles
//! 4. clears castling rights touched by the move
//! 5. flips the side to move
//!
//! ## Terminal detection
//!
//! [`Board::status`] looks at the side to move: no legal move while in check
//! is checkmate, no legal move otherwise is stalemate (a draw).

use crate::constants::{
    BACK_RANK, BOARD_SIZE, KINGSIDE_CASTLE_COL, KINGSIDE_ROOK_COL, KINGSIDE_ROOK_TARGET_COL,
    KING_HOME_COL, QUEENSIDE_CASTLE_COL, QUEENSIDE_ROOK_COL, QUEENSIDE_ROOK_TARGET_COL,
};
use crate::error::{ChessEngineError, ChessEngineResult};
use crate::move_gen;
use crate::pieces::{Piece, PieceKind, PromotionKind};
use crate::types::{
    CastleSide, CastlingRights, Color, DrawReason, GameStatus, MoveRecord, Square, WinReason,
};

pub type Cells = [[Option<Piece>; BOARD_SIZE as usize]; BOARD_SIZE as usize];

const NO_PROMOTIONS: &[PromotionKind] = &[];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Indexed `[row][col]`
    cells: Cells,
    turn: Color,
    castling: [CastlingRights; 2],
    kings: [Square; 2],
}

impl Default for Board {
    fn default() -> Self {
        Board::standard()
    }
}

impl Board {
    /// Standard starting position, White to move, all castling rights
    pub fn standard() -> Board {
        let mut cells: Cells = [[None; BOARD_SIZE as usize]; BOARD_SIZE as usize];

        for color in Color::ALL {
            let home = color.home_row() as usize;
            let pawns = color.pawn_row() as usize;
            for (col, &kind) in BACK_RANK.iter().enumerate() {
                cells[home][col] = Some(Piece::new(kind, color));
                cells[pawns][col] = Some(Piece::new(PieceKind::Pawn, color));
            }
        }

        Board {
            cells,
            turn: Color::White,
            castling: [CastlingRights::BOTH; 2],
            kings: [
                Square::at(Color::White.home_row(), KING_HOME_COL),
                Square::at(Color::Black.home_row(), KING_HOME_COL),
            ],
        }
    }

    /// Assemble a board from raw parts
    ///
    /// Fails unless each color has exactly one king. Castling rights whose
    /// king or rook is not on its home square are dropped.
    pub fn from_parts(
        cells: Cells,
        turn: Color,
        castling: [CastlingRights; 2],
    ) -> ChessEngineResult<Board> {
        let mut kings = [None, None];

        for (row, rank) in cells.iter().enumerate() {
            for (col, cell) in rank.iter().enumerate() {
                if let Some(Piece::King(color)) = cell {
                    let slot = &mut kings[color.index()];
                    if slot.is_some() {
                        return Err(ChessEngineError::MissingKing { color: *color });
                    }
                    *slot = Some(Square::at(row as i8, col as i8));
                }
            }
        }

        let white_king = kings[0].ok_or(ChessEngineError::MissingKing {
            color: Color::White,
        })?;
        let black_king = kings[1].ok_or(ChessEngineError::MissingKing {
            color: Color::Black,
        })?;

        let mut board = Board {
            cells,
            turn,
            castling,
            kings: [white_king, black_king],
        };
        board.drop_stale_castling_rights();
        Ok(board)
    }

    fn drop_stale_castling_rights(&mut self) {
        for color in Color::ALL {
            let row = color.home_row();
            let king_home = self.piece_at(Square::at(row, KING_HOME_COL)) == Some(Piece::King(color));
            let rook_home =
                |col: i8| self.piece_at(Square::at(row, col)) == Some(Piece::Rook(color));

            let kingside = king_home && rook_home(KINGSIDE_ROOK_COL);
            let queenside = king_home && rook_home(QUEENSIDE_ROOK_COL);

            let rights = &mut self.castling[color.index()];
            rights.kingside &= kingside;
            rights.queenside &= queenside;
        }
    }

    /// Parse the placement, side-to-move and castling fields of a FEN string
    ///
    /// Trailing fields (en passant, clocks) are ignored. Missing side-to-move
    /// defaults to White, missing castling to none. Pawns off their start row
    /// are marked as moved.
    ///
    /// # Examples
    ///
    /// ```
    /// use chess_engine::{Board, Color};
    ///
    /// let board = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w K").unwrap();
    /// assert_eq!(board.turn(), Color::White);
    /// assert!(board.castling_rights(Color::White).kingside);
    /// ```
    pub fn from_fen(fen: &str) -> ChessEngineResult<Board> {
        let invalid = |message: String| ChessEngineError::InvalidFen { message };

        let mut fields = fen.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| invalid("empty FEN".to_string()))?;

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != BOARD_SIZE as usize {
            return Err(invalid(format!("expected 8 ranks, found {}", ranks.len())));
        }

        let mut cells: Cells = [[None; BOARD_SIZE as usize]; BOARD_SIZE as usize];
        for (i, rank) in ranks.iter().enumerate() {
            let row = BOARD_SIZE - 1 - i as i8;
            let mut col: i8 = 0;
            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10) {
                    col += skip as i8;
                    continue;
                }
                let kind = PieceKind::from_tag(c)
                    .ok_or_else(|| invalid(format!("unknown piece letter {c:?}")))?;
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                if col >= BOARD_SIZE {
                    return Err(invalid(format!("rank {} is too long", row + 1)));
                }
                let mut piece = Piece::new(kind, color);
                if kind == PieceKind::Pawn && row != color.pawn_row() {
                    piece.mark_moved();
                }
                cells[row as usize][col as usize] = Some(piece);
                col += 1;
            }
            if col != BOARD_SIZE {
                return Err(invalid(format!("rank {} does not have 8 files", row + 1)));
            }
        }

        let turn = match fields.next() {
            None => Color::White,
            Some(field) => {
                let mut chars = field.chars();
                match (chars.next().and_then(Color::from_tag), chars.next()) {
                    (Some(color), None) => color,
                    _ => return Err(invalid(format!("bad side to move {field:?}"))),
                }
            }
        };

        let mut castling = [CastlingRights::NONE; 2];
        if let Some(field) = fields.next() {
            if field != "-" {
                for c in field.chars() {
                    match c {
                        'K' => castling[0].kingside = true,
                        'Q' => castling[0].queenside = true,
                        'k' => castling[1].kingside = true,
                        'q' => castling[1].queenside = true,
                        _ => return Err(invalid(format!("bad castling field {field:?}"))),
                    }
                }
            }
        }

        Board::from_parts(cells, turn, castling)
    }

    /// Placement, side to move and castling fields of FEN
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for row in (0..BOARD_SIZE).rev() {
            let mut empty = 0;
            for col in 0..BOARD_SIZE {
                match self.piece_at(Square::at(row, col)) {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.fen_char());
                    }
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if row > 0 {
                placement.push('/');
            }
        }

        let mut castling = String::new();
        let [white, black] = self.castling;
        for (flag, letter) in [
            (white.kingside, 'K'),
            (white.queenside, 'Q'),
            (black.kingside, 'k'),
            (black.queenside, 'q'),
        ] {
            if flag {
                castling.push(letter);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        format!("{placement} {} {castling}", self.turn.tag())
    }

    /// Piece on `square`; `None` for empty or off-board squares
    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        if !square.is_on_board() {
            return None;
        }
        self.cells[square.row as usize][square.col as usize]
    }

    fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.row as usize][square.col as usize] = piece;
    }

    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    #[inline]
    pub fn is_occupied(&self, square: Square) -> bool {
        self.piece_at(square).is_some()
    }

    #[inline]
    pub fn occupied_by(&self, square: Square, color: Color) -> bool {
        self.piece_at(square).is_some_and(|piece| piece.color() == color)
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn castling_rights(&self, color: Color) -> CastlingRights {
        self.castling[color.index()]
    }

    pub fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    /// Every `(square, piece)` of the given color, rank by rank
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(move |(row, rank)| {
            rank.iter().enumerate().filter_map(move |(col, cell)| match cell {
                Some(piece) if piece.color() == color => {
                    Some((Square::at(row as i8, col as i8), *piece))
                }
                _ => None,
            })
        })
    }

    /// Squares the piece on `from` threatens (empty for an empty square)
    pub fn control_area(&self, from: Square) -> Vec<Square> {
        self.piece_at(from)
            .map(|piece| move_gen::control_area(self, from, piece))
            .unwrap_or_default()
    }

    pub fn control_squares(&self, color: Color) -> Vec<Square> {
        move_gen::control_squares(self, color)
    }

    pub fn is_attacked(&self, square: Square, by_color: Color) -> bool {
        move_gen::is_square_attacked(self, square, by_color)
    }

    pub fn in_check(&self, color: Color) -> bool {
        move_gen::is_in_check(self, color)
    }

    /// Legal destinations of the piece on `from`, castling included
    pub fn legal_moves(&self, from: Square) -> Vec<Square> {
        move_gen::legal_moves(self, from)
    }

    /// Whether the piece on `from` may legally move to `to`
    ///
    /// Total: any pair of squares yields an answer, off-board squares and
    /// empty sources included. Does not look at whose turn it is.
    pub fn can_move(&self, from: Square, to: Square) -> bool {
        if !from.is_on_board() || !to.is_on_board() {
            return false;
        }
        let Some(piece) = self.piece_at(from) else {
            return false;
        };
        if self.occupied_by(to, piece.color()) {
            return false;
        }
        self.legal_moves(from).contains(&to)
    }

    /// Would `color`'s king be attacked after moving `from` → `to`?
    ///
    /// Simulated on a scratch copy; `self` is untouched.
    pub fn puts_in_check(&self, from: Square, to: Square, color: Color) -> bool {
        let Some(piece) = self.piece_at(from) else {
            return false;
        };

        let mut scratch = self.clone();
        scratch.set(from, None);
        scratch.set(to, Some(piece));
        if piece.is_kind(PieceKind::King) {
            scratch.kings[piece.color().index()] = to;
        }

        scratch.in_check(color)
    }

    /// False only when every piece of `color` has an empty legal move set
    pub fn has_legal_moves(&self, color: Color) -> bool {
        self.pieces(color)
            .any(|(from, _)| !self.legal_moves(from).is_empty())
    }

    /// Promotion pieces the mover must choose from for `from` → `to`
    ///
    /// Non-empty exactly when a pawn lands on its promotion row.
    pub fn forced_promotion_choices(&self, from: Square, to: Square) -> &'static [PromotionKind] {
        match self.piece_at(from) {
            Some(Piece::Pawn { color, .. }) if to.row == color.promotion_row() => {
                &PromotionKind::ALL
            }
            _ => NO_PROMOTIONS,
        }
    }

    /// Apply a move that the caller already validated
    ///
    /// # Errors
    ///
    /// Returns [`ChessEngineError::NoPieceAt`] if `from` is empty; nothing
    /// else is checked.
    pub fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PromotionKind>,
    ) -> ChessEngineResult<MoveRecord> {
        let mut piece = self
            .piece_at(from)
            .ok_or(ChessEngineError::NoPieceAt { square: from })?;
        let color = piece.color();
        let captured = self.piece_at(to).map(Piece::kind);

        piece.mark_moved();
        self.set(from, None);
        let placed = match promotion {
            Some(kind) => Piece::new(kind.into(), color),
            None => piece,
        };
        self.set(to, Some(placed));

        let mut castle = None;
        let home_row = color.home_row();

        if piece.is_kind(PieceKind::King) {
            self.kings[color.index()] = to;

            let from_home = from == Square::at(home_row, KING_HOME_COL);
            if from_home && to.row == home_row {
                castle = match to.col {
                    KINGSIDE_CASTLE_COL => Some(CastleSide::Kingside),
                    QUEENSIDE_CASTLE_COL => Some(CastleSide::Queenside),
                    _ => None,
                };
            }

            if let Some(side) = castle {
                let (rook_from, rook_to) = match side {
                    CastleSide::Kingside => (KINGSIDE_ROOK_COL, KINGSIDE_ROOK_TARGET_COL),
                    CastleSide::Queenside => (QUEENSIDE_ROOK_COL, QUEENSIDE_ROOK_TARGET_COL),
                };
                let rook = self.piece_at(Square::at(home_row, rook_from));
                self.set(Square::at(home_row, rook_from), None);
                self.set(Square::at(home_row, rook_to), rook);
            }

            self.castling[color.index()] = CastlingRights::NONE;
        }

        self.revoke_rook_rights(from);
        self.revoke_rook_rights(to);

        self.turn = self.turn.opposite();

        Ok(MoveRecord {
            from,
            to,
            piece: piece.kind(),
            captured,
            promoted_to: promotion,
            castle,
        })
    }

    /// Clear the castling side whose rook starts on `square`
    fn revoke_rook_rights(&mut self, square: Square) {
        for color in Color::ALL {
            if square.row != color.home_row() {
                continue;
            }
            let rights = &mut self.castling[color.index()];
            match square.col {
                KINGSIDE_ROOK_COL => rights.kingside = false,
                QUEENSIDE_ROOK_COL => rights.queenside = false,
                _ => {}
            }
        }
    }

    /// Status from the point of view of the side to move
    pub fn status(&self) -> GameStatus {
        let to_move = self.turn;
        if self.has_legal_moves(to_move) {
            GameStatus::Ongoing
        } else if self.in_check(to_move) {
            GameStatus::Win {
                winner: to_move.opposite(),
                reason: WinReason::Checkmate,
            }
        } else {
            GameStatus::Draw {
                reason: DrawReason::Stalemate,
            }
        }
    }

    /// Has `color` checkmated its opponent?
    pub fn has_won(&self, color: Color) -> bool {
        self.turn == color.opposite() && self.status().winner() == Some(color)
    }
}
