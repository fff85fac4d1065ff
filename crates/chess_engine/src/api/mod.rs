//! Game-level API over the [`Board`](crate::board::Board)
//!
//! A [`Game`] binds two distinct identities to a board and enforces who may
//! move what. A [`GamePost`] is the pending half of a game waiting for an
//! opponent.
//!
//! ## Module Organization
//!
//! - `game` - Game lifecycle (posting, accepting, identities)
//! - `moves` - Move validation and application (check_move, play)
//! - `state` - Terminal queries and resignation (status, has_won, resign)

mod game;
mod moves;
mod state;

pub use game::{Game, GamePost};
