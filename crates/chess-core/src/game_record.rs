//! A recorded game: where it came from, where it starts, and its mainline.

use shakmaty::san::{San, SanPlus};
use shakmaty::{Chess, Position};

use crate::error::GameError;

#[derive(Debug, Clone)]
pub struct GameRecord {
    /// Provenance tag (the PGN `Site` header), if the game carries one.
    pub site: Option<String>,
    /// Position before the first move.
    pub start: Chess,
    /// Mainline moves in SAN.
    pub moves: Vec<San>,
}

impl GameRecord {
    /// Build a record from SAN strings (check/mate suffixes allowed).
    pub fn from_san_moves(
        site: Option<String>,
        start: Chess,
        sans: &[&str],
    ) -> Result<Self, GameError> {
        let moves = sans
            .iter()
            .enumerate()
            .map(|(i, s)| {
                s.parse::<SanPlus>()
                    .map(|sp| sp.san)
                    .map_err(|e| GameError::IllegalMove {
                        ply: i + 1,
                        san: s.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { site, start, moves })
    }

    /// Replay the mainline from the start position, yielding the board after
    /// each move.
    pub fn replay(&self) -> Replay<'_> {
        Replay {
            board: self.start.clone(),
            moves: self.moves.iter(),
            ply: 0,
            halted: false,
        }
    }
}

/// Iterator over the positions of a game, one per ply.
///
/// Stops after yielding the first illegal move error.
pub struct Replay<'a> {
    board: Chess,
    moves: std::slice::Iter<'a, San>,
    ply: usize,
    halted: bool,
}

impl Replay<'_> {
    /// Number of moves played so far.
    pub fn ply(&self) -> usize {
        self.ply
    }

    fn illegal(&mut self, san: &San, reason: String) -> GameError {
        self.halted = true;
        GameError::IllegalMove {
            ply: self.ply + 1,
            san: san.to_string(),
            reason,
        }
    }
}

impl Iterator for Replay<'_> {
    type Item = Result<Chess, GameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let san = self.moves.next()?;

        let mv = match san.to_move(&self.board) {
            Ok(mv) => mv,
            Err(e) => return Some(Err(self.illegal(san, e.to_string()))),
        };

        match self.board.clone().play(mv) {
            Ok(next) => {
                self.ply += 1;
                self.board = next.clone();
                Some(Ok(next))
            }
            Err(e) => Some(Err(self.illegal(san, e.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::to_fen;

    #[test]
    fn test_replay_yields_every_position() {
        let game =
            GameRecord::from_san_moves(None, Chess::default(), &["e4", "e5", "Nf3"]).unwrap();
        let fens: Vec<String> = game.replay().map(|p| to_fen(&p.unwrap())).collect();

        assert_eq!(fens.len(), 3);
        assert_eq!(fens[0], "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(fens[2], "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2");
    }

    #[test]
    fn test_replay_stops_at_illegal_move() {
        let game =
            GameRecord::from_san_moves(None, Chess::default(), &["e4", "e4", "Nf3"]).unwrap();
        let mut replay = game.replay();

        assert!(replay.next().unwrap().is_ok());
        match replay.next().unwrap() {
            Err(GameError::IllegalMove { ply, san, .. }) => {
                assert_eq!(ply, 2);
                assert_eq!(san, "e4");
            }
            other => panic!("expected illegal move, got {other:?}"),
        }
        assert!(replay.next().is_none());
        assert_eq!(replay.ply(), 1);
    }

    #[test]
    fn test_mate_suffix_accepted() {
        let game = GameRecord::from_san_moves(
            None,
            Chess::default(),
            &["f3", "e5", "g4", "Qh4#"],
        )
        .unwrap();
        let last = game.replay().last().unwrap().unwrap();
        assert!(last.is_checkmate());
    }
}
