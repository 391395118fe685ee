//! Terminal collaborator for a two-player match.
//!
//! A deliberately thin driver over the library boundary: it renders the
//! board and clocks, reads move intents and commands from stdin, ticks the
//! clock once per loop, and treats illegal-move errors as a re-prompt.
//! The clock only advances when a line is read, which is as good as a
//! blocking terminal gets; a real GUI collaborator would tick on a timer.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use chess_duel::engine::san;
use chess_duel::{ChessError, Color, MatchConfig, MatchSession, PieceKind, Square};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_duel=info".into()),
        )
        .init();

    let config = MatchConfig::from_env();
    let mut session = MatchSession::new(config, Instant::now());

    println!("chess-duel v{}", env!("CARGO_PKG_VERSION"));
    println!("Moves: coordinates (e2e4, e7e8q) or SAN (Nf3, O-O).");
    println!("Commands: moves <square>, draw, resign, restart, quit.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        session.tick(Instant::now());

        if let Some(result) = session.result() {
            let clock = session.clock();
            println!("\n{}", session.game().position().board_string());
            println!(
                "[{} {} | {} {}]",
                session.player_name(Color::White),
                clock.format(Color::White),
                session.player_name(Color::Black),
                clock.format(Color::Black),
            );
            println!("Game over: {result}");
            print!("Play again? [y/n] ");
            let answer = match prompt(&mut lines) {
                Some(a) => a,
                None => break,
            };
            if answer.eq_ignore_ascii_case("y") {
                session.restart(Instant::now());
                continue;
            }
            break;
        }

        let clock = session.clock();
        let turn = session.side_to_move();
        println!("\n{}", session.game().position().board_string());
        println!(
            "[{} {} | {} {}]{}",
            session.player_name(Color::White),
            clock.format(Color::White),
            session.player_name(Color::Black),
            clock.format(Color::Black),
            if session.game().in_check() { "  (check)" } else { "" },
        );
        print!("{} ({turn}) > ", session.player_name(turn));

        let line = match prompt(&mut lines) {
            Some(line) => line,
            None => break,
        };
        if line.is_empty() {
            continue;
        }

        match line.as_str() {
            "quit" | "exit" => break,
            "resign" => {
                session.resign(turn);
            }
            "restart" => session.restart(Instant::now()),
            "draw" => {
                print!(
                    "{} offers a draw. Accept? [y/n] ",
                    session.player_name(turn)
                );
                let accepted = prompt(&mut lines)
                    .is_some_and(|a| a.eq_ignore_ascii_case("y"));
                if session.propose_draw(accepted).is_none() {
                    println!("Draw declined, play on.");
                }
            }
            _ if line.starts_with("moves ") => {
                match Square::parse(line.trim_start_matches("moves ").trim()) {
                    Some(from) => {
                        let targets: Vec<String> = session
                            .legal_moves_from(from)
                            .iter()
                            .map(|m| m.to.name())
                            .collect();
                        println!("{}", targets.join(" "));
                    }
                    None => println!("Not a square."),
                }
            }
            input => match submit(&mut session, input) {
                Ok(san) => println!("Played {san}."),
                // Rule violations are a re-prompt, never a crash.
                Err(err) => println!("{err}"),
            },
        }
    }
}

/// Resolve one line of input to a move attempt: coordinate pairs first,
/// then SAN.
fn submit(session: &mut MatchSession, input: &str) -> Result<String, ChessError> {
    let now = Instant::now();
    if let Some((from, to, promotion)) = parse_coordinates(input) {
        return session.attempt_move(from, to, promotion, now).map(|o| o.san);
    }
    let mv = san::from_san(session.game().position(), input)?;
    session
        .attempt_move(mv.from, mv.to, mv.promotion, now)
        .map(|o| o.san)
}

/// "e2e4" or "e7e8q" (trailing promotion letter).
fn parse_coordinates(input: &str) -> Option<(Square, Square, Option<PieceKind>)> {
    if !input.is_ascii() || (input.len() != 4 && input.len() != 5) {
        return None;
    }
    let from = Square::parse(&input[..2])?;
    let to = Square::parse(&input[2..4])?;
    let promotion = match input.as_bytes().get(4) {
        None => None,
        Some(b'q') | Some(b'Q') => Some(PieceKind::Queen),
        Some(b'r') | Some(b'R') => Some(PieceKind::Rook),
        Some(b'b') | Some(b'B') => Some(PieceKind::Bishop),
        Some(b'n') | Some(b'N') => Some(PieceKind::Knight),
        Some(_) => return None,
    };
    Some((from, to, promotion))
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<String> {
    io::stdout().flush().ok();
    lines.next()?.ok().map(|line| line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_parsing() {
        let (from, to, promo) = parse_coordinates("e2e4").unwrap();
        assert_eq!(from, Square::parse("e2").unwrap());
        assert_eq!(to, Square::parse("e4").unwrap());
        assert_eq!(promo, None);

        let (_, _, promo) = parse_coordinates("e7e8q").unwrap();
        assert_eq!(promo, Some(PieceKind::Queen));

        assert!(parse_coordinates("e2").is_none());
        assert!(parse_coordinates("e2e4x").is_none());
        assert!(parse_coordinates("z9e4").is_none());
    }
}
