use crate::types::MatchSummary;
use std::cell::RefCell;
use std::io::{BufRead, Stdout, StdinLock, Write};

/// Capability to ask a human whether an uncertain match is right.
///
/// Calls are synchronous and block the run until answered, so prompts reach
/// the user one at a time in processing order.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait InteractionPrompt {
    /// Show `summary` and return `true` if the user accepts the match.
    fn ask(&self, summary: &MatchSummary) -> bool;
}

/// Line-oriented yes/no prompt over any reader/writer pair.
///
/// Accepts `y`/`yes` and `n`/`no` in any case, asks again on anything else,
/// and rejects when the input is closed.
///
/// # Examples
///
/// ```rust
/// use standards_playlist::prompt::{InteractionPrompt, LinePrompt};
/// # use standards_playlist::MatchSummary;
/// # let summary = MatchSummary {
/// #     recommendation: "Chet Baker (1954".into(),
/// #     standard_title: "My Funny Valentine".into(),
/// #     candidate_id: "id".into(),
/// #     candidate_artists: "Chet Baker".into(),
/// #     candidate_title: "My Funny Valentine - Vocal Version".into(),
/// #     candidate_album: None,
/// #     candidate_year: None,
/// #     title_similarity: 0.7,
/// #     artist_similarity: 1.0,
/// #     already_in_playlist: false,
/// # };
///
/// let prompt = LinePrompt::new(std::io::Cursor::new("yes\n"), Vec::new());
/// assert!(prompt.ask(&summary));
/// ```
pub struct LinePrompt<R, W> {
    io: RefCell<(R, W)>,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: RefCell::new((input, output)),
        }
    }

    /// Give back the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner()
    }
}

impl LinePrompt<StdinLock<'static>, Stdout> {
    /// Prompt on the process terminal.
    pub fn terminal() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractionPrompt for LinePrompt<R, W> {
    fn ask(&self, summary: &MatchSummary) -> bool {
        let mut io = self.io.borrow_mut();
        let (input, output) = &mut *io;

        let _ = writeln!(output, "🤔 Possible match for '{}'", summary.standard_title);
        let _ = writeln!(output, "{summary}");

        loop {
            let _ = write!(output, "   Accept this match? (y/n): ");
            let _ = output.flush();

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    log::warn!(
                        "Prompt input closed, rejecting '{}'",
                        summary.candidate_title
                    );
                    return false;
                }
                Ok(_) => match parse_answer(&line) {
                    Some(answer) => return answer,
                    None => {
                        let _ = writeln!(output, "   Please enter 'y' (yes) or 'n' (no)");
                    }
                },
                Err(e) => {
                    log::error!("Failed to read prompt answer: {e}");
                    return false;
                }
            }
        }
    }
}

/// Interpret a yes/no answer. Returns `None` for anything unrecognised.
pub fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Answers every prompt the same way without asking anyone.
///
/// Used for unattended runs (`--yes` / `--no-prompt`).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl InteractionPrompt for FixedAnswer {
    fn ask(&self, summary: &MatchSummary) -> bool {
        log::info!(
            "{} uncertain match without prompting: {} - {}",
            if self.0 { "Accepting" } else { "Rejecting" },
            summary.candidate_artists,
            summary.candidate_title
        );
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn summary() -> MatchSummary {
        MatchSummary {
            recommendation: "Dexter Gordon (1962".to_string(),
            standard_title: "Cheese Cake".to_string(),
            candidate_id: "abc".to_string(),
            candidate_artists: "Dexter Gordon".to_string(),
            candidate_title: "Cheese Cake - Alternate".to_string(),
            candidate_album: Some("Go".to_string()),
            candidate_year: Some(1962),
            title_similarity: 0.72,
            artist_similarity: 1.0,
            already_in_playlist: false,
        }
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), Some(true));
        assert_eq!(parse_answer("  YES "), Some(true));
        assert_eq!(parse_answer("n"), Some(false));
        assert_eq!(parse_answer("No\r\n"), Some(false));
        assert_eq!(parse_answer("maybe"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn test_reasks_until_valid_answer() {
        let prompt = LinePrompt::new(Cursor::new("what\n\nn\n"), Vec::new());
        assert!(!prompt.ask(&summary()));

        let (_, output) = prompt.into_inner();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches("Accept this match?").count(), 3);
        assert_eq!(output.matches("Please enter").count(), 2);
        assert!(output.contains("Dexter Gordon - Cheese Cake - Alternate"));
    }

    #[test]
    fn test_closed_input_rejects() {
        let prompt = LinePrompt::new(Cursor::new(""), Vec::new());
        assert!(!prompt.ask(&summary()));
    }

    #[test]
    fn test_prompts_are_sequential() {
        let prompt = LinePrompt::new(Cursor::new("y\nn\n"), Vec::new());
        assert!(prompt.ask(&summary()));
        assert!(!prompt.ask(&summary()));
        assert!(!prompt.ask(&summary()));
    }

    #[test]
    fn test_fixed_answer() {
        assert!(FixedAnswer(true).ask(&summary()));
        assert!(!FixedAnswer(false).ask(&summary()));
    }
}
