//! Line-oriented presentation layer over `QuizLoopService`.

use std::io::{self, BufRead, Write};

use quiz_core::model::{LabelError, OptionLabel, Question};
use services::{
    PassSummary, QuizLoopService, QuizPhase, QuizRequest, QuizSession, Reveal, SessionError,
    SessionView, SubmitResult,
};

/// Session commands typed at the answer prompt. The `:` prefix keeps them
/// apart from option letters.
const PAUSE: &str = ":p";
const RESUME: &str = ":r";
const QUIT: &str = ":q";

/// Parse a selection like `a c`, `a&c`, `A, C` or `ac`.
pub fn parse_selection(line: &str) -> Result<Vec<OptionLabel>, LabelError> {
    let mut labels = Vec::new();
    for token in line
        .split(|c: char| c.is_whitespace() || c == ',' || c == '&')
        .filter(|t| !t.is_empty())
    {
        match token.parse::<OptionLabel>() {
            Ok(label) => labels.push(label),
            Err(LabelError::NotALetter { .. })
                if token.len() > 1 && token.chars().all(|c| c.is_ascii_alphabetic()) =>
            {
                for c in token.chars() {
                    labels.push(c.to_string().parse()?);
                }
            }
            Err(err) => return Err(err),
        }
    }
    if labels.is_empty() {
        return Err(LabelError::Empty);
    }
    Ok(labels)
}

fn format_secs(secs: i64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn format_labels<'a>(labels: impl IntoIterator<Item = &'a OptionLabel>) -> String {
    labels
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Renders one session and reads the user's actions from `input`.
pub struct Terminal<'a, R, W> {
    service: &'a QuizLoopService,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Terminal<'a, R, W> {
    pub fn new(service: &'a QuizLoopService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    /// Reads one trimmed line; `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// Run passes until the user quits or input ends.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the terminal and session errors from `start`.
    pub fn run(
        &mut self,
        session: &mut QuizSession,
        request: &QuizRequest,
    ) -> Result<(), Box<dyn std::error::Error>> {
        writeln!(
            self.output,
            "Question pool: {} questions. Each pass draws up to {}.",
            self.service.store_size(),
            request.count
        )?;
        writeln!(
            self.output,
            "Answer with option letters. {PAUSE} pause, {RESUME} resume, {QUIT} end the pass."
        )?;

        loop {
            self.service.start(session, request)?;
            if !self.play_pass(session)? {
                break;
            }
            if let Some(summary) = session.summary() {
                self.print_summary(&summary)?;
                self.print_missed(session, summary.pass)?;
            }
            if !self.after_pass(session)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns false if input ended mid-pass.
    fn play_pass(&mut self, session: &mut QuizSession) -> io::Result<bool> {
        loop {
            let view = self.service.view(session);
            if view.phase == QuizPhase::Finished {
                if view.timed_out {
                    writeln!(self.output, "Time is up.")?;
                }
                return Ok(true);
            }
            let Some(question) = self.service.current_question(session).cloned() else {
                return Ok(true);
            };
            self.print_question(&view, &question)?;

            let Some(line) = self.read_line("> ")? else {
                self.abandon(session)?;
                return Ok(false);
            };
            match line.as_str() {
                PAUSE => match self.service.pause(session) {
                    Ok(_) => {
                        writeln!(self.output, "Paused. Enter {RESUME} to resume.")?;
                        self.wait_for_resume(session)?;
                    }
                    // Expired while reading input; the next view shows the finish.
                    Err(SessionError::NotInProgress { .. }) => {}
                    Err(err) => return Err(to_io(err)),
                },
                QUIT => {
                    self.abandon(session)?;
                    return Ok(true);
                }
                RESUME => {}
                _ => self.answer(session, &question, &line)?,
            }
        }
    }

    fn wait_for_resume(&mut self, session: &mut QuizSession) -> io::Result<()> {
        while let Some(line) = self.read_line("(paused) ")? {
            if line == RESUME {
                self.service.resume(session).map_err(to_io)?;
                return Ok(());
            }
            writeln!(self.output, "Enter {RESUME} to resume.")?;
        }
        Ok(())
    }

    fn answer(
        &mut self,
        session: &mut QuizSession,
        question: &Question,
        line: &str,
    ) -> io::Result<()> {
        let labels = match parse_selection(line) {
            Ok(labels) => labels,
            Err(err) => {
                writeln!(self.output, "{err}. Enter option letters, e.g. a or a c.")?;
                return Ok(());
            }
        };

        match self.service.submit(session, labels) {
            Ok(SubmitResult::Accepted(reveal)) => {
                self.print_reveal(question, &reveal)?;
                if self.read_line("Press Enter for the next question ")?.is_some() {
                    self.service.next(session).map_err(to_io)?;
                } else {
                    self.abandon(session)?;
                }
            }
            Ok(SubmitResult::NeedsCount { required, .. }) => {
                writeln!(self.output, "Select exactly {required} options.")?;
            }
            Ok(SubmitResult::InvalidLabel { label }) => {
                writeln!(self.output, "There is no option {label}.")?;
            }
            Ok(SubmitResult::Expired) => {}
            Err(SessionError::Paused) => {
                writeln!(self.output, "The quiz is paused. Enter {RESUME} to resume.")?;
            }
            Err(err) => return Err(to_io(err)),
        }
        Ok(())
    }

    fn abandon(&mut self, session: &mut QuizSession) -> io::Result<()> {
        match self.service.abandon(session) {
            Ok(_) | Err(SessionError::NotInProgress { .. }) => Ok(()),
            Err(err) => Err(to_io(err)),
        }
    }

    /// Returns true to start another pass.
    fn after_pass(&mut self, session: &QuizSession) -> io::Result<bool> {
        loop {
            let Some(line) = self.read_line("[again / stats / export / quit] ")? else {
                return Ok(false);
            };
            match line.as_str() {
                "again" | "a" => return Ok(true),
                "stats" | "s" => self.print_stats(session)?,
                "export" | "e" => {
                    let json = serde_json::to_string_pretty(self.service.history(session))
                        .map_err(io::Error::other)?;
                    writeln!(self.output, "{json}")?;
                }
                "quit" | "q" => return Ok(false),
                _ => writeln!(self.output, "Unknown command.")?,
            }
        }
    }

    fn print_question(&mut self, view: &SessionView, question: &Question) -> io::Result<()> {
        writeln!(self.output)?;
        write!(
            self.output,
            "Question {} / {} [{}]",
            view.index + 1,
            view.total,
            question.category()
        )?;
        if let (Some(remaining), Some(limit)) = (view.remaining_secs, view.limit_secs) {
            write!(
                self.output,
                "  time left {} of {}",
                format_secs(remaining),
                format_secs(limit)
            )?;
        }
        writeln!(self.output)?;
        writeln!(self.output, "{}", question.text())?;
        for option in question.options() {
            writeln!(self.output, "  {}. {}", option.label(), option.text())?;
        }
        if question.is_multi_answer() {
            writeln!(self.output, "(choose {})", question.required_selections())?;
        }
        Ok(())
    }

    fn print_reveal(&mut self, question: &Question, reveal: &Reveal) -> io::Result<()> {
        if reveal.is_correct {
            writeln!(self.output, "Correct!")?;
        } else {
            writeln!(
                self.output,
                "Incorrect. The answer is {} ({}).",
                format_labels(&reveal.correct_labels),
                question.correct_texts().join(", ")
            )?;
        }
        if !reveal.explanation.is_empty() {
            writeln!(self.output, "Explanation: {}", reveal.explanation)?;
        }
        Ok(())
    }

    fn print_summary(&mut self, summary: &PassSummary) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "Pass {} finished.", summary.pass)?;
        writeln!(
            self.output,
            "Score: {}/{} ({:.1}%) in {}",
            summary.score,
            summary.total,
            summary.percent,
            format_secs(summary.elapsed_secs)
        )?;
        if summary.passed {
            writeln!(self.output, "Pass line cleared.")?;
        } else {
            writeln!(self.output, "Below the pass line. Review the explanations.")?;
        }
        Ok(())
    }

    /// Questions answered wrongly in `pass`, looked up in the pool for their text.
    fn print_missed(&mut self, session: &QuizSession, pass: u32) -> io::Result<()> {
        let store = self.service.store();
        let missed: Vec<_> = session
            .history()
            .for_pass(pass)
            .filter(|entry| !entry.was_correct)
            .filter_map(|entry| store.get(entry.question_id))
            .collect();
        if missed.is_empty() {
            return Ok(());
        }
        writeln!(self.output, "To review:")?;
        for question in missed {
            writeln!(self.output, "  {} {}", question.id(), question.text())?;
        }
        Ok(())
    }

    fn print_stats(&mut self, session: &QuizSession) -> io::Result<()> {
        let stats = self.service.stats(session);
        writeln!(
            self.output,
            "{} answers over {} passes, {:.1}% correct",
            stats.attempts, stats.passes, stats.accuracy
        )?;
        for category in &stats.by_category {
            writeln!(
                self.output,
                "  {:<14} {:>3}/{:<3} {:>5.1}%",
                category.category.as_str(),
                category.correct,
                category.attempts,
                category.accuracy
            )?;
        }
        if let Some(weakest) = stats.weakest() {
            writeln!(self.output, "Weakest category: {}", weakest.category)?;
        }
        Ok(())
    }
}

fn to_io(err: SessionError) -> io::Error {
    io::Error::other(err)
}
