//! Interactive menu loop over any line-based input and output.
use anyhow::{Context, Result};
use cagebound_game::{
    Action, EngineError, Profile, ProfileStorage, ProgressionEngine, RandomSource, Session,
};
use chrono::NaiveDateTime;
use colored::Colorize;
use std::io::{BufRead, Write};
use thiserror::Error;

use crate::info::info_text;
use crate::render::{describe_report, detailed_stats, status};

/// A menu selection that could not be used. The player is asked again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("The input was not valid; there was no selection")]
    Empty,
    #[error("The input was not valid; {0:?} is not an integer")]
    NotInteger(String),
    #[error("The input was not valid; {selection} is not between 0 and {max}")]
    OutOfRange { selection: i64, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Act(Action),
    ShowStats,
    ShowInfo,
    Exit,
}

impl MenuItem {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Act(Action::CommandCaging) => "[Be Commanded] Start Caging (free)",
            Self::Act(Action::BuyCaging) => "[Beg]          Start Caging (purchase)",
            Self::Act(Action::MarkSuccess) => "[Be Praised]   Mark Caging as Complete",
            Self::Act(Action::MarkFailure) => "[Be Punished]  Mark Caging as Failed",
            Self::Act(Action::RefuseCaging) => "[Grovel]       Try to Refuse Caging",
            Self::Act(Action::BuyBathroomBreak) => "[Relief]       Purchase a Bathroom Break",
            Self::Act(Action::RedeemPhoto) => "[Admire]       Redeem Photo",
            Self::ShowStats => "               Show Stats",
            Self::ShowInfo => "               Show Info",
            Self::Exit => "               Exit",
        }
    }
}

/// Legal actions for the profile's state followed by the fixed entries.
pub fn menu_items(profile: &Profile) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = profile
        .available_actions()
        .into_iter()
        .map(MenuItem::Act)
        .collect();
    items.extend([MenuItem::ShowStats, MenuItem::ShowInfo, MenuItem::Exit]);
    items
}

/// Parse a zero-based menu index.
///
/// # Errors
///
/// Returns an [`InputError`] for blank, non-numeric or out-of-range input.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let selection: i64 = trimmed
        .parse()
        .map_err(|_| InputError::NotInteger(trimmed.to_string()))?;
    usize::try_from(selection)
        .ok()
        .filter(|index| *index < count)
        .ok_or(InputError::OutOfRange {
            selection,
            max: count.saturating_sub(1),
        })
}

/// How a session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Exited,
    EndOfInput,
    Eliminated,
}

pub struct Menu<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Menu<I, O> {
    pub const fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> O {
        self.output
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read from input")?;
        Ok((read > 0).then_some(line))
    }

    /// Ask for a profile name until a non-blank one arrives. `None` on end of input.
    pub fn prompt_name(&mut self) -> Result<Option<String>> {
        loop {
            writeln!(self.output, "Please enter a profile name")?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let name = line.trim();
            if !name.is_empty() {
                return Ok(Some(name.to_string()));
            }
            writeln!(self.output, "{}", "A profile name cannot be blank".red())?;
        }
    }

    pub fn greet(&mut self, session: &Session) -> Result<()> {
        let name = session.profile().name();
        if session.was_created() {
            writeln!(self.output, "{}", format!("Created a new profile for {name}").green())?;
        } else {
            writeln!(self.output, "Welcome back, {name}")?;
        }
        Ok(())
    }

    /// Run menus until the player exits, input ends or the profile is eliminated.
    ///
    /// Rejected actions are reported and the menu is shown again. Exit and end
    /// of input save; elimination returns without saving.
    ///
    /// # Errors
    ///
    /// Returns storage and I/O failures.
    pub fn run<S, R>(
        &mut self,
        engine: &mut ProgressionEngine<S, R>,
        session: &mut Session,
        clock: impl Fn() -> NaiveDateTime,
    ) -> Result<SessionEnd>
    where
        S: ProfileStorage,
        R: RandomSource,
    {
        loop {
            writeln!(self.output, "{}", status(session.profile()))?;
            let items = menu_items(session.profile());
            writeln!(self.output, "Choose an option")?;
            for (index, item) in items.iter().enumerate() {
                writeln!(self.output, "{index}) {}", item.label())?;
            }
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                engine.save(session)?;
                writeln!(self.output, "Exiting...")?;
                return Ok(SessionEnd::EndOfInput);
            };
            writeln!(self.output)?;

            let item = match parse_selection(&line, items.len()) {
                Ok(index) => items[index],
                Err(err) => {
                    writeln!(self.output, "{}\n", err.to_string().red())?;
                    continue;
                }
            };

            match item {
                MenuItem::Exit => {
                    engine.save(session)?;
                    writeln!(self.output, "Exiting...")?;
                    return Ok(SessionEnd::Exited);
                }
                MenuItem::ShowStats => {
                    writeln!(self.output, "{}", detailed_stats(session.profile()))?;
                }
                MenuItem::ShowInfo => {
                    write!(self.output, "{}", info_text())?;
                }
                MenuItem::Act(action) => match engine.perform(session, action, clock()) {
                    Ok(report) => {
                        writeln!(self.output, "{}", describe_report(&report))?;
                        if report.is_eliminated() {
                            return Ok(SessionEnd::Eliminated);
                        }
                    }
                    Err(EngineError::Game(err)) => {
                        log::debug!("{action} rejected: {err}");
                        writeln!(self.output, "{}\n", err.to_string().yellow())?;
                    }
                    Err(err) => return Err(err.into()),
                },
            }
        }
    }
}
