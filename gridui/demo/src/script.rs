//! Scripted Sessions
//!
//! The demo replays a small line-based script against an in-memory host,
//! one host event per line:
//!
//! ```text
//! open <session> <page>            plain open
//! force <session> <page>           forceful open
//! click <session> <slot> [type] [@<id>|@previous]
//! back <session>
//! close <session>
//! refresh <session>
//! client-close <session>           the client closed its container
//! end <session>                    the client disconnected
//! show <session>
//! ```
//!
//! Sessions are named freely; a name gets a fresh [`SessionId`] on first use.
//! `@previous` tags a click with the container the session saw before its
//! last container change, which is how a lagging client's click looks.

use std::collections::HashMap;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use gridui_core::{
    ClickEvent, ClickType, DispatchConfig, ItemDisplay, MemoryHost, SessionId, UiManager,
};
use serde::Serialize;
use tracing::debug;

use crate::pages::Catalog;

/// Script replayed when no file is given (assumes three-row pages)
pub const DEFAULT_SCRIPT: &str = "\
# alice browses the shop and comes back
open alice main
click alice 13 left
click alice 26 left
click alice 18 left
back alice
# a lagging click after two forceful opens
force alice shop-2
force alice shop-3
click alice 10 left @previous
# a failing button leaves bob's session usable
open bob main
click bob 11 left
click bob 13 right
# nothing survives a disconnect
end alice
click alice 10 left
";

/// Where a click claims to have happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// Whatever is open now
    Current,
    /// An explicit container id
    Container(i32),
    /// The container shown before the last change
    Previous,
}

/// One script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain open
    Open { session: String, page: String },
    /// Forceful open
    Force { session: String, page: String },
    /// Click a slot
    Click {
        session: String,
        slot: usize,
        click: ClickType,
        target: ClickTarget,
    },
    /// Navigate back
    Back { session: String },
    /// Close the container
    Close { session: String },
    /// Repaint the container
    Refresh { session: String },
    /// Client closed the container
    ClientClose { session: String },
    /// Client disconnected
    End { session: String },
    /// Report state only
    Show { session: String },
}

impl Command {
    fn session(&self) -> &str {
        match self {
            Self::Open { session, .. }
            | Self::Force { session, .. }
            | Self::Click { session, .. }
            | Self::Back { session }
            | Self::Close { session }
            | Self::Refresh { session }
            | Self::ClientClose { session }
            | Self::End { session }
            | Self::Show { session } => session,
        }
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, rest)) = words.split_first() else {
            bail!("empty command");
        };
        let Some((&session, args)) = rest.split_first() else {
            bail!("'{verb}' needs a session name");
        };
        let session = session.to_string();

        let command = match (verb, args) {
            ("open", [page]) => Self::Open {
                session,
                page: (*page).to_string(),
            },
            ("force", [page]) => Self::Force {
                session,
                page: (*page).to_string(),
            },
            ("click", [slot, modifiers @ ..]) if modifiers.len() <= 2 => {
                let slot = slot
                    .parse()
                    .with_context(|| format!("invalid slot '{slot}'"))?;
                let mut click = ClickType::LeftClick;
                let mut target = ClickTarget::Current;
                for word in modifiers {
                    if let Some(tag) = word.strip_prefix('@') {
                        target = match tag {
                            "previous" => ClickTarget::Previous,
                            id => ClickTarget::Container(
                                id.parse()
                                    .with_context(|| format!("invalid container id '{id}'"))?,
                            ),
                        };
                    } else {
                        click = word.parse().map_err(anyhow::Error::msg)?;
                    }
                }
                Self::Click {
                    session,
                    slot,
                    click,
                    target,
                }
            }
            ("back", []) => Self::Back { session },
            ("close", []) => Self::Close { session },
            ("refresh", []) => Self::Refresh { session },
            ("client-close", []) => Self::ClientClose { session },
            ("end", []) => Self::End { session },
            ("show", []) => Self::Show { session },
            _ => bail!("unrecognised command '{line}'"),
        };
        Ok(command)
    }
}

/// What one script line did, printed as a JSON line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based line counter (comments and blanks excluded)
    pub step: usize,
    /// The line as written
    pub command: String,
    /// Session name
    pub session: String,
    /// Outcome reported by the manager
    pub outcome: String,
    /// Title of the page now shown, if any
    pub page: Option<String>,
    /// Container now shown, if any
    pub container_id: Option<i32>,
    /// Pages on the session's stack
    pub depth: usize,
}

/// Replays commands against a manager backed by a [`MemoryHost`]
pub struct ScriptRunner {
    manager: UiManager<MemoryHost<ItemDisplay>>,
    host: Arc<MemoryHost<ItemDisplay>>,
    catalog: Catalog,
    sessions: HashMap<String, SessionId>,
    previous: HashMap<String, i32>,
    steps: usize,
}

impl ScriptRunner {
    /// Runner with its own in-memory host
    pub fn new(catalog: Catalog, dispatch: DispatchConfig) -> Self {
        let host = Arc::new(MemoryHost::new());
        Self {
            manager: UiManager::with_config(Arc::clone(&host), dispatch),
            host,
            catalog,
            sessions: HashMap::new(),
            previous: HashMap::new(),
            steps: 0,
        }
    }

    /// The host the runner drives
    pub fn host(&self) -> &MemoryHost<ItemDisplay> {
        &self.host
    }

    /// Run every command in `reader`, handing each report to `emit`
    ///
    /// Returns the number of commands run.
    pub fn run<R, F>(&mut self, reader: R, mut emit: F) -> Result<usize>
    where
        R: BufRead,
        F: FnMut(&StepReport) -> Result<()>,
    {
        for (number, line) in reader.lines().enumerate() {
            let line = line.context("failed to read script")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let command: Command = line
                .parse()
                .with_context(|| format!("script line {}", number + 1))?;
            let report = self
                .execute(line, &command)
                .with_context(|| format!("script line {}", number + 1))?;
            emit(&report)?;
        }
        Ok(self.steps)
    }

    /// Run one command
    pub fn execute(&mut self, line: &str, command: &Command) -> Result<StepReport> {
        let name = command.session().to_string();
        let session = *self
            .sessions
            .entry(name.clone())
            .or_insert_with(SessionId::new);
        let before = self.manager.current_container(session);

        let outcome = match command {
            Command::Open { page, .. } => {
                format!("{:?}", self.manager.open(session, self.catalog.get(page)?))
            }
            Command::Force { page, .. } => format!(
                "{:?}",
                self.manager
                    .open_forcefully(session, self.catalog.get(page)?)
            ),
            Command::Click {
                slot,
                click,
                target,
                ..
            } => {
                let mut event = ClickEvent::new(*slot, *click);
                match target {
                    ClickTarget::Current => {}
                    ClickTarget::Container(id) => event = event.in_container(*id),
                    ClickTarget::Previous => {
                        let id = self
                            .previous
                            .get(&name)
                            .copied()
                            .with_context(|| format!("'{name}' has no previous container"))?;
                        event = event.in_container(id);
                    }
                }
                format!("{:?}", self.manager.handle_click(session, event))
            }
            Command::Back { .. } => format!("{:?}", self.manager.back(session)),
            Command::Close { .. } => flag(self.manager.close(session), "Closed"),
            Command::Refresh { .. } => flag(self.manager.refresh(session), "Refreshed"),
            Command::ClientClose { .. } => {
                let id = before.map_or(0, |container| container.container_id);
                flag(self.manager.handle_container_closed(session, id), "Closed")
            }
            Command::End { .. } => {
                self.manager.handle_session_end(session);
                self.host.disconnect(session);
                "Ended".to_string()
            }
            Command::Show { .. } => "Shown".to_string(),
        };

        let after = self.manager.current_container(session);
        if let Some(before) = before {
            if after.map(|c| c.container_id) != Some(before.container_id) {
                self.previous.insert(name.clone(), before.container_id);
            }
        }

        self.steps += 1;
        let report = StepReport {
            step: self.steps,
            command: line.to_string(),
            session: name,
            outcome,
            page: self
                .manager
                .current_page(session)
                .map(|page| page.title().to_string()),
            container_id: after.map(|c| c.container_id),
            depth: self.manager.history_depth(session),
        };
        debug!(step = report.step, outcome = %report.outcome, "Script step");
        Ok(report)
    }
}

fn flag(done: bool, label: &str) -> String {
    if done {
        label.to_string()
    } else {
        "NotOpen".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridui_core::ContainerLimits;

    fn runner() -> ScriptRunner {
        let catalog = Catalog::build(3, &ContainerLimits::default()).unwrap();
        ScriptRunner::new(catalog, DispatchConfig::default())
    }

    fn run(script: &str) -> Vec<StepReport> {
        let mut reports = Vec::new();
        runner()
            .run(script.as_bytes(), |report| {
                reports.push(report.clone());
                Ok(())
            })
            .unwrap();
        reports
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "open alice main".parse::<Command>().unwrap(),
            Command::Open {
                session: "alice".to_string(),
                page: "main".to_string()
            }
        );
        assert_eq!(
            "click bob 4 shift-right @previous".parse::<Command>().unwrap(),
            Command::Click {
                session: "bob".to_string(),
                slot: 4,
                click: ClickType::ShiftRightClick,
                target: ClickTarget::Previous,
            }
        );
        assert_eq!(
            "click bob 4 @7".parse::<Command>().unwrap(),
            Command::Click {
                session: "bob".to_string(),
                slot: 4,
                click: ClickType::LeftClick,
                target: ClickTarget::Container(7),
            }
        );
        assert!("click bob x".parse::<Command>().is_err());
        assert!("open alice".parse::<Command>().is_err());
        assert!("dance alice".parse::<Command>().is_err());
    }

    #[test]
    fn test_default_script_outcomes() {
        let reports = run(DEFAULT_SCRIPT);
        let outcomes: Vec<&str> = reports.iter().map(|r| r.outcome.as_str()).collect();

        assert_eq!(
            outcomes,
            vec![
                "Opened",
                "Dispatched",
                "Dispatched",
                "Dispatched",
                "Returned",
                "Opened",
                "Opened",
                "Stale",
                "Opened",
                "Failed",
                "Dispatched",
                "Ended",
                "NoPage",
            ]
        );
        assert_eq!(reports[3].page.as_deref(), Some("Shop (1/4)"));
        assert_eq!(reports[4].page.as_deref(), Some("Main Menu"));
        assert_eq!(reports[7].page.as_deref(), Some("Shop (3/4)"));
        assert_eq!(reports[10].page, None);
    }

    #[test]
    fn test_previous_without_history_fails() {
        let mut runner = runner();
        let result = runner.run("click carol 0 @previous\n".as_bytes(), |_| Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn test_client_close_clears_session() {
        let reports = run("open dave wardrobe\nclient-close dave\nshow dave\n");
        assert_eq!(reports[1].outcome, "Closed");
        assert_eq!(reports[2].page, None);
        assert_eq!(reports[2].depth, 0);
    }
}
