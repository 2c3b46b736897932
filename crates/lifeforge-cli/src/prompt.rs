//! Narrow interface to the interactive prompt layer.
//!
//! The pipelines only ever ask three things of the operator: confirm a
//! gate, pick from a list, or type a value. `Ok(None)` from the gate
//! methods means the operator cancelled (Esc), which callers translate
//! into a clean pipeline cancellation rather than an error.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Prompt failed: {0}")]
    Terminal(#[from] dialoguer::Error),
}

pub trait Prompter {
    /// Yes/no gate. `None` means cancelled.
    fn confirm(&self, prompt: &str, default: bool) -> Result<Option<bool>, PromptError>;

    /// Pick one item from a list. `None` means cancelled.
    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<String>, PromptError>;

    /// Free-form text entry with an optional default.
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String, PromptError>;
}

/// The real, dialoguer-backed prompt layer.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<Option<bool>, PromptError> {
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact_opt()?)
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<String>, PromptError> {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?;
        Ok(selection.and_then(|index| items.get(index).cloned()))
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme).with_prompt(prompt);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }
}

/// Icon identifiers look like `mdi:tool` — an Iconify collection prefix
/// and an icon name.
static ICON_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z0-9][a-z0-9-]*:[a-z0-9][a-z0-9-]*$").expect("icon pattern is valid"));

/// Ask for an icon identifier until one matches the `collection:icon-name`
/// shape.
pub fn choose_icon(prompter: &dyn Prompter) -> Result<String, PromptError> {
    loop {
        let icon = prompter.input("Module icon (collection:icon-name)", Some("tabler:cube"))?;
        if ICON_PATTERN.is_match(&icon) {
            return Ok(icon);
        }
        lifeforge_logger::warn(&format!(
            "'{}' is not a valid icon identifier, expected collection:icon-name",
            icon
        ));
    }
}
