//! Terminal prompts for passwords and confirmations.

use std::path::Path;

use anyhow::{Context, Result};
use inquire::{Confirm, PasswordDisplayMode};
use zesec_rs::Password;

pub struct Prompt;

impl Prompt {
    /// Asks twice; inquire re-prompts until both entries match.
    pub fn encryption_password() -> Result<Password> {
        let password = inquire::Password::new("Enter encryption password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_custom_confirmation_message("Confirm password:")
            .with_custom_confirmation_error_message("The passwords do not match.")
            .with_validator(inquire::required!("password cannot be empty"))
            .prompt()
            .context("password input failed")?;

        Ok(Password::from_string(password))
    }

    pub fn decryption_password() -> Result<Password> {
        let password = inquire::Password::new("Enter decryption password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .with_validator(inquire::required!("password cannot be empty"))
            .prompt()
            .context("password input failed")?;

        Ok(Password::from_string(password))
    }

    pub fn confirm_overwrite(path: &Path) -> Result<bool> {
        Self::confirm(&format!("{} already exists. Overwrite?", path.display()))
    }

    pub fn confirm_wipe(path: &Path, passes: u32) -> Result<bool> {
        Self::confirm(&format!("Overwrite {} with {passes} pass(es) and delete it? This cannot be undone.", path.display()))
    }

    fn confirm(message: &str) -> Result<bool> {
        Confirm::new(message).with_default(false).prompt().context("confirmation failed")
    }
}
