//! Interactive Session
//!
//! The menu loop wiring the credential store, repository auto-detection and
//! the label API client together. Session state is an explicit context
//! struct; there is no module-level mutable state. All failures inside an
//! action print a colored message and return control to the menu.

use colored::Colorize;
use inquire::{
    validator::Validation, Confirm, InquireError, Password, PasswordDisplayMode, Select, Text,
};

use crate::credentials::{self, CredentialStore, MigrationOutcome, StoredCredentials};
use crate::crypto;
use crate::detect::{detect_repository, DetectionMethod, DetectionResult, RepositoryReference};
use crate::error::{Error, Result};
use crate::github::{authenticated_login, CreateOutcome, DeleteOutcome, LabelClient};
use crate::labels::{self, LabelRecord};

/// Bound on the credential-collection retry loop
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Menu entries offered by the interactive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    CreateLabel,
    CreatePreset,
    DeleteLabel,
    DeleteAll,
    Import,
    SampleJson,
    SampleYaml,
    Settings,
    Exit,
}

impl MenuAction {
    fn all() -> Vec<MenuAction> {
        vec![
            MenuAction::CreateLabel,
            MenuAction::CreatePreset,
            MenuAction::DeleteLabel,
            MenuAction::DeleteAll,
            MenuAction::Import,
            MenuAction::SampleJson,
            MenuAction::SampleYaml,
            MenuAction::Settings,
            MenuAction::Exit,
        ]
    }
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MenuAction::CreateLabel => "Create a label",
            MenuAction::CreatePreset => "Create the preset label set",
            MenuAction::DeleteLabel => "Delete a label",
            MenuAction::DeleteAll => "Delete all labels",
            MenuAction::Import => "Import labels from a file",
            MenuAction::SampleJson => "Generate a JSON sample (hyouji.json)",
            MenuAction::SampleYaml => "Generate a YAML sample (hyouji.yaml)",
            MenuAction::Settings => "Display settings",
            MenuAction::Exit => "Exit",
        };
        write!(f, "{label}")
    }
}

/// Session context threaded through the menu loop
pub struct Session {
    store: CredentialStore,
    credentials: StoredCredentials,
    repository: RepositoryReference,
    client: LabelClient,
}

/// Run the interactive session
///
/// # Errors
/// Returns an error only for failures before the menu loop starts (no home
/// directory, credentials invalid after the bounded retries). Failures inside
/// an action are reported and the loop continues.
pub async fn run() -> Result<()> {
    println!("{}", "hyouji - GitHub label manager".bold());

    let store = CredentialStore::new()?;
    match store.migrate_to_encrypted() {
        Ok(MigrationOutcome::Migrated) => {
            println!("{} Stored token re-saved obfuscated", "✓".green());
        }
        Ok(_) => {}
        Err(e) => eprintln!("{} Could not migrate stored config: {}", "!".yellow(), e),
    }

    let cwd = std::env::current_dir()?;
    let detection = detect_repository(&cwd).await;
    report_detection(&detection);

    let credentials = resolve_credentials(&store).await?;
    let repository = resolve_repository(&detection, &credentials)?;
    let client =
        LabelClient::new(&credentials.token, &repository.owner, &repository.repo).await?;

    let mut session = Session {
        store,
        credentials,
        repository,
        client,
    };

    menu_loop(&mut session).await
}

async fn menu_loop(session: &mut Session) -> Result<()> {
    loop {
        println!();
        let action = match Select::new("What would you like to do?", MenuAction::all()).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        if action == MenuAction::Exit {
            break;
        }

        if let Err(e) = dispatch(session, action).await {
            // The current action aborts; the menu survives
            eprintln!("{} {}", "✗".red(), e.to_string().red());
        }
    }

    println!("{} Bye", "✓".green());
    Ok(())
}

async fn dispatch(session: &mut Session, action: MenuAction) -> Result<()> {
    match action {
        MenuAction::CreateLabel => create_one_label(session).await,
        MenuAction::CreatePreset => create_preset(session).await,
        MenuAction::DeleteLabel => delete_one_label(session).await,
        MenuAction::DeleteAll => delete_all_labels(session).await,
        MenuAction::Import => import_from_file(session).await,
        MenuAction::SampleJson => {
            let path = labels::write_sample_json()?;
            println!(
                "{} Sample written to {}",
                "✓".green(),
                path.display().to_string().cyan()
            );
            Ok(())
        }
        MenuAction::SampleYaml => {
            let path = labels::write_sample_yaml()?;
            println!(
                "{} Sample written to {}",
                "✓".green(),
                path.display().to_string().cyan()
            );
            Ok(())
        }
        MenuAction::Settings => {
            display_settings(session);
            Ok(())
        }
        MenuAction::Exit => Ok(()),
    }
}

// --- credential and repository resolution ---

fn report_detection(detection: &DetectionResult) {
    match (&detection.repository, &detection.error) {
        (Some(info), _) => println!(
            "{} Detected repository {} via {}",
            "✓".green(),
            format!("{}/{}", info.owner, info.repo).cyan(),
            info.detection_method
        ),
        (None, Some(reason)) => println!("{} Auto-detection skipped: {}", "!".yellow(), reason),
        (None, None) => {}
    }
}

/// Resolve working credentials, bounded to a fixed number of attempts
///
/// Each attempt validates the saved or freshly entered token against the
/// live API. A login mismatch discards both fields; any other failure keeps
/// the owner as the prefill for the next prompt.
async fn resolve_credentials(store: &CredentialStore) -> Result<StoredCredentials> {
    let mut prefill_owner: Option<String> = None;

    for attempt in 1..=MAX_CREDENTIAL_ATTEMPTS {
        let candidate = match store.load()? {
            Some(saved) => saved,
            None => {
                let (token, owner) = prompt_credentials(prefill_owner.as_deref())?;
                let written = store.save(&token, &owner)?;
                println!(
                    "{} Credentials saved to {}",
                    "✓".green(),
                    written.display().to_string().cyan()
                );
                StoredCredentials {
                    token,
                    owner,
                    last_updated: chrono::Utc::now(),
                }
            }
        };

        match authenticated_login(&candidate.token).await {
            Ok(login) if login.eq_ignore_ascii_case(&candidate.owner) => {
                println!("{} Authenticated as {}", "✓".green(), login.cyan());
                return Ok(candidate);
            }
            Ok(login) => {
                eprintln!(
                    "{} Owner {} does not match authenticated login {}; credentials discarded",
                    "!".yellow(),
                    candidate.owner.cyan(),
                    login.cyan()
                );
                prefill_owner = None;
                store.clear()?;
            }
            Err(e) => {
                eprintln!(
                    "{} Could not validate saved credentials ({}); token discarded",
                    "!".yellow(),
                    e
                );
                prefill_owner = Some(candidate.owner.clone());
                store.clear()?;
            }
        }

        if attempt < MAX_CREDENTIAL_ATTEMPTS {
            println!(
                "{} Retrying credential entry ({}/{})",
                "•".blue(),
                attempt + 1,
                MAX_CREDENTIAL_ATTEMPTS
            );
        }
    }

    Err(Error::AuthenticationFailed)
}

fn prompt_credentials(prefill_owner: Option<&str>) -> Result<(String, String)> {
    println!("{} Enter your GitHub credentials", "•".blue());

    let token = Password::new("Personal access token:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_validator(|input: &str| {
            if credentials::is_valid_token_shape(input.trim()) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    "Expected ghp_/gho_/ghu_/ghs_ followed by 36 alphanumeric characters".into(),
                ))
            }
        })
        .prompt()?;

    let mut owner_prompt =
        Text::new("GitHub owner (user or organization):").with_validator(non_empty);
    if let Some(owner) = prefill_owner {
        owner_prompt = owner_prompt.with_default(owner);
    }
    let owner = owner_prompt.prompt()?;

    Ok((token.trim().to_string(), owner.trim().to_string()))
}

fn resolve_repository(
    detection: &DetectionResult,
    credentials: &StoredCredentials,
) -> Result<RepositoryReference> {
    if let Some(info) = &detection.repository {
        let use_detected = Confirm::new(&format!(
            "Use detected repository {}/{}?",
            info.owner, info.repo
        ))
        .with_default(true)
        .prompt()?;
        if use_detected {
            return Ok(info.clone());
        }
    }

    let owner = Text::new("Repository owner:")
        .with_default(&credentials.owner)
        .with_validator(non_empty)
        .prompt()?;
    let repo = Text::new("Repository name:")
        .with_validator(non_empty)
        .prompt()?;

    Ok(RepositoryReference {
        owner: owner.trim().to_string(),
        repo: repo.trim().to_string(),
        remote_url: None,
        detection_method: DetectionMethod::Manual,
    })
}

fn non_empty(input: &str) -> std::result::Result<Validation, inquire::CustomUserError> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("Value must not be empty".into()))
    } else {
        Ok(Validation::Valid)
    }
}

// --- menu actions ---

fn confirm_dry_run() -> Result<bool> {
    Ok(
        Confirm::new("Dry run (validate and report without making changes)?")
            .with_default(false)
            .prompt()?,
    )
}

async fn create_one_label(session: &Session) -> Result<()> {
    let name = Text::new("Label name:").with_validator(non_empty).prompt()?;
    let color = Text::new("Label color (6-digit hex without #):")
        .with_help_message("Leave blank to use a default color")
        .with_validator(|input: &str| {
            let trimmed = input.trim();
            if trimmed.is_empty() || labels::is_valid_hex_color(trimmed) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    "Expected 6 hex digits, e.g. d73a4a".into(),
                ))
            }
        })
        .prompt()?;
    let description = Text::new("Label description:")
        .with_help_message("Leave blank for none")
        .prompt()?;

    let record = LabelRecord {
        name: name.trim().to_string(),
        color: non_blank(&color),
        description: non_blank(&description),
    };

    let dry_run = confirm_dry_run()?;
    apply_creates(session, &[record], dry_run).await
}

async fn create_preset(session: &Session) -> Result<()> {
    let preset = labels::preset_labels();
    println!(
        "{} Creating the preset set of {} labels",
        "•".blue(),
        preset.len()
    );
    let dry_run = confirm_dry_run()?;
    apply_creates(session, &preset, dry_run).await
}

fn non_blank(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Create each record sequentially and print a per-action summary
async fn apply_creates(session: &Session, records: &[LabelRecord], dry_run: bool) -> Result<()> {
    if records.is_empty() {
        println!("{} Nothing to create", "!".yellow());
        return Ok(());
    }

    if dry_run {
        for record in records {
            println!("{} Would create label: {}", "•".blue(), record.name.cyan());
        }
        println!(
            "{} Dry run: {} label(s) would be created",
            "✓".green(),
            records.len().to_string().green()
        );
        return Ok(());
    }

    let mut created = 0u32;
    let mut existing = 0u32;
    let mut failed = 0u32;

    for record in records {
        match session.client.create_label(record).await {
            CreateOutcome::Created => {
                created += 1;
                println!("{} Created label: {}", "✓".green(), record.name.cyan());
            }
            CreateOutcome::AlreadyExists => {
                existing += 1;
                println!("{} Label already exists: {}", "!".yellow(), record.name.cyan());
            }
            CreateOutcome::RepositoryNotFound => {
                failed += 1;
                eprintln!(
                    "{} Repository not found: {}",
                    "✗".red(),
                    session.client.repository().cyan()
                );
            }
            CreateOutcome::Unexpected(message) => {
                failed += 1;
                eprintln!(
                    "{} Unexpected error creating {}: {}",
                    "✗".red(),
                    record.name.cyan(),
                    message
                );
            }
        }
    }

    println!(
        "{} Created: {}  Already existed: {}  Failed: {}",
        "✓".green(),
        created.to_string().green(),
        existing.to_string().yellow(),
        failed.to_string().red()
    );
    Ok(())
}

async fn delete_one_label(session: &Session) -> Result<()> {
    let name = Text::new("Label name to delete:")
        .with_validator(non_empty)
        .prompt()?;
    let name = name.trim().to_string();

    let dry_run = confirm_dry_run()?;
    if dry_run {
        println!("{} Would delete label: {}", "•".blue(), name.cyan());
        return Ok(());
    }

    report_delete(&name, &session.client.delete_label(&name).await);
    Ok(())
}

async fn delete_all_labels(session: &Session) -> Result<()> {
    let names = session.client.list_label_names().await?;
    if names.is_empty() {
        println!("{} The repository has no labels", "!".yellow());
        return Ok(());
    }

    println!(
        "{} Found {} label(s) (first 100 at most)",
        "•".blue(),
        names.len()
    );

    let dry_run = confirm_dry_run()?;
    if dry_run {
        for name in &names {
            println!("{} Would delete label: {}", "•".blue(), name.cyan());
        }
        return Ok(());
    }

    let confirmed = Confirm::new(&format!(
        "Delete all {} labels from {}?",
        names.len(),
        session.client.repository()
    ))
    .with_default(false)
    .prompt()?;
    if !confirmed {
        println!("{} Aborted", "!".yellow());
        return Ok(());
    }

    let mut deleted = 0u32;
    let mut failed = 0u32;
    for (name, outcome) in session.client.delete_labels(&names).await {
        report_delete(&name, &outcome);
        match outcome {
            DeleteOutcome::Deleted => deleted += 1,
            _ => failed += 1,
        }
    }

    println!(
        "{} Deleted: {}  Failed: {}",
        "✓".green(),
        deleted.to_string().green(),
        failed.to_string().red()
    );
    Ok(())
}

fn report_delete(name: &str, outcome: &DeleteOutcome) {
    match outcome {
        DeleteOutcome::Deleted => {
            println!("{} Deleted label: {}", "✓".green(), name.cyan());
        }
        DeleteOutcome::NotFound => {
            println!("{} Label not found: {}", "!".yellow(), name.cyan());
        }
        DeleteOutcome::Failed(message) => {
            eprintln!("{} Could not delete {}: {}", "✗".red(), name.cyan(), message);
        }
    }
}

async fn import_from_file(session: &Session) -> Result<()> {
    let path = Text::new("Path to import file (.json, .yaml, .yml):")
        .with_validator(non_empty)
        .prompt()?;

    let batch = labels::load_import_file(std::path::Path::new(path.trim()))?;

    for warning in &batch.warnings {
        println!("{} {}", "!".yellow(), warning);
    }
    for skipped in &batch.skipped {
        println!(
            "{} Skipping record {}: {}",
            "!".yellow(),
            skipped.index + 1,
            skipped.reason
        );
    }

    if batch.valid.is_empty() {
        println!("{} No valid records in the file", "!".yellow());
        return Ok(());
    }

    println!(
        "{} {} valid record(s), {} skipped",
        "•".blue(),
        batch.valid.len().to_string().green(),
        batch.skipped.len().to_string().yellow()
    );

    let dry_run = confirm_dry_run()?;
    apply_creates(session, &batch.valid, dry_run).await
}

fn display_settings(session: &Session) {
    println!("{}", "Current settings".bold());
    println!(
        "  Repository: {}",
        format!("{}/{}", session.repository.owner, session.repository.repo).cyan()
    );
    println!("  Detection:  {}", session.repository.detection_method);
    if let Some(url) = &session.repository.remote_url {
        println!("  Remote URL: {}", url);
    }
    println!("  Owner:      {}", session.credentials.owner.cyan());
    println!(
        "  Token:      {}",
        crypto::obfuscate_for_display(&session.credentials.token)
    );
    match session.store.active_path() {
        Some(path) => println!("  Config:     {}", path.display()),
        None => println!("  Config:     (not saved)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_covers_all_actions() {
        let actions = MenuAction::all();
        assert_eq!(actions.len(), 9);
        assert_eq!(actions.first(), Some(&MenuAction::CreateLabel));
        assert_eq!(actions.last(), Some(&MenuAction::Exit));
    }

    #[test]
    fn test_menu_labels_are_distinct() {
        let labels: std::collections::HashSet<String> =
            MenuAction::all().iter().map(|a| a.to_string()).collect();
        assert_eq!(labels.len(), MenuAction::all().len());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(""), None);
        assert_eq!(non_blank("   "), None);
        assert_eq!(non_blank(" d73a4a "), Some("d73a4a".to_string()));
    }

    #[test]
    fn test_non_empty_validator() {
        assert!(matches!(non_empty("x"), Ok(Validation::Valid)));
        assert!(matches!(non_empty("  "), Ok(Validation::Invalid(_))));
    }
}
