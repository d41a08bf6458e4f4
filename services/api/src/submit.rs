use crate::infra::{build_store, schema_options};
use clap::Args;
use serde_json::json;
use signup_forms::config::AppConfig;
use signup_forms::error::AppError;
use signup_forms::forms::{
    FormVariant, RawSubmission, RawTech, SelectedFile, SubmissionHandler, SubmissionSchema,
    ValidationErrors,
};
use signup_forms::storage::FilesystemBucketStore;
use signup_forms::telemetry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// Form variant: credentials, profile or portfolio (or 1, 2, 3)
    #[arg(long)]
    pub(crate) variant: FormVariant,
    /// JSON file holding the typed values (email, password, name, techs)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Image to attach as the avatar; its file name becomes the object key
    #[arg(long)]
    pub(crate) avatar: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Only run the given variant instead of all three
    #[arg(long)]
    pub(crate) variant: Option<FormVariant>,
}

pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let raw = tokio::fs::read(&args.input).await?;
    let mut input: RawSubmission = serde_json::from_slice(&raw)?;
    if let Some(path) = args.avatar.as_deref() {
        input.avatar = vec![read_selected_file(path).await?];
    }

    let schema = SubmissionSchema::for_variant(args.variant, &schema_options(&config.forms));
    let submission = match schema.validate(&input) {
        Ok(submission) => submission,
        Err(errors) => {
            print_errors(&errors);
            return Err(errors.into());
        }
    };

    let store = Arc::new(build_store(&config.storage)?);
    let handler = SubmissionHandler::new(store, config.storage.bucket.clone());
    let receipt = handler.handle(submission).await?;

    if let Some(upload) = &receipt.upload {
        println!(
            "Avatar stored as {}/{} ({} bytes)",
            upload.bucket, upload.key, upload.size
        );
    }
    println!("{}", receipt.output);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let root = std::env::temp_dir().join(format!("signup-forms-demo-{}", std::process::id()));
    let store = Arc::new(FilesystemBucketStore::new(root.clone()));
    let handler = SubmissionHandler::new(store, config.storage.bucket.clone());
    let options = schema_options(&config.forms);

    let variants = match args.variant {
        Some(variant) => vec![variant],
        None => vec![
            FormVariant::Credentials,
            FormVariant::Profile,
            FormVariant::Portfolio,
        ],
    };

    println!("Signup forms demo");
    for variant in variants {
        let schema = SubmissionSchema::for_variant(variant, &options);
        println!("\n== {variant} ==");

        println!("Submitting an empty form:");
        if let Err(errors) = schema.validate(&RawSubmission::default()) {
            print_errors(&errors);
        }

        println!("Submitting a filled form:");
        let input = demo_input(variant, &options.email_domain);
        match schema.validate(&input) {
            Ok(submission) => {
                let receipt = handler.handle(submission).await?;
                println!("{}", receipt.output);
            }
            Err(errors) => print_errors(&errors),
        }
    }

    println!("\nDemo bucket written to {}", root.display());
    Ok(())
}

async fn read_selected_file(path: &Path) -> Result<SelectedFile, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile::new(name, bytes))
}

fn print_errors(errors: &ValidationErrors) {
    for (path, message) in errors.iter() {
        println!("  - {path}: {message}");
    }
}

fn demo_input(variant: FormVariant, email_domain: &str) -> RawSubmission {
    let mut input = RawSubmission {
        email: Some(format!("Diego.Fernandes@{email_domain}")),
        password: Some("123456".to_string()),
        ..RawSubmission::default()
    };
    if variant.has_name() {
        input.name = Some("  diego   fernandes ".to_string());
    }
    if variant.has_portfolio() {
        input.techs = vec![
            RawTech {
                title: Some("React".to_string()),
                knowledge: Some(json!(80)),
            },
            RawTech {
                title: Some("Node.js".to_string()),
                knowledge: Some(json!("65")),
            },
        ];
        input.avatar = vec![SelectedFile::new("diego.png", DEMO_AVATAR.to_vec())];
    }
    input
}

// Small PNG payload for the demo avatar.
const DEMO_AVATAR: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];
