//! Gallery Vault - CLI
//!
//! Command-line front end over a SQLite-backed gallery.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use uuid::Uuid;

use gallery_vault::{GalleryApi, GalleryConfig, PhotoSummary, SqliteRepository, UploadRequest};

#[derive(Parser)]
#[command(name = "gallery-vault")]
#[command(author = "Karen Tonoyan")]
#[command(version = gallery_vault::VERSION)]
#[command(about = "Gallery Vault - encrypted photo gallery with non-destructive filters")]
struct Cli {
    /// Config file (JSON)
    #[arg(short, long, default_value = "gallery.json")]
    config: PathBuf,

    /// Override the database path from the config
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        username: String,
        /// Login password
        #[arg(short, long)]
        password: String,
    },

    /// Print an access token
    Login {
        username: String,
        /// Login password
        #[arg(short, long)]
        password: String,
    },

    /// Encrypt and store a photo
    Upload {
        path: PathBuf,
        #[arg(short, long)]
        token: String,
        /// Gallery password
        #[arg(short, long)]
        gallery_password: String,
        /// Subject name; "noSubject" classifies automatically
        #[arg(short, long)]
        subject: Option<String>,
        /// MIME type; sniffed from the content when omitted
        #[arg(long)]
        mime_type: Option<String>,
    },

    /// Decrypt a photo to a file
    Get {
        id: Uuid,
        output: PathBuf,
        #[arg(short, long)]
        token: String,
        #[arg(short, long)]
        gallery_password: String,
    },

    /// List photos
    List {
        #[arg(short, long)]
        token: String,
    },

    /// Copy a photo
    Duplicate {
        id: Uuid,
        #[arg(short, long)]
        token: String,
    },

    /// Change a photo's subject; an empty name clears it
    SetSubject {
        id: Uuid,
        subject: String,
        #[arg(short, long)]
        token: String,
    },

    /// Apply "sepia", "black and white", "color inversion", or "none"
    Filter {
        id: Uuid,
        name: String,
        #[arg(short, long)]
        token: String,
        #[arg(short, long)]
        gallery_password: String,
    },

    /// List subjects
    Subjects {
        #[arg(short, long)]
        token: String,
    },

    /// Create a subject
    CreateSubject {
        name: String,
        #[arg(short, long)]
        token: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GalleryConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let repo = SqliteRepository::open(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path.display()))?;
    let api = GalleryApi::from_config(Arc::new(repo), &config);

    match cli.command {
        Commands::Register { username, password } => {
            let user = api.register(&username, &secret(password))?;
            println!("Registered {} ({})", user.username, user.id);
        }

        Commands::Login { username, password } => {
            let token = api.login(&username, &secret(password))?;
            println!("{}", token.access_token);
        }

        Commands::Upload {
            path,
            token,
            gallery_password,
            subject,
            mime_type,
        } => {
            let ctx = api.authenticate(&token)?;
            let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();

            let photo = api.upload_photo(
                &ctx,
                UploadRequest {
                    filename,
                    mime_type,
                    data,
                    subject_name: subject,
                },
                &secret(gallery_password),
            )?;
            print_photo(&photo);
        }

        Commands::Get {
            id,
            output,
            token,
            gallery_password,
        } => {
            let ctx = api.authenticate(&token)?;
            let (bytes, mime_type) = api.get_photo(&ctx, id, &secret(gallery_password))?;
            std::fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {} ({}, {} bytes)", output.display(), mime_type, bytes.len());
        }

        Commands::List { token } => {
            let ctx = api.authenticate(&token)?;
            let photos = api.list_photos(&ctx)?;
            if photos.is_empty() {
                println!("No photos");
            }
            for photo in &photos {
                print_photo(photo);
            }
        }

        Commands::Duplicate { id, token } => {
            let ctx = api.authenticate(&token)?;
            print_photo(&api.duplicate_photo(&ctx, id)?);
        }

        Commands::SetSubject { id, subject, token } => {
            let ctx = api.authenticate(&token)?;
            print_photo(&api.update_photo_subject(&ctx, id, &subject)?);
        }

        Commands::Filter {
            id,
            name,
            token,
            gallery_password,
        } => {
            let ctx = api.authenticate(&token)?;
            print_photo(&api.apply_filter(&ctx, id, &name, &secret(gallery_password))?);
        }

        Commands::Subjects { token } => {
            let ctx = api.authenticate(&token)?;
            for subject in api.list_subjects(&ctx)? {
                println!("{}  {}", subject.id, subject.name);
            }
        }

        Commands::CreateSubject { name, token } => {
            let ctx = api.authenticate(&token)?;
            let subject = api.create_subject(&ctx, &name)?;
            println!("{}  {}", subject.id, subject.name);
        }
    }

    Ok(())
}

fn secret(value: String) -> SecretString {
    SecretString::new(value)
}

fn print_photo(photo: &PhotoSummary) {
    println!(
        "{}  {}  {}  filter={}  subject={}  {}",
        photo.id,
        photo.filename,
        photo.mime_type,
        photo.filter_applied.as_deref().unwrap_or("-"),
        photo.subject_name.as_deref().unwrap_or("-"),
        photo.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
    );
}
