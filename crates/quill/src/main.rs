//! Quill CLI - personal notes with local, remote, and mirrored storage.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use quill_core::{
    FolderPatch, NoteDraft, NotePatch, RemoteCredentials, Repository, Session, StorageBackend,
    Store,
};
use quill_kv::{
    forget_mirror_root, remember_mirror_root, remembered_mirror_root, KvStore, LocalStore,
};
use quill_mirror::Mirror;
use quill_remote::RemoteStore;

const STORE_FILE: &str = "store.db";
/// Secondary store holding capability grants, separate from the collections.
const GRANTS_FILE: &str = "grants.db";

#[derive(Parser)]
#[command(name = "quill", about = "Personal notes with local, remote, and mirrored storage", version)]
struct Cli {
    /// Data directory (defaults to ~/.quill)
    #[arg(long, env = "QUILL_DIR", global = true)]
    dir: Option<PathBuf>,

    /// Remote store URL; together with --remote-key this makes the remote
    /// backend authoritative for the whole session
    #[arg(long, env = "QUILL_REMOTE_URL", global = true)]
    remote_url: Option<String>,

    /// Remote store API key
    #[arg(long, env = "QUILL_REMOTE_KEY", global = true)]
    remote_key: Option<String>,

    /// User id for remote row scoping
    #[arg(long, env = "QUILL_USER", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a note
    Add {
        /// Note title
        #[arg(long)]
        title: Option<String>,
        /// Note content
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated folder ids
        #[arg(long)]
        tags: Option<String>,
        /// Board column
        #[arg(long)]
        status: Option<String>,
        /// Pin the note
        #[arg(long)]
        pin: bool,
    },
    /// List active notes, pinned first
    Ls {
        /// Case-insensitive title/content filter
        query: Option<String>,
    },
    /// Show one note in full
    Show { id: String },
    /// Edit fields of a note
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// New comma-separated folder ids
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Move a note to the trash (or delete it outright)
    Rm {
        id: String,
        /// Skip the trash and hard-delete immediately
        #[arg(long)]
        permanent: bool,
    },
    /// Bring a note back from the trash
    Restore { id: String },
    /// Toggle a note's pin
    Pin { id: String },
    /// Toggle a note's favorite mark
    Fav { id: String },
    /// Inspect or empty the trash
    Trash {
        #[command(subcommand)]
        command: TrashCommands,
    },
    /// Manage audio recordings attached to a note
    Audio {
        #[command(subcommand)]
        command: AudioCommands,
    },
    /// Manage folders
    Folders {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Manage the on-disk mirror
    Mirror {
        #[command(subcommand)]
        command: MirrorCommands,
    },
}

#[derive(Subcommand)]
enum TrashCommands {
    /// List trashed notes, most recently deleted first
    Ls,
    /// Hard-delete every trashed note
    Empty,
}

#[derive(Subcommand)]
enum AudioCommands {
    /// Attach a recording reference to a note
    Add {
        note_id: String,
        /// Opaque reference to the audio payload
        audio_ref: String,
        #[arg(long)]
        transcript: Option<String>,
    },
    /// Remove a recording from a note
    Rm { note_id: String, audio_id: String },
    /// Set a recording's transcript
    Transcript {
        note_id: String,
        audio_id: String,
        text: String,
    },
}

#[derive(Subcommand)]
enum FolderCommands {
    /// List folders
    Ls,
    /// Create a folder
    Add {
        name: String,
        /// Hex color, e.g. #3b82f6
        #[arg(long, default_value = "#64748b")]
        color: String,
    },
    /// Edit fields of a folder
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        category_name: Option<String>,
        #[arg(long)]
        category_color: Option<String>,
    },
    /// Delete a folder (notes keep their tags)
    Rm { id: String },
}

#[derive(Subcommand)]
enum MirrorCommands {
    /// Grant a root directory and remember it across sessions
    Connect { path: PathBuf },
    /// Forget the granted root
    Disconnect,
    /// Show the granted root, if any
    Status,
    /// Manual recovery: overwrite local storage from the mirror
    Load,
}

fn data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.dir {
        return Ok(dir.clone());
    }
    let base = directories::BaseDirs::new().context("could not locate a home directory")?;
    Ok(base.home_dir().join(".quill"))
}

fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .context("invalid log specification")?
        .start()
        .context("failed to start logger")?;

    let dir = data_dir(&cli)?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory {}", dir.display()))?;
    let kv = KvStore::open(dir.join(STORE_FILE)).context("failed to open local store")?;
    let grants = KvStore::open(dir.join(GRANTS_FILE)).context("failed to open grant store")?;

    // Mirror management operates on the grant store directly; it does not
    // need a session or an authoritative backend.
    if let Commands::Mirror { command } = &cli.command {
        return mirror_command(kv, &grants, command);
    }

    let credentials = match (cli.remote_url.clone(), cli.remote_key.clone()) {
        (Some(base_url), Some(api_key)) => Some(RemoteCredentials { base_url, api_key }),
        _ => None,
    };
    let session = match &cli.user {
        Some(user) => Session::new(user.clone(), credentials.as_ref()),
        None => Session::guest(),
    };

    // The backend is selected here, once, and injected; it never changes
    // for the lifetime of the process.
    match session.backend() {
        StorageBackend::Remote => {
            let credentials = credentials
                .as_ref()
                .context("remote backend selected without credentials")?;
            let store = RemoteStore::new(credentials)?;
            run(Repository::new(store, session), cli.command).await
        }
        StorageBackend::Local => {
            let store = match remembered_mirror_root(&grants)? {
                Some(root) => LocalStore::with_mirror(kv, Mirror::new(root)),
                None => LocalStore::new(kv),
            };
            run(Repository::new(store, session), cli.command).await
        }
    }
}

fn mirror_command(kv: KvStore, grants: &KvStore, command: &MirrorCommands) -> Result<()> {
    match command {
        MirrorCommands::Connect { path } => {
            std::fs::create_dir_all(path.join("notes"))
                .with_context(|| format!("cannot write to {}", path.display()))?;
            remember_mirror_root(grants, path)?;
            println!("Mirroring to {}", path.display());
        }
        MirrorCommands::Disconnect => {
            forget_mirror_root(grants)?;
            println!("Mirror disconnected");
        }
        MirrorCommands::Status => match remembered_mirror_root(grants)? {
            Some(root) => println!("Mirroring to {}", root.display()),
            None => println!("No mirror connected"),
        },
        MirrorCommands::Load => {
            let root = remembered_mirror_root(grants)?.context("no mirror connected")?;
            let snapshot = Mirror::new(root).load_all().context("mirror read failed")?;
            let store = LocalStore::new(kv);
            store.import_snapshot(&snapshot.notes, &snapshot.folders)?;
            println!(
                "Recovered {} notes and {} folders from the mirror",
                snapshot.notes.len(),
                snapshot.folders.len()
            );
        }
    }
    Ok(())
}

async fn run<S: Store>(mut repo: Repository<S>, command: Commands) -> Result<()> {
    repo.refresh().await.context("failed to load notes")?;

    match command {
        Commands::Add {
            title,
            content,
            tags,
            status,
            pin,
        } => {
            let id = repo
                .add_note(NoteDraft {
                    title,
                    content,
                    tags: tags.as_deref().map(parse_tags),
                    status,
                    is_pinned: Some(pin),
                    ..Default::default()
                })
                .await?;
            println!("Added note {id}");
        }

        Commands::Ls { query } => {
            if let Some(query) = query {
                repo.set_search_query(query);
            }
            for note in repo.filtered_notes() {
                let marker = if note.is_pinned { "*" } else { " " };
                println!(
                    "{marker} {}: {} ({})",
                    note.id,
                    note.title,
                    note.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        Commands::Show { id } => match repo.get_note(&id) {
            Some(note) => {
                println!("{}", note.title);
                println!("status: {}  pinned: {}  favorite: {}", note.status, note.is_pinned, note.is_favorite);
                if !note.tags.is_empty() {
                    let names: Vec<&str> = note
                        .tags
                        .iter()
                        .filter_map(|t| repo.folder_for_tag(t).map(|f| f.name.as_str()))
                        .collect();
                    println!("folders: {}", names.join(", "));
                }
                for audio in &note.audio_recordings {
                    println!(
                        "audio {}: {} ({})",
                        audio.id,
                        audio.audio_ref,
                        audio.transcript.as_deref().unwrap_or("no transcript")
                    );
                }
                println!();
                println!("{}", note.content);
            }
            None => println!("No note {id}"),
        },

        Commands::Edit {
            id,
            title,
            content,
            tags,
            status,
        } => {
            repo.update_note(
                &id,
                NotePatch {
                    title,
                    content,
                    tags: tags.as_deref().map(parse_tags),
                    status,
                    ..Default::default()
                },
            )
            .await?;
            println!("Updated note {id}");
        }

        Commands::Rm { id, permanent } => {
            repo.delete_note(&id, permanent).await?;
            if permanent {
                println!("Deleted note {id}");
            } else {
                println!("Moved note {id} to the trash");
            }
        }

        Commands::Restore { id } => {
            repo.restore_note(&id).await?;
            println!("Restored note {id}");
        }

        Commands::Pin { id } => {
            repo.toggle_pin(&id).await?;
            println!("Toggled pin on {id}");
        }

        Commands::Fav { id } => {
            repo.toggle_favorite(&id).await?;
            println!("Toggled favorite on {id}");
        }

        Commands::Trash { command } => match command {
            TrashCommands::Ls => {
                for note in repo.trash_notes() {
                    let deleted = note
                        .deleted_at
                        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!("{}: {} (deleted {deleted})", note.id, note.title);
                }
            }
            TrashCommands::Empty => {
                repo.empty_trash().await?;
                println!("Trash emptied");
            }
        },

        Commands::Audio { command } => match command {
            AudioCommands::Add {
                note_id,
                audio_ref,
                transcript,
            } => match repo.add_audio_to_note(&note_id, &audio_ref, transcript).await? {
                Some(audio_id) => println!("Attached recording {audio_id}"),
                None => println!("No note {note_id}"),
            },
            AudioCommands::Rm { note_id, audio_id } => {
                repo.delete_audio_from_note(&note_id, &audio_id).await?;
                println!("Removed recording {audio_id}");
            }
            AudioCommands::Transcript {
                note_id,
                audio_id,
                text,
            } => {
                repo.update_audio_transcript(&note_id, &audio_id, &text).await?;
                println!("Updated transcript on {audio_id}");
            }
        },

        Commands::Folders { command } => match command {
            FolderCommands::Ls => {
                for folder in repo.folders() {
                    println!("{}: {} ({})", folder.id, folder.name, folder.color);
                }
            }
            FolderCommands::Add { name, color } => {
                let id = repo.add_folder(quill_core::Folder::new(name, color)).await?;
                println!("Added folder {id}");
            }
            FolderCommands::Edit {
                id,
                name,
                color,
                category_name,
                category_color,
            } => {
                repo.update_folder(
                    &id,
                    FolderPatch {
                        name,
                        color,
                        category_name,
                        category_color,
                        ..Default::default()
                    },
                )
                .await?;
                println!("Updated folder {id}");
            }
            FolderCommands::Rm { id } => {
                repo.delete_folder(&id).await?;
                println!("Deleted folder {id}");
            }
        },

        Commands::Mirror { .. } => unreachable!(),
    }

    Ok(())
}
