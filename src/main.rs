use avatar_studio::config::{self, Network};
use avatar_studio::outcome::StoredAvatar;
use avatar_studio::pipeline::Pipeline;
use avatar_studio::present::{self, PipelineEvent, PreviewAssets};
use avatar_studio::store::{AvatarId, HttpAvatarStore};
use avatar_studio::types::SelectedFile;
use avatar_studio::validate::{self, Limits, media_type_for_path};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tracing_subscriber::EnvFilter;

/// Flags shared by commands that take a photo.
#[derive(clap::Args, Clone)]
struct PhotoArgs {
    /// Photo to use as the avatar source
    file: PathBuf,

    /// Declared media type (guessed from the extension when omitted)
    #[arg(long = "type")]
    media_type: Option<String>,
}

impl PhotoArgs {
    fn declared_type(&self) -> String {
        self.media_type
            .clone()
            .unwrap_or_else(|| media_type_for_path(&self.file).to_string())
    }

    /// Check the file against `limits` using its on-disk length, without
    /// reading it.
    fn check(&self, limits: &Limits) -> Result<u64, Box<dyn std::error::Error>> {
        let len = std::fs::metadata(&self.file)?.len();
        validate::validate(&self.declared_type(), len, limits)?;
        Ok(len)
    }

    /// Read the photo. Oversized or unsupported files are refused before
    /// any bytes are loaded.
    fn read(&self, limits: &Limits) -> Result<SelectedFile, Box<dyn std::error::Error>> {
        self.check(limits)?;
        let bytes = std::fs::read(&self.file)?;
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(SelectedFile::new(name, self.declared_type(), bytes))
    }
}

#[derive(Parser)]
#[command(name = "avatar-studio")]
#[command(about = "Turn a photo into an avatar and store it remotely")]
#[command(long_about = "\
Turn a photo into an avatar and store it remotely

A selected photo is checked (JPEG, PNG or GIF, at most 10 MB by default),
downscaled so neither side exceeds 800 px, optionally stylized, re-encoded,
and uploaded to the avatar store. The stored copy is read back and written
next to the original under the output directory, with an index.html preview.

Store deployment:
  AVATAR_NETWORK=local   store replica on this machine (default)
  AVATAR_NETWORK=ic      public deployment

Logging:
  RUST_LOG=avatar_studio=debug   per-stage detail

Run 'avatar-studio gen-config' to generate a documented avatar.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "avatar.toml", global = true)]
    config: PathBuf,

    /// Output directory for previews and fetched avatars
    #[arg(long, default_value = "avatar-out", global = true)]
    out: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a photo against the selection rules without processing it
    Check(PhotoArgs),
    /// Transform a photo locally and write a preview, without uploading
    Transform(PhotoArgs),
    /// Transform, upload, and read back: the full avatar flow
    Create(PhotoArgs),
    /// Fetch a stored avatar by id
    Get {
        /// Avatar identifier
        id: AvatarId,
    },
    /// List every stored avatar id
    List,
    /// Print a stock avatar.toml with all options documented
    GenConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("avatar_studio=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Check(photo) => {
            let config = config::load_config(&cli.config)?;
            let name = photo
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
            let len = std::fs::metadata(&photo.file)?.len();
            print_lines(&PipelineEvent::Selected {
                name,
                declared_type: photo.declared_type(),
                len,
            });
            photo.check(&Limits::from_config(&config.limits))?;
            print_lines(&PipelineEvent::Accepted);
            return Ok(());
        }
        _ => {}
    }

    let config = config::load_config(&cli.config)?;
    let network = Network::from_env()?;
    let endpoint = config.store.endpoint(network);
    tracing::debug!(?network, endpoint, "using avatar store");
    let store = HttpAvatarStore::new(
        endpoint,
        config.store.request_timeout(),
        config.store.get_avatar_shape,
    )?;

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            print_lines(&event);
        }
    });

    let result = run(&cli, &config, Arc::new(store), tx).await;
    printer.join().map_err(|_| "output thread panicked")?;
    result
}

/// Run a store-backed command. Consumes the event sender so the printer
/// thread ends once the command is done. Everything the command prints goes
/// through the same channel, so lines come out in order.
async fn run(
    cli: &Cli,
    config: &config::AppConfig,
    store: Arc<HttpAvatarStore>,
    events: Sender<PipelineEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let limits = Limits::from_config(&config.limits);
    let pipeline = Pipeline::new(config, store, Some(events.clone()));
    let wrote = |label: &'static str, path: PathBuf| {
        // Printer gone means the process is already going down
        let _ = events.send(PipelineEvent::Wrote { label, path });
    };

    match &cli.command {
        Command::Transform(photo) => {
            let file = photo.read(&limits)?;
            let image = pipeline.select(file.clone()).await?;
            let page = present::write_preview(
                &cli.out,
                &pipeline.session().status(),
                &PreviewAssets {
                    original: Some(&file.bytes),
                    avatar: Some(&image.bytes),
                    avatar_id: None,
                },
            )?;
            wrote("Preview", page);
        }
        Command::Create(photo) => {
            let file = photo.read(&limits)?;
            let outcome = match pipeline.select(file.clone()).await {
                Ok(_) => pipeline.upload().await,
                Err(err) => Err(err),
            };
            // The preview is written on failure too, showing the error status
            let created = outcome.as_ref().ok();
            let page = present::write_preview(
                &cli.out,
                &pipeline.session().status(),
                &PreviewAssets {
                    original: Some(&file.bytes),
                    avatar: created.and_then(|c| c.stored.bytes()),
                    avatar_id: created.map(|c| c.id),
                },
            )?;
            wrote("Preview", page);
            outcome?;
        }
        Command::Get { id } => {
            if let StoredAvatar::Found(bytes) = pipeline.fetch(*id).await? {
                wrote("Saved", save_avatar(&cli.out, *id, &bytes)?);
            }
        }
        Command::List => {
            pipeline.list().await?;
        }
        Command::Check(_) | Command::GenConfig => {}
    }

    Ok(())
}

fn print_lines(event: &PipelineEvent) {
    for line in present::format_event(event) {
        println!("{}", line);
    }
}

fn save_avatar(dir: &Path, id: AvatarId, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let ext = avatar_studio::imaging::sniff_encoding(bytes)
        .map(|e| e.extension())
        .unwrap_or("img");
    let path = dir.join(format!("avatar-{id}.{ext}"));
    std::fs::write(&path, bytes)?;
    Ok(path)
}
