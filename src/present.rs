//! Presenter: status lines for the terminal and a static preview page.
//!
//! The presenter holds no logic of its own. The pipeline raises
//! [`PipelineEvent`]s; [`format_event`] turns each into display lines, and
//! [`write_preview`] renders the current state as a small HTML page next to
//! the original selection and the stored avatar.
//!
//! # Output Format
//!
//! ```text
//! Selected me.png (image/png, 2.0 KB)
//!     Accepted
//! Transformed 50x50 image/png (1.1 KB)
//!     Style: none
//!     Digest: 3f1c9a0b2d4e
//! [processing] Processing...
//! Uploaded as avatar 0
//! Stored avatar 0 (1.1 KB)
//! [success] Avatar created successfully!
//! Preview: avatar-out/index.html
//! ```

use crate::imaging::{Encoding, sniff_encoding};
use crate::session::UiStatus;
use crate::store::AvatarId;
use crate::validate::format_size;
use maud::{DOCTYPE, Markup, html};
use std::io;
use std::path::{Path, PathBuf};

pub const MSG_PROCESSING: &str = "Processing...";
pub const MSG_SUCCESS: &str = "Avatar created successfully!";

/// Status shown when an upload was accepted but the read-back came back empty.
pub fn nothing_stored_message(id: AvatarId) -> String {
    format!("Uploaded as avatar {id}, but nothing is stored under that id.")
}

/// Something the pipeline wants shown.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Selected {
        name: Option<String>,
        declared_type: String,
        len: u64,
    },
    Accepted,
    Transformed {
        width: u32,
        height: u32,
        media_type: &'static str,
        len: u64,
        style: &'static str,
        digest: String,
    },
    Uploaded {
        id: AvatarId,
    },
    Stored {
        id: AvatarId,
        len: u64,
    },
    /// A read under `id` came back empty.
    Absent {
        id: AvatarId,
    },
    Listed {
        ids: Vec<AvatarId>,
    },
    /// A file was written to disk.
    Wrote {
        label: &'static str,
        path: PathBuf,
    },
    Status(UiStatus),
}

/// Format one event as display lines.
pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::Selected {
            name,
            declared_type,
            len,
        } => vec![format!(
            "Selected {} ({}, {})",
            name.as_deref().unwrap_or("file"),
            declared_type,
            format_size(*len)
        )],
        PipelineEvent::Accepted => vec!["    Accepted".to_string()],
        PipelineEvent::Transformed {
            width,
            height,
            media_type,
            len,
            style,
            digest,
        } => vec![
            format!(
                "Transformed {}x{} {} ({})",
                width,
                height,
                media_type,
                format_size(*len)
            ),
            format!("    Style: {}", style),
            format!("    Digest: {}", &digest[..12.min(digest.len())]),
        ],
        PipelineEvent::Uploaded { id } => vec![format!("Uploaded as avatar {}", id)],
        PipelineEvent::Stored { id, len } => {
            vec![format!("Stored avatar {} ({})", id, format_size(*len))]
        }
        PipelineEvent::Absent { id } => vec![format!("Nothing stored under avatar {}", id)],
        PipelineEvent::Listed { ids } if ids.is_empty() => vec!["No avatars stored".to_string()],
        PipelineEvent::Listed { ids } => {
            let mut lines = vec![format!("{} avatars", ids.len())];
            lines.extend(ids.iter().map(|id| format!("    {}", id)));
            lines
        }
        PipelineEvent::Wrote { label, path } => vec![format!("{}: {}", label, path.display())],
        PipelineEvent::Status(status) => vec![status.to_string()],
    }
}

/// What the preview page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewPage {
    pub status: UiStatus,
    /// File name of the original selection, relative to the page.
    pub original: Option<String>,
    /// File name of the stored avatar, relative to the page.
    pub avatar: Option<String>,
    pub avatar_id: Option<AvatarId>,
}

pub fn render_preview(page: &PreviewPage) -> Markup {
    let status_class = format!("message {}", page.status.label());
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Avatar" }
            }
            body {
                main {
                    h1 { "Avatar" }
                    p id="message" class=(status_class) {
                        (page.status.message().unwrap_or(""))
                    }
                    div class="previews" {
                        figure {
                            @if let Some(src) = &page.original {
                                img id="originalPreview" src=(src) alt="Original photo";
                            }
                            figcaption { "Original" }
                        }
                        figure {
                            @if let Some(src) = &page.avatar {
                                img id="avatarPreview" src=(src) alt="Avatar";
                            }
                            figcaption {
                                "Avatar"
                                @if let Some(id) = page.avatar_id {
                                    " #" (id.0)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Image files to place next to the preview page.
#[derive(Debug, Default)]
pub struct PreviewAssets<'a> {
    pub original: Option<&'a [u8]>,
    pub avatar: Option<&'a [u8]>,
    pub avatar_id: Option<AvatarId>,
}

fn asset_name(stem: &str, bytes: &[u8]) -> String {
    let ext = sniff_encoding(bytes).map(Encoding::extension).unwrap_or("img");
    format!("{stem}.{ext}")
}

/// Write `index.html` plus image assets into `dir`. Returns the page path.
pub fn write_preview(dir: &Path, status: &UiStatus, assets: &PreviewAssets<'_>) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let original = match assets.original {
        Some(bytes) => {
            let name = asset_name("original", bytes);
            std::fs::write(dir.join(&name), bytes)?;
            Some(name)
        }
        None => None,
    };
    let avatar = match assets.avatar {
        Some(bytes) => {
            let name = asset_name("avatar", bytes);
            std::fs::write(dir.join(&name), bytes)?;
            Some(name)
        }
        None => None,
    };

    let page = PreviewPage {
        status: status.clone(),
        original,
        avatar,
        avatar_id: assets.avatar_id,
    };
    let path = dir.join("index.html");
    std::fs::write(&path, render_preview(&page).into_string())?;
    Ok(path)
}
