//! Guide documents command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};

use cvt_core::forms::GuideUpload;
use cvt_core::i18n::{Op, Subject};
use tracing::info;

use super::{Context, read_upload};
use crate::cli::GuideCommands;
use crate::error::CliError;
use crate::output::{MessageOutput, OutputFormat};

/// Handler for guide subcommands.
pub struct GuideCommand<'a> {
    ctx: &'a Context,
}

impl<'a> GuideCommand<'a> {
    /// Creates a new guide command handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Executes the guide subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &GuideCommands,
    ) -> Result<(), CliError> {
        let files = self.ctx.client().files();
        match command {
            GuideCommands::List => format.write(out, &files.guides().await?),
            GuideCommands::Upload { files: paths } => {
                let upload = GuideUpload {
                    files: paths
                        .iter()
                        .map(|p| read_upload(p))
                        .collect::<Result<_, _>>()?,
                };
                self.ctx.report(Subject::Guides, Op::Upload, files.upload(&upload).await)?;
                format.write(out, &self.ctx.done(Subject::Guides, Op::Upload))
            }
            GuideCommands::Remove { ids } => {
                self.ctx.report(Subject::Guides, Op::Delete, files.delete_many(ids.as_slice()).await)?;
                format.write(out, &self.ctx.done(Subject::Guides, Op::Delete))
            }
            GuideCommands::Download { id, output } => {
                let path = match output {
                    Some(path) => path.clone(),
                    None => self.original_name(id).await?,
                };
                let bytes = files.download(id).await?;
                std::fs::write(&path, &bytes)?;
                info!(id, path = %path.display(), size = bytes.len(), "guide downloaded");
                format.write(out, &saved(&path, bytes.len()))
            }
            GuideCommands::DownloadAll { output, url_only } => {
                if *url_only {
                    return format.write(out, &MessageOutput::ok(files.download_all_url()?.to_string()));
                }
                let bytes = files.download_all().await?;
                std::fs::write(output, &bytes)?;
                format.write(out, &saved(output, bytes.len()))
            }
            GuideCommands::ViewUrl { id } => {
                format.write(out, &MessageOutput::ok(files.view_url(id)?.to_string()).with_id(id))
            }
        }
    }

    async fn original_name(&self, id: &str) -> Result<PathBuf, CliError> {
        let guides = self.ctx.client().files().guides().await?;
        guides
            .files
            .into_iter()
            .find(|f| f.id == id)
            .and_then(|f| Path::new(&f.original_name).file_name().map(PathBuf::from))
            .ok_or_else(|| CliError::NotFound {
                kind: "guide file",
                id: id.to_string(),
            })
    }
}

fn saved(path: &Path, size: usize) -> MessageOutput {
    MessageOutput::ok(format!("saved {} ({size} bytes)", path.display()))
}
