//! Resume Materializer: turns a `Suitable` classification into a tailored resume file.
//!
//! Flow: copy template → working path, fill placeholders, save, then move the working
//! copy into the output folder as `<job title> - <job id>.<ext>`. The working path is a
//! single reusable slot, so it is always empty again once a job is done with it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

pub mod docx;

pub use docx::FontSpec;
use docx::{DocxError, PROFILE_PLACEHOLDER, SKILLS_PLACEHOLDER};

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("could not copy template {} to {}: {source}", .template.display(), .working.display())]
    Template {
        template: PathBuf,
        working: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Docx(#[from] DocxError),
}

/// Locations and formatting for resume generation.
#[derive(Debug, Clone)]
pub struct ResumeSettings {
    pub template_path: PathBuf,
    pub working_path: PathBuf,
    pub output_dir: PathBuf,
    pub font: FontSpec,
}

pub struct ResumeMaterializer {
    settings: ResumeSettings,
}

impl ResumeMaterializer {
    pub fn new(settings: ResumeSettings) -> Self {
        Self { settings }
    }

    #[cfg(test)]
    pub fn working_path(&self) -> &Path {
        &self.settings.working_path
    }

    /// Builds the resume for one suitable job and moves it into the output folder.
    ///
    /// Returns the final path, or `None` when any step failed (already logged).
    pub fn materialize(
        &self,
        profile: &str,
        skills: &str,
        job_title: &str,
        job_id: &str,
    ) -> Option<PathBuf> {
        if let Err(e) = self.prepare(profile, skills) {
            warn!("Resume generation failed for job {job_id}: {e}");
            self.discard_working_copy();
            return None;
        }
        self.move_to_output(job_title, job_id)
    }

    /// Copies the template into the working path and fills in the generated text.
    pub fn prepare(&self, profile: &str, skills: &str) -> Result<(), ResumeError> {
        let template = &self.settings.template_path;
        let working = &self.settings.working_path;

        if let Some(parent) = working.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ResumeError::Template {
                template: template.clone(),
                working: working.clone(),
                source,
            })?;
        }
        fs::copy(template, working).map_err(|source| ResumeError::Template {
            template: template.clone(),
            working: working.clone(),
            source,
        })?;

        let replaced = docx::fill_placeholders(
            working,
            &[(PROFILE_PLACEHOLDER, profile), (SKILLS_PLACEHOLDER, skills)],
            &self.settings.font,
        )?;
        if replaced == 0 {
            warn!(
                "Template {} contains no placeholders; resume is an unmodified copy",
                template.display()
            );
        }

        info!("Resume updated successfully as {}", working.display());
        Ok(())
    }

    /// Moves the working copy to `<output_dir>/<job title> - <job id>.<ext>`.
    ///
    /// A missing working copy is reported as `None`, never as an error.
    pub fn move_to_output(&self, job_title: &str, job_id: &str) -> Option<PathBuf> {
        let working = &self.settings.working_path;
        if !working.exists() {
            warn!(
                "No working resume at {} to move for job {job_id}",
                working.display()
            );
            return None;
        }

        let output_dir = &self.settings.output_dir;
        if let Err(e) = fs::create_dir_all(output_dir) {
            warn!("Could not create resume folder {}: {e}", output_dir.display());
            return None;
        }

        let destination = output_dir.join(self.artifact_name(job_title, job_id));
        match move_file(working, &destination) {
            Ok(()) => {
                info!(
                    "Renamed working resume to {} in {}",
                    destination.display(),
                    output_dir.display()
                );
                Some(destination)
            }
            Err(e) => {
                warn!("Move error for job {job_id}: {e}");
                None
            }
        }
    }

    /// `<job title> - <job id>.<ext>`, with the template's extension.
    pub fn artifact_name(&self, job_title: &str, job_id: &str) -> String {
        let ext = self
            .settings
            .template_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("docx");
        format!(
            "{} - {}.{ext}",
            sanitize_file_component(job_title),
            sanitize_file_component(job_id)
        )
    }

    fn discard_working_copy(&self) {
        let working = &self.settings.working_path;
        if working.exists() {
            if let Err(e) = fs::remove_file(working) {
                warn!("Could not remove working resume {}: {e}", working.display());
            }
        }
    }
}

/// Replaces characters that are illegal in file names on common filesystems.
fn sanitize_file_component(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    cleaned.trim().trim_end_matches('.').to_string()
}

/// `rename`, falling back to copy + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
