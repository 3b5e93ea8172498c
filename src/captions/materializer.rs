use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::{ApiClient, ApiError, TransportError};
use crate::cli::OutputFormat;
use crate::config::OutputConfig;
use crate::credentials::AuthContext;
use crate::output;
use crate::utils::{extract_host, sanitize_filename};

use super::CaptionLocation;

/// Where the caption artifact goes and in which format
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Target directory; the current directory when unset
    pub directory: Option<PathBuf>,

    pub format: OutputFormat,
}

impl OutputOptions {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            format: config.format,
        }
    }

    /// Absolute target directory
    fn resolve_directory(&self) -> std::io::Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(match &self.directory {
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }

    /// File name for a part title
    pub fn file_name(&self, title: &str) -> String {
        format!("{}.{}", sanitize_filename(title), self.format.extension())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MaterializationError {
    #[error("caption download failed: {0}")]
    TransportFailure(#[source] TransportError),

    #[error("caption document is malformed: {0}")]
    MalformedDocument(String),

    #[error("caption document contains no lines")]
    EmptyDocument,

    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ApiError> for MaterializationError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(e) => Self::TransportFailure(e),
            ApiError::Malformed(detail) => Self::MalformedDocument(detail),
            ApiError::Rejected { code, message } => {
                Self::MalformedDocument(format!("unexpected API envelope (code {code}): {message}"))
            }
        }
    }
}

/// Download the caption document and persist it as `<sanitized title>.<ext>`.
///
/// The file is either written completely or not at all. An existing file of
/// the same name is replaced. Returns the absolute path of the artifact.
pub async fn materialize(
    client: &ApiClient,
    location: &CaptionLocation,
    title: &str,
    auth: Option<&AuthContext>,
    output: &OutputOptions,
) -> Result<PathBuf, MaterializationError> {
    tracing::debug!("Downloading captions from {}", extract_host(&location.url));
    let document = client.caption_document(&location.url, auth).await?;

    if document.body.is_empty() {
        return Err(MaterializationError::EmptyDocument);
    }
    tracing::debug!("Caption document has {} line(s)", document.body.len());

    let content = output::render(&document.body, output.format);

    let directory = output
        .resolve_directory()
        .map_err(|source| MaterializationError::WriteFailure {
            path: output.directory.clone().unwrap_or_default(),
            source,
        })?;
    let path = directory.join(output.file_name(title));

    write_atomically(&directory, &path, content.as_bytes()).map_err(|source| {
        MaterializationError::WriteFailure {
            path: path.clone(),
            source,
        }
    })?;

    Ok(path)
}

/// Write through a temporary sibling file and rename it over `path`
fn write_atomically(directory: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs_err::create_dir_all(directory)?;

    let mut file = tempfile::Builder::new()
        .prefix(".bilisub-")
        .suffix(".part")
        .tempfile_in(directory)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Endpoints, MockTransport};
    use tempfile::TempDir;
    use url::Url;

    fn location() -> CaptionLocation {
        CaptionLocation {
            url: Url::parse("https://aisubtitle.hdslb.com/bfs/ai_subtitle/a.json").unwrap(),
            language: Some("ai-zh".to_string()),
        }
    }

    fn client_returning(body: &'static str) -> ApiClient {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url, _| url.host_str() == Some("aisubtitle.hdslb.com"))
            .times(1)
            .returning(move |_, _| Ok(body.to_string()));
        ApiClient::new(
            Box::new(transport),
            Endpoints::new("https://api.bilibili.com").unwrap(),
        )
    }

    fn options(dir: &TempDir, format: OutputFormat) -> OutputOptions {
        OutputOptions {
            directory: Some(dir.path().to_path_buf()),
            format,
        }
    }

    fn entries(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs_err::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_materialize_writes_lines_in_order() {
        let dir = TempDir::new().unwrap();
        let client = client_returning(r#"{"body":[{"content":"hello"},{"content":"world"}]}"#);

        let path = materialize(&client, &location(), "Intro", None, &options(&dir, OutputFormat::Text))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("Intro.txt"));
        assert!(path.is_absolute());
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "hello\nworld\n");
        assert_eq!(entries(&dir), vec!["Intro.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_materialize_sanitizes_title() {
        let dir = TempDir::new().unwrap();
        let client = client_returning(r#"{"body":[{"content":"一"}]}"#);

        let path = materialize(&client, &location(), "Q&A: why?", None, &options(&dir, OutputFormat::Text))
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "Q&A_ why_.txt");
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "一\n");
    }

    #[tokio::test]
    async fn test_materialize_all_reserved_title() {
        let dir = TempDir::new().unwrap();
        let client = client_returning(r#"{"body":[{"content":"x"}]}"#);

        let path = materialize(&client, &location(), "<|>", None, &options(&dir, OutputFormat::Text))
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "___.txt");
    }

    #[tokio::test]
    async fn test_materialize_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        fs_err::write(dir.path().join("Intro.txt"), "stale content\nmore\nlines\n").unwrap();
        let client = client_returning(r#"{"body":[{"content":"fresh"}]}"#);

        let path = materialize(&client, &location(), "Intro", None, &options(&dir, OutputFormat::Text))
            .await
            .unwrap();

        assert_eq!(fs_err::read_to_string(&path).unwrap(), "fresh\n");
        assert_eq!(entries(&dir), vec!["Intro.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_materialize_srt() {
        let dir = TempDir::new().unwrap();
        let client = client_returning(
            r#"{"body":[{"from":0.0,"to":1.5,"content":"hello"},{"from":1.5,"to":3.25,"content":"world"}]}"#,
        );

        let path = materialize(&client, &location(), "Intro", None, &options(&dir, OutputFormat::Srt))
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "Intro.srt");
        assert_eq!(
            fs_err::read_to_string(&path).unwrap(),
            "1\n00:00:00,000 --> 00:00:01,500\nhello\n\n2\n00:00:01,500 --> 00:00:03,250\nworld\n\n"
        );
    }

    #[tokio::test]
    async fn test_materialize_empty_document_writes_nothing() {
        for body in [r#"{"body":[]}"#, "{}"] {
            let dir = TempDir::new().unwrap();
            let client = client_returning(body);

            let err = materialize(&client, &location(), "Intro", None, &options(&dir, OutputFormat::Text))
                .await
                .unwrap_err();

            assert!(matches!(err, MaterializationError::EmptyDocument));
            assert!(entries(&dir).is_empty());
        }
    }

    #[tokio::test]
    async fn test_materialize_malformed_document() {
        let dir = TempDir::new().unwrap();
        let client = client_returning(r#"{"body":[{"from":1.0}]}"#);

        let err = materialize(&client, &location(), "Intro", None, &options(&dir, OutputFormat::Text))
            .await
            .unwrap_err();

        assert!(matches!(err, MaterializationError::MalformedDocument(_)));
        assert!(entries(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_materialize_write_failure() {
        let dir = TempDir::new().unwrap();
        // A regular file where the output directory should be
        let blocker = dir.path().join("not-a-dir");
        fs_err::write(&blocker, "").unwrap();
        let client = client_returning(r#"{"body":[{"content":"x"}]}"#);

        let output = OutputOptions {
            directory: Some(blocker),
            format: OutputFormat::Text,
        };
        let err = materialize(&client, &location(), "Intro", None, &output)
            .await
            .unwrap_err();

        assert!(matches!(err, MaterializationError::WriteFailure { .. }));
    }
}
