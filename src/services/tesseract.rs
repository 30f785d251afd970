//! Recognition and script detection through the `tesseract` command-line tool.
//!
//! Each call writes the conditioned PNG to a temporary directory and runs one
//! `tesseract` process. Recognition asks for both the `txt` and `tsv` renderers:
//! text comes from the plain-text output, where `preserve_interword_spaces`
//! applies, and the word rows of the TSV only feed the confidence. The child is
//! killed if the calling future is dropped, and the temporary files are removed
//! with it.

use crate::core::OCRError;
use crate::core::config::RecognitionParams;
use crate::core::traits::{RawConfidence, RecognitionEngine, RecognitionOutput, ScriptDetector};
use crate::domain::LanguageSpec;
use crate::pipeline::progress::StageProgress;
use crate::processors::EncodedImage;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::Output;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

const ENGINE_NAME: &str = "tesseract";

/// TSV level of a single word.
const WORD_LEVEL: u32 = 5;

/// Runs the `tesseract` executable.
#[derive(Debug)]
pub struct TesseractEngine {
    binary: PathBuf,
    tessdata_dir: Option<PathBuf>,
    installed: OnceCell<Vec<String>>,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractEngine {
    /// Uses `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            tessdata_dir: None,
            installed: OnceCell::new(),
        }
    }

    /// Uses a specific executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Reads traineddata files from `dir` instead of the built-in location.
    pub fn with_tessdata_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.tessdata_dir = dir;
        self
    }

    /// Language packs installed for this executable. Queried once and cached.
    pub async fn installed_languages(&self) -> Result<&[String], OCRError> {
        let packs = self
            .installed
            .get_or_try_init(|| async {
                let output = self.run(vec!["--list-langs".into()]).await?;
                if !output.status.success() {
                    return Err(failure("tesseract --list-langs failed", &output));
                }
                Ok(parse_list_langs(&String::from_utf8_lossy(&output.stdout)))
            })
            .await?;
        Ok(packs.as_slice())
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Output, OCRError> {
        let mut command = Command::new(&self.binary);
        if let Some(dir) = &self.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }
        command.args(&args).kill_on_drop(true);
        debug!(binary = %self.binary.display(), ?args, "running tesseract");

        command.output().await.map_err(|e| OCRError::Recognition {
            engine: ENGINE_NAME.to_string(),
            context: format!("failed to start '{}'", self.binary.display()),
            source: Some(Box::new(e)),
        })
    }

    /// Runs tesseract on `image` with the given trailing arguments and returns stdout.
    async fn run_on_image(
        &self,
        image: &EncodedImage,
        extra: Vec<OsString>,
    ) -> Result<String, OCRError> {
        let mut file = tempfile::Builder::new()
            .prefix("lipi-")
            .suffix(".png")
            .tempfile()?;
        file.write_all(image.bytes())?;
        file.flush()?;

        let mut args: Vec<OsString> = vec![file.path().into(), "stdout".into()];
        args.extend(extra);
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(failure("tesseract exited with an error", &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs recognition into `<tmp>/out.txt` and `<tmp>/out.tsv` and returns both.
    async fn run_recognition(
        &self,
        image: &EncodedImage,
        extra: Vec<OsString>,
    ) -> Result<(String, String), OCRError> {
        let dir = tempfile::Builder::new().prefix("lipi-").tempdir()?;
        let input = dir.path().join("input.png");
        let base = dir.path().join("out");
        tokio::fs::write(&input, image.bytes()).await?;

        let mut args: Vec<OsString> = vec![input.into(), base.clone().into()];
        args.extend(extra);
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(failure("tesseract exited with an error", &output));
        }

        let txt = tokio::fs::read_to_string(base.with_extension("txt")).await?;
        let tsv = tokio::fs::read_to_string(base.with_extension("tsv")).await?;
        Ok((txt, tsv))
    }
}

fn failure(context: &str, output: &Output) -> OCRError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    OCRError::recognition(ENGINE_NAME, format!("{context}: {}", stderr.trim()))
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn load_languages(
        &self,
        languages: &LanguageSpec,
        progress: &StageProgress,
    ) -> Result<(), OCRError> {
        let installed = self.installed_languages().await.map_err(|e| {
            OCRError::model_load(languages, "could not list installed packs", Some(Box::new(e)))
        })?;
        let missing: Vec<&str> = languages
            .packs()
            .iter()
            .filter(|pack| !installed.contains(*pack))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(OCRError::model_load(
                languages,
                format!("missing traineddata for {}", missing.join(", ")),
                None,
            ));
        }
        progress.report(1.0, Some("Language models ready"));
        Ok(())
    }

    async fn recognize(
        &self,
        image: &EncodedImage,
        languages: &LanguageSpec,
        params: &RecognitionParams,
        progress: &StageProgress,
    ) -> Result<RecognitionOutput, OCRError> {
        let (txt, tsv) = self
            .run_recognition(image, recognition_args(languages, params))
            .await?;
        let output = RecognitionOutput {
            text: clean_text(&txt),
            confidence: mean_word_confidence(&tsv),
        };
        progress.report(1.0, Some("Text recognized"));
        Ok(output)
    }
}

#[async_trait]
impl ScriptDetector for TesseractEngine {
    async fn detect_script(
        &self,
        image: &EncodedImage,
        progress: &StageProgress,
    ) -> Result<String, OCRError> {
        let osd = self
            .run_on_image(image, vec!["--psm".into(), "0".into()])
            .await
            .map_err(|e| {
                OCRError::classification(format!("orientation and script detection failed: {e}"))
            })?;
        let script = parse_osd_script(&osd)
            .ok_or_else(|| OCRError::classification("no 'Script:' line in OSD output"))?;
        progress.report(1.0, None);
        Ok(script.to_string())
    }
}

fn recognition_args(languages: &LanguageSpec, params: &RecognitionParams) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-l".into(),
        languages.to_string().into(),
        "--psm".into(),
        params.page_segmentation.tesseract_psm().to_string().into(),
    ];
    if params.preserve_interword_spaces {
        args.push("-c".into());
        args.push("preserve_interword_spaces=1".into());
    }
    if let Some(whitelist) = &params.char_whitelist {
        args.push("-c".into());
        args.push(format!("tessedit_char_whitelist={whitelist}").into());
    }
    args.push("txt".into());
    args.push("tsv".into());
    args
}

/// Parses `--list-langs` output; the first line is a header.
fn parse_list_langs(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts the script name from `--psm 0` output.
fn parse_osd_script(osd: &str) -> Option<&str> {
    osd.lines()
        .filter_map(|line| line.trim().strip_prefix("Script:"))
        .map(str::trim)
        .find(|name| !name.is_empty())
}

/// Strips the trailing page separator and blank lines of the `txt` renderer.
///
/// Leading indentation and the spacing between words are kept as tesseract
/// wrote them.
fn clean_text(txt: &str) -> String {
    txt.trim_start_matches(['\n', '\r'])
        .trim_end()
        .to_string()
}

/// Mean confidence of the TSV word rows, in percent.
///
/// Rows with an empty word or a negative confidence are ignored.
fn mean_word_confidence(tsv: &str) -> RawConfidence {
    let mut sum = 0.0f32;
    let mut count = 0u32;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        if cols[0].trim().parse::<u32>().ok() != Some(WORD_LEVEL) || cols[11].trim().is_empty() {
            continue;
        }
        if let Ok(conf) = cols[10].trim().parse::<f32>()
            && conf >= 0.0
        {
            sum += conf;
            count += 1;
        }
    }

    if count == 0 {
        RawConfidence::Unknown
    } else {
        RawConfidence::Percent(sum / count as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PageSegmentation;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(line: u32, n: u32, left: u32, width: u32, conf: f32, text: &str) -> String {
        format!("5\t1\t1\t1\t{line}\t{n}\t{left}\t0\t{width}\t10\t{conf}\t{text}")
    }

    #[test]
    fn test_clean_text_keeps_word_spacing() {
        let txt = "\nItem                    $42\n    Total   $42\n\n\x0c";
        assert_eq!(clean_text(txt), "Item                    $42\n    Total   $42");
        assert_eq!(clean_text("\x0c"), "");
    }

    #[test]
    fn test_wide_gap_text_with_tsv_confidence() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t700\t100\t-1\t".to_string(),
            word(1, 1, 0, 40, 90.0, "Item"),
            word(1, 2, 600, 40, 70.0, "$42"),
        ]
        .join("\n");
        let txt = "Item                                   $42\n\x0c";

        assert_eq!(clean_text(txt), "Item                                   $42");
        assert_eq!(mean_word_confidence(&tsv), RawConfidence::Percent(80.0));
    }

    #[test]
    fn test_confidence_without_words() {
        assert_eq!(mean_word_confidence(HEADER), RawConfidence::Unknown);
        assert_eq!(mean_word_confidence(""), RawConfidence::Unknown);
    }

    #[test]
    fn test_confidence_skips_negative_and_empty_words() {
        let tsv = [
            HEADER.to_string(),
            word(1, 1, 0, 10, -1.0, "x"),
            word(1, 2, 20, 10, 50.0, "y"),
            word(1, 3, 40, 10, 95.0, " "),
        ]
        .join("\n");
        assert_eq!(mean_word_confidence(&tsv), RawConfidence::Percent(50.0));
    }

    #[test]
    fn test_parse_list_langs() {
        let stdout = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nhin\n\nosd\n";
        assert_eq!(parse_list_langs(stdout), vec!["eng", "hin", "osd"]);
    }

    #[test]
    fn test_parse_osd_script() {
        let osd = "Page number: 0\nOrientation in degrees: 0\nRotate: 0\n\
                   Orientation confidence: 1.20\nScript: Devanagari\nScript confidence: 3.33\n";
        assert_eq!(parse_osd_script(osd), Some("Devanagari"));
        assert_eq!(parse_osd_script("Orientation in degrees: 0\n"), None);
    }

    #[test]
    fn test_recognition_args() {
        let languages: LanguageSpec = "hin+mar".parse().unwrap();
        let params = RecognitionParams::default();
        let args: Vec<String> = recognition_args(&languages, &params)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(
            args,
            [
                "-l",
                "hin+mar",
                "--psm",
                "6",
                "-c",
                "preserve_interword_spaces=1",
                "txt",
                "tsv"
            ]
        );

        let params = RecognitionParams::default()
            .with_page_segmentation(PageSegmentation::SparseText)
            .with_char_whitelist(Some("0123456789".to_string()));
        let args = recognition_args(&languages, &params);
        assert!(args.contains(&OsString::from("11")));
        assert!(args.contains(&OsString::from("tessedit_char_whitelist=0123456789")));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_recognition_error() {
        let engine = TesseractEngine::new().with_binary("/nonexistent/lipi-tesseract");
        let image = EncodedImage::new(vec![1, 2, 3], 1, 1, "image/png");
        let err = engine
            .recognize(
                &image,
                &LanguageSpec::english(),
                &RecognitionParams::default(),
                &StageProgress::detached(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OCRError::Recognition { .. }));

        let err = engine
            .load_languages(&LanguageSpec::english(), &StageProgress::detached())
            .await
            .unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));

        let err = engine
            .detect_script(&image, &StageProgress::detached())
            .await
            .unwrap_err();
        assert!(matches!(err, OCRError::Classification { .. }));
    }
}
