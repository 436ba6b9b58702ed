//! Collaborator configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lexiscore_core::analyzer::AnalyzerConfig;
use lexiscore_core::traits::{
    Annotator, FrequencyCorpus, LexicalDatabase, NoFrequencies, NoLexicon, RuleChecker,
};

use crate::file_annotator::FileAnnotator;
use crate::http_annotator::{self, HttpAnnotator};
use crate::languagetool::{self, LanguageToolChecker};
use crate::lexicon_file::{FileFrequencies, FileLexicon};

/// Where annotated documents come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotatorConfig {
    Http {
        #[serde(default = "default_annotator_url")]
        base_url: String,
    },
    /// Pre-annotated JSON documents on disk.
    File { path: PathBuf },
}

/// Which grammar rule checker to consult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleCheckerConfig {
    LanguageTool {
        #[serde(default = "default_languagetool_url")]
        base_url: String,
        #[serde(default = "default_language")]
        language: String,
    },
    /// Skip rule checking; grammar accuracy uses the local fallback.
    None,
}

fn default_annotator_url() -> String {
    http_annotator::DEFAULT_BASE_URL.to_string()
}
fn default_languagetool_url() -> String {
    languagetool::DEFAULT_BASE_URL.to_string()
}
fn default_language() -> String {
    languagetool::DEFAULT_LANGUAGE.to_string()
}

/// Analysis limits, mirrored into [`AnalyzerConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub min_words: usize,
    pub max_words: usize,
    pub highlight_radius: usize,
    pub parallelism: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        let defaults = AnalyzerConfig::default();
        Self {
            min_words: defaults.min_words,
            max_words: defaults.max_words,
            highlight_radius: defaults.highlight_radius,
            parallelism: defaults.parallelism,
        }
    }
}

/// Top-level lexiscore configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiscoreConfig {
    pub annotator: AnnotatorConfig,
    pub rule_checker: RuleCheckerConfig,
    /// JSON array of synsets.
    pub lexicon_path: Option<PathBuf>,
    /// `word<TAB>zipf` table.
    pub frequency_path: Option<PathBuf>,
    /// Timeout for each collaborator call, in seconds.
    pub timeout_secs: u64,
    /// Extra question-bank files or directories merged over the built-in bank.
    pub question_banks: Vec<PathBuf>,
    /// Seed for follow-up test shuffling; random when absent.
    pub followup_seed: Option<u64>,
    pub analysis: AnalysisSettings,
}

impl Default for LexiscoreConfig {
    fn default() -> Self {
        Self {
            annotator: AnnotatorConfig::Http {
                base_url: default_annotator_url(),
            },
            rule_checker: RuleCheckerConfig::LanguageTool {
                base_url: default_languagetool_url(),
                language: default_language(),
            },
            lexicon_path: None,
            frequency_path: None,
            timeout_secs: 10,
            question_banks: Vec::new(),
            followup_seed: None,
            analysis: AnalysisSettings::default(),
        }
    }
}

impl LexiscoreConfig {
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            min_words: self.analysis.min_words,
            max_words: self.analysis.max_words,
            rule_check_timeout: Duration::from_secs(self.timeout_secs),
            highlight_radius: self.analysis.highlight_radius,
            parallelism: self.analysis.parallelism.max(1),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(p: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&p.to_string_lossy()))
}

fn resolve(config: &mut LexiscoreConfig) {
    match &mut config.annotator {
        AnnotatorConfig::Http { base_url } => *base_url = resolve_env_vars(base_url),
        AnnotatorConfig::File { path } => *path = resolve_path(path),
    }
    if let RuleCheckerConfig::LanguageTool { base_url, language } = &mut config.rule_checker {
        *base_url = resolve_env_vars(base_url);
        *language = resolve_env_vars(language);
    }
    config.lexicon_path = config.lexicon_path.as_deref().map(resolve_path);
    config.frequency_path = config.frequency_path.as_deref().map(resolve_path);
    config.question_banks = config.question_banks.iter().map(|p| resolve_path(p)).collect();
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `lexiscore.toml` in the current directory
/// 2. `~/.config/lexiscore/config.toml`
///
/// `LEXISCORE_LANGUAGETOOL_URL` overrides the rule checker URL (and enables
/// LanguageTool if the file disabled it).
pub fn load_config() -> Result<LexiscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LexiscoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("lexiscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<LexiscoreConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LexiscoreConfig::default(),
    };

    if let Ok(url) = std::env::var("LEXISCORE_LANGUAGETOOL_URL") {
        let language = match &config.rule_checker {
            RuleCheckerConfig::LanguageTool { language, .. } => language.clone(),
            RuleCheckerConfig::None => default_language(),
        };
        config.rule_checker = RuleCheckerConfig::LanguageTool {
            base_url: url,
            language,
        };
    }

    resolve(&mut config);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("lexiscore"))
}

/// Create the annotator described by the configuration.
pub fn create_annotator(config: &LexiscoreConfig) -> Result<Arc<dyn Annotator>> {
    match &config.annotator {
        AnnotatorConfig::Http { base_url } => Ok(Arc::new(HttpAnnotator::with_timeout(
            base_url,
            config.timeout_secs,
        )?)),
        AnnotatorConfig::File { path } => Ok(Arc::new(FileAnnotator::new(path))),
    }
}

/// Create the rule checker, or `None` when rule checking is disabled.
pub fn create_rule_checker(config: &LexiscoreConfig) -> Result<Option<Arc<dyn RuleChecker>>> {
    match &config.rule_checker {
        RuleCheckerConfig::LanguageTool { base_url, language } => Ok(Some(Arc::new(
            LanguageToolChecker::with_timeout(base_url, language, config.timeout_secs)?,
        ))),
        RuleCheckerConfig::None => Ok(None),
    }
}

pub fn create_lexicon(config: &LexiscoreConfig) -> Arc<dyn LexicalDatabase> {
    match &config.lexicon_path {
        Some(path) => Arc::new(FileLexicon::new(path)),
        None => Arc::new(NoLexicon),
    }
}

pub fn create_frequencies(config: &LexiscoreConfig) -> Arc<dyn FrequencyCorpus> {
    match &config.frequency_path {
        Some(path) => Arc::new(FileFrequencies::new(path)),
        None => Arc::new(NoFrequencies),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_LEXISCORE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_LEXISCORE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_LEXISCORE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("unclosed ${VAR"), "unclosed ${VAR");
        std::env::remove_var("_LEXISCORE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = LexiscoreConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert!(matches!(config.annotator, AnnotatorConfig::Http { .. }));
        let analyzer = config.analyzer_config();
        assert_eq!(analyzer.min_words, 90);
        assert_eq!(analyzer.max_words, 400);
        assert_eq!(analyzer.rule_check_timeout, Duration::from_secs(10));
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
lexicon_path = "data/lexicon.json"
timeout_secs = 5
question_banks = ["banks/travel.toml"]
followup_seed = 42

[annotator]
type = "file"
path = "annotations"

[rule_checker]
type = "languagetool"
base_url = "https://api.languagetool.org"

[analysis]
parallelism = 8
"#;
        let config: LexiscoreConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.annotator,
            AnnotatorConfig::File {
                path: PathBuf::from("annotations")
            }
        );
        assert_eq!(
            config.rule_checker,
            RuleCheckerConfig::LanguageTool {
                base_url: "https://api.languagetool.org".into(),
                language: "en-US".into(),
            }
        );
        assert_eq!(config.followup_seed, Some(42));
        assert_eq!(config.analysis.parallelism, 8);
        assert_eq!(config.analysis.min_words, 90);
        assert_eq!(config.analyzer_config().rule_check_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rule_checker_can_be_disabled() {
        let config: LexiscoreConfig = toml::from_str("[rule_checker]\ntype = \"none\"\n").unwrap();
        assert_eq!(config.rule_checker, RuleCheckerConfig::None);
        assert!(create_rule_checker(&config).unwrap().is_none());
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = load_config_from(Some(Path::new("/no/such/lexiscore.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_resolves_env_in_paths() {
        std::env::set_var("_LEXISCORE_DATA_DIR", "/srv/data");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexiscore.toml");
        std::fs::write(
            &path,
            "frequency_path = \"${_LEXISCORE_DATA_DIR}/zipf.tsv\"\n[annotator]\ntype = \"http\"\nbase_url = \"http://${_LEXISCORE_DATA_DIR}\"\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.frequency_path, Some(PathBuf::from("/srv/data/zipf.tsv")));
        assert_eq!(
            config.annotator,
            AnnotatorConfig::Http {
                base_url: "http:///srv/data".into()
            }
        );
        std::env::remove_var("_LEXISCORE_DATA_DIR");
    }

    #[test]
    fn factories_build_configured_collaborators() {
        let config = LexiscoreConfig {
            annotator: AnnotatorConfig::File {
                path: PathBuf::from("annotations"),
            },
            ..LexiscoreConfig::default()
        };
        assert_eq!(create_annotator(&config).unwrap().name(), "file");
        assert_eq!(
            create_rule_checker(&config).unwrap().unwrap().name(),
            "languagetool"
        );
        assert!(create_lexicon(&config).synsets("dog").is_empty());
        assert_eq!(create_frequencies(&config).zipf("the"), None);
    }
}
