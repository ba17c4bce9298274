//! Configuration types for serial-number extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The adjustable constants (markers,
//! brand vocabulary, serial pattern, window width) are validated and compiled
//! into [`ExtractionRules`] exactly once, in [`ExtractionConfigBuilder::build`].
//! After that the rules are read-only: nothing in the pipeline rebuilds a
//! regex from mutable state.
//!
//! The same constants can be loaded from a JSON [`ExtractionProfile`] so a
//! deployment can change its marker phrases or brand list without a rebuild.

use crate::error::ScrapeError;
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Brand reported when no vocabulary token is found in the search window.
pub const UNKNOWN_BRAND: &str = "Unknown";

/// `ULT` followed by exactly seven word characters.
pub const DEFAULT_SERIAL_PATTERN: &str = r"ULT\w{7}";

pub const DEFAULT_START_MARKER: &str = "Shipped Serial Numbers/Asset Numbers";

pub const DEFAULT_END_MARKER: &str = "58000.0605";

/// Width of the brand lookbehind window, in characters.
pub const DEFAULT_LOOKBEHIND_CHARS: usize = 50;

// ── Policies ─────────────────────────────────────────────────────────────

/// How the start of a block is recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "phrase", rename_all = "snake_case")]
pub enum StartMarker {
    /// Exact, case-sensitive phrase.
    Literal(String),
    /// The phrase's words in order, case-insensitive, separated by any run
    /// of whitespace or punctuation (including none).
    Flexible(String),
}

impl Default for StartMarker {
    fn default() -> Self {
        StartMarker::Literal(DEFAULT_START_MARKER.to_string())
    }
}

impl StartMarker {
    pub fn phrase(&self) -> &str {
        match self {
            StartMarker::Literal(p) | StartMarker::Flexible(p) => p,
        }
    }

    fn to_pattern(&self) -> Result<String, ScrapeError> {
        match self {
            StartMarker::Literal(phrase) => {
                if phrase.is_empty() {
                    return Err(ScrapeError::InvalidConfig(
                        "start marker must not be empty".into(),
                    ));
                }
                Ok(regex::escape(phrase))
            }
            StartMarker::Flexible(phrase) => {
                let words: Vec<String> = phrase
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .map(regex::escape)
                    .collect();
                if words.is_empty() {
                    return Err(ScrapeError::InvalidConfig(format!(
                        "flexible start marker '{phrase}' has no words"
                    )));
                }
                Ok(format!("(?i){}", words.join(r"[\W_]*")))
            }
        }
    }
}

/// Which text is searched for a brand token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandWindow {
    /// The `lookbehind_chars` characters immediately before the start marker. (default)
    #[default]
    Lookbehind,
    /// The block's own text, from start marker to end marker.
    BlockInterior,
}

/// Whether documents in a batch are segmented separately or as one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// One text stream per document; blocks never span documents. (default)
    #[default]
    PerDocument,
    /// All documents concatenated in input order; a block may start in one
    /// document and end in the next.
    Combined,
}

/// What to do when one document of a batch cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadErrorPolicy {
    /// Return the error; no partial output. (default)
    #[default]
    AbortBatch,
    /// Leave the document out and record a
    /// [`crate::error::BatchWarning::DocumentSkipped`].
    SkipDocument,
}

// ── Brand vocabulary ─────────────────────────────────────────────────────

/// Recognised brand tokens and the names they are reported under.
///
/// Tokens are tried in order and matched case-insensitively as whole words.
/// The display map is keyed by the upper-cased token; a token without an
/// entry resolves to [`UNKNOWN_BRAND`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandVocabulary {
    pub tokens: Vec<String>,
    #[serde(default)]
    pub display: BTreeMap<String, String>,
}

impl Default for BrandVocabulary {
    fn default() -> Self {
        Self::new()
            .with("FRAZIL", "FRAZIL")
            .with("CAFE TANGO", "CAFÉ TANGO")
            .with("ENGY", "ENERGY")
            .with("REFURB", "FRAZIL")
    }
}

impl BrandVocabulary {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            display: BTreeMap::new(),
        }
    }

    /// Append a token and its display name.
    pub fn with(mut self, token: impl Into<String>, display: impl Into<String>) -> Self {
        let token = token.into();
        self.display.insert(token.to_uppercase(), display.into());
        self.tokens.push(token);
        self
    }
}

// ── Compiled rules ───────────────────────────────────────────────────────

/// The validated, compiled form of the extraction constants.
///
/// Only obtainable through [`ExtractionConfigBuilder::build`] (or
/// [`ExtractionRules::default`]), so every regex here is known to compile and
/// the serial pattern is known not to match empty text.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    start_marker: StartMarker,
    start_re: Regex,
    end_marker: String,
    end_re: Regex,
    serial_re: Regex,
    brand_re: Option<Regex>,
    brands: BrandVocabulary,
    display: HashMap<String, String>,
    lookbehind_chars: usize,
    brand_window: BrandWindow,
}

// Built only from the constants above.
static DEFAULT_RULES: Lazy<ExtractionRules> = Lazy::new(|| {
    RuleSettings::default()
        .compile()
        .expect("built-in extraction rules are valid")
});

impl Default for ExtractionRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

impl ExtractionRules {
    pub fn start_marker(&self) -> &StartMarker {
        &self.start_marker
    }

    pub fn end_marker(&self) -> &str {
        &self.end_marker
    }

    pub fn serial_pattern(&self) -> &str {
        self.serial_re.as_str()
    }

    pub fn brands(&self) -> &BrandVocabulary {
        &self.brands
    }

    pub fn lookbehind_chars(&self) -> usize {
        self.lookbehind_chars
    }

    pub fn brand_window(&self) -> BrandWindow {
        self.brand_window
    }

    pub(crate) fn start_regex(&self) -> &Regex {
        &self.start_re
    }

    pub(crate) fn end_regex(&self) -> &Regex {
        &self.end_re
    }

    pub(crate) fn serial_regex(&self) -> &Regex {
        &self.serial_re
    }

    pub(crate) fn brand_regex(&self) -> Option<&Regex> {
        self.brand_re.as_ref()
    }

    /// Display name for a matched brand token, compared upper-cased.
    pub fn display_name(&self, matched: &str) -> &str {
        self.display
            .get(&matched.to_uppercase())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_BRAND)
    }
}

/// Raw, unvalidated rule constants held by the builder.
#[derive(Debug, Clone, Default)]
struct RuleSettings {
    start_marker: StartMarker,
    end_marker: Option<String>,
    serial_pattern: Option<String>,
    brands: BrandVocabulary,
    lookbehind_chars: Option<usize>,
    brand_window: BrandWindow,
}

impl RuleSettings {
    fn compile(self) -> Result<ExtractionRules, ScrapeError> {
        let start_re = Regex::new(&self.start_marker.to_pattern()?).map_err(|e| {
            ScrapeError::InvalidConfig(format!("start marker does not compile: {e}"))
        })?;

        let end_marker = self
            .end_marker
            .unwrap_or_else(|| DEFAULT_END_MARKER.to_string());
        if end_marker.is_empty() {
            return Err(ScrapeError::InvalidConfig(
                "end marker must not be empty".into(),
            ));
        }
        let end_re = Regex::new(&regex::escape(&end_marker))
            .map_err(|e| ScrapeError::InvalidConfig(format!("end marker does not compile: {e}")))?;

        let serial_pattern = self
            .serial_pattern
            .unwrap_or_else(|| DEFAULT_SERIAL_PATTERN.to_string());
        let serial_re = Regex::new(&serial_pattern).map_err(|e| {
            ScrapeError::InvalidConfig(format!("serial pattern '{serial_pattern}' is invalid: {e}"))
        })?;
        if serial_re.is_match("") {
            return Err(ScrapeError::InvalidConfig(format!(
                "serial pattern '{serial_pattern}' matches empty text"
            )));
        }

        if let Some(blank) = self.brands.tokens.iter().find(|t| t.trim().is_empty()) {
            return Err(ScrapeError::InvalidConfig(format!(
                "brand token {blank:?} is blank"
            )));
        }
        let brand_re = if self.brands.tokens.is_empty() {
            None
        } else {
            let alternation = self
                .brands
                .tokens
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).map_err(|e| {
                    ScrapeError::InvalidConfig(format!("brand vocabulary does not compile: {e}"))
                })?,
            )
        };
        let display = self
            .brands
            .display
            .iter()
            .map(|(k, v)| (k.to_uppercase(), v.clone()))
            .collect();

        Ok(ExtractionRules {
            start_marker: self.start_marker,
            start_re,
            end_marker,
            end_re,
            serial_re,
            brand_re,
            brands: self.brands,
            display,
            lookbehind_chars: self.lookbehind_chars.unwrap_or(DEFAULT_LOOKBEHIND_CHARS),
            brand_window: self.brand_window,
        })
    }
}

// ── Config ───────────────────────────────────────────────────────────────

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`], which reproduces the packing-list layout
/// the tool was written for.
///
/// # Example
/// ```rust
/// use packlist_serials::{BrandWindow, ExtractionConfig, StartMarker};
///
/// let config = ExtractionConfig::builder()
///     .start_marker(StartMarker::Flexible("Shipped Serial Numbers/Asset Numbers".into()))
///     .brand_window(BrandWindow::BlockInterior)
///     .lookbehind_chars(80)
///     .build()
///     .unwrap();
/// assert_eq!(config.rules().lookbehind_chars(), 80);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    rules: ExtractionRules,

    /// Segment each document on its own or the whole batch as one stream.
    pub stream_mode: StreamMode,

    /// Abort on an unreadable document, or skip it with a warning.
    pub read_error_policy: ReadErrorPolicy,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// libpdfium file or directory. None means `PDFIUM_LIB_PATH`, then `./`,
    /// then the system library path.
    pub pdfium_library: Option<PathBuf>,

    /// Per-document progress events. None means no callbacks.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rules: ExtractionRules::default(),
            stream_mode: StreamMode::default(),
            read_error_policy: ReadErrorPolicy::default(),
            password: None,
            download_timeout_secs: 120,
            pdfium_library: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("rules", &self.rules)
            .field("stream_mode", &self.stream_mode)
            .field("read_error_policy", &self.read_error_policy)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            rules: RuleSettings::default(),
            stream_mode: StreamMode::default(),
            read_error_policy: ReadErrorPolicy::default(),
            password: None,
            download_timeout_secs: 120,
            pdfium_library: None,
            progress_callback: None,
        }
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    rules: RuleSettings,
    stream_mode: StreamMode,
    read_error_policy: ReadErrorPolicy,
    password: Option<String>,
    download_timeout_secs: u64,
    pdfium_library: Option<PathBuf>,
    progress_callback: Option<ProgressCallback>,
}

impl ExtractionConfigBuilder {
    pub fn start_marker(mut self, marker: StartMarker) -> Self {
        self.rules.start_marker = marker;
        self
    }

    pub fn end_marker(mut self, marker: impl Into<String>) -> Self {
        self.rules.end_marker = Some(marker.into());
        self
    }

    pub fn serial_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.rules.serial_pattern = Some(pattern.into());
        self
    }

    pub fn brands(mut self, vocabulary: BrandVocabulary) -> Self {
        self.rules.brands = vocabulary;
        self
    }

    pub fn lookbehind_chars(mut self, n: usize) -> Self {
        self.rules.lookbehind_chars = Some(n);
        self
    }

    pub fn brand_window(mut self, window: BrandWindow) -> Self {
        self.rules.brand_window = window;
        self
    }

    pub fn stream_mode(mut self, mode: StreamMode) -> Self {
        self.stream_mode = mode;
        self
    }

    pub fn read_error_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.read_error_policy = policy;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.download_timeout_secs = secs;
        self
    }

    pub fn pdfium_library(mut self, location: impl Into<PathBuf>) -> Self {
        self.pdfium_library = Some(location.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Overlay every field the profile sets; unset fields keep their current value.
    pub fn profile(mut self, profile: ExtractionProfile) -> Self {
        if let Some(m) = profile.start_marker {
            self.rules.start_marker = m;
        }
        if let Some(m) = profile.end_marker {
            self.rules.end_marker = Some(m);
        }
        if let Some(p) = profile.serial_pattern {
            self.rules.serial_pattern = Some(p);
        }
        if let Some(b) = profile.brands {
            self.rules.brands = b;
        }
        if let Some(n) = profile.lookbehind_chars {
            self.rules.lookbehind_chars = Some(n);
        }
        if let Some(w) = profile.brand_window {
            self.rules.brand_window = w;
        }
        if let Some(m) = profile.stream_mode {
            self.stream_mode = m;
        }
        if let Some(p) = profile.read_error_policy {
            self.read_error_policy = p;
        }
        self
    }

    /// Build the configuration, validating and compiling the rules.
    pub fn build(self) -> Result<ExtractionConfig, ScrapeError> {
        if self.download_timeout_secs == 0 {
            return Err(ScrapeError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(ExtractionConfig {
            rules: self.rules.compile()?,
            stream_mode: self.stream_mode,
            read_error_policy: self.read_error_policy,
            password: self.password,
            download_timeout_secs: self.download_timeout_secs,
            pdfium_library: self.pdfium_library,
            progress_callback: self.progress_callback,
        })
    }
}

// ── Profile ──────────────────────────────────────────────────────────────

/// JSON form of the adjustable extraction constants.
///
/// Every field is optional; see [`ExtractionConfigBuilder::profile`].
///
/// ```json
/// {
///   "start_marker": { "kind": "flexible", "phrase": "Shipped Serial Numbers/Asset Numbers" },
///   "end_marker": "58000.0605",
///   "serial_pattern": "ULT\\w{7}",
///   "brands": {
///     "tokens": ["FRAZIL", "CAFE TANGO"],
///     "display": { "FRAZIL": "FRAZIL", "CAFE TANGO": "CAFÉ TANGO" }
///   },
///   "lookbehind_chars": 50,
///   "brand_window": "lookbehind",
///   "stream_mode": "per_document",
///   "read_error_policy": "abort_batch"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionProfile {
    pub start_marker: Option<StartMarker>,
    pub end_marker: Option<String>,
    pub serial_pattern: Option<String>,
    pub brands: Option<BrandVocabulary>,
    pub lookbehind_chars: Option<usize>,
    pub brand_window: Option<BrandWindow>,
    pub stream_mode: Option<StreamMode>,
    pub read_error_policy: Option<ReadErrorPolicy>,
}

impl ExtractionProfile {
    pub fn from_json_str(json: &str) -> Result<Self, ScrapeError> {
        serde_json::from_str(json)
            .map_err(|e| ScrapeError::InvalidConfig(format!("profile is not valid: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::InvalidConfig(format!("cannot read profile {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}
